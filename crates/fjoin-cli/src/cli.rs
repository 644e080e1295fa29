//! CLI argument definitions for the fuzzy join runner.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use fjoin_model::JoinKind;

#[derive(Parser)]
#[command(
    name = "fuzzy-join",
    version,
    about = "Join two tables on approximately matching keys",
    long_about = "Join two CSV tables on approximately matching keys.\n\n\
                  Text, numeric, vector, geographic and datetime columns are matched\n\
                  within a tolerance, then joined on the matched values."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow cell values in trace logs (redacted otherwise).
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a join job described by a TOML file.
    Join(JoinArgs),

    /// List the supported semantic types and the matcher each one selects.
    Types,
}

#[derive(Parser)]
pub struct JoinArgs {
    /// Path to the job file.
    #[arg(value_name = "JOB")]
    pub job: PathBuf,

    /// Output CSV path (overrides the job file).
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Relational join kind (overrides the job file).
    #[arg(long = "join-kind", value_enum)]
    pub join_kind: Option<JoinKindArg>,

    /// Match and report without writing the output file.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

/// CLI join kind choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum JoinKindArg {
    Left,
    Right,
    Outer,
    Inner,
    Cross,
}

impl From<JoinKindArg> for JoinKind {
    fn from(value: JoinKindArg) -> Self {
        match value {
            JoinKindArg::Left => JoinKind::Left,
            JoinKindArg::Right => JoinKind::Right,
            JoinKindArg::Outer => JoinKind::Outer,
            JoinKindArg::Inner => JoinKind::Inner,
            JoinKindArg::Cross => JoinKind::Cross,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_command() {
        let cli = Cli::try_parse_from([
            "fuzzy-join",
            "--log-format",
            "json",
            "join",
            "job.toml",
            "--join-kind",
            "inner",
            "--dry-run",
        ])
        .unwrap();
        assert!(matches!(cli.log_format, LogFormatArg::Json));
        let Command::Join(args) = cli.command else {
            panic!("expected join command");
        };
        assert_eq!(args.job, PathBuf::from("job.toml"));
        assert_eq!(args.join_kind.map(JoinKind::from), Some(JoinKind::Inner));
        assert!(args.dry_run);
        assert!(args.output.is_none());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["fuzzy-join", "types", "--log-data"]).unwrap();
        assert!(cli.log_data);
        assert!(matches!(cli.command, Command::Types));
    }
}
