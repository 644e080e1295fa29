use std::time::Instant;

use anyhow::{Context, Result};
use fjoin_common::any_to_key_string;
use fjoin_core::fuzzy_join_with_options;
use fjoin_ingest::write_csv_table;
use fjoin_model::{JoinKind, Side, Table};
use tracing::{info, info_span, trace};

use crate::cli::JoinArgs;
use crate::config::JobConfig;
use crate::logging::redact_value;
use crate::summary::types_table;
use crate::types::JoinOutcome;

pub fn run_types() -> Result<()> {
    println!("{}", types_table());
    Ok(())
}

pub fn run_join(args: &JoinArgs) -> Result<JoinOutcome> {
    let span = info_span!("job", path = %args.job.display());
    let _guard = span.enter();
    let start = Instant::now();

    let config = JobConfig::load(&args.job)?;
    let spec = config.spec().context("invalid join columns")?;
    let join_kind = args
        .join_kind
        .map(JoinKind::from)
        .or(config.join_kind)
        .unwrap_or_default();
    let output = if args.dry_run {
        None
    } else {
        let path = config
            .output_path(args.output.as_deref())
            .context("no output path: set `output` in the job file or pass --output")?;
        Some(path)
    };

    let left = config.load_table(Side::Left)?;
    let right = config.load_table(Side::Right)?;
    info!(
        left_rows = left.height(),
        right_rows = right.height(),
        pairs = spec.len(),
        kind = %join_kind,
        "inputs loaded"
    );

    let report = fuzzy_join_with_options(&left, &right, &spec, join_kind, &config.options)
        .context("fuzzy join failed")?;
    trace!(row = redact_value(&first_row_preview(&report.table)), "first joined row");

    if let Some(path) = &output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output directory {}", parent.display()))?;
        }
        write_csv_table(&report.table, path)?;
    }

    info!(
        rows = report.table.height(),
        written = output.is_some(),
        duration_ms = start.elapsed().as_millis(),
        "job complete"
    );
    Ok(JoinOutcome {
        job: args.job.clone(),
        join_kind,
        left_rows: left.height(),
        right_rows: right.height(),
        rows: report.table.height(),
        columns: report.table.width(),
        output,
        pairs: report.pairs,
    })
}

fn first_row_preview(table: &Table) -> String {
    if table.height() == 0 {
        return String::new();
    }
    table
        .data
        .get_columns()
        .iter()
        .map(|column| {
            let value = column
                .get(0)
                .ok()
                .and_then(any_to_key_string)
                .unwrap_or_default();
            format!("{}={value}", column.name())
        })
        .collect::<Vec<_>>()
        .join(", ")
}
