//! Join job files.
//!
//! A job is a TOML document naming the two inputs, the join columns and
//! their tolerances:
//!
//! ```toml
//! join_kind = "inner"
//! output = "joined.csv"
//!
//! [left]
//! path = "stations.csv"
//!
//! [left.semantic_types]
//! location = ["float_vector"]
//!
//! [right]
//! path = "readings"          # a directory of CSV files
//! resource = "learningData"
//!
//! [join]
//! left_columns = ["name", "location"]
//! right_columns = ["station", "coords"]
//! accuracy = [0.9, 500.0]
//! absolute = [false, true]
//! join_types = ["string", "geo"]
//!
//! [options]
//! string_scorer = "jaro_winkler"
//! ```
//!
//! Relative paths are resolved against the job file's directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use fjoin_core::JoinOptions;
use fjoin_ingest::{read_csv_table, read_dataset};
use fjoin_model::{ColumnPair, JoinKind, JoinSpec, JoinType, OneOrMany, Side, Table};
use serde::Deserialize;
use tracing::{debug, warn};

/// A parsed job file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    pub left: InputConfig,
    pub right: InputConfig,
    pub join: JoinColumns,
    #[serde(default)]
    pub join_kind: Option<JoinKind>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub options: JoinOptions,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// One side of the join.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// A CSV file, or a directory of CSV files loaded as a dataset.
    pub path: PathBuf,
    /// Resource to use when `path` is a directory.
    #[serde(default)]
    pub resource: Option<String>,
    /// Declared semantic tags per column, replacing dtype-derived ones.
    #[serde(default)]
    pub semantic_types: BTreeMap<String, Vec<String>>,
}

/// Join columns and tolerances, scalar or one value per pair.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinColumns {
    pub left_columns: OneOrMany<String>,
    pub right_columns: OneOrMany<String>,
    #[serde(default = "default_accuracy")]
    pub accuracy: OneOrMany<f64>,
    #[serde(default = "default_absolute")]
    pub absolute: OneOrMany<bool>,
    /// Matcher family per pair, bypassing classification.
    #[serde(default)]
    pub join_types: Option<OneOrMany<JoinType>>,
}

fn default_accuracy() -> OneOrMany<f64> {
    OneOrMany::One(1.0)
}

fn default_absolute() -> OneOrMany<bool> {
    OneOrMany::One(false)
}

impl JobConfig {
    /// Read and parse a job file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read job file {}", path.display()))?;
        let mut config = Self::parse(&text)
            .with_context(|| format!("parse job file {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    /// Parse a job from TOML text. Paths stay relative to the working directory.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Build the validated column pairs.
    pub fn spec(&self) -> Result<JoinSpec> {
        let join = &self.join;
        let spec = JoinSpec::from_lists(
            &join.left_columns,
            &join.right_columns,
            &join.accuracy,
            &join.absolute,
        )?;
        let Some(join_types) = &join.join_types else {
            return Ok(spec);
        };
        let Some(join_types) = join_types.expand(spec.len()) else {
            bail!(
                "{} join types given for {} join column pairs",
                join_types.len().unwrap_or(1),
                spec.len()
            );
        };
        let pairs: Vec<ColumnPair> = spec
            .pairs()
            .iter()
            .cloned()
            .zip(join_types)
            .map(|(pair, join_type)| pair.with_join_type(join_type))
            .collect();
        Ok(JoinSpec::new(pairs)?)
    }

    /// Output path: the explicit override, else the job's own.
    pub fn output_path(&self, explicit: Option<&Path>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.output.as_deref().map(|path| self.resolve(path)))
    }

    pub fn input(&self, side: Side) -> &InputConfig {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Load one side's table and apply its declared semantic types.
    pub fn load_table(&self, side: Side) -> Result<Table> {
        let input = self.input(side);
        let path = self.resolve(&input.path);
        let mut table = if path.is_dir() {
            let dataset = read_dataset(&path)
                .with_context(|| format!("load {side} dataset {}", path.display()))?;
            let (resource, table) = dataset.tabular_resource(side, input.resource.as_deref())?;
            debug!(%side, resource, "using dataset resource");
            table.clone()
        } else {
            if input.resource.is_some() {
                warn!(%side, path = %path.display(), "resource ignored for a single CSV file");
            }
            read_csv_table(&path).with_context(|| format!("load {side} table {}", path.display()))?
        };
        apply_semantic_types(&mut table, side, &input.semantic_types);
        Ok(table)
    }
}

/// Declare semantic tags on a table. Columns the table lacks are skipped
/// with a warning.
pub fn apply_semantic_types(
    table: &mut Table,
    side: Side,
    semantic_types: &BTreeMap<String, Vec<String>>,
) {
    for (column, tags) in semantic_types {
        if !table.has_column(column) {
            warn!(%side, column, "semantic types declared for a missing column");
            continue;
        }
        table.set_semantic_types(column, tags.iter().map(String::as_str));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fjoin_match::StringScorer;
    use fjoin_model::SemanticType;
    use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

    const JOB: &str = r#"
        join_kind = "inner"
        output = "out/joined.csv"

        [left]
        path = "left.csv"

        [left.semantic_types]
        code = ["categorical"]

        [right]
        path = "right"
        resource = "learningData"

        [join]
        left_columns = ["name", "location"]
        right_columns = ["station", "coords"]
        accuracy = [0.9, 500.0]
        absolute = [false, true]
        join_types = ["string", "geo"]

        [options]
        string_scorer = "jaro_winkler"
    "#;

    #[test]
    fn parses_full_job() {
        let config = JobConfig::parse(JOB).unwrap();
        assert_eq!(config.join_kind, Some(JoinKind::Inner));
        assert_eq!(config.right.resource.as_deref(), Some("learningData"));
        assert_eq!(config.options.string_scorer, StringScorer::JaroWinkler);
        assert_eq!(config.options.right_suffix, "_right");

        let spec = config.spec().unwrap();
        assert_eq!(spec.len(), 2);
        let geo = &spec.pairs()[1];
        assert_eq!(geo.right_column, "coords");
        assert_eq!(geo.join_type, Some(JoinType::Geo));
        assert!(geo.absolute);
    }

    #[test]
    fn scalars_broadcast_and_defaults_apply() {
        let config = JobConfig::parse(
            r#"
            [left]
            path = "a.csv"
            [right]
            path = "b.csv"
            [join]
            left_columns = "k"
            right_columns = "k"
            "#,
        )
        .unwrap();
        let spec = config.spec().unwrap();
        assert!(spec.pairs()[0].is_exact());
        assert_eq!(config.join_kind, None);
        assert_eq!(config.output_path(None), None);
    }

    #[test]
    fn join_type_count_must_match() {
        let text = JOB.replace(r#"join_types = ["string", "geo"]"#, r#"join_types = ["string"]"#);
        let err = JobConfig::parse(&text).unwrap().spec().unwrap_err();
        assert!(err.to_string().contains("1 join types given for 2"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let text = JOB.replace("join_kind", "join_knd");
        assert!(JobConfig::parse(&text).is_err());
    }

    #[test]
    fn paths_resolve_against_job_directory() {
        let mut config = JobConfig::parse(JOB).unwrap();
        config.base_dir = PathBuf::from("/jobs");
        assert_eq!(config.resolve(Path::new("left.csv")), PathBuf::from("/jobs/left.csv"));
        assert_eq!(
            config.output_path(None),
            Some(PathBuf::from("/jobs/out/joined.csv"))
        );
        assert_eq!(
            config.output_path(Some(Path::new("x.csv"))),
            Some(PathBuf::from("x.csv"))
        );
    }

    #[test]
    fn semantic_types_skip_missing_columns() {
        let cols: Vec<Column> = vec![Series::new("code".into(), vec![1i64, 2]).into_column()];
        let mut table = Table::new(DataFrame::new(cols).unwrap());
        let declared = BTreeMap::from([
            ("code".to_string(), vec!["categorical".to_string()]),
            ("absent".to_string(), vec!["text".to_string()]),
        ]);
        apply_semantic_types(&mut table, Side::Left, &declared);
        assert_eq!(
            table.semantic_types("code").into_iter().collect::<Vec<_>>(),
            vec![SemanticType::Categorical]
        );
        assert!(!table.semantic_types.contains_key("absent"));
    }
}
