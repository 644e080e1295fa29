//! Tables and datasets handed to the join engine.
//!
//! A [`Table`] wraps a Polars DataFrame with per-column semantic tags. A
//! [`Dataset`] is a collection of named tables from which the main tabular
//! resource is extracted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use polars::prelude::DataFrame;

use crate::error::{FuzzyJoinError, Result};
use crate::semantic::SemanticType;

/// Default name of the per-table row identity column.
pub const ROW_IDENTITY_COLUMN: &str = "d3mIndex";

/// Resource id used for the main table when a dataset has several.
pub const DEFAULT_RESOURCE_ID: &str = "learningData";

/// Which input a column or table belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}

/// A DataFrame plus the semantic tags of its columns.
#[derive(Debug, Clone)]
pub struct Table {
    /// The table contents.
    pub data: DataFrame,
    /// Declared semantic tags by column name. Columns without an entry fall
    /// back to tags derived from their dtype.
    pub semantic_types: BTreeMap<String, BTreeSet<SemanticType>>,
}

impl Table {
    /// Create a table with no declared tags.
    pub fn new(data: DataFrame) -> Self {
        Self {
            data,
            semantic_types: BTreeMap::new(),
        }
    }

    /// Declare the semantic tags for a column, replacing any previous ones.
    #[must_use]
    pub fn with_semantic_types<I, T>(mut self, column: &str, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SemanticType>,
    {
        self.set_semantic_types(column, types);
        self
    }

    pub fn set_semantic_types<I, T>(&mut self, column: &str, types: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<SemanticType>,
    {
        self.semantic_types
            .insert(column.to_string(), types.into_iter().map(Into::into).collect());
    }

    pub fn height(&self) -> usize {
        self.data.height()
    }

    pub fn width(&self) -> usize {
        self.data.width()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.data.get_column_index(name).is_some()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Semantic tags of a column: the declared tags, or the tag derived from
    /// its dtype. Missing columns have no tags.
    pub fn semantic_types(&self, column: &str) -> BTreeSet<SemanticType> {
        if let Some(declared) = self.semantic_types.get(column)
            && !declared.is_empty()
        {
            return declared.clone();
        }
        self.data
            .column(column)
            .ok()
            .and_then(|c| SemanticType::from_dtype(c.dtype()))
            .into_iter()
            .collect()
    }

    /// Fail with `ColumnNotFound` unless the column exists.
    pub fn require_column(&self, side: Side, column: &str) -> Result<()> {
        if self.has_column(column) {
            Ok(())
        } else {
            Err(FuzzyJoinError::ColumnNotFound {
                side,
                column: column.to_string(),
            })
        }
    }
}

/// A set of named tables.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub resources: BTreeMap<String, Table>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dataset holding a single table under [`DEFAULT_RESOURCE_ID`].
    pub fn from_table(table: Table) -> Self {
        let mut dataset = Self::new();
        dataset.insert(DEFAULT_RESOURCE_ID, table);
        dataset
    }

    pub fn insert(&mut self, resource_id: impl Into<String>, table: Table) {
        self.resources.insert(resource_id.into(), table);
    }

    pub fn get(&self, resource_id: &str) -> Option<&Table> {
        self.resources.get(resource_id)
    }

    /// Locate the main tabular resource.
    ///
    /// With an explicit id, that resource must exist. Otherwise the only
    /// resource is used, or the [`DEFAULT_RESOURCE_ID`] resource when there
    /// are several.
    pub fn tabular_resource(&self, side: Side, resource_id: Option<&str>) -> Result<(&str, &Table)> {
        if let Some(id) = resource_id {
            return self
                .resources
                .get_key_value(id)
                .map(|(key, table)| (key.as_str(), table))
                .ok_or_else(|| FuzzyJoinError::ResourceNotFound {
                    side,
                    message: format!("no resource named '{id}'"),
                });
        }
        if self.resources.len() == 1
            && let Some((key, table)) = self.resources.iter().next()
        {
            return Ok((key.as_str(), table));
        }
        self.resources
            .get_key_value(DEFAULT_RESOURCE_ID)
            .map(|(key, table)| (key.as_str(), table))
            .ok_or_else(|| FuzzyJoinError::ResourceNotFound {
                side,
                message: if self.resources.is_empty() {
                    "dataset has no resources".to_string()
                } else {
                    format!(
                        "{} resources and none named '{DEFAULT_RESOURCE_ID}'",
                        self.resources.len()
                    )
                },
            })
    }
}
