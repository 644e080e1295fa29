//! Result assembly around the equi-join.
//!
//! Before the join the right-hand join columns and row identity column are
//! removed, clashing names get side suffixes, vector cells are parked in a
//! side channel and the synthetic keys are attached. After the join the
//! vectors are put back by original row position and every helper column is
//! dropped.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use fjoin_model::{FuzzyJoinError, Result, SemanticType, Side, Table};
use polars::prelude::{DataFrame, DataType, Series};
use tracing::debug;

use crate::join::{LEFT_ROW_COLUMN, RIGHT_ROW_COLUMN};
use crate::keys::{PairPlan, SyntheticKeys};
use crate::options::JoinOptions;

/// A vector column swapped for nulls during the join.
#[derive(Debug, Clone)]
struct StashedVector {
    side: Side,
    values: Series,
}

/// Join inputs ready for the executor, plus what is needed to finish the
/// result afterwards.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub left: DataFrame,
    pub right: DataFrame,
    pub left_keys: Vec<String>,
    pub right_keys: Vec<String>,
    stash: Vec<StashedVector>,
    semantic_types: BTreeMap<String, BTreeSet<SemanticType>>,
}

fn is_vector(dtype: &DataType) -> bool {
    matches!(dtype, DataType::List(_) | DataType::Array(_, _))
}

fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect()
}

fn stash_vectors(df: &mut DataFrame, side: Side, stash: &mut Vec<StashedVector>) -> Result<()> {
    let names: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|c| is_vector(c.dtype()))
        .map(|c| c.name().to_string())
        .collect();
    for name in names {
        let values = df.column(&name)?.as_materialized_series().clone();
        let placeholder = Series::full_null(name.as_str().into(), df.height(), &DataType::Float64);
        df.with_column(placeholder)?;
        stash.push(StashedVector { side, values });
    }
    Ok(())
}

/// Prepare both sides for the equi-join.
pub fn prepare(
    left: &Table,
    right: &Table,
    plans: &[PairPlan],
    keys: &SyntheticKeys,
    options: &JoinOptions,
) -> Result<Assembly> {
    let left_keys = keys.left_names();
    let right_keys = keys.right_names();

    let reserved = left_keys
        .iter()
        .chain(&right_keys)
        .map(String::as_str)
        .chain([LEFT_ROW_COLUMN, RIGHT_ROW_COLUMN]);
    for name in reserved {
        if left.has_column(name) || right.has_column(name) {
            return Err(FuzzyJoinError::invalid(format!(
                "column name '{name}' is reserved for join keys"
            )));
        }
    }

    let mut consumed: HashSet<&str> = plans.iter().map(|p| p.pair.right_column.as_str()).collect();
    consumed.insert(options.row_identity_column.as_str());

    let mut left_df = left.data.clone();
    let mut right_df = right.data.clone();
    for name in column_names(&right_df) {
        if consumed.contains(name.as_str()) {
            right_df = right_df.drop(&name)?;
        }
    }

    let mut semantic_types = BTreeMap::new();
    let left_names: HashSet<String> = column_names(&left_df).into_iter().collect();
    let mut left_output: BTreeMap<String, String> = left_names
        .iter()
        .map(|name| (name.clone(), name.clone()))
        .collect();
    for name in column_names(&right_df) {
        let mut output = name.clone();
        if left_names.contains(&name) {
            let left_renamed = format!("{name}{}", options.left_suffix);
            output = format!("{name}{}", options.right_suffix);
            left_df.rename(&name, left_renamed.as_str().into())?;
            right_df.rename(&name, output.as_str().into())?;
            left_output.insert(name.clone(), left_renamed);
        }
        let tags = right.semantic_types(&name);
        if !tags.is_empty() {
            semantic_types.insert(output, tags);
        }
    }
    for (source, output) in &left_output {
        let tags = left.semantic_types(source);
        if !tags.is_empty() {
            semantic_types.insert(output.clone(), tags);
        }
    }

    let mut stash = Vec::new();
    stash_vectors(&mut left_df, Side::Left, &mut stash)?;
    stash_vectors(&mut right_df, Side::Right, &mut stash)?;
    for stashed in &stash {
        semantic_types
            .entry(stashed.values.name().to_string())
            .or_insert_with(BTreeSet::new)
            .insert(SemanticType::FloatVector);
    }

    for series in keys.left_columns() {
        left_df.with_column(series.clone())?;
    }
    for series in keys.right_columns() {
        right_df.with_column(series.clone())?;
    }

    debug!(
        left_columns = left_df.width(),
        right_columns = right_df.width(),
        stashed_vectors = stash.len(),
        "join inputs prepared"
    );

    Ok(Assembly {
        left: left_df,
        right: right_df,
        left_keys,
        right_keys,
        stash,
        semantic_types,
    })
}

impl Assembly {
    /// Restore stashed vectors and drop key and row-position columns.
    pub fn finish(self, mut joined: DataFrame) -> Result<Table> {
        for stashed in self.stash {
            let row_column = match stashed.side {
                Side::Left => LEFT_ROW_COLUMN,
                Side::Right => RIGHT_ROW_COLUMN,
            };
            let rows = joined.column(row_column)?.as_materialized_series().idx()?.clone();
            let restored = stashed.values.take(&rows)?;
            joined.with_column(restored)?;
        }

        let helpers = self
            .left_keys
            .iter()
            .chain(&self.right_keys)
            .map(String::as_str)
            .chain([LEFT_ROW_COLUMN, RIGHT_ROW_COLUMN]);
        for name in helpers {
            if joined.get_column_index(name).is_some() {
                joined = joined.drop(name)?;
            }
        }

        let mut table = Table::new(joined);
        for (name, tags) in self.semantic_types {
            if table.has_column(&name) {
                table.semantic_types.insert(name, tags);
            }
        }
        Ok(table)
    }
}
