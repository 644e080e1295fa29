//! Join type classification from semantic tags.

use std::collections::BTreeSet;

use fjoin_model::{ColumnPair, FuzzyJoinError, JoinType, Result, SemanticType};
use tracing::debug;

/// Families in the order they win when a pair shares several of them.
const PRIORITY: [JoinType; 5] = [
    JoinType::Datetime,
    JoinType::Geo,
    JoinType::Vector,
    JoinType::Numeric,
    JoinType::String,
];

fn families(types: &BTreeSet<SemanticType>) -> BTreeSet<JoinType> {
    types.iter().filter_map(SemanticType::family).collect()
}

/// Pick the matcher family for two columns' semantic tags.
///
/// A tag present on both sides selects its family, the most specific one
/// first when several are shared. Failing that, two numeric columns (integer
/// against float, say) join as numeric and two textual columns join as
/// strings. Anything else is unsupported.
pub fn classify(left: &BTreeSet<SemanticType>, right: &BTreeSet<SemanticType>) -> Option<JoinType> {
    let shared: BTreeSet<JoinType> = left
        .intersection(right)
        .filter_map(SemanticType::family)
        .collect();
    if let Some(join_type) = PRIORITY.iter().find(|t| shared.contains(*t)) {
        return Some(*join_type);
    }

    let left_families = families(left);
    let right_families = families(right);
    [JoinType::Numeric, JoinType::String]
        .into_iter()
        .find(|t| left_families.contains(t) && right_families.contains(t))
}

fn describe(types: &BTreeSet<SemanticType>) -> String {
    if types.is_empty() {
        return "no semantic types".to_string();
    }
    types
        .iter()
        .map(SemanticType::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the join type of a column pair, honouring an explicit override.
pub fn resolve_join_type(
    pair: &ColumnPair,
    left: &BTreeSet<SemanticType>,
    right: &BTreeSet<SemanticType>,
) -> Result<JoinType> {
    if let Some(join_type) = pair.join_type {
        debug!(
            left_column = %pair.left_column,
            right_column = %pair.right_column,
            %join_type,
            "join type set explicitly"
        );
        return Ok(join_type);
    }
    let join_type = classify(left, right).ok_or_else(|| FuzzyJoinError::UnsupportedJoinType {
        left_column: pair.left_column.clone(),
        right_column: pair.right_column.clone(),
        left_types: describe(left),
        right_types: describe(right),
    })?;
    debug!(
        left_column = %pair.left_column,
        right_column = %pair.right_column,
        left_types = %describe(left),
        right_types = %describe(right),
        %join_type,
        "join type resolved"
    );
    Ok(join_type)
}
