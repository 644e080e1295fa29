//! Per-component matching of fixed-width numeric vectors.

use fjoin_model::{FuzzyJoinError, Result};

use crate::matcher::{candidate_set, match_values};
use crate::numeric::NumericMatcher;

/// Split vectors into one column per component.
///
/// Rows whose vector is null or has a different width contribute a null to
/// every component column.
pub fn split_components(values: &[Option<Vec<f64>>], width: usize) -> Vec<Vec<Option<f64>>> {
    (0..width)
        .map(|component| {
            values
                .iter()
                .map(|value| {
                    value
                        .as_ref()
                        .filter(|v| v.len() == width)
                        .map(|v| v[component])
                })
                .collect()
        })
        .collect()
}

/// The common width of a left and right vector column.
///
/// Fails when the columns disagree. A column with no vectors takes the width
/// of the other side; when neither side has one the width is 0.
pub fn common_width(
    left_column: &str,
    left: Option<usize>,
    right_column: &str,
    right: Option<usize>,
) -> Result<usize> {
    match (left, right) {
        (Some(l), Some(r)) if l != r => Err(FuzzyJoinError::invalid(format!(
            "vector width mismatch: '{left_column}' has {l} components, '{right_column}' has {r}"
        ))),
        (Some(width), _) | (None, Some(width)) => Ok(width),
        (None, None) => Ok(0),
    }
}

/// Outcome of matching a vector column component by component.
#[derive(Debug, Clone)]
pub struct VectorMatch {
    /// Matched left-side keys, one column per component.
    pub left: Vec<Vec<Option<f64>>>,
    /// Right-side keys, one column per component.
    pub right: Vec<Vec<Option<f64>>>,
    /// Left rows whose every component found a match.
    pub matched_rows: usize,
}

/// Match each component of `left` against the same component of `right`.
///
/// A left row keeps its keys only when every component matched; otherwise
/// all of its components are nulled so it cannot join.
pub fn match_vectors(
    matcher: &NumericMatcher,
    left: &[Option<Vec<f64>>],
    right: &[Option<Vec<f64>>],
    width: usize,
    parallel: bool,
) -> VectorMatch {
    let left_components = split_components(left, width);
    let right_components = split_components(right, width);

    let mut matched: Vec<Vec<Option<f64>>> = left_components
        .iter()
        .zip(&right_components)
        .map(|(l, r)| match_values(matcher, l, &candidate_set(r), parallel).rows())
        .collect();

    let mut matched_rows = 0;
    for row in 0..left.len() {
        let complete = width > 0 && matched.iter().all(|component| component[row].is_some());
        if complete {
            matched_rows += 1;
        } else {
            for component in &mut matched {
                component[row] = None;
            }
        }
    }

    VectorMatch {
        left: matched,
        right: right_components,
        matched_rows,
    }
}
