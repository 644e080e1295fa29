//! Joins between multi-resource datasets.

use fjoin_model::{Dataset, JoinKind, JoinSpec, Result, Side};
use tracing::debug;

use crate::{JoinOptions, fuzzy_join_with_options};

/// Join the main tables of two datasets.
///
/// The result is the left dataset with its main resource replaced by the
/// joined table; its other resources are carried over unchanged.
pub fn fuzzy_join_datasets(
    left: &Dataset,
    right: &Dataset,
    spec: &JoinSpec,
    kind: JoinKind,
    options: &JoinOptions,
) -> Result<Dataset> {
    let (left_id, left_table) = left.tabular_resource(Side::Left, None)?;
    let (right_id, right_table) = right.tabular_resource(Side::Right, None)?;
    debug!(left_resource = left_id, right_resource = right_id, "joining dataset resources");

    let report = fuzzy_join_with_options(left_table, right_table, spec, kind, options)?;
    let mut output = left.clone();
    output.insert(left_id, report.table);
    Ok(output)
}
