//! Equi-join execution on the synthetic key columns.

use std::time::Instant;

use fjoin_model::{FuzzyJoinError, JoinKind, Result};
use polars::prelude::{
    DataFrame, Expr, IntoLazy, JoinArgs, JoinCoalesce, JoinType, SortMultipleOptions, col,
};
use tracing::info;

/// Original row position of each output row in the left input.
pub const LEFT_ROW_COLUMN: &str = "__fjoin_left_row";
/// Original row position of each output row in the right input.
pub const RIGHT_ROW_COLUMN: &str = "__fjoin_right_row";

fn polars_join_type(kind: JoinKind) -> JoinType {
    match kind {
        JoinKind::Left => JoinType::Left,
        JoinKind::Right => JoinType::Right,
        JoinKind::Outer => JoinType::Full,
        JoinKind::Inner => JoinType::Inner,
        JoinKind::Cross => JoinType::Cross,
    }
}

fn key_exprs(names: &[String]) -> Vec<Expr> {
    names.iter().map(|name| col(name.as_str())).collect()
}

/// Join `left` and `right` on component-wise equality of the key columns.
///
/// Both frames get a row-position column first, and the output is ordered
/// by the anchoring side's original row order (right rows first for right
/// joins). Unpaired rows of outer joins come last. Null keys never match.
/// Key columns from both sides are kept in the output.
pub fn execute(
    left: &DataFrame,
    right: &DataFrame,
    left_keys: &[String],
    right_keys: &[String],
    kind: JoinKind,
) -> Result<DataFrame> {
    if left_keys.len() != right_keys.len() {
        return Err(FuzzyJoinError::invalid(format!(
            "{} left key columns but {} right key columns",
            left_keys.len(),
            right_keys.len()
        )));
    }
    if kind != JoinKind::Cross && left_keys.is_empty() {
        return Err(FuzzyJoinError::invalid(format!(
            "{kind} join needs at least one key column"
        )));
    }

    let start = Instant::now();
    let left_lf = left.with_row_index(LEFT_ROW_COLUMN.into(), None)?.lazy();
    let right_lf = right.with_row_index(RIGHT_ROW_COLUMN.into(), None)?.lazy();

    let joined = if kind == JoinKind::Cross {
        left_lf.cross_join(right_lf, None)
    } else {
        let args = JoinArgs::new(polars_join_type(kind)).with_coalesce(JoinCoalesce::KeepColumns);
        left_lf.join(right_lf, key_exprs(left_keys), key_exprs(right_keys), args)
    };

    let order = match kind {
        JoinKind::Right => [RIGHT_ROW_COLUMN, LEFT_ROW_COLUMN],
        _ => [LEFT_ROW_COLUMN, RIGHT_ROW_COLUMN],
    };
    let result = joined
        .sort_by_exprs(
            [col(order[0]), col(order[1])],
            SortMultipleOptions::default()
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;

    info!(
        kind = %kind,
        left_rows = left.height(),
        right_rows = right.height(),
        output_rows = result.height(),
        duration_ms = start.elapsed().as_millis(),
        "equi-join complete"
    );
    Ok(result)
}
