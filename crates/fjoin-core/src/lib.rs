//! Fuzzy multi-type joins.
//!
//! A join runs in four stages:
//!
//! 1. **Plan**: every column pair is checked and its join type resolved.
//!    Configuration errors stop the join here.
//! 2. **Key building**: each pair's matcher maps left values to right values
//!    and produces synthetic key columns on both sides.
//! 3. **Equi-join**: a plain Polars join on the synthetic keys.
//! 4. **Assembly**: helper columns are dropped, clashing names suffixed and
//!    vector columns restored.
//!
//! ```no_run
//! use fjoin_core::fuzzy_join;
//! use fjoin_model::{JoinKind, JoinSpec, Table};
//! # fn run(left: Table, right: Table) -> fjoin_model::Result<()> {
//! let spec = JoinSpec::single("name", "name", 0.8, false)?;
//! let joined = fuzzy_join(&left, &right, &spec, JoinKind::Inner)?;
//! println!("{} rows", joined.height());
//! # Ok(())
//! # }
//! ```

pub mod assemble;
pub mod dataset;
pub mod join;
pub mod keys;
pub mod options;

use std::time::Instant;

use fjoin_model::{JoinKind, JoinSpec, Result, Table};
use tracing::{info, info_span};

pub use dataset::fuzzy_join_datasets;
pub use keys::{PairReport, SyntheticKeys};
pub use options::JoinOptions;

/// The joined table and per-pair matching statistics.
#[derive(Debug, Clone)]
pub struct JoinReport {
    pub table: Table,
    pub pairs: Vec<PairReport>,
}

/// Join two tables with default options.
pub fn fuzzy_join(left: &Table, right: &Table, spec: &JoinSpec, kind: JoinKind) -> Result<Table> {
    fuzzy_join_with_options(left, right, spec, kind, &JoinOptions::default())
        .map(|report| report.table)
}

/// Join two tables and report how each column pair matched.
pub fn fuzzy_join_with_options(
    left: &Table,
    right: &Table,
    spec: &JoinSpec,
    kind: JoinKind,
    options: &JoinOptions,
) -> Result<JoinReport> {
    let span = info_span!("fuzzy_join", kind = %kind, pairs = spec.len());
    let _guard = span.enter();
    let start = Instant::now();

    let plans = keys::plan(left, right, spec)?;
    let keys = if kind == JoinKind::Cross {
        SyntheticKeys::unmatched(&plans)
    } else {
        keys::build_keys(left, right, &plans, options)?
    };

    let assembly = assemble::prepare(left, right, &plans, &keys, options)?;
    let joined = join::execute(
        &assembly.left,
        &assembly.right,
        &assembly.left_keys,
        &assembly.right_keys,
        kind,
    )?;
    let table = assembly.finish(joined)?;

    info!(
        rows = table.height(),
        columns = table.width(),
        duration_ms = start.elapsed().as_millis(),
        "fuzzy join complete"
    );
    Ok(JoinReport {
        table,
        pairs: keys.reports(),
    })
}
