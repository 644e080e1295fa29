use std::path::PathBuf;

use fjoin_core::PairReport;
use fjoin_model::JoinKind;

/// What a `join` run produced.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub job: PathBuf,
    pub join_kind: JoinKind,
    pub left_rows: usize,
    pub right_rows: usize,
    pub rows: usize,
    pub columns: usize,
    /// Written CSV, or `None` for dry runs.
    pub output: Option<PathBuf>,
    pub pairs: Vec<PairReport>,
}
