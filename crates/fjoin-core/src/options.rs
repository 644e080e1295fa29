//! Join options beyond the column pairs themselves.

use fjoin_match::StringScorer;
use fjoin_model::ROW_IDENTITY_COLUMN;
use serde::{Deserialize, Serialize};

/// Tuning knobs for a fuzzy join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinOptions {
    /// Per-table row identity column, dropped from the right table.
    pub row_identity_column: String,
    /// Suffix for left columns whose name also appears on the right.
    pub left_suffix: String,
    /// Suffix for right columns whose name also appears on the left.
    pub right_suffix: String,
    /// Similarity metric for fuzzy string pairs.
    pub string_scorer: StringScorer,
    /// Fan matching out across the rayon pool.
    pub parallel: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            row_identity_column: ROW_IDENTITY_COLUMN.to_string(),
            left_suffix: "_left".to_string(),
            right_suffix: "_right".to_string(),
            string_scorer: StringScorer::default(),
            parallel: true,
        }
    }
}

impl JoinOptions {
    #[must_use]
    pub fn with_string_scorer(mut self, scorer: StringScorer) -> Self {
        self.string_scorer = scorer;
        self
    }

    #[must_use]
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}
