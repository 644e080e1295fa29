//! Error types for fuzzy join operations.

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::table::Side;

/// Errors that abort a fuzzy join.
///
/// Per-row "no match" outcomes are never errors; they surface as null
/// synthetic keys and are resolved by the equi-join.
#[derive(Debug, Error)]
pub enum FuzzyJoinError {
    /// Malformed join configuration (accuracy range, list lengths, geo without
    /// absolute tolerance, inconsistent vector widths).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The resolved type of a column pair has no matcher.
    #[error(
        "join not supported between '{left_column}' ({left_types}) and '{right_column}' ({right_types})"
    )]
    UnsupportedJoinType {
        left_column: String,
        right_column: String,
        left_types: String,
        right_types: String,
    },

    /// A required table could not be located in a dataset.
    #[error("failed to find tabular resource in {side} dataset: {message}")]
    ResourceNotFound { side: Side, message: String },

    /// A join column is missing from its table.
    #[error("{side} table has no column '{column}'")]
    ColumnNotFound { side: Side, column: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {0}")]
    Polars(#[from] PolarsError),
}

impl FuzzyJoinError {
    /// Shorthand for [`FuzzyJoinError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

/// Result type for fuzzy join operations.
pub type Result<T> = std::result::Result<T, FuzzyJoinError>;
