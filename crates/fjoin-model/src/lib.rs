//! Fuzzy join data model.
//!
//! Types shared by every stage of the join: tables and datasets, the
//! semantic type catalog, join specifications, and the error taxonomy.

pub mod error;
pub mod semantic;
pub mod spec;
pub mod table;

pub use error::{FuzzyJoinError, Result};
pub use semantic::{JoinType, SemanticType};
pub use spec::{ColumnPair, JoinKind, JoinSpec, OneOrMany};
pub use table::{DEFAULT_RESOURCE_ID, Dataset, ROW_IDENTITY_COLUMN, Side, Table};
