//! Table ingestion for fuzzy joins.
//!
//! This crate loads CSV files into [`fjoin_model::Table`]s, whole directories
//! into [`fjoin_model::Dataset`]s, and writes joined tables back out as CSV.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use fjoin_ingest::{read_csv_table, write_csv_table};
//!
//! let table = read_csv_table(Path::new("left.csv"))?;
//! write_csv_table(&table, Path::new("copy.csv"))?;
//! ```

mod discovery;
mod error;
mod reader;
mod writer;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use reader::read_csv_table;

// === Dataset Discovery ===
pub use discovery::{list_csv_files, read_dataset};

// === CSV Writing ===
pub use writer::{flatten_vectors, write_csv_table};
