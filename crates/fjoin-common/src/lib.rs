//! Shared utilities for the fuzzy join crates.
//!
//! This crate provides the Polars `AnyValue` coercions every matcher needs to
//! turn heterogeneous cells into comparable Rust values.

pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use polars::{
    any_to_f64, any_to_key_string, any_to_vector, column_values, format_numeric, format_vector,
    parse_f64, parse_vector,
};
