//! CSV reading into tables.

use std::path::Path;

use fjoin_model::Table;
use polars::prelude::{CsvReadOptions, DataFrame, SerReader};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Rows sampled for dtype inference.
const INFER_SCHEMA_ROWS: usize = 100;

/// Reads a CSV file with a single header row into a [`Table`].
///
/// Column dtypes are inferred by Polars and no semantic types are declared,
/// so classification falls back to dtype-derived tags until the caller
/// declares them.
pub fn read_csv_table(path: &Path) -> Result<Table> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    validate_column_names(&df, path)?;
    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "CSV loaded"
    );
    Ok(Table::new(df))
}

fn validate_column_names(df: &DataFrame, path: &Path) -> Result<()> {
    for name in df.get_column_names() {
        if name.trim().is_empty() {
            return Err(IngestError::EmptyColumnName {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(())
}
