//! CSV writing of joined tables.

use std::fs::File;
use std::path::Path;

use fjoin_common::{any_to_vector, column_values, format_vector};
use fjoin_model::Table;
use polars::prelude::{CsvWriter, DataFrame, DataType, NamedFrom, SerWriter, Series};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Replace list and array columns with comma-joined strings.
///
/// CSV has no nested cells, so each vector is written as `"1,2.5,3"`, the
/// same encoding the vector matcher parses.
pub fn flatten_vectors(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();
    for column in df.get_columns() {
        if !matches!(column.dtype(), DataType::List(_) | DataType::Array(_, _)) {
            continue;
        }
        let text: Vec<Option<String>> = column_values(column, any_to_vector)
            .into_iter()
            .map(|v| v.map(|values| format_vector(&values)))
            .collect();
        out.with_column(Series::new(column.name().clone(), text))?;
    }
    Ok(out)
}

/// Writes a table as CSV with a header row.
pub fn write_csv_table(table: &Table, path: &Path) -> Result<()> {
    let mut df = flatten_vectors(&table.data)?;
    let mut file = File::create(path).map_err(|e| IngestError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| IngestError::CsvWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    debug!(
        path = %path.display(),
        rows = df.height(),
        "CSV written"
    );
    Ok(())
}
