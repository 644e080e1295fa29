//! Dataset discovery from a directory of CSV files.

use std::path::{Path, PathBuf};

use fjoin_model::Dataset;
use tracing::info;

use crate::error::{IngestError, Result};
use crate::reader::read_csv_table;

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        let is_csv = path.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Loads every CSV file in a directory as a dataset resource named after the
/// file stem (`learningData.csv` becomes the `learningData` resource).
pub fn read_dataset(dir: &Path) -> Result<Dataset> {
    let files = list_csv_files(dir)?;
    if files.is_empty() {
        return Err(IngestError::EmptyDataset {
            path: dir.to_path_buf(),
        });
    }

    let mut dataset = Dataset::new();
    for path in &files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        dataset.insert(stem, read_csv_table(path)?);
    }
    info!(
        path = %dir.display(),
        resources = dataset.resources.len(),
        "dataset loaded"
    );
    Ok(dataset)
}
