//! Appends forecast extractions to identifier-named CSV files.

use crate::dataset::filter::FilteredRecord;
use crate::output::error::OutputError;
use crate::types::identifier::ForecastIdentifier;
use crate::utils::ensure_dir_exists;
use log::debug;
use polars::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::{fs, task};

/// Default directory for forecast output, one file per identifier.
pub const DEFAULT_DATA_DIRECTORY: &str = "data";

/// Appends `record` to `<directory>/<identifier>.csv`, creating the
/// directory if needed.
///
/// The header row is written only when the file does not exist at write
/// time. Existence is probed on every call, never remembered in memory, so
/// the header-once contract survives process restarts. The row is encoded
/// into an in-memory buffer first and written with a single `write_all`, so
/// an encoding failure never leaves a partial row behind.
///
/// Concurrent appends to the same path from multiple processes are not
/// coordinated; within one [`crate::GfsForecast`] the per-identifier lock
/// serializes them.
///
/// Returns the path written to.
pub async fn append_record(
    record: &FilteredRecord,
    directory: &Path,
    identifier: &ForecastIdentifier,
) -> Result<PathBuf, OutputError> {
    ensure_dir_exists(directory)
        .await
        .map_err(|e| OutputError::DirCreation(directory.to_path_buf(), e))?;

    let path = directory.join(identifier.csv_filename());
    let include_header = fs::metadata(&path).await.is_err();
    debug!(
        "Writing record to: {:?}, with header: {}",
        path, include_header
    );

    let mut frame = record
        .to_frame()
        .map_err(|e| OutputError::CsvEncode(path.clone(), e))?;

    let path_buf = path.clone();
    task::spawn_blocking(move || {
        let mut buffer = Vec::new();
        CsvWriter::new(&mut buffer)
            .include_header(include_header)
            .finish(&mut frame)
            .map_err(|e| OutputError::CsvEncode(path_buf.clone(), e))?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path_buf)
            .map_err(|e| OutputError::Append(path_buf.clone(), e))?;
        file.write_all(&buffer)
            .map_err(|e| OutputError::Append(path_buf.clone(), e))?;
        Ok::<(), OutputError>(())
    })
    .await??;

    Ok(path)
}
