use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while appending an extraction to its output CSV.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to create output directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("failed to encode CSV row for '{0}'")]
    CsvEncode(PathBuf, #[source] PolarsError),

    #[error("failed to append to output file '{0}'")]
    Append(PathBuf, #[source] std::io::Error),

    #[error("background write task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
