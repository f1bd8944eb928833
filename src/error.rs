use crate::dataset::error::DatasetError;
use crate::output::error::OutputError;
use crate::types::request::RequestError;
use thiserror::Error;

/// Top-level error of the crate, aggregating the per-area errors.
#[derive(Debug, Error)]
pub enum GfsForecastError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Output(#[from] OutputError),
}
