use chrono::NaiveDateTime;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while opening, sampling or persisting a forecast dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The remote or cached dataset could not be opened at all: network
    /// failure, missing file or malformed dataset. The underlying reader
    /// error is preserved as the source.
    #[error("failed to open dataset at '{locator}'")]
    SourceUnreachable {
        locator: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Opening the dataset did not complete within the configured timeout.
    /// The DODS transport can hang indefinitely on a stalled connection.
    #[error("opening dataset at '{locator}' timed out after {after:?}")]
    OpenTimeout { locator: String, after: Duration },

    /// The dataset opened fine but has no exact match for the requested
    /// time coordinate. Selection is exact-match, not nearest-neighbor.
    #[error("no data available for time coordinate {time}")]
    DataUnavailable { time: NaiveDateTime },

    /// The requested variable does not exist in the dataset.
    #[error("variable '{0}' not found in dataset")]
    VariableNotFound(String),

    /// The requested point lies outside the dataset's spatial grid.
    #[error("point (lat {latitude}, lon {longitude}) lies outside the dataset grid")]
    PointOutsideGrid { latitude: f64, longitude: f64 },

    /// The injected raw-dataset sink failed while persisting a fresh fetch.
    #[error("failed to persist raw dataset for '{identifier}'")]
    RawPersist {
        identifier: String,
        #[source]
        source: std::io::Error,
    },
}
