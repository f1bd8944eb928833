//! The seam between this crate and the dataset transport.
//!
//! The DODS wire protocol is deliberately out of scope: hosts inject a
//! [`DatasetReader`] that knows how to open a locator (remote URL or cached
//! file) and hand back something queryable. [`crate::GridSlab`] is a ready
//! in-memory implementation of the queryable side.

use crate::dataset::error::DatasetError;
use crate::types::identifier::{ForecastIdentifier, RemoteLocator};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::path::PathBuf;

/// Where a dataset open should read from, decided by the cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadSource {
    /// Fetch from the NOMADS DODS endpoint.
    Remote(RemoteLocator),
    /// Read a previously cached extraction from disk.
    Cached(PathBuf),
}

impl ReadSource {
    /// A printable form of the locator, for logs and errors.
    pub fn describe(&self) -> String {
        match self {
            ReadSource::Remote(locator) => locator.as_str().to_string(),
            ReadSource::Cached(path) => path.display().to_string(),
        }
    }

    /// Whether this source is a fresh remote fetch (i.e. a cache miss).
    pub fn is_remote(&self) -> bool {
        matches!(self, ReadSource::Remote(_))
    }
}

/// Opens a dataset at a given source.
///
/// Implementations own the transport (DODS/OPeNDAP client, NetCDF reader,
/// CSV loader for cached extractions). Opening must fail with
/// [`DatasetError::SourceUnreachable`] when the source cannot be reached or
/// parsed.
#[async_trait]
pub trait DatasetReader: Send + Sync {
    type Dataset: ForecastDataset;

    async fn open(&self, source: &ReadSource) -> Result<Self::Dataset, DatasetError>;
}

/// A queryable multi-dimensional forecast dataset.
///
/// The handle is a scoped resource: implementations release whatever the
/// transport holds (connections, file handles) in `Drop`, so it is freed on
/// every exit path, including failures during filtering.
pub trait ForecastDataset: Send {
    /// Selects `variable`, interpolates spatially at the exact
    /// (`longitude`, `latitude`) using the reader's native interpolation,
    /// and selects the exact matching `time` coordinate.
    ///
    /// # Errors
    ///
    /// [`DatasetError::DataUnavailable`] when no time coordinate matches
    /// exactly, [`DatasetError::VariableNotFound`] /
    /// [`DatasetError::PointOutsideGrid`] for bad selections.
    fn sample(
        &self,
        variable: &str,
        longitude: f64,
        latitude: f64,
        time: NaiveDateTime,
    ) -> Result<f64, DatasetError>;
}

/// Extension hook for persisting a freshly fetched remote dataset.
///
/// The upstream pipeline documents this step but leaves it unimplemented;
/// here it is an explicit seam instead. When a sink is injected into
/// [`crate::GfsForecast`], it runs exactly once per cache miss, right after
/// the remote open succeeds and before filtering. It is never invoked for
/// cache hits, and never when no sink is provided.
pub trait RawDatasetSink<D: ForecastDataset>: Send + Sync {
    fn persist(&self, dataset: &D, identifier: &ForecastIdentifier) -> Result<(), DatasetError>;
}
