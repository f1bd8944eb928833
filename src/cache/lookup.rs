//! Existence-based lookup of cached forecast extractions.

use crate::types::identifier::ForecastIdentifier;
use log::debug;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default directory holding cached extractions, one file per identifier.
pub const DEFAULT_CACHE_DIRECTORY: &str = "forecasts";

/// A flat on-disk cache keyed by [`ForecastIdentifier`].
///
/// An entry is valid purely by existing: there is no TTL, checksum or expiry
/// metadata. Identifiers embed the run date, so entries go stale naturally
/// by never being looked up again. The lookup itself is a read-only probe;
/// entries are produced by whatever implements
/// [`crate::RawDatasetSink`].
#[derive(Debug, Clone)]
pub struct ForecastCache {
    directory: PathBuf,
}

impl ForecastCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The directory this cache probes.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The path an entry for `identifier` would live at, whether or not it
    /// exists.
    pub fn entry_path(&self, identifier: &ForecastIdentifier) -> PathBuf {
        self.directory.join(identifier.csv_filename())
    }

    /// Probes for a cached extraction. Returns the path when a file exists
    /// for `identifier`, without validating its content or freshness.
    pub async fn lookup(&self, identifier: &ForecastIdentifier) -> Option<PathBuf> {
        let path = self.entry_path(identifier);
        if fs::metadata(&path).await.is_ok() {
            debug!("Cache hit for {} at {:?}", identifier, path);
            Some(path)
        } else {
            debug!("Cache miss for {}", identifier);
            None
        }
    }
}

impl Default for ForecastCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIRECTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::identifier::build_locator;
    use crate::types::resolution::Resolution;
    use crate::types::run::RunLabel;
    use chrono::NaiveDate;

    fn identifier() -> ForecastIdentifier {
        let date = NaiveDate::from_ymd_opt(2023, 10, 15).unwrap();
        build_locator(date, Resolution::P0p25Hourly, RunLabel::Z18).1
    }

    #[tokio::test]
    async fn absent_entry_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ForecastCache::new(dir.path());

        assert_eq!(cache.lookup(&identifier()).await, None);
    }

    #[tokio::test]
    async fn present_entry_returns_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ForecastCache::new(dir.path());
        let id = identifier();

        let expected = cache.entry_path(&id);
        tokio::fs::write(&expected, "time,lon,lat,tmpsfc\n").await.unwrap();

        assert_eq!(cache.lookup(&id).await, Some(expected));
    }

    #[tokio::test]
    async fn lookup_does_not_create_anything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ForecastCache::new(dir.path().join("forecasts"));

        assert_eq!(cache.lookup(&identifier()).await, None);
        assert!(!cache.directory().exists());
    }
}
