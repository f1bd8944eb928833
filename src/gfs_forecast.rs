//! This module provides the main entry point for fetching GFS point
//! forecasts. It resolves the forecast run covering the requested datetime,
//! decides between the local cache and the remote NOMADS endpoint, narrows
//! the opened dataset to the requested point, and appends the result to an
//! identifier-named CSV file.

use crate::cache::lookup::{ForecastCache, DEFAULT_CACHE_DIRECTORY};
use crate::dataset::error::DatasetError;
use crate::dataset::filter::{filter_dataset, FilteredRecord};
use crate::dataset::reader::{DatasetReader, RawDatasetSink, ReadSource};
use crate::error::GfsForecastError;
use crate::output::appender::{append_record, DEFAULT_DATA_DIRECTORY};
use crate::types::identifier::{build_locator, ForecastIdentifier};
use crate::types::request::ForecastRequest;
use crate::types::run::RunLabel;
use bon::bon;
use chrono::{NaiveDateTime, Utc};
use log::{debug, info};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

/// Default bound on how long a dataset open may take. The DODS transport
/// gives no guarantee of ever returning on a stalled connection.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(30);

/// The main client for fetching GFS point forecasts.
///
/// The client is generic over the [`DatasetReader`] that owns the transport.
/// Per request it resolves the run label, builds the remote locator and
/// forecast identifier, probes the cache, opens the chosen source with a
/// timeout, interpolates at the requested point and appends the result to
/// `<data_dir>/<identifier>.csv`.
///
/// Calls for the same identifier are serialized through an internal lock
/// map, so concurrent requests cannot race the header probe of the output
/// file or fetch the same run twice at once. Nothing coordinates *across*
/// processes.
///
/// # Examples
///
/// ```rust,ignore
/// use gfs_forecast::{ForecastRequest, GfsForecast, Resolution};
/// use chrono::{Duration, Utc};
///
/// let client = GfsForecast::builder().reader(my_dods_reader).build();
/// let tomorrow = Utc::now().naive_utc() + Duration::days(1);
/// let request = ForecastRequest::new(52.371807, 4.896029, tomorrow, Resolution::P0p25Hourly)?;
/// let record = client.fetch().request(&request).call().await?;
/// println!("{record}");
/// ```
pub struct GfsForecast<R: DatasetReader> {
    reader: R,
    data_dir: PathBuf,
    cache: ForecastCache,
    raw_sink: Option<Box<dyn RawDatasetSink<R::Dataset>>>,
    open_timeout: Duration,
    fetch_locks: Mutex<HashMap<ForecastIdentifier, Arc<Mutex<()>>>>,
}

#[bon]
impl<R: DatasetReader> GfsForecast<R> {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `.reader(R)`: **Required.** The [`DatasetReader`] owning the transport.
    /// * `.data_dir(PathBuf)`: Optional. Output directory. Defaults to `data`.
    /// * `.cache_dir(PathBuf)`: Optional. Cache directory probed for existing
    ///   extractions. Defaults to `forecasts`.
    /// * `.raw_sink(Box<dyn RawDatasetSink<_>>)`: Optional. Hook that persists a
    ///   freshly fetched remote dataset. Runs only on cache misses, and only
    ///   when provided.
    /// * `.open_timeout(Duration)`: Optional. Bound on the dataset open.
    ///   Defaults to [`DEFAULT_OPEN_TIMEOUT`].
    #[builder]
    pub fn new(
        reader: R,
        data_dir: Option<PathBuf>,
        cache_dir: Option<PathBuf>,
        raw_sink: Option<Box<dyn RawDatasetSink<R::Dataset>>>,
        open_timeout: Option<Duration>,
    ) -> Self {
        Self {
            reader,
            data_dir: data_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIRECTORY)),
            cache: ForecastCache::new(
                cache_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIRECTORY)),
            ),
            raw_sink,
            open_timeout: open_timeout.unwrap_or(DEFAULT_OPEN_TIMEOUT),
            fetch_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Fetches the forecast slice for `request` and appends it to the output
    /// file for the resolved identifier.
    ///
    /// # Arguments
    ///
    /// * `.request(&ForecastRequest)`: **Required.** The validated request.
    /// * `.now(NaiveDateTime)`: Optional. Overrides the UTC wall clock used
    ///   for run resolution and identifier dating. Intended for hosts that
    ///   pin the clock in tests.
    ///
    /// # Errors
    ///
    /// [`DatasetError::SourceUnreachable`] / [`DatasetError::OpenTimeout`]
    /// when the chosen source cannot be opened,
    /// [`DatasetError::DataUnavailable`] when the run has no exact match for
    /// the requested time, and [`crate::OutputError`] variants for
    /// filesystem failures. On any error nothing is appended.
    #[builder]
    pub async fn fetch(
        &self,
        request: &ForecastRequest,
        now: Option<NaiveDateTime>,
    ) -> Result<FilteredRecord, GfsForecastError> {
        let now = now.unwrap_or_else(|| Utc::now().naive_utc());

        // The latest forecast lives under today's date; the run is resolved
        // from the requested time-of-day alone.
        let run = RunLabel::for_target(request.target_datetime(), now);
        let (locator, identifier) = build_locator(now.date(), request.resolution(), run);

        // Serialize all work per identifier: at most one fetch in flight and
        // no interleaved appends for the same output file.
        let lock = {
            let mut locks = self.fetch_locks.lock().await;
            locks
                .entry(identifier.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = lock.lock().await;

        let source = match self.cache.lookup(&identifier).await {
            Some(path) => ReadSource::Cached(path),
            None => ReadSource::Remote(locator),
        };
        debug!(
            "gfs_id: {} (cached: {}), reading from: {}",
            identifier,
            !source.is_remote(),
            source.describe()
        );

        let dataset = timeout(self.open_timeout, self.reader.open(&source))
            .await
            .map_err(|_| DatasetError::OpenTimeout {
                locator: source.describe(),
                after: self.open_timeout,
            })??;

        if source.is_remote() {
            if let Some(sink) = &self.raw_sink {
                debug!("Persisting raw dataset for {}", identifier);
                sink.persist(&dataset, &identifier)?;
            }
        }

        let record = filter_dataset(
            &dataset,
            request.latitude(),
            request.longitude(),
            request.target_datetime(),
        )?;
        // Release the dataset handle before touching the output file.
        drop(dataset);

        let path = append_record(&record, &self.data_dir, &identifier).await?;
        info!("Appended forecast {} to {:?}", identifier, path);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::filter::SURFACE_TEMPERATURE;
    use crate::dataset::grid::GridSlab;
    use crate::types::resolution::Resolution;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use tempfile::TempDir;

    fn wall_clock() -> NaiveDateTime {
        // 20:00 on the day the 18z run is published.
        NaiveDate::from_ymd_opt(2023, 10, 15)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap()
    }

    fn tomorrow_midnight() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 10, 16)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn amsterdam_request() -> ForecastRequest {
        ForecastRequest::new_at(
            52.371807,
            4.896029,
            tomorrow_midnight(),
            Resolution::P0p25Hourly,
            wall_clock(),
        )
        .unwrap()
    }

    fn slab() -> GridSlab {
        GridSlab::new(
            SURFACE_TEMPERATURE,
            vec![4.75, 5.0],
            vec![52.25, 52.5],
            vec![tomorrow_midnight()],
            vec![284.0, 284.5, 285.0, 285.5],
        )
        .unwrap()
    }

    /// Serves a fixed slab and records every source it was asked to open.
    struct FakeReader {
        slab: GridSlab,
        opened: StdMutex<Vec<ReadSource>>,
    }

    impl FakeReader {
        fn new(slab: GridSlab) -> Self {
            Self {
                slab,
                opened: StdMutex::new(Vec::new()),
            }
        }

        fn opened(&self) -> Vec<ReadSource> {
            self.opened.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DatasetReader for FakeReader {
        type Dataset = GridSlab;

        async fn open(&self, source: &ReadSource) -> Result<GridSlab, DatasetError> {
            self.opened.lock().unwrap().push(source.clone());
            Ok(self.slab.clone())
        }
    }

    /// Always fails to open, like a dead endpoint.
    struct UnreachableReader;

    #[async_trait]
    impl DatasetReader for UnreachableReader {
        type Dataset = GridSlab;

        async fn open(&self, source: &ReadSource) -> Result<GridSlab, DatasetError> {
            Err(DatasetError::SourceUnreachable {
                locator: source.describe(),
                source: "connection refused".into(),
            })
        }
    }

    /// Never completes the open within any reasonable timeout.
    struct StalledReader(GridSlab);

    #[async_trait]
    impl DatasetReader for StalledReader {
        type Dataset = GridSlab;

        async fn open(&self, _source: &ReadSource) -> Result<GridSlab, DatasetError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(self.0.clone())
        }
    }

    /// Counts how often the raw-persist hook fires.
    struct CountingSink(Arc<AtomicUsize>);

    impl RawDatasetSink<GridSlab> for CountingSink {
        fn persist(
            &self,
            _dataset: &GridSlab,
            _identifier: &ForecastIdentifier,
        ) -> Result<(), DatasetError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Dirs {
        _root: TempDir,
        data: PathBuf,
        cache: PathBuf,
    }

    fn dirs() -> Dirs {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");
        let cache = root.path().join("forecasts");
        Dirs {
            _root: root,
            data,
            cache,
        }
    }

    fn expected_identifier() -> &'static str {
        "gfs20231015_gfs_0p25_1hr_18z"
    }

    #[tokio::test]
    async fn cache_miss_fetches_remote_and_writes_header() {
        let dirs = dirs();
        let client = GfsForecast::builder()
            .reader(FakeReader::new(slab()))
            .data_dir(dirs.data.clone())
            .cache_dir(dirs.cache.clone())
            .build();

        let record = client
            .fetch()
            .request(&amsterdam_request())
            .now(wall_clock())
            .call()
            .await
            .unwrap();

        // 20:00 target time-of-day 00:00 resolves the run purely from the clock time.
        let opened = client.reader.opened();
        assert_eq!(
            opened,
            vec![ReadSource::Remote(
                build_locator(
                    NaiveDate::from_ymd_opt(2023, 10, 15).unwrap(),
                    Resolution::P0p25Hourly,
                    RunLabel::Z18,
                )
                .0
            )]
        );

        let output = dirs.data.join(format!("{}.csv", expected_identifier()));
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.starts_with("time,lon,lat,tmpsfc\n"));
        assert_eq!(content.lines().count(), 2);
        assert!(record.value() > 284.0 && record.value() < 285.5);
    }

    #[tokio::test]
    async fn cache_hit_reads_cached_path_and_appends_without_header() {
        let dirs = dirs();
        let client = GfsForecast::builder()
            .reader(FakeReader::new(slab()))
            .data_dir(dirs.data.clone())
            .cache_dir(dirs.cache.clone())
            .build();

        // First invocation: miss, remote fetch, header written.
        client
            .fetch()
            .request(&amsterdam_request())
            .now(wall_clock())
            .call()
            .await
            .unwrap();

        // Drop a cache entry for the identifier, as a raw sink would have.
        std::fs::create_dir_all(&dirs.cache).unwrap();
        let cached = dirs.cache.join(format!("{}.csv", expected_identifier()));
        std::fs::write(&cached, "time,lon,lat,tmpsfc\n").unwrap();

        // Second invocation: hit, reads the cached file, appends headerless.
        client
            .fetch()
            .request(&amsterdam_request())
            .now(wall_clock())
            .call()
            .await
            .unwrap();

        let opened = client.reader.opened();
        assert_eq!(opened.len(), 2);
        assert!(opened[0].is_remote());
        assert_eq!(opened[1], ReadSource::Cached(cached));

        let output = dirs.data.join(format!("{}.csv", expected_identifier()));
        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            content
                .lines()
                .filter(|l| l.starts_with("time,lon,lat"))
                .count(),
            1
        );
        assert_eq!(content.lines().count(), 3);
    }

    #[tokio::test]
    async fn raw_sink_runs_once_per_cache_miss_only() {
        let dirs = dirs();
        let count = Arc::new(AtomicUsize::new(0));
        let client = GfsForecast::builder()
            .reader(FakeReader::new(slab()))
            .data_dir(dirs.data.clone())
            .cache_dir(dirs.cache.clone())
            .raw_sink(Box::new(CountingSink(count.clone())))
            .build();

        client
            .fetch()
            .request(&amsterdam_request())
            .now(wall_clock())
            .call()
            .await
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // With a cache entry present the sink must stay silent.
        std::fs::create_dir_all(&dirs.cache).unwrap();
        std::fs::write(
            dirs.cache.join(format!("{}.csv", expected_identifier())),
            "time,lon,lat,tmpsfc\n",
        )
        .unwrap();

        client
            .fetch()
            .request(&amsterdam_request())
            .now(wall_clock())
            .call()
            .await
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn without_a_sink_nothing_persists_the_raw_dataset() {
        let dirs = dirs();
        let client = GfsForecast::builder()
            .reader(FakeReader::new(slab()))
            .data_dir(dirs.data.clone())
            .cache_dir(dirs.cache.clone())
            .build();

        client
            .fetch()
            .request(&amsterdam_request())
            .now(wall_clock())
            .call()
            .await
            .unwrap();

        // The cache directory is never even created on the read-only path.
        assert!(!dirs.cache.exists());
    }

    #[tokio::test]
    async fn missing_time_coordinate_writes_nothing() {
        let dirs = dirs();
        let client = GfsForecast::builder()
            .reader(FakeReader::new(slab()))
            .data_dir(dirs.data.clone())
            .cache_dir(dirs.cache.clone())
            .build();

        // 01:00 is not a coordinate of the single-time slab.
        let request = ForecastRequest::new_at(
            52.371807,
            4.896029,
            NaiveDate::from_ymd_opt(2023, 10, 16)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap(),
            Resolution::P0p25Hourly,
            wall_clock(),
        )
        .unwrap();

        let err = client
            .fetch()
            .request(&request)
            .now(wall_clock())
            .call()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GfsForecastError::Dataset(DatasetError::DataUnavailable { .. })
        ));
        assert!(!dirs.data.exists());
    }

    #[tokio::test]
    async fn unreachable_source_surfaces_and_writes_nothing() {
        let dirs = dirs();
        let client = GfsForecast::builder()
            .reader(UnreachableReader)
            .data_dir(dirs.data.clone())
            .cache_dir(dirs.cache.clone())
            .build();

        let err = client
            .fetch()
            .request(&amsterdam_request())
            .now(wall_clock())
            .call()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GfsForecastError::Dataset(DatasetError::SourceUnreachable { .. })
        ));
        assert!(!dirs.data.exists());
    }

    #[tokio::test]
    async fn stalled_open_times_out() {
        let dirs = dirs();
        let client = GfsForecast::builder()
            .reader(StalledReader(slab()))
            .data_dir(dirs.data.clone())
            .cache_dir(dirs.cache.clone())
            .open_timeout(Duration::from_millis(20))
            .build();

        let err = client
            .fetch()
            .request(&amsterdam_request())
            .now(wall_clock())
            .call()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GfsForecastError::Dataset(DatasetError::OpenTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_fetches_for_one_identifier_do_not_race_the_header() {
        let dirs = dirs();
        let client = Arc::new(
            GfsForecast::builder()
                .reader(FakeReader::new(slab()))
                .data_dir(dirs.data.clone())
                .cache_dir(dirs.cache.clone())
                .build(),
        );

        let a = {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .fetch()
                    .request(&amsterdam_request())
                    .now(wall_clock())
                    .call()
                    .await
            })
        };
        let b = {
            let client = client.clone();
            tokio::spawn(async move {
                client
                    .fetch()
                    .request(&amsterdam_request())
                    .now(wall_clock())
                    .call()
                    .await
            })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let output = dirs.data.join(format!("{}.csv", expected_identifier()));
        let content = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            content
                .lines()
                .filter(|l| l.starts_with("time,lon,lat"))
                .count(),
            1
        );
        assert_eq!(content.lines().count(), 3);
    }
}
