mod cache;
mod dataset;
mod error;
mod gfs_forecast;
mod output;
mod types;
mod utils;

pub use error::GfsForecastError;
pub use gfs_forecast::*;

pub use cache::lookup::{ForecastCache, DEFAULT_CACHE_DIRECTORY};

pub use dataset::error::DatasetError;
pub use dataset::filter::{filter_dataset, FilteredRecord, SURFACE_TEMPERATURE};
pub use dataset::grid::{GridShapeError, GridSlab};
pub use dataset::reader::{DatasetReader, ForecastDataset, RawDatasetSink, ReadSource};

pub use output::appender::{append_record, DEFAULT_DATA_DIRECTORY};
pub use output::error::OutputError;

pub use types::identifier::{build_locator, ForecastIdentifier, RemoteLocator, NOMADS_ENDPOINT};
pub use types::request::{ForecastRequest, RequestError, LATITUDE_RANGE, LONGITUDE_RANGE};
pub use types::resolution::{Resolution, UnknownResolution};
pub use types::run::RunLabel;
