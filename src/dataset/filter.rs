//! Narrows an opened dataset to the requested point and time.

use crate::dataset::error::DatasetError;
use crate::dataset::reader::ForecastDataset;
use chrono::NaiveDateTime;
use log::debug;
use polars::prelude::*;
use std::fmt;

/// The GFS variable this crate extracts: surface temperature.
///
/// The full variable list for a run is published alongside the dataset,
/// e.g. `https://nomads.ncep.noaa.gov/dods/gfs_0p25_1hr/gfs20231014/gfs_0p25_1hr_00z.das`.
pub const SURFACE_TEMPERATURE: &str = "tmpsfc";

/// Format used for the `time` column of the tabular output.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One forecast extraction: a single variable at a single interpolated point
/// and a single time coordinate, ready to be written as one CSV row.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRecord {
    time: NaiveDateTime,
    longitude: f64,
    latitude: f64,
    variable: String,
    value: f64,
}

impl FilteredRecord {
    pub fn time(&self) -> NaiveDateTime {
        self.time
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// The extracted value, e.g. surface temperature in Kelvin.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Renders the record as a one-row dataframe with columns
    /// `time, lon, lat, <variable>`.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        df!(
            "time" => [self.time.format(TIME_FORMAT).to_string()],
            "lon" => [self.longitude],
            "lat" => [self.latitude],
            self.variable.as_str() => [self.value],
        )
    }
}

impl fmt::Display for FilteredRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.to_frame().map_err(|_| fmt::Error)?;
        write!(f, "{frame}")
    }
}

/// Selects [`SURFACE_TEMPERATURE`], interpolates at the exact
/// (`longitude`, `latitude`) and selects the exact `time` coordinate.
///
/// # Errors
///
/// Propagates the dataset's sampling errors unchanged; in particular
/// [`DatasetError::DataUnavailable`] when the run has no exact match for
/// `time`. Nothing is written on failure.
pub fn filter_dataset<D: ForecastDataset>(
    dataset: &D,
    latitude: f64,
    longitude: f64,
    time: NaiveDateTime,
) -> Result<FilteredRecord, DatasetError> {
    let value = dataset.sample(SURFACE_TEMPERATURE, longitude, latitude, time)?;
    debug!(
        "Sampled {} at (lon {}, lat {}) for {}: {}",
        SURFACE_TEMPERATURE, longitude, latitude, time, value
    );
    Ok(FilteredRecord {
        time,
        longitude,
        latitude,
        variable: SURFACE_TEMPERATURE.to_string(),
        value,
    })
}
