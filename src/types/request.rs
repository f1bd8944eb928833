//! The validated forecast request handed to [`crate::GfsForecast::fetch`].

use crate::types::resolution::Resolution;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inclusive latitude range accepted by the GFS grid.
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
/// Inclusive longitude range accepted by the GFS grid (0..=359.75, i.e. the
/// grid wraps eastward from Greenwich rather than using signed longitudes).
pub const LONGITUDE_RANGE: (f64, f64) = (0.0, 359.75);

/// Error returned when a [`ForecastRequest`] fails validation.
///
/// A request that fails validation performs no work at all: no run is
/// resolved, nothing is fetched and nothing is written.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("latitude {0} out of range [{min}, {max}]", min = LATITUDE_RANGE.0, max = LATITUDE_RANGE.1)]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} out of range [{min}, {max}]", min = LONGITUDE_RANGE.0, max = LONGITUDE_RANGE.1)]
    LongitudeOutOfRange(f64),

    #[error("requested datetime should be in the future, given: {given}, now: {now}")]
    DatetimeNotInFuture {
        given: NaiveDateTime,
        now: NaiveDateTime,
    },
}

/// A validated request for a forecast slice at one geographic point and
/// datetime.
///
/// Construct via [`ForecastRequest::new`]; the fields are immutable once
/// validation has passed.
///
/// # Examples
///
/// ```
/// use gfs_forecast::{ForecastRequest, Resolution};
/// use chrono::{Duration, Utc};
///
/// let tomorrow = Utc::now().naive_utc() + Duration::days(1);
/// let request = ForecastRequest::new(52.371807, 4.896029, tomorrow, Resolution::P0p25Hourly)?;
/// assert_eq!(request.latitude(), 52.371807);
/// # Ok::<(), gfs_forecast::RequestError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    latitude: f64,
    longitude: f64,
    target_datetime: NaiveDateTime,
    resolution: Resolution,
}

impl ForecastRequest {
    /// Validates and constructs a request against the current UTC wall clock.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when a coordinate is out of range or the
    /// datetime is not in the future.
    pub fn new(
        latitude: f64,
        longitude: f64,
        target_datetime: NaiveDateTime,
        resolution: Resolution,
    ) -> Result<Self, RequestError> {
        Self::new_at(
            latitude,
            longitude,
            target_datetime,
            resolution,
            Utc::now().naive_utc(),
        )
    }

    /// Same as [`ForecastRequest::new`] but validated against an explicit
    /// wall clock. Useful for hosts that pin the clock in tests.
    pub fn new_at(
        latitude: f64,
        longitude: f64,
        target_datetime: NaiveDateTime,
        resolution: Resolution,
        now: NaiveDateTime,
    ) -> Result<Self, RequestError> {
        if !(LATITUDE_RANGE.0..=LATITUDE_RANGE.1).contains(&latitude) {
            return Err(RequestError::LatitudeOutOfRange(latitude));
        }
        if !(LONGITUDE_RANGE.0..=LONGITUDE_RANGE.1).contains(&longitude) {
            return Err(RequestError::LongitudeOutOfRange(longitude));
        }
        if target_datetime < now {
            return Err(RequestError::DatetimeNotInFuture {
                given: target_datetime,
                now,
            });
        }
        Ok(Self {
            latitude,
            longitude,
            target_datetime,
            resolution,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn target_datetime(&self) -> NaiveDateTime {
        self.target_datetime
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }
}
