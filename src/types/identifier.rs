//! Builds the remote dataset locator and the canonical forecast identifier.
//!
//! The identifier doubles as the cache key and the output filename stem, so
//! it must be deterministic and free of path separators.

use crate::types::resolution::Resolution;
use crate::types::run::RunLabel;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Base endpoint of the NOMADS DODS service. The full locator shape,
/// `<endpoint>/gfs_<res>/gfs<YYYYMMDD>/gfs_<res>_<run>`, is an
/// interoperability contract with the upstream data provider.
pub const NOMADS_ENDPOINT: &str = "https://nomads.ncep.noaa.gov/dods";

/// URL of a single GFS run dataset on the NOMADS DODS service.
///
/// Example: `https://nomads.ncep.noaa.gov/dods/gfs_0p25_1hr/gfs20231015/gfs_0p25_1hr_18z`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteLocator(String);

impl RemoteLocator {
    /// The locator as a URL string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical identifier of one forecast extraction.
///
/// Derived from (date, resolution, run); identical inputs always yield the
/// identical identifier, and identifiers never contain `/`, so they are safe
/// to use directly as filename stems. Example: `gfs20231015_gfs_0p25_1hr_18z`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForecastIdentifier(String);

impl ForecastIdentifier {
    /// The identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Filename of this forecast's CSV extraction, `<identifier>.csv`.
    pub fn csv_filename(&self) -> String {
        format!("{}.csv", self.0)
    }
}

impl fmt::Display for ForecastIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds the remote locator and forecast identifier for a run published on
/// `date`.
///
/// Pure function of its inputs: no clock, network or disk access. The latest
/// forecast always lives under today's date on NOMADS, so callers pass the
/// current date here.
pub fn build_locator(
    date: NaiveDate,
    resolution: Resolution,
    run: RunLabel,
) -> (RemoteLocator, ForecastIdentifier) {
    let relative_path = format!(
        "gfs{}/gfs_{}_{}",
        date.format("%Y%m%d"),
        resolution.path_segment(),
        run.suffix()
    );
    let identifier = ForecastIdentifier(relative_path.replace('/', "_"));
    let locator = RemoteLocator(format!(
        "{}/gfs_{}/{}",
        NOMADS_ENDPOINT,
        resolution.path_segment(),
        relative_path
    ));
    (locator, identifier)
}
