//! Defines the GFS grid/step resolutions this crate can request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The spatial and temporal resolution of a GFS dataset on NOMADS.
///
/// Currently only the 0.25 degree / 1 hour product is supported; the enum
/// leaves room for the coarser products (`0p50`, `1p00`) should they be
/// needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    /// 0.25 degree grid with hourly forecast steps (`0p25_1hr`).
    P0p25Hourly,
}

impl Resolution {
    /// The segment NOMADS uses for this resolution in dataset paths.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Resolution::P0p25Hourly => "0p25_1hr",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

impl FromStr for Resolution {
    type Err = UnknownResolution;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0p25_1hr" => Ok(Resolution::P0p25Hourly),
            other => Err(UnknownResolution(other.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized resolution string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown GFS resolution '{0}', expected one of: 0p25_1hr")]
pub struct UnknownResolution(pub String);
