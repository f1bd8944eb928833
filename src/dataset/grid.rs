//! An in-memory regular lon/lat/time grid implementing [`ForecastDataset`].
//!
//! Readers that pull a GFS run over DODS can decode into a `GridSlab` and get
//! bilinear interpolation and exact time selection for free. It is also the
//! dataset of choice in tests, where no transport exists at all.

use crate::dataset::error::DatasetError;
use crate::dataset::reader::ForecastDataset;
use chrono::NaiveDateTime;
use thiserror::Error;

/// Error returned when a [`GridSlab`] is constructed from inconsistent axes.
#[derive(Debug, Error)]
pub enum GridShapeError {
    #[error("values length {values} does not match {times} times x {lats} lats x {lons} lons")]
    ValueCountMismatch {
        values: usize,
        times: usize,
        lats: usize,
        lons: usize,
    },

    #[error("{axis} axis must be non-empty and strictly ascending")]
    BadAxis { axis: &'static str },
}

/// A single-variable forecast slab on a regular grid.
///
/// Values are stored row-major as `[time][lat][lon]`. Coordinate axes must be
/// strictly ascending.
#[derive(Debug, Clone)]
pub struct GridSlab {
    variable: String,
    lons: Vec<f64>,
    lats: Vec<f64>,
    times: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl GridSlab {
    /// Builds a slab, validating that the value buffer matches the axes.
    pub fn new(
        variable: impl Into<String>,
        lons: Vec<f64>,
        lats: Vec<f64>,
        times: Vec<NaiveDateTime>,
        values: Vec<f64>,
    ) -> Result<Self, GridShapeError> {
        if lons.is_empty() || lons.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GridShapeError::BadAxis { axis: "lon" });
        }
        if lats.is_empty() || lats.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GridShapeError::BadAxis { axis: "lat" });
        }
        if times.is_empty() || times.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GridShapeError::BadAxis { axis: "time" });
        }
        if values.len() != times.len() * lats.len() * lons.len() {
            return Err(GridShapeError::ValueCountMismatch {
                values: values.len(),
                times: times.len(),
                lats: lats.len(),
                lons: lons.len(),
            });
        }
        Ok(Self {
            variable: variable.into(),
            lons,
            lats,
            times,
            values,
        })
    }

    /// The variable this slab carries, e.g. `tmpsfc`.
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// The time coordinates of this slab.
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    fn value_at(&self, t: usize, y: usize, x: usize) -> f64 {
        self.values[(t * self.lats.len() + y) * self.lons.len() + x]
    }

    /// Bilinear interpolation on the (lat, lon) plane of one time slice.
    fn interpolate_plane(
        &self,
        t: usize,
        lon: Bracket,
        lat: Bracket,
    ) -> f64 {
        let v00 = self.value_at(t, lat.lo, lon.lo);
        let v01 = self.value_at(t, lat.lo, lon.hi);
        let v10 = self.value_at(t, lat.hi, lon.lo);
        let v11 = self.value_at(t, lat.hi, lon.hi);

        let low = v00 + (v01 - v00) * lon.frac;
        let high = v10 + (v11 - v10) * lon.frac;
        low + (high - low) * lat.frac
    }
}

/// A coordinate bracketed between two axis indices.
#[derive(Debug, Clone, Copy)]
struct Bracket {
    lo: usize,
    hi: usize,
    frac: f64,
}

/// Locates `x` on a strictly ascending axis. Returns `None` when `x` falls
/// outside the axis range.
fn bracket(axis: &[f64], x: f64) -> Option<Bracket> {
    let first = *axis.first()?;
    let last = *axis.last()?;
    if x < first || x > last {
        return None;
    }
    // Index of the first coordinate >= x.
    let upper = axis.partition_point(|&c| c < x);
    if axis[upper] == x {
        return Some(Bracket {
            lo: upper,
            hi: upper,
            frac: 0.0,
        });
    }
    let lower = upper - 1;
    let frac = (x - axis[lower]) / (axis[upper] - axis[lower]);
    Some(Bracket {
        lo: lower,
        hi: upper,
        frac,
    })
}

impl ForecastDataset for GridSlab {
    fn sample(
        &self,
        variable: &str,
        longitude: f64,
        latitude: f64,
        time: NaiveDateTime,
    ) -> Result<f64, DatasetError> {
        if variable != self.variable {
            return Err(DatasetError::VariableNotFound(variable.to_string()));
        }
        let lon = bracket(&self.lons, longitude);
        let lat = bracket(&self.lats, latitude);
        let (lon, lat) = match (lon, lat) {
            (Some(lon), Some(lat)) => (lon, lat),
            _ => {
                return Err(DatasetError::PointOutsideGrid {
                    latitude,
                    longitude,
                })
            }
        };
        // Exact-match selection, not nearest-neighbor.
        let t = self
            .times
            .iter()
            .position(|&candidate| candidate == time)
            .ok_or(DatasetError::DataUnavailable { time })?;

        Ok(self.interpolate_plane(t, lon, lat))
    }
}
