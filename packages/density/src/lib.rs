#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Population density sampling.
//!
//! Loads a single-band population raster into memory once and answers
//! zonal statistics (max, mean, sum) for arbitrary polygons, plus the
//! whole-raster population total used for coverage reporting.
//!
//! Statistics are never missing: a polygon that covers no unmasked cells
//! reports zero, so callers can compare densities against thresholds
//! without special-casing empty coverage.

pub mod geotiff;
pub mod raster;
pub mod zonal;

use geo::MultiPolygon;
use geotargeting_urban_models::DensityStats;
use thiserror::Error;

pub use raster::{DensityRaster, GeoTransform};

/// Errors that can occur while loading or sampling a density raster.
#[derive(Debug, Error)]
pub enum DensityError {
    /// The raster file could not be opened or read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TIFF decoder rejected the file.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// The file carries no usable georeferencing tags.
    #[error("Missing geotransform: {message}")]
    MissingGeoTransform {
        /// Description of what was missing.
        message: String,
    },

    /// The pixel buffer does not match the declared dimensions.
    #[error("Raster size mismatch: expected {expected} cells, got {actual}")]
    SizeMismatch {
        /// `rows * cols`.
        expected: usize,
        /// Cells actually supplied.
        actual: usize,
    },

    /// The pixel format cannot be read as numbers.
    #[error("Unsupported pixel format: {0}")]
    UnsupportedPixelFormat(String),
}

/// A source of per-polygon density statistics.
///
/// Polygons are in the raster's CRS (WGS84 longitude/latitude).
pub trait DensitySampler {
    /// Statistics for each polygon, in input order.
    fn stats(&self, polygons: &[MultiPolygon<f64>]) -> Vec<DensityStats>;

    /// Sum of every unmasked cell.
    fn total(&self) -> f64;
}

impl DensitySampler for DensityRaster {
    fn stats(&self, polygons: &[MultiPolygon<f64>]) -> Vec<DensityStats> {
        polygons
            .iter()
            .map(|polygon| zonal::zonal_stats(self, polygon))
            .collect()
    }

    fn total(&self) -> f64 {
        self.total()
    }
}
