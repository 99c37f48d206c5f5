#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dataset I/O for urban area delineation.
//!
//! Reads populated places and administrative regions from `GeoJSON`
//! `FeatureCollection`s (normalizing them to WGS84), and writes the
//! finished urban areas as `GeoJSON` and the targeting tables as CSV.

pub mod crs;
pub mod output;
pub mod points;
pub mod regions;

use std::path::Path;

use thiserror::Error;

pub use output::{urban_areas_to_geojson, write_rows, write_rows_to, write_urban_areas};
pub use points::{load_points, parse_points};
pub use regions::{load_regions, parse_regions};

/// Errors that can occur while reading or writing datasets.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// File could not be read or written.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// `GeoJSON` parsing or conversion failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The dataset declares a CRS other than WGS84 or Web Mercator.
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    /// The document is valid `GeoJSON` but not a `FeatureCollection`.
    #[error("Expected a FeatureCollection, found {0}")]
    NotAFeatureCollection(String),

    /// A feature lacks a required property.
    #[error("Feature {index} has no '{field}' property")]
    MissingProperty {
        /// Zero-based feature index.
        index: usize,
        /// Property that was expected.
        field: String,
    },
}

/// Reads a whole file into a string, attaching the path to any error.
pub(crate) fn read_to_string(path: &Path) -> Result<String, DatasetError> {
    std::fs::read_to_string(path).map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

/// Renders a property value as a plain string (strings unquoted).
pub(crate) fn property_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
