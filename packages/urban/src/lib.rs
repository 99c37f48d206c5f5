#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Urban area delineation around populated places.
//!
//! Each place is grown outward in fixed-width rings. Every round, the
//! newest ring (outer buffer minus inner buffer) is sampled against a
//! population density raster and classified against mean/max density
//! thresholds; finished places are frozen and the rest keep growing
//! until a round cap. Finished areas are then de-duplicated by overlap,
//! annotated with the population they cover, and attributed to
//! administrative regions by polygon overlap and by centroid.

pub mod attribution;
pub mod classify;
pub mod coverage;
pub mod growth;
pub mod overlap;
pub mod progress;
pub mod ring;

use std::collections::BTreeSet;
use std::path::Path;

use geotargeting_dataset::DatasetError;
use geotargeting_density::{DensityError, DensitySampler, geotiff};
use geotargeting_spatial::buffer::MIN_SEGMENTS;
use geotargeting_urban_models::{City, GrowthConfig, TargetingRow, Thresholds, UrbanArea};
use thiserror::Error;

use crate::progress::ProgressCallback;

/// Errors that can occur while delineating or attributing urban areas.
#[derive(Debug, Error)]
pub enum UrbanError {
    /// The density raster could not be loaded.
    #[error("Density raster error: {0}")]
    Density(#[from] DensityError),

    /// A vector dataset could not be read.
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// The growth configuration is unusable.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what went wrong.
        message: String,
    },
}

/// Checks that `config` describes a growth run that can terminate and
/// produce geometry.
///
/// # Errors
///
/// Returns [`UrbanError::InvalidConfig`] naming the first bad field.
pub fn validate_config(config: &GrowthConfig) -> Result<(), UrbanError> {
    let invalid = |message: String| Err(UrbanError::InvalidConfig { message });

    if !(config.step_m.is_finite() && config.step_m > 0.0) {
        return invalid(format!("step_m must be positive, got {}", config.step_m));
    }
    if config.max_rounds == 0 {
        return invalid("max_rounds must be at least 1".to_string());
    }
    if !(config.overlap_threshold > 0.0 && config.overlap_threshold <= 1.0) {
        return invalid(format!(
            "overlap_threshold must be in (0, 1], got {}",
            config.overlap_threshold
        ));
    }
    if config.buffer_segments < MIN_SEGMENTS {
        return invalid(format!(
            "buffer_segments must be at least {MIN_SEGMENTS}, got {}",
            config.buffer_segments
        ));
    }
    if config.min_rad_km.is_nan() {
        return invalid("min_rad_km must be a number".to_string());
    }

    Ok(())
}

/// Keeps only cities whose place type is in `place_types`.
#[must_use]
pub fn filter_place_types(cities: Vec<City>, place_types: &[String]) -> Vec<City> {
    let wanted: BTreeSet<&str> = place_types.iter().map(String::as_str).collect();
    cities
        .into_iter()
        .filter(|city| wanted.contains(city.place.as_str()))
        .collect()
}

/// Runs growth, overlap resolution, and population annotation against an
/// already-loaded sampler.
#[must_use]
pub fn delineate(
    cities: &[City],
    sampler: &dyn DensitySampler,
    thresholds: &Thresholds,
    config: &GrowthConfig,
    progress: &dyn ProgressCallback,
) -> Vec<UrbanArea> {
    let growth = growth::grow(cities, sampler, thresholds, config, progress);
    let areas = overlap::resolve(growth.areas, config.overlap_threshold);
    let (areas, _report) = coverage::annotate_population(areas, sampler);
    areas
}

/// Delineates urban areas for the populated places in `points_path`
/// using the density raster at `raster_path`.
///
/// # Errors
///
/// Returns [`UrbanError`] if the configuration is invalid or either input
/// cannot be read.
pub fn make_city_shapes(
    thresholds: &Thresholds,
    points_path: &Path,
    raster_path: &Path,
    config: &GrowthConfig,
    progress: &dyn ProgressCallback,
) -> Result<Vec<UrbanArea>, UrbanError> {
    validate_config(config)?;

    log::info!(
        "Generating buffers with mean minimum {} and max minimum {}",
        thresholds.mean,
        thresholds.max
    );

    let places =
        geotargeting_dataset::load_points(points_path, &config.name_field, &config.place_field)?;
    let cities = filter_place_types(places, &config.place_types);
    log::info!(
        "{} places match place types {:?}",
        cities.len(),
        config.place_types
    );

    let raster = geotiff::read_geotiff(raster_path)?;

    Ok(delineate(&cities, &raster, thresholds, config, progress))
}

/// Attributes urban areas to the regions in `regions_path`, returning the
/// `(centroid, overlap)` tables.
///
/// # Errors
///
/// Returns [`UrbanError::Dataset`] if the regions file cannot be read.
pub fn prepare_targeting(
    areas: &[UrbanArea],
    regions_path: &Path,
    region_name_field: &str,
) -> Result<(Vec<TargetingRow>, Vec<TargetingRow>), UrbanError> {
    let regions = geotargeting_dataset::load_regions(regions_path, region_name_field)?;
    let targeting = attribution::attribute(areas, regions);
    Ok((targeting.centroid, targeting.overlap))
}
