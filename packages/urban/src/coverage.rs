//! Population coverage annotation.

use geo::MultiPolygon;
use geotargeting_density::DensitySampler;
use geotargeting_spatial::projection;
use geotargeting_urban_models::UrbanArea;

/// Whole-run coverage figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverageReport {
    /// Sum of every unmasked raster cell.
    pub total_population: f64,
    /// Sum of `overlap_population` over all areas.
    pub covered_population: i64,
    /// `covered / total`, or 0 when the raster is empty.
    pub covered_ratio: f64,
}

/// Sets `overlap_population` on every area to the rounded raster sum
/// under its disc, and reports how much of the raster is covered.
///
/// Areas that overlap each other count their shared population twice.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn annotate_population(
    areas: Vec<UrbanArea>,
    sampler: &dyn DensitySampler,
) -> (Vec<UrbanArea>, CoverageReport) {
    let discs: Vec<MultiPolygon<f64>> = areas
        .iter()
        .map(|area| MultiPolygon(vec![projection::unproject(&area.geometry)]))
        .collect();
    let stats = sampler.stats(&discs);

    let areas: Vec<UrbanArea> = areas
        .into_iter()
        .zip(stats)
        .map(|(area, stats)| UrbanArea {
            overlap_population: stats.sum.round() as i64,
            ..area
        })
        .collect();

    let total_population = sampler.total();
    let covered_population: i64 = areas.iter().map(|area| area.overlap_population).sum();
    let covered_ratio = if total_population > 0.0 {
        covered_population as f64 / total_population
    } else {
        0.0
    };

    log::info!("Total Population: {total_population}");
    log::info!("Covered Population: {covered_population}");
    log::info!("Covered Ratio: {covered_ratio}");

    (
        areas,
        CoverageReport {
            total_population,
            covered_population,
            covered_ratio,
        },
    )
}
