#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Urban area delineation types.
//!
//! These types carry a populated place through buffer growth: the input
//! [`City`], the per-round [`RoundState`], the sampled [`DensityStats`],
//! and finally the frozen [`UrbanArea`] plus the [`TargetingRow`]s that
//! attribute it to administrative regions.

use geo::{Point, Polygon};
use serde::{Deserialize, Serialize};

/// Meters per kilometer. Radii are computed in meters and recorded in
/// kilometers.
pub const METERS_PER_KM: f64 = 1000.0;

/// A populated place read from the points dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    /// Place name (e.g. "Nairobi").
    pub name: String,
    /// Place type as tagged in the source (e.g. "city", "town").
    pub place: String,
    /// Location in WGS84 longitude/latitude.
    pub location: Point<f64>,
}

/// Aggregate raster statistics over one polygon.
///
/// Fields are never missing: a polygon that covers no unmasked cells
/// reports zero for every statistic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DensityStats {
    /// Largest cell value under the polygon.
    pub max: f64,
    /// Mean cell value under the polygon.
    pub mean: f64,
    /// Sum of cell values under the polygon.
    pub sum: f64,
    /// Number of unmasked cells counted.
    pub count: usize,
}

/// The radii shared by every active city in one growth round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    /// Zero-based round index.
    pub index: u32,
    /// Inner buffer radius in meters (0 on the first round).
    pub inner_m: f64,
    /// Outer buffer radius in meters.
    pub outer_m: f64,
}

impl RoundState {
    /// The first round: a filled disc of radius `step_m`.
    #[must_use]
    pub const fn initial(step_m: f64) -> Self {
        Self {
            index: 0,
            inner_m: 0.0,
            outer_m: step_m,
        }
    }

    /// The following round: the previous outer radius becomes the inner
    /// radius and the outer radius grows by `step_m`.
    #[must_use]
    pub fn next(&self, step_m: f64) -> Self {
        Self {
            index: self.index + 1,
            inner_m: self.outer_m,
            outer_m: self.outer_m + step_m,
        }
    }

    /// Outer radius in kilometers.
    #[must_use]
    pub fn rad_km(&self) -> f64 {
        self.outer_m / METERS_PER_KM
    }
}

/// Outcome of classifying one ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Keep growing.
    Continue,
    /// Stop growing and freeze the current ring.
    Finished,
}

/// Which side of the density thresholds ends a city's growth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishRule {
    /// Finish once a ring's mean or max density exceeds its threshold.
    #[default]
    Dense,
    /// Finish once a ring's mean and max density are both at or below
    /// their thresholds, i.e. the ring has left the dense core.
    Sparse,
}

/// Why a city stopped growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The ring was classified finished by the density thresholds.
    Density,
    /// The round cap was reached while the city was still active.
    RoundCap,
}

/// Density limits compared against each ring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Ring mean density limit.
    pub mean: f64,
    /// Ring max density limit.
    pub max: f64,
}

/// A city whose growth has terminated.
#[derive(Debug, Clone, PartialEq)]
pub struct UrbanArea {
    /// Place name carried over from the [`City`].
    pub name: String,
    /// Original WGS84 location of the place.
    pub location: Point<f64>,
    /// Full outer disc of the last round, in Web Mercator meters.
    pub geometry: Polygon<f64>,
    /// Outer radius of the last round in kilometers.
    pub rad: f64,
    /// Max density of the last sampled ring.
    pub max_density: f64,
    /// Mean density of the last sampled ring.
    pub mean_density: f64,
    /// Raster population under `geometry`, rounded. Zero until annotated.
    pub overlap_population: i64,
    /// Round in which the city finished.
    pub round: u32,
    /// Why growth ended.
    pub reason: FinishReason,
}

/// One (region, city) attribution row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetingRow {
    /// Administrative region name.
    pub region: String,
    /// City name.
    pub name: String,
    /// Population covered by the city's urban area.
    pub total_population: i64,
    /// Urban area radius in kilometers.
    pub rad: f64,
    /// Centroid latitude (WGS84).
    pub lat: f64,
    /// Centroid longitude (WGS84).
    pub lng: f64,
}

/// Tunables for the growth algorithm, deserialized from TOML.
///
/// Every field has a default so a config file only needs to list what
/// it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Place types kept from the points dataset.
    pub place_types: Vec<String>,
    /// Urban areas with a radius below this (km) are dropped.
    pub min_rad_km: f64,
    /// Ring width and per-round radius increment in meters.
    pub step_m: f64,
    /// Total number of rounds, including the initial one.
    pub max_rounds: u32,
    /// Fraction of a polygon that another polygon must cover for it to be
    /// dropped as an overlap.
    pub overlap_threshold: f64,
    /// Vertices used to approximate each buffer circle.
    pub buffer_segments: usize,
    /// Which side of the thresholds ends growth.
    pub finish_rule: FinishRule,
    /// Point property holding the place name.
    pub name_field: String,
    /// Point property holding the place type.
    pub place_field: String,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            place_types: vec!["city".to_string(), "town".to_string()],
            min_rad_km: 2.0,
            step_m: 1000.0,
            max_rounds: 10,
            overlap_threshold: 0.8,
            buffer_segments: 64,
            finish_rule: FinishRule::Dense,
            name_field: "name".to_string(),
            place_field: "place".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_advance_by_step() {
        let mut round = RoundState::initial(1000.0);
        assert!((round.inner_m - 0.0).abs() < f64::EPSILON);
        for i in 0..10_u32 {
            assert_eq!(round.index, i);
            assert!(
                (round.outer_m - 1000.0 * f64::from(i + 1)).abs() < f64::EPSILON,
                "round {i} outer radius was {}",
                round.outer_m
            );
            round = round.next(1000.0);
        }
    }

    #[test]
    fn next_round_inner_is_previous_outer() {
        let first = RoundState::initial(1000.0);
        let second = first.next(1000.0);
        assert!((second.inner_m - first.outer_m).abs() < f64::EPSILON);
        assert!((second.rad_km() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: GrowthConfig = toml::from_str("min_rad_km = 3.5\nplace_types = [\"city\"]")
            .expect("config should parse");
        assert!((config.min_rad_km - 3.5).abs() < f64::EPSILON);
        assert_eq!(config.place_types, vec!["city".to_string()]);
        assert_eq!(config.max_rounds, 10);
        assert_eq!(config.name_field, "name");
        assert_eq!(config.finish_rule, FinishRule::Dense);
    }

    #[test]
    fn finish_rule_reads_snake_case() {
        let config: GrowthConfig =
            toml::from_str("finish_rule = \"sparse\"").expect("config should parse");
        assert_eq!(config.finish_rule, FinishRule::Sparse);
    }
}
