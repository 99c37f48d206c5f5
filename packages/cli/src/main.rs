#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Delineates urban areas around populated places and writes the
//! region targeting tables.
//!
//! Reads a points `GeoJSON`, a population density `GeoTIFF` and a regions
//! `GeoJSON`, then writes `urban-areas.geojson`, `centers-per-state.csv`
//! and `overlap-per-state.csv` into the output directory.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use geotargeting_cli_utils::IndicatifProgress;
use geotargeting_urban_models::{GrowthConfig, Thresholds};

const URBAN_AREAS_FILE: &str = "urban-areas.geojson";
const CENTROID_FILE: &str = "centers-per-state.csv";
const OVERLAP_FILE: &str = "overlap-per-state.csv";

#[derive(Parser, Debug)]
#[command(name = "geotargeting", about = "Urban area delineation and region targeting")]
struct Cli {
    /// Path to the populated places `GeoJSON` (points)
    #[arg(short = 'p', long)]
    populated_places_path: PathBuf,

    /// Path to the population density `GeoTIFF`
    #[arg(short = 'r', long)]
    population_raster_path: PathBuf,

    /// Mean density threshold for a ring
    #[arg(long)]
    mean_minimum: f64,

    /// Max density threshold for a ring
    #[arg(long)]
    max_minimum: f64,

    /// Path to the administrative regions `GeoJSON`
    #[arg(short = 'a', long)]
    admin_shapes: PathBuf,

    /// Region property holding the region name
    #[arg(short = 'k', long)]
    admin_shape_key: String,

    /// Directory the outputs are written to
    #[arg(short = 'o', long)]
    out_dir: PathBuf,

    /// Optional TOML file overriding growth parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimum urban area radius in km
    #[arg(long)]
    min_rad: Option<f64>,

    /// Comma-separated place types to keep (e.g. `city,town`)
    #[arg(long, value_delimiter = ',')]
    place_types: Option<Vec<String>>,
}

impl Cli {
    const fn thresholds(&self) -> Thresholds {
        Thresholds {
            mean: self.mean_minimum,
            max: self.max_minimum,
        }
    }

    /// Loads the config file (if any) and applies flag overrides on top.
    fn growth_config(&self) -> Result<GrowthConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => GrowthConfig::default(),
        };

        if let Some(min_rad) = self.min_rad {
            config.min_rad_km = min_rad;
        }
        if let Some(place_types) = &self.place_types {
            config.place_types.clone_from(place_types);
        }

        Ok(config)
    }
}

fn load_config(path: &Path) -> Result<GrowthConfig, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    Ok(toml::from_str(&text)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = geotargeting_cli_utils::init_logger();
    let cli = Cli::parse();
    let start = Instant::now();

    let config = cli.growth_config()?;
    log::debug!("Growth config: {config:?}");

    std::fs::create_dir_all(&cli.out_dir)?;

    let progress = IndicatifProgress::rounds_bar(&multi, "Growing urban areas");
    let areas = geotargeting_urban::make_city_shapes(
        &cli.thresholds(),
        &cli.populated_places_path,
        &cli.population_raster_path,
        &config,
        progress.as_ref(),
    )?;

    geotargeting_dataset::write_urban_areas(&cli.out_dir.join(URBAN_AREAS_FILE), &areas)?;

    let (centroid, overlap) =
        geotargeting_urban::prepare_targeting(&areas, &cli.admin_shapes, &cli.admin_shape_key)?;

    geotargeting_dataset::write_rows(&cli.out_dir.join(CENTROID_FILE), &centroid)?;
    geotargeting_dataset::write_rows(&cli.out_dir.join(OVERLAP_FILE), &overlap)?;

    log::info!(
        "Done in {:.1}s: {} centroid rows, {} overlap rows in {}",
        start.elapsed().as_secs_f64(),
        centroid.len(),
        overlap.len(),
        cli.out_dir.display()
    );

    Ok(())
}
