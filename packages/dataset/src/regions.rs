//! Administrative region loader.

use std::path::Path;

use geo::MultiPolygon;
use geotargeting_spatial::to_multipolygon;

use crate::{DatasetError, crs, property_string};

/// Loads administrative regions from a `GeoJSON` file.
///
/// See [`parse_regions`].
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read or parsed.
pub fn load_regions(
    path: &Path,
    name_field: &str,
) -> Result<Vec<(String, MultiPolygon<f64>)>, DatasetError> {
    let regions = parse_regions(&crate::read_to_string(path)?, name_field)?;
    log::info!("Loaded {} regions from {}", regions.len(), path.display());
    Ok(regions)
}

/// Parses `(name, polygon)` pairs from `GeoJSON` text, in WGS84.
///
/// Names are trimmed. Features without areal geometry are skipped with a
/// warning.
///
/// # Errors
///
/// Returns [`DatasetError::MissingProperty`] if a feature has no
/// `name_field`, or another [`DatasetError`] if the text is not a usable
/// `FeatureCollection`.
pub fn parse_regions(
    text: &str,
    name_field: &str,
) -> Result<Vec<(String, MultiPolygon<f64>)>, DatasetError> {
    let (collection, source_crs) = crs::parse_collection(text)?;
    let mut regions = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let name = feature
            .property(name_field)
            .and_then(property_string)
            .ok_or_else(|| DatasetError::MissingProperty {
                index,
                field: name_field.to_string(),
            })?
            .trim()
            .to_string();

        let Some(geometry) = feature.geometry else {
            log::warn!("Skipping region {index} ({name}): no geometry");
            continue;
        };
        let geometry: geo::Geometry<f64> = geometry.try_into()?;

        let Some(polygon) = to_multipolygon(crs::to_wgs84(geometry, source_crs)) else {
            log::warn!("Skipping region {index} ({name}): not a polygon");
            continue;
        };

        regions.push((name, polygon));
    }

    Ok(regions)
}
