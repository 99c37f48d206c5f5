//! Populated places loader.

use std::path::Path;

use geotargeting_urban_models::City;

use crate::{DatasetError, crs, property_string};

/// Loads populated places from a `GeoJSON` file.
///
/// See [`parse_points`].
///
/// # Errors
///
/// Returns [`DatasetError`] if the file cannot be read or parsed.
pub fn load_points(
    path: &Path,
    name_field: &str,
    place_field: &str,
) -> Result<Vec<City>, DatasetError> {
    let cities = parse_points(&crate::read_to_string(path)?, name_field, place_field)?;
    log::info!("Loaded {} populated places from {}", cities.len(), path.display());
    Ok(cities)
}

/// Parses populated places from `GeoJSON` text.
///
/// Only `Point` features are kept; other geometries are skipped with a
/// warning. Coordinates are normalized to WGS84. Missing names or place
/// types become empty strings.
///
/// # Errors
///
/// Returns [`DatasetError`] if the text is not a `FeatureCollection` or
/// declares an unsupported CRS.
pub fn parse_points(
    text: &str,
    name_field: &str,
    place_field: &str,
) -> Result<Vec<City>, DatasetError> {
    let (collection, source_crs) = crs::parse_collection(text)?;
    let mut cities = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let name = feature
            .property(name_field)
            .and_then(property_string)
            .unwrap_or_default();
        let place = feature
            .property(place_field)
            .and_then(property_string)
            .unwrap_or_default();

        let Some(geometry) = feature.geometry else {
            log::warn!("Skipping place {index} ({name}): no geometry");
            continue;
        };
        let geometry: geo::Geometry<f64> = geometry.try_into()?;

        let geo::Geometry::Point(point) = crs::to_wgs84(geometry, source_crs) else {
            log::warn!("Skipping place {index} ({name}): not a point");
            continue;
        };

        cities.push(City {
            name,
            place,
            location: point,
        });
    }

    Ok(cities)
}
