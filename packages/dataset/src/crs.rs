//! Coordinate reference system detection for `GeoJSON` inputs.
//!
//! RFC 7946 `GeoJSON` is always WGS84, but older files may carry a
//! top-level `crs` member. A missing member means WGS84.

use geo::MapCoords;
use geojson::{FeatureCollection, GeoJson};
use geotargeting_spatial::projection::{self, Crs};

use crate::DatasetError;

/// Parses a `GeoJSON` document that must be a `FeatureCollection` and
/// resolves its declared CRS.
///
/// # Errors
///
/// Returns [`DatasetError`] if the text is not `GeoJSON`, is not a
/// `FeatureCollection`, or declares an unsupported CRS.
pub fn parse_collection(text: &str) -> Result<(FeatureCollection, Crs), DatasetError> {
    let geojson: GeoJson = text.parse()?;
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(_) => return Err(DatasetError::NotAFeatureCollection("Feature".into())),
        GeoJson::Geometry(_) => {
            return Err(DatasetError::NotAFeatureCollection("Geometry".into()));
        }
    };

    let crs = declared_crs(&collection)?;
    Ok((collection, crs))
}

/// Reads the legacy `crs` member, defaulting to WGS84.
///
/// # Errors
///
/// Returns [`DatasetError::UnsupportedCrs`] for anything that is not
/// WGS84/CRS84 or Web Mercator.
pub fn declared_crs(collection: &FeatureCollection) -> Result<Crs, DatasetError> {
    let Some(name) = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(serde_json::Value::as_str)
    else {
        return Ok(Crs::Wgs84);
    };

    crs_from_name(name).ok_or_else(|| DatasetError::UnsupportedCrs(name.to_string()))
}

/// Resolves names such as `EPSG:3857`, `urn:ogc:def:crs:EPSG::4326`, or
/// `urn:ogc:def:crs:OGC:1.3:CRS84`.
#[must_use]
pub fn crs_from_name(name: &str) -> Option<Crs> {
    if name.ends_with("CRS84") {
        return Some(Crs::Wgs84);
    }
    let code = name.rsplit(':').next()?.trim().parse::<u32>().ok()?;
    Crs::from_epsg(code)
}

/// Converts a geometry in `crs` to WGS84.
#[must_use]
pub fn to_wgs84(geometry: geo::Geometry<f64>, crs: Crs) -> geo::Geometry<f64> {
    match crs {
        Crs::Wgs84 => geometry,
        Crs::WebMercator => geometry.map_coords(projection::to_wgs84),
    }
}
