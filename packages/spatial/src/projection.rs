//! Spherical Web Mercator (EPSG:3857) projection.
//!
//! Buffers are built in Web Mercator meters and sampled in WGS84
//! longitude/latitude, so every ring makes a round trip through
//! [`to_mercator`] and [`to_wgs84`].

use std::f64::consts::FRAC_PI_4;

use geo::{Coord, MapCoords};

/// Semi-major axis of WGS84, used as the sphere radius by Web Mercator.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude at which Web Mercator maps to a square world.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Coordinate reference systems understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crs {
    /// EPSG:4326, longitude/latitude in degrees.
    Wgs84,
    /// EPSG:3857, meters.
    WebMercator,
}

impl Crs {
    /// Resolves an EPSG code.
    #[must_use]
    pub const fn from_epsg(code: u32) -> Option<Self> {
        match code {
            4326 => Some(Self::Wgs84),
            3857 | 900_913 => Some(Self::WebMercator),
            _ => None,
        }
    }

    /// EPSG code of this CRS.
    #[must_use]
    pub const fn epsg(self) -> u32 {
        match self {
            Self::Wgs84 => 4326,
            Self::WebMercator => 3857,
        }
    }
}

/// Projects a WGS84 coordinate to Web Mercator meters.
///
/// Latitudes beyond [`MAX_LATITUDE`] are clamped.
#[must_use]
pub fn to_mercator(coord: Coord<f64>) -> Coord<f64> {
    let lat = coord.y.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    Coord {
        x: EARTH_RADIUS_M * coord.x.to_radians(),
        y: EARTH_RADIUS_M * (FRAC_PI_4 + lat / 2.0).tan().ln(),
    }
}

/// Unprojects a Web Mercator coordinate to WGS84 degrees.
#[must_use]
pub fn to_wgs84(coord: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (coord.x / EARTH_RADIUS_M).to_degrees(),
        y: (2.0 * (coord.y / EARTH_RADIUS_M).exp().atan() - 2.0 * FRAC_PI_4).to_degrees(),
    }
}

/// Projects any geometry from WGS84 to Web Mercator.
pub fn project<G: MapCoords<f64, f64>>(geometry: &G) -> G::Output {
    geometry.map_coords(to_mercator)
}

/// Unprojects any geometry from Web Mercator to WGS84.
pub fn unproject<G: MapCoords<f64, f64>>(geometry: &G) -> G::Output {
    geometry.map_coords(to_wgs84)
}
