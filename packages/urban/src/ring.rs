//! Annular sampling rings around populated places.
//!
//! Buffers are built in Web Mercator meters around the original point,
//! the inner disc is subtracted from the outer one, and the resulting
//! ring is unprojected to WGS84 to match the density raster.

use geo::{BooleanOps, MultiPolygon, Point, Polygon};
use geotargeting_spatial::{buffer, projection};
use geotargeting_urban_models::RoundState;

/// One city's geometry for one round.
#[derive(Debug, Clone)]
pub struct Ring {
    /// Full outer disc in Web Mercator meters.
    pub disc: Polygon<f64>,
    /// Outer disc minus inner disc, in WGS84. Equal to the disc when the
    /// inner radius is zero.
    pub annulus: MultiPolygon<f64>,
}

/// Builds the ring for `location` (WGS84) between `inner_m` and
/// `outer_m`.
#[must_use]
pub fn build_ring(location: Point<f64>, inner_m: f64, outer_m: f64, segments: usize) -> Ring {
    let center = Point::from(projection::to_mercator(location.into()));
    let disc = buffer::circle(center, outer_m, segments);

    let projected = if inner_m > 0.0 {
        disc.difference(&buffer::circle(center, inner_m, segments))
    } else if disc.exterior().0.is_empty() {
        MultiPolygon(vec![])
    } else {
        MultiPolygon(vec![disc.clone()])
    };

    Ring {
        annulus: projection::unproject(&projected),
        disc,
    }
}

/// Builds rings for every location using the radii of `round`.
#[must_use]
pub fn build_rings(locations: &[Point<f64>], round: &RoundState, segments: usize) -> Vec<Ring> {
    locations
        .iter()
        .map(|&location| build_ring(location, round.inner_m, round.outer_m, segments))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    use geo::{Area, Contains};

    fn projected_area(ring: &Ring) -> f64 {
        projection::project(&ring.annulus).unsigned_area()
    }

    #[test]
    fn zero_inner_radius_is_a_filled_disc() {
        let location = Point::new(36.8, -1.3);
        let ring = build_ring(location, 0.0, 1000.0, 128);
        assert_eq!(ring.annulus.0.len(), 1);
        assert!(ring.annulus.0[0].interiors().is_empty());
        assert!(ring.annulus.contains(&location));
    }

    #[test]
    fn annulus_excludes_the_inner_disc() {
        let location = Point::new(36.8, -1.3);
        let ring = build_ring(location, 1000.0, 2000.0, 128);
        assert!(!ring.annulus.contains(&location));

        let expected = PI * (2000.0_f64.powi(2) - 1000.0_f64.powi(2));
        let error = (projected_area(&ring) - expected).abs() / expected;
        assert!(error < 0.01, "annulus area error {:.3}%", error * 100.0);
    }

    #[test]
    fn disc_is_the_full_outer_buffer() {
        let ring = build_ring(Point::new(0.0, 0.0), 2000.0, 3000.0, 128);
        let expected = PI * 3000.0 * 3000.0;
        let error = (ring.disc.unsigned_area() - expected).abs() / expected;
        assert!(error < 0.01, "disc area error {:.3}%", error * 100.0);
    }

    #[test]
    fn annulus_is_geographic() {
        let ring = build_ring(Point::new(10.0, 50.0), 0.0, 1000.0, 32);
        for coord in &ring.annulus.0[0].exterior().0 {
            assert!((coord.x - 10.0).abs() < 0.1, "lon {} too far", coord.x);
            assert!((coord.y - 50.0).abs() < 0.1, "lat {} too far", coord.y);
        }
    }

    #[test]
    fn empty_radius_gives_empty_ring() {
        let ring = build_ring(Point::new(0.0, 0.0), 0.0, 0.0, 32);
        assert!(ring.annulus.0.is_empty());
    }

    #[test]
    fn rings_follow_round_radii() {
        let round = RoundState::initial(1000.0).next(1000.0);
        let rings = build_rings(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)], &round, 64);
        assert_eq!(rings.len(), 2);
        assert!(!rings[0].annulus.contains(&Point::new(0.0, 0.0)));
    }
}
