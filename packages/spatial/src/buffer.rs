//! Circular buffers around points.
//!
//! Circles are approximated by regular polygons. Buffering is only
//! meaningful in a planar, meter-based CRS such as Web Mercator.

use std::f64::consts::PI;

use geo::{LineString, Point, Polygon};

/// Smallest number of vertices accepted for a circle.
pub const MIN_SEGMENTS: usize = 4;

/// Creates a counter-clockwise polygon approximating a circle of
/// `radius` around `center`, with `segments` vertices.
///
/// A non-positive radius yields an empty polygon.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn circle(center: Point<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    if radius <= 0.0 || !radius.is_finite() {
        return Polygon::new(LineString::new(vec![]), vec![]);
    }

    let n = segments.max(MIN_SEGMENTS);
    let (cx, cy) = (center.x(), center.y());

    let mut coords = Vec::with_capacity(n + 1);
    for i in 0..n {
        let angle = 2.0 * PI * i as f64 / n as f64;
        coords.push((radius.mul_add(angle.cos(), cx), radius.mul_add(angle.sin(), cy)));
    }
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Contains};

    #[test]
    fn circle_area_approximates_pi_r_squared() {
        let polygon = circle(Point::new(0.0, 0.0), 1000.0, 256);
        let expected = PI * 1000.0 * 1000.0;
        let error = (polygon.unsigned_area() - expected).abs() / expected;
        assert!(error < 0.001, "circle area error {:.4}%", error * 100.0);
    }

    #[test]
    fn circle_is_closed_with_segment_count_vertices() {
        let polygon = circle(Point::new(5.0, 5.0), 1.0, 32);
        assert_eq!(polygon.exterior().0.len(), 33);
        assert_eq!(polygon.exterior().0.first(), polygon.exterior().0.last());
    }

    #[test]
    fn circle_contains_its_center() {
        let center = Point::new(-100.0, 250.0);
        assert!(circle(center, 10.0, 16).contains(&center));
    }

    #[test]
    fn too_few_segments_are_raised() {
        let polygon = circle(Point::new(0.0, 0.0), 1.0, 2);
        assert_eq!(polygon.exterior().0.len(), MIN_SEGMENTS + 1);
    }

    #[test]
    fn zero_radius_is_empty() {
        let polygon = circle(Point::new(0.0, 0.0), 0.0, 16);
        assert!(polygon.exterior().0.is_empty());
    }
}
