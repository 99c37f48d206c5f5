#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial primitives for urban area delineation.
//!
//! Provides the Web Mercator projection used for meter-based buffering,
//! circular point buffers, and an in-memory R-tree index over named
//! region polygons for polygon-intersection and point-in-polygon
//! attribution.

pub mod buffer;
pub mod projection;

use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point, Polygon};
use rstar::{AABB, RTree, RTreeObject};

/// A region polygon stored in the R-tree with its metadata.
struct RegionEntry {
    /// Position of the region in the order it was supplied.
    order: usize,
    name: String,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for RegionEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index over named region polygons.
///
/// Lookups return region names in the order the regions were supplied,
/// regardless of how the R-tree visits them.
pub struct RegionIndex {
    regions: RTree<RegionEntry>,
}

impl RegionIndex {
    /// Builds the index from `(name, polygon)` pairs.
    ///
    /// Regions with an empty name are kept; regions with no extent are
    /// skipped.
    #[must_use]
    pub fn new(regions: Vec<(String, MultiPolygon<f64>)>) -> Self {
        let mut entries = Vec::with_capacity(regions.len());

        for (order, (name, polygon)) in regions.into_iter().enumerate() {
            let Some(envelope) = compute_envelope(&polygon) else {
                log::warn!("Skipping region {name}: empty geometry");
                continue;
            };
            entries.push(RegionEntry {
                order,
                name,
                envelope,
                polygon,
            });
        }

        Self {
            regions: RTree::bulk_load(entries),
        }
    }

    /// Number of indexed regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.size()
    }

    /// Returns `true` if no regions were indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.size() == 0
    }

    /// Names of every region whose geometry intersects `polygon`.
    #[must_use]
    pub fn intersecting(&self, polygon: &Polygon<f64>) -> Vec<&str> {
        let Some(query_env) = compute_envelope(polygon) else {
            return Vec::new();
        };

        let mut hits: Vec<&RegionEntry> = self
            .regions
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.intersects(polygon))
            .collect();
        hits.sort_by_key(|entry| entry.order);
        hits.into_iter().map(|entry| entry.name.as_str()).collect()
    }

    /// Names of every region whose geometry contains `point`.
    ///
    /// Regions may overlap, so more than one name can come back.
    #[must_use]
    pub fn containing(&self, point: Point<f64>) -> Vec<&str> {
        let query_env = AABB::from_point([point.x(), point.y()]);

        let mut hits: Vec<&RegionEntry> = self
            .regions
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.contains(&point))
            .collect();
        hits.sort_by_key(|entry| entry.order);
        hits.into_iter().map(|entry| entry.name.as_str()).collect()
    }
}

/// Converts an areal [`geo::Geometry`] into a [`MultiPolygon`].
/// Handles both `Polygon` and `MultiPolygon`; anything else is `None`.
#[must_use]
pub fn to_multipolygon(geometry: geo::Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        _ => None,
    }
}

/// Compute the bounding box envelope of a geometry.
pub fn compute_envelope<G: BoundingRect<f64>>(geometry: &G) -> Option<AABB<[f64; 2]>>
where
    G::Output: Into<Option<geo::Rect<f64>>>,
{
    geometry
        .bounding_rect()
        .into()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}
