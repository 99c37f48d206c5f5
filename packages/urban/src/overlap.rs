//! Greedy removal of mostly-subsumed urban areas.
//!
//! Areas are visited once, in input order. An area is dropped when some
//! other area that has not already been dropped covers more than the
//! threshold fraction of it. Dropped areas stop taking part in later
//! comparisons, so the result depends on input order.

use geo::{Area, BooleanOps, Intersects, Polygon};
use geotargeting_spatial::compute_envelope;
use geotargeting_urban_models::UrbanArea;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

type IndexedEnvelope = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Returns, for each polygon, whether it is dropped as an overlap.
///
/// A polygon with zero area is never dropped.
#[must_use]
pub fn overlapped(polygons: &[Polygon<f64>], threshold: f64) -> Vec<bool> {
    let envelopes: Vec<Option<AABB<[f64; 2]>>> = polygons.iter().map(compute_envelope).collect();
    let tree: RTree<IndexedEnvelope> = RTree::bulk_load(
        envelopes
            .iter()
            .enumerate()
            .filter_map(|(i, env)| {
                env.map(|env| GeomWithData::new(Rectangle::from_aabb(env), i))
            })
            .collect(),
    );

    let mut dropped = vec![false; polygons.len()];

    for (i, polygon) in polygons.iter().enumerate() {
        let Some(envelope) = envelopes[i] else {
            continue;
        };
        let area = polygon.unsigned_area();
        if area <= 0.0 {
            continue;
        }

        let subsumed = tree
            .locate_in_envelope_intersecting(&envelope)
            .map(|entry| entry.data)
            .filter(|&j| j != i && !dropped[j])
            .any(|j| {
                let other = &polygons[j];
                other.intersects(polygon)
                    && polygon.intersection(other).unsigned_area() / area > threshold
            });

        if subsumed {
            dropped[i] = true;
        }
    }

    dropped
}

/// Removes areas that are mostly covered by another area.
#[must_use]
pub fn resolve(areas: Vec<UrbanArea>, threshold: f64) -> Vec<UrbanArea> {
    let polygons: Vec<Polygon<f64>> = areas.iter().map(|area| area.geometry.clone()).collect();
    let dropped = overlapped(&polygons, threshold);

    let before = areas.len();
    let kept: Vec<UrbanArea> = areas
        .into_iter()
        .zip(dropped)
        .filter_map(|(area, dropped)| {
            if dropped {
                log::debug!("Dropping {} ({} km): overlapped", area.name, area.rad);
                None
            } else {
                Some(area)
            }
        })
        .collect();

    log::info!(
        "Overlap resolution kept {} of {before} urban areas",
        kept.len()
    );

    kept
}
