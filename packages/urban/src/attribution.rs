//! Region attribution for finished urban areas.
//!
//! Two independent joins are produced. The overlap join emits a row for
//! every region that intersects an area's polygon; the centroid join
//! emits a row for every region that contains the polygon's centroid.
//! Areas matching no region contribute no rows.

use geo::{Centroid, MultiPolygon};
use geotargeting_spatial::{RegionIndex, projection};
use geotargeting_urban_models::{TargetingRow, UrbanArea};

/// Attribution tables, each sorted by city name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Targeting {
    /// One row per (region, city) where the region contains the centroid.
    pub centroid: Vec<TargetingRow>,
    /// One row per (region, city) where the region intersects the area.
    pub overlap: Vec<TargetingRow>,
}

/// Joins `areas` against WGS84 `regions`.
///
/// Region polygons are projected to Web Mercator to match the area
/// geometry; reported latitude/longitude is the centroid of the area in
/// WGS84.
#[must_use]
pub fn attribute(areas: &[UrbanArea], regions: Vec<(String, MultiPolygon<f64>)>) -> Targeting {
    let index = RegionIndex::new(
        regions
            .into_iter()
            .map(|(name, polygon)| (name, projection::project(&polygon)))
            .collect(),
    );
    log::info!("Attributing {} urban areas to {} regions", areas.len(), index.len());

    let mut targeting = Targeting::default();

    for area in areas {
        let (Some(projected_centroid), Some(centroid)) = (
            area.geometry.centroid(),
            projection::unproject(&area.geometry).centroid(),
        ) else {
            log::warn!("Skipping {}: empty geometry", area.name);
            continue;
        };

        let row = |region: &str| TargetingRow {
            region: region.to_string(),
            name: area.name.clone(),
            total_population: area.overlap_population,
            rad: area.rad,
            lat: centroid.y(),
            lng: centroid.x(),
        };

        let overlapping = index.intersecting(&area.geometry);
        let containing = index.containing(projected_centroid);

        if overlapping.is_empty() {
            log::debug!("{} intersects no region", area.name);
        }

        targeting.overlap.extend(overlapping.into_iter().map(row));
        targeting.centroid.extend(containing.into_iter().map(row));
    }

    targeting.overlap.sort_by(|a, b| a.name.cmp(&b.name));
    targeting.centroid.sort_by(|a, b| a.name.cmp(&b.name));

    log::info!(
        "Attribution produced {} centroid rows and {} overlap rows",
        targeting.centroid.len(),
        targeting.overlap.len()
    );

    targeting
}
