//! Zonal statistics over polygons.
//!
//! A cell belongs to a polygon when the cell center lies inside it.
//! Masked cells (nodata or NaN) are ignored. When no cell qualifies every
//! statistic is reported as zero rather than missing.

use geo::{BoundingRect, Contains, MultiPolygon, Point};
use geotargeting_urban_models::DensityStats;

use crate::DensityRaster;

/// Computes max, mean, and sum of the unmasked cells under `polygon`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn zonal_stats(raster: &DensityRaster, polygon: &MultiPolygon<f64>) -> DensityStats {
    let Some(rect) = polygon.bounding_rect() else {
        return DensityStats::default();
    };
    let Some((rows, cols)) = raster.window(&rect) else {
        return DensityStats::default();
    };

    let transform = raster.transform();
    let mut count = 0_usize;
    let mut sum = 0.0;
    let mut max = f64::NEG_INFINITY;

    for row in rows {
        for col in cols.clone() {
            let Some(value) = raster.get(row, col) else {
                continue;
            };
            let center = Point::from(transform.cell_center(row, col));
            if !polygon.contains(&center) {
                continue;
            }
            count += 1;
            sum += value;
            max = max.max(value);
        }
    }

    if count == 0 {
        return DensityStats::default();
    }

    DensityStats {
        max,
        mean: sum / count as f64,
        sum,
        count,
    }
}
