//! In-memory density grid with a north-up affine geotransform.

use geo::{Coord, Rect};

use crate::DensityError;

/// Affine transformation for a north-up raster.
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is negative for the usual top-down row order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner.
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner.
    pub origin_y: f64,
    /// Cell size in X.
    pub pixel_width: f64,
    /// Cell size in Y, usually negative.
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Creates a geotransform with no rotation.
    #[must_use]
    pub const fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// World coordinate of the center of cell `(row, col)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_center(&self, row: usize, col: usize) -> Coord<f64> {
        Coord {
            x: (col as f64 + 0.5).mul_add(self.pixel_width, self.origin_x),
            y: (row as f64 + 0.5).mul_add(self.pixel_height, self.origin_y),
        }
    }

    /// Fractional `(row, col)` position of a world coordinate.
    #[must_use]
    pub fn to_pixel(&self, coord: Coord<f64>) -> (f64, f64) {
        (
            (coord.y - self.origin_y) / self.pixel_height,
            (coord.x - self.origin_x) / self.pixel_width,
        )
    }
}

/// A single-band population raster held in memory.
#[derive(Debug, Clone)]
pub struct DensityRaster {
    rows: usize,
    cols: usize,
    transform: GeoTransform,
    nodata: Option<f64>,
    data: Vec<f64>,
}

impl DensityRaster {
    /// Wraps a row-major cell buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DensityError::SizeMismatch`] if `data.len() != rows * cols`.
    pub fn new(
        rows: usize,
        cols: usize,
        transform: GeoTransform,
        nodata: Option<f64>,
        data: Vec<f64>,
    ) -> Result<Self, DensityError> {
        if data.len() != rows * cols {
            return Err(DensityError::SizeMismatch {
                expected: rows * cols,
                actual: data.len(),
            });
        }

        Ok(Self {
            rows,
            cols,
            transform,
            nodata,
            data,
        })
    }

    /// `(rows, cols)`.
    #[must_use]
    pub const fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// The raster's geotransform.
    #[must_use]
    pub const fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Value of cell `(row, col)`, or `None` if it is out of range,
    /// nodata, or NaN.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        let value = self.data[row * self.cols + col];
        if value.is_nan() || self.nodata.is_some_and(|nd| value == nd) {
            return None;
        }
        Some(value)
    }

    /// Sum of every unmasked cell.
    #[must_use]
    pub fn total(&self) -> f64 {
        (0..self.rows)
            .flat_map(|row| (0..self.cols).map(move |col| (row, col)))
            .filter_map(|(row, col)| self.get(row, col))
            .sum()
    }

    /// Inclusive-exclusive `(rows, cols)` cell window whose centers may
    /// fall within `rect`, clipped to the raster. `None` if the rectangle
    /// misses the raster entirely.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn window(
        &self,
        rect: &Rect<f64>,
    ) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
        let (r0, c0) = self.transform.to_pixel(rect.min());
        let (r1, c1) = self.transform.to_pixel(rect.max());

        let (row_lo, row_hi) = (r0.min(r1), r0.max(r1));
        let (col_lo, col_hi) = (c0.min(c1), c0.max(c1));

        // A cell center sits at index + 0.5.
        let first_row = (row_lo - 0.5).ceil().max(0.0);
        let last_row = (row_hi - 0.5).floor().min(self.rows as f64 - 1.0);
        let first_col = (col_lo - 0.5).ceil().max(0.0);
        let last_col = (col_hi - 0.5).floor().min(self.cols as f64 - 1.0);

        if first_row > last_row || first_col > last_col {
            return None;
        }

        Some((
            first_row as usize..last_row as usize + 1,
            first_col as usize..last_col as usize + 1,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> DensityRaster {
        // 3x3 grid of 1-degree cells with upper-left corner at (0, 3).
        DensityRaster::new(
            3,
            3,
            GeoTransform::new(0.0, 3.0, 1.0, -1.0),
            Some(-99.0),
            vec![1.0, 2.0, 3.0, 4.0, -99.0, 6.0, 7.0, 8.0, f64::NAN],
        )
        .expect("valid raster")
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        let result = DensityRaster::new(2, 2, GeoTransform::new(0.0, 0.0, 1.0, -1.0), None, vec![]);
        assert!(matches!(
            result,
            Err(DensityError::SizeMismatch {
                expected: 4,
                actual: 0
            })
        ));
    }

    #[test]
    fn masks_nodata_and_nan() {
        let raster = grid();
        assert_eq!(raster.get(0, 0), Some(1.0));
        assert_eq!(raster.get(1, 1), None);
        assert_eq!(raster.get(2, 2), None);
        assert_eq!(raster.get(3, 0), None);
    }

    #[test]
    fn total_skips_masked_cells() {
        assert!((grid().total() - 31.0).abs() < f64::EPSILON);
    }

    #[test]
    fn cell_center_of_first_cell() {
        let center = grid().transform().cell_center(0, 0);
        assert!((center.x - 0.5).abs() < f64::EPSILON);
        assert!((center.y - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn window_covers_centers_inside_rect() {
        let raster = grid();
        let rect = Rect::new(Coord { x: 0.2, y: 0.2 }, Coord { x: 1.8, y: 1.8 });
        let (rows, cols) = raster.window(&rect).expect("window");
        assert_eq!(rows, 1..3);
        assert_eq!(cols, 0..2);
    }

    #[test]
    fn window_outside_raster_is_none() {
        let raster = grid();
        let rect = Rect::new(Coord { x: 10.0, y: 10.0 }, Coord { x: 11.0, y: 11.0 });
        assert!(raster.window(&rect).is_none());
    }
}
