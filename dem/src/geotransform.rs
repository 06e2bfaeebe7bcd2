use crate::{DemError, C};
use geo::geometry::Coord;

/// North-up affine transform.
///
/// Same coefficient order as GDAL's
/// `(origin_x, pixel_width, 0, origin_y, 0, pixel_height)` with the
/// rotation terms fixed at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X of the upper-left corner of the upper-left cell.
    pub origin_x: C,

    /// Cell size in X (positive).
    pub pixel_width: C,

    /// Y of the upper-left corner of the upper-left cell.
    pub origin_y: C,

    /// Cell size in Y (negative for north-up grids).
    pub pixel_height: C,
}

impl GeoTransform {
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn new(
        origin_x: C,
        pixel_width: C,
        origin_y: C,
        pixel_height: C,
    ) -> Result<Self, DemError> {
        if !(pixel_width > 0.0) || !(pixel_height < 0.0) {
            return Err(DemError::GeoTransform {
                pixel_width,
                pixel_height,
            });
        }
        Ok(Self {
            origin_x,
            pixel_width,
            origin_y,
            pixel_height,
        })
    }

    /// Builds a transform from GDAL-ordered coefficients, rejecting
    /// rotated grids.
    pub fn from_gdal(coeffs: [C; 6]) -> Result<Self, DemError> {
        let [origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height] = coeffs;
        if row_rotation != 0.0 || col_rotation != 0.0 {
            return Err(DemError::GeoTransform {
                pixel_width,
                pixel_height,
            });
        }
        Self::new(origin_x, pixel_width, origin_y, pixel_height)
    }

    pub fn to_gdal(&self) -> [C; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }

    /// Returns the (column, row) of the cell containing `coord`.
    ///
    /// Indices are not range checked and may be negative. A NaN
    /// component maps to `isize::MIN`, which no grid contains.
    #[allow(clippy::cast_possible_truncation)]
    pub fn coord_to_xy(&self, coord: Coord<C>) -> (isize, isize) {
        let index = |v: C| if v.is_nan() { isize::MIN } else { v.floor() as isize };
        let px = index((coord.x - self.origin_x) / self.pixel_width);
        let py = index((self.origin_y - coord.y) / self.pixel_height.abs());
        (px, py)
    }

    /// Returns the upper-left corner of cell `(x, y)`.
    #[allow(clippy::cast_precision_loss)]
    pub fn xy_to_coord(&self, (x, y): (usize, usize)) -> Coord<C> {
        Coord {
            x: self.origin_x + x as C * self.pixel_width,
            y: self.origin_y + y as C * self.pixel_height,
        }
    }

    /// Cell size, assuming square pixels.
    pub fn cell_size(&self) -> C {
        self.pixel_width
    }

    /// Returns the sampling extent of a `cols` x `rows` grid.
    #[allow(clippy::cast_precision_loss)]
    pub fn extent(&self, (cols, rows): (usize, usize)) -> Extent {
        let last_col = cols.saturating_sub(1) as C;
        let last_row = rows.saturating_sub(1) as C;
        Extent {
            xmin: self.origin_x,
            xmax: self.origin_x + self.pixel_width * last_col,
            ymin: self.origin_y + self.pixel_height * last_row,
            ymax: self.origin_y,
        }
    }
}

/// Rectangle spanned by the upper-left corners of the first and last
/// cells of a grid.
///
/// Transect growth treats this as the raster boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub xmin: C,
    pub xmax: C,
    pub ymin: C,
    pub ymax: C,
}

impl Extent {
    /// Returns true if `coord` lies inside or on the boundary.
    pub fn contains(&self, coord: Coord<C>) -> bool {
        self.xmin <= coord.x && coord.x <= self.xmax && self.ymin <= coord.y && coord.y <= self.ymax
    }

    /// Returns true if `coord` lies strictly inside the boundary.
    pub fn contains_strict(&self, coord: Coord<C>) -> bool {
        self.xmin < coord.x && coord.x < self.xmax && self.ymin < coord.y && coord.y < self.ymax
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, Extent, GeoTransform};
    use approx::assert_relative_eq;

    #[test]
    fn test_rejects_south_up() {
        assert!(GeoTransform::new(0.0, 1.0, 0.0, 1.0).is_err());
        assert!(GeoTransform::new(0.0, 0.0, 0.0, -1.0).is_err());
        assert!(GeoTransform::new(0.0, f64::NAN, 0.0, -1.0).is_err());
        assert!(GeoTransform::from_gdal([0.0, 1.0, 0.5, 10.0, 0.0, -1.0]).is_err());
    }

    #[test]
    fn test_coord_to_xy() {
        let gt = GeoTransform::new(100.0, 10.0, 200.0, -10.0).unwrap();
        assert_eq!(gt.coord_to_xy(Coord { x: 100.0, y: 200.0 }), (0, 0));
        assert_eq!(gt.coord_to_xy(Coord { x: 119.9, y: 180.1 }), (1, 1));
        assert_eq!(gt.coord_to_xy(Coord { x: 120.0, y: 180.0 }), (2, 2));
        assert_eq!(gt.coord_to_xy(Coord { x: 99.0, y: 201.0 }), (-1, -1));
        let corner = gt.xy_to_coord((2, 2));
        assert_eq!(gt.coord_to_xy(corner), (2, 2));
        assert_eq!(
            gt.coord_to_xy(Coord {
                x: f64::NAN,
                y: 190.0
            }),
            (isize::MIN, 1)
        );
    }

    #[test]
    fn test_extent() {
        let gt = GeoTransform::from_gdal([0.0, 2.0, 0.0, 50.0, 0.0, -2.0]).unwrap();
        let extent = gt.extent((11, 6));
        assert_relative_eq!(extent.xmin, 0.0);
        assert_relative_eq!(extent.xmax, 20.0);
        assert_relative_eq!(extent.ymin, 40.0);
        assert_relative_eq!(extent.ymax, 50.0);
        assert_eq!(gt.to_gdal(), [0.0, 2.0, 0.0, 50.0, 0.0, -2.0]);
    }

    #[test]
    fn test_extent_contains() {
        let extent = Extent {
            xmin: 0.0,
            xmax: 10.0,
            ymin: 0.0,
            ymax: 10.0,
        };
        let edge = Coord { x: 10.0, y: 5.0 };
        assert!(extent.contains(edge));
        assert!(!extent.contains_strict(edge));
        assert!(extent.contains_strict(Coord { x: 5.0, y: 5.0 }));
        assert!(!extent.contains(Coord { x: 10.1, y: 5.0 }));
        assert!(!extent.contains(Coord {
            x: f64::NAN,
            y: 5.0
        }));
    }
}
