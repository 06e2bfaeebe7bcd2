//! Geo-referenced elevation rasters.
//!
//! A [Raster] is a north-up grid of elevation samples paired with an
//! affine [GeoTransform]. Samples may live in memory or be memory
//! mapped from a NASADEM/SRTM `.hgt` tile.
//!
//! # References
//!
//! 1. [30-Meter SRTM Tile Downloader](https://dwtkns.com/srtm30m)
//! 1. [Archive Team](http://fileformats.archiveteam.org/index.php?title=HGT&oldid=17250)
//! 1. [SRTM Collection User Guide](https://lpdaac.usgs.gov/documents/179/SRTM_User_Guide_V3.pdf)

mod error;
mod geotransform;
mod hgt;

pub use crate::{
    error::DemError,
    geotransform::{Extent, GeoTransform},
};
use byteorder::{BigEndian as BE, ByteOrder};
use geo::geometry::Coord;
use log::debug;
use memmap2::Mmap;
use std::{fs::File, mem::size_of, path::Path};

/// Base floating point type used for all coordinates and samples.
pub type C = f64;

/// Raw values below this are treated as missing unless the raster
/// declares something else.
pub const DEFAULT_NODATA_THRESHOLD: C = -1e10;

/// How missing samples are recognized.
///
/// NaN samples are always missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoData {
    /// Any sample strictly below the threshold is missing.
    Below(C),

    /// Samples equal to this value are missing.
    Value(C),
}

impl Default for NoData {
    fn default() -> Self {
        Self::Below(DEFAULT_NODATA_THRESHOLD)
    }
}

impl NoData {
    pub fn is_nodata(&self, raw: C) -> bool {
        raw.is_nan()
            || match *self {
                Self::Below(threshold) => raw < threshold,
                #[allow(clippy::float_cmp)]
                Self::Value(value) => raw == value,
            }
    }

    /// Maps a raw sample to `None` if it is missing.
    pub fn filter(&self, raw: C) -> Option<C> {
        if self.is_nodata(raw) {
            None
        } else {
            Some(raw)
        }
    }
}

pub struct Raster {
    /// Maps world coordinates to cells.
    transform: GeoTransform,

    /// Number of (columns, rows) in this raster.
    dimensions: (usize, usize),

    /// Missing sample rule.
    nodata: NoData,

    /// Row-major samples, north row first.
    samples: SampleStore,
}

enum SampleStore {
    InMem(Box<[C]>),
    /// Big-endian `i16` samples, as found in `.hgt` files.
    MemMap(Mmap),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> C {
        match self {
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw) => {
                let start = index * size_of::<i16>();
                C::from(BE::read_i16(&raw[start..start + size_of::<i16>()]))
            }
        }
    }
}

impl Raster {
    /// Returns a Raster over in-memory row-major `samples`.
    pub fn new(
        transform: GeoTransform,
        dimensions @ (cols, rows): (usize, usize),
        samples: Vec<C>,
    ) -> Result<Self, DemError> {
        if cols == 0 || rows == 0 || samples.len() != cols * rows {
            return Err(DemError::Dimensions {
                cols,
                rows,
                len: samples.len(),
            });
        }
        Ok(Self {
            transform,
            dimensions,
            nodata: NoData::default(),
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a Raster whose samples are `f(x, y)` evaluated at the
    /// center of every cell.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_fn<F>(transform: GeoTransform, (cols, rows): (usize, usize), f: F) -> Result<Self, DemError>
    where
        F: Fn(C, C) -> C,
    {
        let half_w = transform.pixel_width / 2.0;
        let half_h = transform.pixel_height / 2.0;
        let mut samples = Vec::with_capacity(cols * rows);
        for y in 0..rows {
            for x in 0..cols {
                let Coord { x: cx, y: cy } = transform.xy_to_coord((x, y));
                samples.push(f(cx + half_w, cy + half_h));
            }
        }
        Self::new(transform, (cols, rows), samples)
    }

    /// Returns a Raster read into memory from the `.hgt` file at `path`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let (transform, dimensions @ (cols, rows)) = hgt::geometry(&path)?;
        debug!("loading {:?}", path.as_ref());
        let raw = std::fs::read(&path)?;
        let samples: Box<[C]> = raw
            .chunks_exact(size_of::<i16>())
            .map(|bytes| C::from(BE::read_i16(bytes)))
            .collect();
        if samples.len() != cols * rows {
            return Err(DemError::Dimensions {
                cols,
                rows,
                len: samples.len(),
            });
        }
        Ok(Self {
            transform,
            dimensions,
            nodata: NoData::Value(hgt::VOID),
            samples: SampleStore::InMem(samples),
        })
    }

    /// Returns a Raster using the memory-mapped `.hgt` file as storage.
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, DemError> {
        let (transform, dimensions) = hgt::geometry(&path)?;
        debug!("mapping {:?}", path.as_ref());
        let samples = {
            let file = File::open(path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            SampleStore::MemMap(mmap)
        };
        Ok(Self {
            transform,
            dimensions,
            nodata: NoData::Value(hgt::VOID),
            samples,
        })
    }

    /// Replaces the missing sample rule.
    #[must_use]
    pub fn with_nodata(mut self, nodata: NoData) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Returns the number of (columns, rows).
    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    pub fn nodata(&self) -> NoData {
        self.nodata
    }

    /// Cell size in world units.
    pub fn cell_size(&self) -> C {
        self.transform.cell_size()
    }

    pub fn extent(&self) -> Extent {
        self.transform.extent(self.dimensions)
    }

    /// Returns the number of samples in this raster.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let (cols, rows) = self.dimensions;
        cols * rows
    }

    /// Returns the (column, row) of the cell containing `coord`.
    pub fn coord_to_xy(&self, coord: Coord<C>) -> (isize, isize) {
        self.transform.coord_to_xy(coord)
    }

    /// Returns the sample at the given world coordinates.
    ///
    /// `None` if the coordinates fall outside the grid or the sample
    /// is missing.
    pub fn get(&self, coord: Coord<C>) -> Option<C> {
        let (x, y) = self.coord_to_xy(coord);
        self.get_xy(x, y)
    }

    /// Returns the raw sample at the given world coordinates.
    ///
    /// # Panics
    ///
    /// If the coordinates fall outside the grid.
    #[allow(clippy::cast_sign_loss)]
    pub fn get_unchecked(&self, coord: Coord<C>) -> C {
        let (x, y) = self.coord_to_xy(coord);
        assert!(self.in_grid(x, y), "{coord:?} is outside the raster");
        self.samples
            .get_unchecked(self.xy_to_linear_index((x as usize, y as usize)))
    }

    /// Returns the sample of cell `(x, y)`, if it exists and is not
    /// missing.
    #[allow(clippy::cast_sign_loss)]
    pub fn get_xy(&self, x: isize, y: isize) -> Option<C> {
        if self.in_grid(x, y) {
            let raw = self
                .samples
                .get_unchecked(self.xy_to_linear_index((x as usize, y as usize)));
            self.nodata.filter(raw)
        } else {
            None
        }
    }

    /// Reads the cells of a `width` x `height` window whose upper-left
    /// cell is `(x, y)`, clipped to the grid.
    ///
    /// Missing samples are NaN.
    pub fn window(&self, x: isize, y: isize, width: usize, height: usize) -> Window {
        let (cols, rows) = self.dimensions;
        #[allow(clippy::cast_possible_wrap)]
        let (x0, y0, x1, y1) = (
            x.max(0),
            y.max(0),
            x.saturating_add(width as isize).min(cols as isize),
            y.saturating_add(height as isize).min(rows as isize),
        );
        if x0 >= x1 || y0 >= y1 {
            return Window {
                origin: (x0, y0),
                dimensions: (0, 0),
                samples: Vec::new(),
            };
        }
        #[allow(clippy::cast_sign_loss)]
        let dimensions = ((x1 - x0) as usize, (y1 - y0) as usize);
        let mut samples = Vec::with_capacity(dimensions.0 * dimensions.1);
        for yy in y0..y1 {
            for xx in x0..x1 {
                samples.push(self.get_xy(xx, yy).unwrap_or(C::NAN));
            }
        }
        Window {
            origin: (x0, y0),
            dimensions,
            samples,
        }
    }
}

/// Private API
impl Raster {
    #[allow(clippy::cast_possible_wrap)]
    fn in_grid(&self, x: isize, y: isize) -> bool {
        let (cols, rows) = self.dimensions;
        0 <= x && x < cols as isize && 0 <= y && y < rows as isize
    }

    fn xy_to_linear_index(&self, (x, y): (usize, usize)) -> usize {
        self.dimensions.0 * y + x
    }
}

/// A rectangular block of cells read from a [Raster].
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// (column, row) of the upper-left cell in the parent raster.
    pub origin: (isize, isize),

    /// Number of (columns, rows) read.
    pub dimensions: (usize, usize),

    /// Row-major samples, NaN where missing.
    pub samples: Vec<C>,
}

impl Window {
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the sample at raster cell `(x, y)` if it is inside this
    /// window.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    pub fn get(&self, x: isize, y: isize) -> Option<C> {
        let (dx, dy) = (x - self.origin.0, y - self.origin.1);
        if 0 <= dx && dx < self.dimensions.0 as isize && 0 <= dy && dy < self.dimensions.1 as isize {
            Some(self.samples[dy as usize * self.dimensions.0 + dx as usize])
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Coord, GeoTransform, NoData, Raster, C};

    /// 4x3 raster with samples 0..12 and 10 unit cells.
    fn ramp() -> Raster {
        let gt = GeoTransform::new(0.0, 10.0, 30.0, -10.0).unwrap();
        Raster::new(gt, (4, 3), (0..12).map(C::from).collect()).unwrap()
    }

    #[test]
    fn test_dimension_mismatch() {
        let gt = GeoTransform::new(0.0, 1.0, 0.0, -1.0).unwrap();
        assert!(Raster::new(gt, (3, 3), vec![0.0; 8]).is_err());
        assert!(Raster::new(gt, (0, 3), vec![]).is_err());
    }

    #[test]
    fn test_get() {
        let raster = ramp();
        assert_eq!(raster.get(Coord { x: 0.0, y: 30.0 }), Some(0.0));
        assert_eq!(raster.get(Coord { x: 15.0, y: 25.0 }), Some(1.0));
        assert_eq!(raster.get(Coord { x: 35.0, y: 5.0 }), Some(11.0));
        assert_eq!(raster.get_unchecked(Coord { x: 25.0, y: 15.0 }), 6.0);
    }

    #[test]
    fn test_out_of_bounds_get_returns_none() {
        let raster = ramp();
        // A smidge north.
        assert_eq!(raster.get(Coord { x: 5.0, y: 30.1 }), None);
        // A smidge east.
        assert_eq!(raster.get(Coord { x: 40.1, y: 5.0 }), None);
        // A smidge south.
        assert_eq!(raster.get(Coord { x: 5.0, y: -0.1 }), None);
        // A smidge west.
        assert_eq!(raster.get(Coord { x: -0.1, y: 5.0 }), None);
    }

    #[test]
    fn test_non_finite_get_returns_none() {
        let raster = ramp();
        assert_eq!(raster.get(Coord { x: C::NAN, y: C::NAN }), None);
        assert_eq!(raster.get(Coord { x: 5.0, y: C::NAN }), None);
        assert_eq!(raster.get(Coord { x: C::INFINITY, y: 5.0 }), None);
        assert_eq!(raster.get(Coord { x: 5.0, y: C::NEG_INFINITY }), None);
    }

    #[test]
    #[should_panic]
    fn test_get_unchecked_panics_outside() {
        ramp().get_unchecked(Coord { x: -5.0, y: 5.0 });
    }

    #[test]
    fn test_nodata() {
        let gt = GeoTransform::new(0.0, 1.0, 2.0, -1.0).unwrap();
        let raster = Raster::new(gt, (2, 2), vec![1.0, -1e20, C::NAN, -9999.0]).unwrap();
        assert_eq!(raster.get_xy(0, 0), Some(1.0));
        assert_eq!(raster.get_xy(1, 0), None);
        assert_eq!(raster.get_xy(0, 1), None);
        assert_eq!(raster.get_xy(1, 1), Some(-9999.0));

        let raster = raster.with_nodata(NoData::Value(-9999.0));
        assert_eq!(raster.get_xy(1, 0), Some(-1e20));
        assert_eq!(raster.get_xy(1, 1), None);
    }

    #[test]
    fn test_window_clips_to_grid() {
        let raster = ramp();
        let window = raster.window(-1, -1, 3, 3);
        assert_eq!(window.origin, (0, 0));
        assert_eq!(window.dimensions, (2, 2));
        assert_eq!(window.samples, vec![0.0, 1.0, 4.0, 5.0]);
        assert_eq!(window.get(1, 1), Some(5.0));
        assert_eq!(window.get(2, 1), None);

        let window = raster.window(3, 2, 5, 5);
        assert_eq!(window.samples, vec![11.0]);
    }

    #[test]
    fn test_window_outside_grid_is_empty() {
        let raster = ramp();
        assert!(raster.window(10, 10, 3, 3).is_empty());
        assert!(raster.window(-5, 0, 3, 3).is_empty());
    }

    #[test]
    fn test_from_fn_samples_cell_centers() {
        let gt = GeoTransform::new(0.0, 2.0, 4.0, -2.0).unwrap();
        let raster = Raster::from_fn(gt, (2, 2), |x, y| x * 10.0 + y).unwrap();
        assert_eq!(raster.get_xy(0, 0), Some(13.0));
        assert_eq!(raster.get_xy(1, 1), Some(31.0));
    }
}
