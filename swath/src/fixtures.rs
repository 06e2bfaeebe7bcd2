//! Synthetic rasters shared by unit tests.

use dem::{GeoTransform, Raster};

/// 20x20 plane rising eastward by `gradient` per world unit.
pub fn plane(cell: f64, gradient: f64) -> Raster {
    let gt = GeoTransform::new(0.0, cell, 20.0 * cell, -cell).unwrap();
    Raster::from_fn(gt, (20, 20), |x, _| gradient * x).unwrap()
}

/// 100x100 unit-cell cone of height 50 and base radius 40 centered on
/// (50, 50).
pub fn cone() -> Raster {
    let gt = GeoTransform::new(0.0, 1.0, 100.0, -1.0).unwrap();
    Raster::from_fn(gt, (100, 100), |x, y| {
        let d = (x - 50.0).hypot(y - 50.0);
        (50.0 * (1.0 - d / 40.0)).max(0.0)
    })
    .unwrap()
}

/// 100x100 unit-cell bowl whose elevation is the distance from (50, 50).
pub fn bowl() -> Raster {
    let gt = GeoTransform::new(0.0, 1.0, 100.0, -1.0).unwrap();
    Raster::from_fn(gt, (100, 100), |x, y| (x - 50.0).hypot(y - 50.0)).unwrap()
}

/// 200x200 unit-cell raster with a flat band of elevation 10 wherever
/// `|y - 100| <= 20`, zero elsewhere.
pub fn ridge() -> Raster {
    let gt = GeoTransform::new(0.0, 1.0, 200.0, -1.0).unwrap();
    Raster::from_fn(gt, (200, 200), |_, y| {
        if (y - 100.0).abs() <= 20.0 {
            10.0
        } else {
            0.0
        }
    })
    .unwrap()
}

/// 200x200 unit-cell ramp rising northward at 45 degrees for
/// `|y - 100| <= 20`, flat beyond.
pub fn ramp() -> Raster {
    let gt = GeoTransform::new(0.0, 1.0, 200.0, -1.0).unwrap();
    Raster::from_fn(gt, (200, 200), |_, y| (y - 100.0).clamp(-20.0, 20.0)).unwrap()
}

/// 120x120 unit-cell crater: a ring crest of height 20 at distance 30
/// from (60, 60) with linear flanks down to zero.
pub fn crater() -> Raster {
    let gt = GeoTransform::new(0.0, 1.0, 120.0, -1.0).unwrap();
    Raster::from_fn(gt, (120, 120), |x, y| {
        let d = (x - 60.0).hypot(y - 60.0);
        (20.0 - (d - 30.0).abs()).max(0.0)
    })
    .unwrap()
}
