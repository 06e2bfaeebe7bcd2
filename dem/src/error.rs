use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DemError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("invalid HGT name {0}")]
    HgtName(PathBuf),

    #[error("invalid HGT file len {0} for {1}")]
    HgtLen(u64, PathBuf),

    #[error("{len} samples do not fill a {cols}x{rows} grid")]
    Dimensions { cols: usize, rows: usize, len: usize },

    #[error("geotransform is not north-up: pixel size ({pixel_width}, {pixel_height})")]
    GeoTransform { pixel_width: f64, pixel_height: f64 },
}
