//! NASADEM/SRTM `.hgt` tile geometry.
//!
//! A tile is a headerless square grid of big-endian `i16` samples,
//! north row first. Its name encodes the southwest corner, whose
//! sample is centered on the integer degree.

use crate::{DemError, GeoTransform, C};
use geo::geometry::Coord;
use std::{mem::size_of, path::Path};

/// Sample value marking a data void.
pub(crate) const VOID: C = -32768.0;

const ARCSEC_PER_DEG: C = 3600.0;

/// Returns the transform and (columns, rows) of the tile at `path`.
pub(crate) fn geometry<P: AsRef<Path>>(path: P) -> Result<(GeoTransform, (usize, usize)), DemError> {
    let (resolution, dimensions @ (cols, _)) = extract_resolution(&path)?;
    let sw_corner = parse_sw_corner(&path)?;
    let cell = C::from(resolution) / ARCSEC_PER_DEG;
    #[allow(clippy::cast_precision_loss)]
    let north = C::from(sw_corner.y) + (cols - 1) as C * cell;
    let transform = GeoTransform::new(
        C::from(sw_corner.x) - cell / 2.0,
        cell,
        north + cell / 2.0,
        -cell,
    )?;
    Ok((transform, dimensions))
}

fn extract_resolution<P: AsRef<Path>>(path: P) -> Result<(u8, (usize, usize)), DemError> {
    const RES_1_ARCSECONDS_FILE_LEN: u64 = 3601 * 3601 * size_of::<u16>() as u64;
    const RES_3_ARCSECONDS_FILE_LEN: u64 = 1201 * 1201 * size_of::<u16>() as u64;
    match path.as_ref().metadata().map(|m| m.len())? {
        RES_1_ARCSECONDS_FILE_LEN => Ok((1, (3601, 3601))),
        RES_3_ARCSECONDS_FILE_LEN => Ok((3, (1201, 1201))),
        invalid_len => Err(DemError::HgtLen(invalid_len, path.as_ref().to_owned())),
    }
}

fn parse_sw_corner<P: AsRef<Path>>(path: P) -> Result<Coord<i16>, DemError> {
    let mk_err = || DemError::HgtName(path.as_ref().to_owned());
    let name = path
        .as_ref()
        .file_stem()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(mk_err)?;
    if name.len() != 7 || !name.is_ascii() {
        return Err(mk_err());
    }
    let lat_sign = match &name[0..1] {
        "N" | "n" => 1,
        "S" | "s" => -1,
        _ => return Err(mk_err()),
    };
    let lat = lat_sign * name[1..3].parse::<i16>().map_err(|_| mk_err())?;
    let lon_sign = match &name[3..4] {
        "E" | "e" => 1,
        "W" | "w" => -1,
        _ => return Err(mk_err()),
    };
    let lon = lon_sign * name[4..7].parse::<i16>().map_err(|_| mk_err())?;
    Ok(Coord { x: lon, y: lat })
}
