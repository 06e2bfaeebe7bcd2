//! Local terrain derivatives.

use crate::C;
use dem::Raster;
use geo::geometry::Coord;

/// Slope in degrees at `coord`, using Horn's 3x3 finite differences.
///
/// Neighbors beyond the grid edge replicate the nearest edge cell.
/// `None` if `coord` is outside the grid or any kernel cell is missing.
#[allow(clippy::cast_possible_wrap)]
pub fn slope(raster: &Raster, coord: Coord<C>) -> Option<C> {
    let (x, y) = raster.coord_to_xy(coord);
    let (cols, rows) = raster.dimensions();
    let (max_x, max_y) = (cols as isize - 1, rows as isize - 1);
    if !(0..=max_x).contains(&x) || !(0..=max_y).contains(&y) {
        return None;
    }
    let window = raster.window(x - 1, y - 1, 3, 3);
    let z = |dx: isize, dy: isize| -> C {
        window
            .get((x + dx).clamp(0, max_x), (y + dy).clamp(0, max_y))
            .unwrap_or(C::NAN)
    };

    let (nw, n, ne) = (z(-1, -1), z(0, -1), z(1, -1));
    let (w, e) = (z(-1, 0), z(1, 0));
    let (sw, s, se) = (z(-1, 1), z(0, 1), z(1, 1));

    let denom = 8.0 * raster.cell_size();
    let dz_dx = ((ne + 2.0 * e + se) - (nw + 2.0 * w + sw)) / denom;
    let dz_dy = ((sw + 2.0 * s + se) - (nw + 2.0 * n + ne)) / denom;
    let degrees = dz_dx.hypot(dz_dy).atan().to_degrees();
    (!degrees.is_nan()).then_some(degrees)
}

/// Topographic position index at `coord`: the center elevation minus
/// the mean of the other valid cells within a square of half-width
/// `radius` world units.
///
/// The square is clipped to the grid, so radii beyond the grid size
/// cover the whole grid. `None` if the center is missing
/// or no other valid cell exists.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn tpi(raster: &Raster, coord: Coord<C>, radius: C) -> Option<C> {
    let (x, y) = raster.coord_to_xy(coord);
    let center = raster.get_xy(x, y)?;
    let (cols, rows) = raster.dimensions();
    #[allow(clippy::cast_possible_wrap)]
    let half = ((radius / raster.cell_size()).floor() as isize).min(cols.max(rows) as isize);
    let span = (2 * half + 1) as usize;
    let window = raster.window(x - half, y - half, span, span);
    let (sum, count) = window
        .samples
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count <= 1 {
        return None;
    }
    let neighborhood_mean = (sum - center) / (count - 1) as C;
    Some(center - neighborhood_mean)
}
