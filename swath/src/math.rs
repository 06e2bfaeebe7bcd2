use crate::C;
use geo::geometry::Coord;

/// Returns `start, start + step, ...` for every value below `stop`.
///
/// Values are computed as `start + i * step` so rounding errors do not
/// accumulate.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn arange(start: C, stop: C, step: C) -> impl Iterator<Item = C> {
    let n = ((stop - start) / step).ceil();
    let n = if n > 0.0 { n as usize } else { 0 };
    (0..n).map(move |i| start + i as C * step)
}

/// Unit vector perpendicular to `a -> b`, pointing to its left.
///
/// NaN if `a` and `b` coincide.
pub fn left_normal(a: Coord<C>, b: Coord<C>) -> Coord<C> {
    let (ux, uy) = (b.x - a.x, b.y - a.y);
    let norm = ux.hypot(uy);
    Coord {
        x: -uy / norm,
        y: ux / norm,
    }
}

/// Linearly interpolated `q`th percentile of ascending `sorted`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn percentile(sorted: &[C], q: C) -> C {
    match sorted.len() {
        0 => C::NAN,
        1 => sorted[0],
        n => {
            let rank = q / 100.0 * (n - 1) as C;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as C;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}
