use crate::C;
use geo::{
    geometry::{Coord, LineString},
    EuclideanLength, LineInterpolatePoint,
};

/// A polyline that transects are seeded along.
pub trait Baseline {
    /// Total length in world units.
    fn length(&self) -> C;

    /// Returns the point `distance` world units along the line.
    fn interpolate(&self, distance: C) -> Option<Coord<C>>;

    /// Returns the vertices.
    fn vertices(&self) -> Vec<Coord<C>>;
}

impl Baseline for LineString<C> {
    fn length(&self) -> C {
        self.euclidean_length()
    }

    fn interpolate(&self, distance: C) -> Option<Coord<C>> {
        let length = self.length();
        if length > 0.0 {
            self.line_interpolate_point(distance / length).map(|p| p.0)
        } else {
            self.0.first().copied()
        }
    }

    fn vertices(&self) -> Vec<Coord<C>> {
        self.0.clone()
    }
}

/// Returns points every `step` world units along `baseline`, starting
/// at its first vertex. The final vertex is included only if the length
/// is a multiple of `step`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub(crate) fn sample_points<B: Baseline + ?Sized>(baseline: &B, step: C) -> Vec<Coord<C>> {
    let length = baseline.length();
    let n = (length / step).floor() as usize;
    (0..=n)
        .filter_map(|i| baseline.interpolate(i as C * step))
        .collect()
}
