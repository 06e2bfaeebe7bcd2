use crate::{
    aggregator::{Stats, SwathTable},
    criterion::{Metric, Threshold},
    error::SwathError,
    C,
};
use dem::Raster;
use geo::geometry::Coord;

/// Sample points along one straight line of a swath.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transect {
    /// Sample locations. Left to right across a baseline, or outward
    /// from a center.
    pub points: Vec<Coord<C>>,

    /// Elevation at each point, NaN where missing.
    pub elevations: Vec<C>,

    /// Signed step count from the seed point to each point. Negative
    /// on the left of a baseline.
    pub offsets: Vec<isize>,
}

impl Transect {
    pub(crate) fn new(raster: &Raster, points: Vec<Coord<C>>, offsets: Vec<isize>) -> Self {
        debug_assert_eq!(points.len(), offsets.len());
        let elevations = points
            .iter()
            .map(|&p| raster.get(p).unwrap_or(C::NAN))
            .collect();
        Self {
            points,
            elevations,
            offsets,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the seed point, if it was admitted.
    pub fn seed_index(&self) -> Option<usize> {
        self.offsets.iter().position(|&offset| offset == 0)
    }

    /// First and last points.
    pub fn endpoints(&self) -> Option<(Coord<C>, Coord<C>)> {
        Some((*self.points.first()?, *self.points.last()?))
    }

    /// Returns `metric` at every point, NaN where undefined.
    pub fn sample(&self, raster: &Raster, metric: Metric) -> Vec<C> {
        self.points
            .iter()
            .map(|&p| metric.eval(raster, p).unwrap_or(C::NAN))
            .collect()
    }

    /// Returns elevations, replacing those whose `metric` falls outside
    /// `threshold` with NaN.
    pub fn mask(&self, raster: &Raster, metric: Metric, threshold: Threshold) -> Vec<C> {
        self.points
            .iter()
            .zip(&self.elevations)
            .map(|(&p, &z)| {
                if threshold.contains(metric.eval(raster, p)) {
                    z
                } else {
                    C::NAN
                }
            })
            .collect()
    }
}

/// Operations shared by every kind of swath.
pub trait SwathProfile {
    fn transects(&self) -> &[Transect];

    /// Per-position statistics in the natural orientation of the swath.
    fn profile_stats(&self) -> Vec<Stats>;

    /// True if no transect holds any point.
    fn is_empty(&self) -> bool {
        self.transects().iter().all(Transect::is_empty)
    }

    /// Ragged elevation rows, one per transect.
    fn elevations(&self) -> Vec<Vec<C>> {
        self.transects()
            .iter()
            .map(|t| t.elevations.clone())
            .collect()
    }

    /// Elevation rows padded into a table.
    fn table(&self) -> SwathTable {
        SwathTable::new(self.elevations())
    }

    /// Resamples `metric` along every transect.
    fn sample(&self, raster: &Raster, metric: Metric) -> Vec<Vec<C>> {
        self.transects()
            .iter()
            .map(|t| t.sample(raster, metric))
            .collect()
    }

    /// Masks every transect's elevations by `metric`. Row lengths are
    /// preserved.
    fn mask(&self, raster: &Raster, metric: Metric, threshold: Threshold) -> Vec<Vec<C>> {
        self.transects()
            .iter()
            .map(|t| t.mask(raster, metric, threshold))
            .collect()
    }

    /// First and last point of every non-empty transect.
    fn endpoints(&self) -> Result<Vec<(Coord<C>, Coord<C>)>, SwathError> {
        let endpoints: Vec<_> = self
            .transects()
            .iter()
            .filter_map(Transect::endpoints)
            .collect();
        if endpoints.is_empty() {
            return Err(SwathError::EmptySwath);
        }
        Ok(endpoints)
    }
}
