use crate::{
    aggregator::Stats,
    criterion::Criterion,
    error::{self, SwathError},
    math,
    progress::{CancelToken, NoProgress, Progress},
    transect::{SwathProfile, Transect},
    C,
};
use dem::{Extent, Raster};
use geo::geometry::Coord;
use itertools::Itertools;
use log::{debug, warn};
use rayon::prelude::*;
use std::time::Instant;

/// Tolerance that keeps the closing bearing and radius inside their
/// ranges.
const RANGE_EPS: C = 1e-5;

/// Transects radiating from a center point.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularSwath {
    pub center: Coord<C>,

    pub radius: C,

    /// Requested bearing range in degrees. The last of `bearings` may
    /// fall short of `end`.
    pub start: C,
    pub end: C,

    /// Degrees counter-clockwise from east, one per transect.
    pub bearings: Vec<C>,

    /// Spacing of points along each transect.
    pub radial_step: C,

    pub transects: Vec<Transect>,
}

impl CircularSwath {
    pub fn builder() -> CircularBuilder {
        CircularBuilder::default()
    }

    /// Distances from the center of each column of [SwathProfile::table].
    #[allow(clippy::cast_precision_loss)]
    pub fn distances(&self) -> Vec<C> {
        let longest = self.transects.iter().map(Transect::len).max().unwrap_or(0);
        (0..longest).map(|i| i as C * self.radial_step).collect()
    }

    /// Returns the transect whose bearing is nearest `bearing`, which
    /// must lie within the requested range.
    pub fn slice(&self, bearing: C) -> Result<&Transect, SwathError> {
        if !(self.start..=self.end).contains(&bearing) {
            return Err(SwathError::OutOfRange {
                name: "bearing",
                value: bearing,
                min: self.start,
                max: self.end,
            });
        }
        self.bearings
            .iter()
            .position_min_by(|a, b| (*a - bearing).abs().total_cmp(&(*b - bearing).abs()))
            .and_then(|idx| self.transects.get(idx))
            .ok_or(SwathError::EmptySwath)
    }
}

impl SwathProfile for CircularSwath {
    fn transects(&self) -> &[Transect] {
        &self.transects
    }

    /// One entry per radial distance.
    fn profile_stats(&self) -> Vec<Stats> {
        self.table().column_stats()
    }
}

#[derive(Debug, Clone)]
pub struct CircularBuilder {
    center: Option<Coord<C>>,

    radius: Option<C>,

    /// First bearing, degrees.
    start: C,

    /// Last bearing, degrees, inclusive.
    end: C,

    /// Bearing interval, degrees.
    angle_step: C,

    /// Defaults to the raster cell size.
    radial_step: Option<C>,

    criterion: Criterion,

    parallel: bool,

    cancel: Option<CancelToken>,
}

impl Default for CircularBuilder {
    fn default() -> Self {
        Self {
            center: None,
            radius: None,
            start: 0.0,
            end: 360.0,
            angle_step: 1.0,
            radial_step: None,
            criterion: Criterion::default(),
            parallel: false,
            cancel: None,
        }
    }
}

impl CircularBuilder {
    #[must_use]
    pub fn center(mut self, center: Coord<C>) -> Self {
        self.center = Some(center);
        self
    }

    #[must_use]
    pub fn radius(mut self, radius: C) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Bearings `start..=end` in degrees, counter-clockwise from east.
    #[must_use]
    pub fn angles(mut self, start: C, end: C) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    #[must_use]
    pub fn angle_step(mut self, angle_step: C) -> Self {
        self.angle_step = angle_step;
        self
    }

    #[must_use]
    pub fn radial_step(mut self, radial_step: C) -> Self {
        self.radial_step = Some(radial_step);
        self
    }

    /// [Criterion::Slope] and [Criterion::Tpi] use only their threshold
    /// minimum, applied beyond the crest.
    #[must_use]
    pub fn criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(&self, raster: &Raster) -> Result<CircularSwath, SwathError> {
        self.build_with(raster, &NoProgress)
    }

    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn build_with<P>(&self, raster: &Raster, progress: &P) -> Result<CircularSwath, SwathError>
    where
        P: Progress + ?Sized,
    {
        let center = self.center.ok_or(SwathError::Builder("center"))?;
        if !(center.x.is_finite() && center.y.is_finite()) {
            return Err(SwathError::Builder("center"));
        }
        let radius = self.radius.ok_or(SwathError::Builder("radius"))?;
        let radius = error::finite_positive("radius", radius)?;
        if !(0.0 <= self.start && self.start < self.end && self.end <= 360.0) {
            return Err(SwathError::AngularRange {
                start: self.start,
                end: self.end,
            });
        }
        let angle_step = error::finite_positive("angle_step", self.angle_step)?;
        let radial_step =
            error::finite_positive("radial_step", self.radial_step.unwrap_or_else(|| raster.cell_size()))?;
        self.criterion.validate()?;

        let now = Instant::now();
        let bearings: Vec<C> = math::arange(self.start, self.end + RANGE_EPS, angle_step).collect();
        let radii: Vec<C> = math::arange(0.0, radius + RANGE_EPS, radial_step).collect();
        let caster = Caster {
            raster,
            extent: raster.extent(),
            criterion: self.criterion,
            center,
            radii: &radii,
        };

        let total = bearings.len();
        let transects = if self.parallel {
            let results: Vec<Result<Transect, SwathError>> = bearings
                .par_iter()
                .map(|&bearing| {
                    self.check_cancel()?;
                    caster.transect(bearing)
                })
                .collect();
            let transects = results.into_iter().collect::<Result<Vec<_>, _>>()?;
            for done in 1..=total {
                progress.update(done, total);
            }
            transects
        } else {
            let mut transects = Vec::with_capacity(total);
            for (idx, &bearing) in bearings.iter().enumerate() {
                self.check_cancel()?;
                transects.push(caster.transect(bearing)?);
                progress.update(idx + 1, total);
            }
            transects
        };

        debug!(
            "circular swath; criterion: {}, transects: {}, exec: {:?}",
            self.criterion.name(),
            transects.len(),
            now.elapsed()
        );

        Ok(CircularSwath {
            center,
            radius,
            start: self.start,
            end: self.end,
            bearings,
            radial_step,
            transects,
        })
    }

    fn check_cancel(&self) -> Result<(), SwathError> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(SwathError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Casts single transects outward from the center.
struct Caster<'a> {
    raster: &'a Raster,
    extent: Extent,
    criterion: Criterion,
    center: Coord<C>,
    radii: &'a [C],
}

impl Caster<'_> {
    #[allow(clippy::cast_possible_wrap)]
    fn transect(&self, bearing: C) -> Result<Transect, SwathError> {
        let (sin, cos) = bearing.to_radians().sin_cos();
        let mut points = Vec::new();
        let mut elevations = Vec::new();
        for &r in self.radii {
            let p = Coord {
                x: self.center.x + r * cos,
                y: self.center.y + r * sin,
            };
            if !self.extent.contains(p) {
                break;
            }
            let Some(z) = self.raster.get(p) else {
                break;
            };
            if let Criterion::Elevation(threshold) = self.criterion {
                if !threshold.contains(Some(z)) {
                    break;
                }
            }
            points.push(p);
            elevations.push(z);
        }

        if matches!(self.criterion, Criterion::Slope(_) | Criterion::Tpi { .. }) {
            let len = self.crest_cutoff(bearing, &points, &elevations)?;
            points.truncate(len);
        }
        let offsets = (0..points.len() as isize).collect();
        Ok(Transect::new(self.raster, points, offsets))
    }

    /// Returns how many points to keep: all up to the first point at or
    /// beyond the highest one whose metric falls below the minimum.
    fn crest_cutoff(&self, bearing: C, points: &[Coord<C>], elevations: &[C]) -> Result<usize, SwathError> {
        let Some(crest) = first_max(elevations) else {
            return Ok(0);
        };
        let len = points.len();
        if crest + 1 == len {
            warn!(
                "bearing {bearing}: highest point is the last one; radius may not reach the crest"
            );
            return Ok(len);
        }
        let metric = self.criterion.metric();
        let min = self.criterion.threshold().min;
        let below: Vec<bool> = points[crest..]
            .iter()
            .map(|&p| metric.eval(self.raster, p).map_or(false, |v| v < min))
            .collect();
        if below.iter().all(|&b| b) {
            return Err(SwathError::ThresholdUnreachable {
                criterion: self.criterion.name(),
                min,
                bearing,
            });
        }
        Ok(below.iter().position(|&b| b).map_or(len, |i| crest + i))
    }
}

/// Index of the first occurrence of the largest value.
fn first_max(values: &[C]) -> Option<usize> {
    let mut best: Option<(usize, C)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, top)) if v <= top => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::{first_max, CircularSwath};
    use crate::{
        criterion::{Criterion, Metric, Threshold},
        fixtures,
        progress::CancelToken,
        transect::SwathProfile,
        SwathError,
    };
    use approx::assert_relative_eq;
    use dem::{GeoTransform, Raster};
    use geo::geometry::Coord;
    use std::cell::RefCell;

    const CENTER: Coord<f64> = Coord { x: 50.0, y: 50.0 };

    /// Asserts the crest rule held on every transect: the highest
    /// sample survives, nothing from it onward falls below `min`, and
    /// truncated transects stop right before a failing point.
    fn assert_crest_rule(swath: &CircularSwath, raster: &Raster, metric: Metric, min: f64) {
        for (t, &bearing) in swath.transects.iter().zip(&swath.bearings) {
            let crest = first_max(&t.elevations).unwrap();
            for &p in &t.points[crest..] {
                assert!(metric.eval(raster, p).map_or(true, |v| v >= min));
            }
            let (sin, cos) = bearing.to_radians().sin_cos();
            let r = t.len() as f64 * swath.radial_step;
            let next = Coord {
                x: swath.center.x + r * cos,
                y: swath.center.y + r * sin,
            };
            assert!(metric.eval(raster, next).unwrap() < min);
        }
    }

    #[test]
    fn test_bearings_and_radii() {
        let raster = fixtures::cone();
        let swath = CircularSwath::builder()
            .center(CENTER)
            .radius(10.0)
            .angle_step(90.0)
            .build(&raster)
            .unwrap();
        assert_eq!(swath.bearings, vec![0.0, 90.0, 180.0, 270.0, 360.0]);
        for t in &swath.transects {
            assert_eq!(t.len(), 11);
            assert_eq!(t.offsets, (0..11).collect::<Vec<_>>());
            assert_relative_eq!(t.points[0].x, 50.0);
        }
        let north = &swath.transects[1];
        assert_relative_eq!(north.points[10].y, 60.0, epsilon = 1e-9);
        assert_relative_eq!(north.points[10].x, 50.0, epsilon = 1e-9);

        assert_eq!(swath.distances().len(), 11);
        let stats = swath.profile_stats();
        assert_eq!(stats.len(), 11);
        assert_eq!(stats[0].count, 5);
    }

    #[test]
    fn test_stops_at_boundary_and_nodata() {
        let raster = fixtures::cone();
        let swath = CircularSwath::builder()
            .center(Coord { x: 90.0, y: 50.0 })
            .radius(30.0)
            .angles(0.0, 90.0)
            .angle_step(90.0)
            .build(&raster)
            .unwrap();
        assert_eq!(swath.transects[0].len(), 10);
        assert_eq!(swath.transects[1].len(), 31);

        let gt = GeoTransform::new(0.0, 1.0, 100.0, -1.0).unwrap();
        let holed = Raster::from_fn(gt, (100, 100), |x, _| if x > 60.0 { f64::NAN } else { 1.0 }).unwrap();
        let swath = CircularSwath::builder()
            .center(CENTER)
            .radius(30.0)
            .angles(0.0, 10.0)
            .angle_step(20.0)
            .build(&holed)
            .unwrap();
        assert_eq!(swath.transects.len(), 1);
        assert_eq!(swath.transects[0].len(), 10);
    }

    #[test]
    fn test_slope_truncates_past_crest() {
        let raster = fixtures::cone();
        let swath = CircularSwath::builder()
            .center(CENTER)
            .radius(60.0)
            .angle_step(90.0)
            .criterion(Criterion::Slope(Threshold::at_least(10.0)))
            .build(&raster)
            .unwrap();
        let lens: Vec<usize> = swath.transects.iter().map(|t| t.len()).collect();
        assert!(lens.iter().all(|len| (38..=45).contains(len)), "{lens:?}");
        assert!(lens.iter().max().unwrap() - lens.iter().min().unwrap() <= 2);
        assert_crest_rule(&swath, &raster, Metric::Slope, 10.0);
    }

    #[test]
    fn test_tpi_truncates_at_toe() {
        let raster = fixtures::crater();
        let swath = CircularSwath::builder()
            .center(Coord { x: 60.0, y: 60.0 })
            .radius(55.0)
            .angle_step(45.0)
            .criterion(Criterion::Tpi {
                radius: 3.0,
                threshold: Threshold::at_least(-0.1),
            })
            .build(&raster)
            .unwrap();
        for t in &swath.transects {
            let crest = first_max(&t.elevations).unwrap();
            assert!(t.elevations[crest] > 18.0);
            let last = (t.len() - 1) as f64;
            assert!((40.0..=52.0).contains(&last), "{last}");
        }
        assert_crest_rule(&swath, &raster, Metric::Tpi { radius: 3.0 }, -0.1);
    }

    #[test]
    fn test_unreachable_threshold_is_fatal() {
        let raster = fixtures::cone();
        let result = CircularSwath::builder()
            .center(CENTER)
            .radius(60.0)
            .angle_step(90.0)
            .criterion(Criterion::Slope(Threshold::at_least(80.0)))
            .build(&raster);
        match result {
            Err(SwathError::ThresholdUnreachable { criterion, bearing, .. }) => {
                assert_eq!(criterion, "slope");
                assert_relative_eq!(bearing, 0.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_crest_at_end_keeps_everything() {
        let raster = fixtures::bowl();
        let swath = CircularSwath::builder()
            .center(CENTER)
            .radius(10.0)
            .angle_step(90.0)
            .criterion(Criterion::Slope(Threshold::at_least(10.0)))
            .build(&raster)
            .unwrap();
        assert!(swath.transects.iter().all(|t| t.len() == 11));
    }

    #[test]
    fn test_elevation_threshold() {
        let raster = fixtures::cone();
        let swath = CircularSwath::builder()
            .center(CENTER)
            .radius(60.0)
            .angle_step(45.0)
            .criterion(Criterion::Elevation(Threshold::at_least(10.0)))
            .build(&raster)
            .unwrap();
        for t in &swath.transects {
            assert!(t.len() > 25);
            assert!(t.elevations.iter().all(|&z| z >= 10.0));
        }
        assert_crest_rule(&swath, &raster, Metric::Elevation, 10.0);
    }

    #[test]
    fn test_config_errors() {
        let raster = fixtures::cone();
        assert!(matches!(
            CircularSwath::builder().radius(5.0).build(&raster),
            Err(SwathError::Builder("center"))
        ));
        let builder = CircularSwath::builder().center(CENTER);
        assert!(matches!(builder.build(&raster), Err(SwathError::Builder("radius"))));
        let builder = builder.radius(5.0);
        for (start, end) in [(10.0, 5.0), (0.0, 400.0), (-10.0, 90.0), (90.0, 90.0)] {
            assert!(matches!(
                builder.clone().angles(start, end).build(&raster),
                Err(SwathError::AngularRange { .. })
            ));
        }
        assert!(matches!(
            builder.clone().angle_step(0.0).build(&raster),
            Err(SwathError::Parameter { name: "angle_step", .. })
        ));
        assert!(matches!(
            builder.clone().radial_step(f64::NAN).build(&raster),
            Err(SwathError::Parameter { name: "radial_step", .. })
        ));
        assert!(builder.radius(-1.0).build(&raster).is_err());
    }

    #[test]
    fn test_slice() {
        let raster = fixtures::cone();
        let swath = CircularSwath::builder()
            .center(CENTER)
            .radius(10.0)
            .angle_step(90.0)
            .build(&raster)
            .unwrap();
        let t = swath.slice(100.0).unwrap();
        assert_eq!(t, &swath.transects[1]);
        assert!(matches!(swath.slice(-5.0), Err(SwathError::OutOfRange { .. })));
        assert!(swath.slice(361.0).is_err());

        // Bearings 0, 30, 60 and 90; the range still ends at 100.
        let swath = CircularSwath::builder()
            .center(CENTER)
            .radius(10.0)
            .angles(0.0, 100.0)
            .angle_step(30.0)
            .build(&raster)
            .unwrap();
        assert_eq!(swath.bearings.len(), 4);
        assert_eq!(swath.slice(95.0).unwrap(), &swath.transects[3]);
        assert_eq!(swath.slice(100.0).unwrap(), &swath.transects[3]);
        assert!(matches!(
            swath.slice(100.5),
            Err(SwathError::OutOfRange { max, .. }) if max == 100.0
        ));
    }

    #[test]
    fn test_parallel_progress_and_cancel() {
        let raster = fixtures::cone();
        let builder = CircularSwath::builder()
            .center(CENTER)
            .radius(60.0)
            .angle_step(10.0)
            .criterion(Criterion::Slope(Threshold::at_least(10.0)));
        let sequential = builder.build(&raster).unwrap();
        let calls = RefCell::new(Vec::new());
        let parallel = builder
            .clone()
            .parallel(true)
            .build_with(&raster, &|done: usize, total: usize| {
                calls.borrow_mut().push((done, total));
            })
            .unwrap();
        assert_eq!(sequential, parallel);
        let calls = calls.into_inner();
        assert_eq!(calls.len(), 37);
        assert_eq!(calls.last(), Some(&(37, 37)));

        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            builder.cancel(token).build(&raster),
            Err(SwathError::Cancelled)
        ));
    }

    #[test]
    fn test_first_max() {
        assert_eq!(first_max(&[1.0, 3.0, 2.0, 3.0]), Some(1));
        assert_eq!(first_max(&[5.0]), Some(0));
        assert_eq!(first_max(&[]), None);
    }
}
