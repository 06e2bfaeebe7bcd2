use crate::{
    aggregator::Stats,
    baseline::{self, Baseline},
    criterion::Criterion,
    cross_section::CrossSection,
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
use std::{ops::Range, time::Instant};

/// Transects laid perpendicular to a baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvilinearSwath {
    /// Baseline sample points. Transect `i` is seeded at `baseline[i]`.
    pub baseline: Vec<Coord<C>>,

    /// Distance along the baseline of each sample point.
    pub distances: Vec<C>,

    /// Spacing of baseline sample points.
    pub line_step: C,

    /// Spacing of points along each transect.
    pub cross_step: C,

    /// Empty if the baseline yielded fewer than two sample points.
    pub transects: Vec<Transect>,
}

/// Selects one end of a run of transects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Nearest distance along the baseline.
    Distance(C),

    /// Nearest baseline sample point.
    Coord(Coord<C>),
}

impl CurvilinearSwath {
    pub fn builder() -> CurvilinearBuilder {
        CurvilinearBuilder::default()
    }

    /// Returns the index range of transects from `start` up to, but not
    /// including, `end`.
    ///
    /// Missing bounds extend to the ends of the swath. The range is
    /// empty if `end` does not follow `start`.
    pub fn segment(&self, start: Option<Bound>, end: Option<Bound>) -> Range<usize> {
        let start = start.map_or(0, |bound| self.nearest(bound));
        let end = end.map_or(self.transects.len(), |bound| self.nearest(bound));
        let end = end.min(self.transects.len());
        start.min(end)..end
    }

    /// Returns the transect seeded nearest to `distance` along the
    /// baseline.
    pub fn slice(&self, distance: C) -> Result<&Transect, SwathError> {
        let max = self.distances.last().copied().unwrap_or(0.0);
        if !(0.0..=max).contains(&distance) {
            return Err(SwathError::OutOfRange {
                name: "distance",
                value: distance,
                min: 0.0,
                max,
            });
        }
        self.transects
            .get(self.nearest(Bound::Distance(distance)))
            .ok_or(SwathError::EmptySwath)
    }

    /// Aligns `values`, one row per transect, across the transects in
    /// `range`.
    pub fn cross_section(&self, values: &[Vec<C>], range: Range<usize>) -> CrossSection {
        let clip = |r: &Range<usize>, len: usize| {
            let end = r.end.min(len);
            r.start.min(end)..end
        };
        let transects = &self.transects[clip(&range, self.transects.len())];
        let values = &values[clip(&range, values.len())];
        CrossSection::new(transects, values, self.cross_step)
    }

    fn nearest(&self, bound: Bound) -> usize {
        let found = match bound {
            Bound::Distance(d) => self
                .distances
                .iter()
                .position_min_by(|a, b| (*a - d).abs().total_cmp(&(*b - d).abs())),
            Bound::Coord(c) => self.baseline.iter().position_min_by(|a, b| {
                let da = (a.x - c.x).hypot(a.y - c.y);
                let db = (b.x - c.x).hypot(b.y - c.y);
                da.total_cmp(&db)
            }),
        };
        found.unwrap_or(0)
    }
}

impl SwathProfile for CurvilinearSwath {
    fn transects(&self) -> &[Transect] {
        &self.transects
    }

    /// One entry per transect.
    fn profile_stats(&self) -> Vec<Stats> {
        self.table().row_stats()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CurvilinearBuilder {
    /// Full swath width, split evenly either side of the baseline.
    width: Option<C>,

    /// Baseline sampling interval. Defaults to the raster cell size.
    line_step: Option<C>,

    /// Transect sampling interval. Defaults to the raster cell size.
    cross_step: Option<C>,

    criterion: Criterion,

    parallel: bool,

    cancel: Option<CancelToken>,
}

impl CurvilinearBuilder {
    #[must_use]
    pub fn width(mut self, width: C) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn line_step(mut self, line_step: C) -> Self {
        self.line_step = Some(line_step);
        self
    }

    #[must_use]
    pub fn cross_step(mut self, cross_step: C) -> Self {
        self.cross_step = Some(cross_step);
        self
    }

    #[must_use]
    pub fn criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Generate transects on the rayon thread pool.
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

    pub fn build<B>(&self, raster: &Raster, baseline: &B) -> Result<CurvilinearSwath, SwathError>
    where
        B: Baseline + ?Sized,
    {
        self.build_with(raster, baseline, &NoProgress)
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn build_with<B, P>(
        &self,
        raster: &Raster,
        baseline: &B,
        progress: &P,
    ) -> Result<CurvilinearSwath, SwathError>
    where
        B: Baseline + ?Sized,
        P: Progress + ?Sized,
    {
        let width = self.width.ok_or(SwathError::Builder("width"))?;
        let half_width = error::positive("width", width)? / 2.0;
        let line_step =
            error::finite_positive("line_step", self.line_step.unwrap_or_else(|| raster.cell_size()))?;
        let cross_step =
            error::finite_positive("cross_step", self.cross_step.unwrap_or_else(|| raster.cell_size()))?;
        self.criterion.validate()?;
        if baseline.vertices().is_empty() {
            return Err(SwathError::Builder("baseline"));
        }

        let now = Instant::now();
        let points = baseline::sample_points(baseline, line_step);
        let distances = (0..points.len()).map(|i| i as C * line_step).collect();

        let grower = Grower {
            raster,
            extent: raster.extent(),
            criterion: self.criterion,
            half_width,
            step: cross_step,
        };
        let total = points.len();
        let transects = if total < 2 {
            warn!(
                "baseline of length {} yields {} sample points at step {}; no transects",
                baseline.length(),
                total,
                line_step
            );
            Vec::new()
        } else if self.parallel {
            let results: Vec<Result<Transect, SwathError>> = (0..total)
                .into_par_iter()
                .map(|idx| {
                    self.check_cancel()?;
                    Ok(grower.transect(&points, idx))
                })
                .collect();
            let transects = results.into_iter().collect::<Result<Vec<_>, _>>()?;
            for done in 1..=total {
                progress.update(done, total);
            }
            transects
        } else {
            let mut transects = Vec::with_capacity(total);
            for idx in 0..total {
                self.check_cancel()?;
                transects.push(grower.transect(&points, idx));
                progress.update(idx + 1, total);
            }
            transects
        };

        debug!(
            "curvilinear swath; criterion: {}, transects: {}, exec: {:?}",
            self.criterion.name(),
            transects.len(),
            now.elapsed()
        );

        Ok(CurvilinearSwath {
            baseline: points,
            distances,
            line_step,
            cross_step,
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

/// Grows single transects outward from their seeds.
struct Grower<'a> {
    raster: &'a Raster,
    extent: Extent,
    criterion: Criterion,
    half_width: C,
    step: C,
}

impl Grower<'_> {
    /// Builds the transect seeded at `points[idx]`, perpendicular to
    /// the segment from it to the next point (or from the previous
    /// point, for the last).
    #[allow(clippy::cast_possible_wrap)]
    fn transect(&self, points: &[Coord<C>], idx: usize) -> Transect {
        let (a, b) = if idx + 1 < points.len() {
            (points[idx], points[idx + 1])
        } else {
            (points[idx - 1], points[idx])
        };
        let seed = points[idx];
        let left = math::left_normal(a, b);
        let right = Coord {
            x: -left.x,
            y: -left.y,
        };

        let mut coords = Vec::new();
        let mut offsets = Vec::new();
        if !self.criterion.gates_seed() || self.admits(seed) {
            let grown = self.grow(seed, left);
            for (i, p) in grown.into_iter().enumerate().rev() {
                coords.push(p);
                offsets.push(-(i as isize + 1));
            }
            coords.push(seed);
            offsets.push(0);
        }
        for (i, p) in self.grow(seed, right).into_iter().enumerate() {
            coords.push(p);
            offsets.push(i as isize + 1);
        }
        Transect::new(self.raster, coords, offsets)
    }

    /// Returns admitted points stepping from `seed` along `dir`,
    /// nearest first, excluding the seed.
    #[allow(clippy::cast_precision_loss)]
    fn grow(&self, seed: Coord<C>, dir: Coord<C>) -> Vec<Coord<C>> {
        let capped = matches!(self.criterion, Criterion::Original);
        let max_steps = (self.half_width / self.step).floor();
        let mut out = Vec::new();
        for i in 1_usize.. {
            if capped && i as C > max_steps {
                break;
            }
            let reach = i as C * self.step;
            let p = Coord {
                x: seed.x + dir.x * reach,
                y: seed.y + dir.y * reach,
            };
            if !self.in_extent(p) {
                break;
            }
            if !capped && reach >= self.half_width {
                break;
            }
            if !self.admits(p) {
                break;
            }
            out.push(p);
        }
        out
    }

    fn admits(&self, p: Coord<C>) -> bool {
        self.in_extent(p) && self.criterion.evaluate(self.raster, p).1
    }

    fn in_extent(&self, p: Coord<C>) -> bool {
        if self.criterion.strict_extent() {
            self.extent.contains_strict(p)
        } else {
            self.extent.contains(p)
        }
    }
}
