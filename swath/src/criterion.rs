use crate::{derivatives, error::SwathError, C};
use dem::Raster;
use geo::geometry::Coord;

/// A raster quantity evaluated at a point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Elevation,

    /// Degrees, see [derivatives::slope].
    Slope,

    /// Topographic position index over a square of half-width `radius`
    /// world units.
    Tpi { radius: C },
}

impl Metric {
    /// Returns the metric at `coord`, `None` where undefined.
    pub fn eval(&self, raster: &Raster, coord: Coord<C>) -> Option<C> {
        match *self {
            Self::Elevation => raster.get(coord),
            Self::Slope => derivatives::slope(raster, coord),
            Self::Tpi { radius } => derivatives::tpi(raster, coord, radius),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Elevation => "elevation",
            Self::Slope => "slope",
            Self::Tpi { .. } => "tpi",
        }
    }

    fn validate(&self) -> Result<(), SwathError> {
        match *self {
            Self::Tpi { radius } if !(radius.is_finite() && radius >= 0.0) => {
                Err(SwathError::Parameter {
                    name: "tpi radius",
                    value: radius,
                    reason: "must be finite and non-negative",
                })
            }
            _ => Ok(()),
        }
    }
}

/// Inclusive band of admitted metric values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub min: C,
    pub max: C,
}

impl Default for Threshold {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl Threshold {
    pub const UNBOUNDED: Self = Self {
        min: C::NEG_INFINITY,
        max: C::INFINITY,
    };

    pub fn new(min: C, max: C) -> Self {
        Self { min, max }
    }

    /// Admits everything at or above `min`.
    pub fn at_least(min: C) -> Self {
        Self {
            min,
            ..Self::UNBOUNDED
        }
    }

    /// Undefined values are never admitted.
    pub fn contains(&self, value: Option<C>) -> bool {
        value.map_or(false, |v| self.min <= v && v <= self.max)
    }

    fn validate(&self) -> Result<(), SwathError> {
        if self.min.is_nan() || self.max.is_nan() || self.min > self.max {
            return Err(SwathError::Threshold {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Rule deciding how far a transect grows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Criterion {
    /// Grow while samples exist, up to the swath width.
    #[default]
    Original,

    /// Grow while elevation stays inside the threshold.
    Elevation(Threshold),

    /// Grow while slope stays inside the threshold.
    Slope(Threshold),

    /// Grow while TPI stays inside the threshold.
    Tpi { radius: C, threshold: Threshold },
}

impl Criterion {
    /// Metric this criterion thresholds. [Criterion::Original] tests
    /// elevation for presence only.
    pub fn metric(&self) -> Metric {
        match *self {
            Self::Original | Self::Elevation(_) => Metric::Elevation,
            Self::Slope(_) => Metric::Slope,
            Self::Tpi { radius, .. } => Metric::Tpi { radius },
        }
    }

    pub fn threshold(&self) -> Threshold {
        match *self {
            Self::Original => Threshold::UNBOUNDED,
            Self::Elevation(threshold) | Self::Slope(threshold) | Self::Tpi { threshold, .. } => {
                threshold
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Original => "original",
            _ => self.metric().name(),
        }
    }

    /// Returns the metric at `coord` and whether it is admitted.
    pub fn evaluate(&self, raster: &Raster, coord: Coord<C>) -> (Option<C>, bool) {
        let value = self.metric().eval(raster, coord);
        (value, self.threshold().contains(value))
    }

    /// True if a transect's seed must itself pass before its left half
    /// is grown.
    pub(crate) fn gates_seed(&self) -> bool {
        matches!(self, Self::Elevation(_) | Self::Tpi { .. })
    }

    /// True if growth stops on the raster boundary itself, not just
    /// beyond it.
    pub(crate) fn strict_extent(&self) -> bool {
        matches!(self, Self::Slope(_))
    }

    pub(crate) fn validate(&self) -> Result<(), SwathError> {
        self.metric().validate()?;
        self.threshold().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::{Criterion, Metric, Threshold};
    use crate::fixtures;
    use geo::geometry::Coord;

    #[test]
    fn test_threshold_contains() {
        let t = Threshold::new(1.0, 2.0);
        assert!(t.contains(Some(1.0)));
        assert!(t.contains(Some(2.0)));
        assert!(!t.contains(Some(2.5)));
        assert!(!t.contains(None));
        assert!(!Threshold::UNBOUNDED.contains(None));
        assert!(Threshold::at_least(5.0).contains(Some(1e9)));
    }

    #[test]
    fn test_evaluate() {
        let raster = fixtures::ridge();
        let inside = Coord { x: 50.0, y: 110.0 };
        let outside = Coord { x: 50.0, y: 150.0 };
        let off_grid = Coord { x: -50.0, y: 110.0 };

        let elev = Criterion::Elevation(Threshold::at_least(5.0));
        assert_eq!(elev.evaluate(&raster, inside), (Some(10.0), true));
        assert_eq!(elev.evaluate(&raster, outside), (Some(0.0), false));
        assert_eq!(elev.evaluate(&raster, off_grid), (None, false));

        assert_eq!(Criterion::Original.evaluate(&raster, outside), (Some(0.0), true));
        assert_eq!(Criterion::Original.evaluate(&raster, off_grid), (None, false));

        let slope = Criterion::Slope(Threshold::new(0.0, 90.0));
        assert_eq!(slope.evaluate(&raster, inside), (Some(0.0), true));
        assert_eq!(slope.metric(), Metric::Slope);
    }

    #[test]
    fn test_validate() {
        assert!(Criterion::Original.validate().is_ok());
        assert!(Criterion::Elevation(Threshold::new(3.0, 1.0)).validate().is_err());
        assert!(Criterion::Slope(Threshold::new(f64::NAN, 1.0)).validate().is_err());
        let tpi = |radius| Criterion::Tpi {
            radius,
            threshold: Threshold::default(),
        };
        assert!(tpi(30.0).validate().is_ok());
        assert!(tpi(-1.0).validate().is_err());
        assert!(tpi(f64::INFINITY).validate().is_err());
        assert_eq!(tpi(3.0).name(), "tpi");
    }
}
