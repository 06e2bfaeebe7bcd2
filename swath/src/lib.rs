//! Swath profiles over elevation rasters.
//!
//! A swath is a bundle of straight transects sampled from a [Raster],
//! either perpendicular to a baseline ([CurvilinearSwath]) or radiating
//! from a center ([CircularSwath]). A [Criterion] decides how far each
//! transect grows.

mod aggregator;
mod baseline;
mod circular;
mod criterion;
mod cross_section;
mod curvilinear;
pub mod derivatives;
mod error;
mod math;
mod progress;
mod transect;

#[cfg(test)]
mod fixtures;

pub use crate::{
    aggregator::{Stats, SwathTable},
    baseline::Baseline,
    circular::{CircularBuilder, CircularSwath},
    criterion::{Criterion, Metric, Threshold},
    cross_section::CrossSection,
    curvilinear::{Bound, CurvilinearBuilder, CurvilinearSwath},
    error::SwathError,
    progress::{CancelToken, NoProgress, Progress},
    transect::{SwathProfile, Transect},
};
pub use dem::{self, Raster, C};
pub use geo;
