use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::{path::PathBuf, str::FromStr};
use swath::{geo::geometry::Coord, Criterion, Threshold};

/// Generate swath profiles from an elevation tile.
///
/// Distances and coordinates are in the tile's own units.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// NASADEM/SRTM `.hgt` tile.
    #[arg(short, long)]
    pub tile: PathBuf,

    /// Memory map the tile instead of reading it into memory.
    #[arg(long, default_value_t = false)]
    pub memmap: bool,

    /// Generate transects on all cores.
    #[arg(short, long, default_value_t = false)]
    pub parallel: bool,

    /// What to print.
    #[arg(short, long, value_enum, default_value_t = Output::Points)]
    pub output: Output,

    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    pub format: Format,

    #[command(flatten)]
    pub rule: RuleArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone)]
pub struct RuleArgs {
    /// How far transects grow.
    #[arg(short, long, value_enum, default_value_t = Rule::Original)]
    pub criterion: Rule,

    /// Lowest admitted value of the criterion's metric.
    #[arg(long)]
    pub min: Option<f64>,

    /// Highest admitted value of the criterion's metric.
    #[arg(long)]
    pub max: Option<f64>,

    /// TPI neighborhood half-width.
    #[arg(long)]
    pub tpi_radius: Option<f64>,
}

impl RuleArgs {
    pub fn criterion(&self) -> Result<Criterion, AnyError> {
        let threshold = Threshold::new(
            self.min.unwrap_or(f64::NEG_INFINITY),
            self.max.unwrap_or(f64::INFINITY),
        );
        Ok(match self.criterion {
            Rule::Original => Criterion::Original,
            Rule::Elevation => Criterion::Elevation(threshold),
            Rule::Slope => Criterion::Slope(Threshold::new(
                self.min.unwrap_or(0.0),
                self.max.unwrap_or(90.0),
            )),
            Rule::Tpi => Criterion::Tpi {
                radius: self
                    .tpi_radius
                    .ok_or_else(|| anyhow!("--tpi-radius is required with --criterion tpi"))?,
                threshold,
            },
        })
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Original,
    Elevation,
    Slope,
    Tpi,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Every transect point and its elevation.
    Points,

    /// Elevation statistics per transect (curvilinear) or per radial
    /// distance (circular).
    Stats,

    /// Elevation statistics per cross distance, curvilinear only.
    Cross,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Transects perpendicular to a baseline.
    Curvilinear {
        /// Baseline vertex "x,y". Repeat for every vertex, in order.
        #[arg(long = "vertex", required = true, allow_hyphen_values = true)]
        vertices: Vec<XY>,

        /// Full swath width.
        #[arg(short, long)]
        width: f64,

        /// Baseline sampling interval. Defaults to the cell size.
        #[arg(long)]
        line_step: Option<f64>,

        /// Transect sampling interval. Defaults to the cell size.
        #[arg(long)]
        cross_step: Option<f64>,
    },

    /// Transects radiating from a center.
    Circular {
        /// Center "x,y".
        #[arg(long, allow_hyphen_values = true)]
        center: XY,

        #[arg(short, long)]
        radius: f64,

        /// First bearing in degrees counter-clockwise from east.
        #[arg(long, default_value_t = 0.0)]
        start: f64,

        /// Last bearing, inclusive.
        #[arg(long, default_value_t = 360.0)]
        end: f64,

        #[arg(long, default_value_t = 1.0)]
        angle_step: f64,

        /// Radial sampling interval. Defaults to the cell size.
        #[arg(long)]
        radial_step: Option<f64>,
    },
}

#[derive(Clone, Debug, Copy)]
pub struct XY(pub Coord<f64>);

impl FromStr for XY {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (x_str, y_str) = s.split_once(',').ok_or_else(|| anyhow!("not a valid x,y"))?;
        let x = f64::from_str(x_str.trim())?;
        let y = f64::from_str(y_str.trim())?;
        Ok(Self(Coord { x, y }))
    }
}
