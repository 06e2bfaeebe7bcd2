mod options;
mod progress;

use anyhow::{bail, Error as AnyError};
use clap::Parser;
use log::info;
use options::{Cli, Command as CliCmd, Format, Output, XY};
use serde::Serialize;
use std::io::Write;
use swath::{
    geo::geometry::LineString, CircularSwath, CurvilinearSwath, Raster, Stats, SwathProfile,
};

fn main() -> Result<(), AnyError> {
    let cli = Cli::parse();
    let Cli {
        tile,
        memmap,
        parallel,
        output,
        format,
        rule,
        cmd,
    } = cli;

    env_logger::init();

    let criterion = rule.criterion()?;
    let raster = if memmap {
        Raster::memmap(&tile)?
    } else {
        Raster::load(&tile)?
    };
    info!(
        "{}: {:?} cells of size {}",
        tile.display(),
        raster.dimensions(),
        raster.cell_size()
    );

    let pb = progress::bar(format!("{} swath", criterion.name()));
    #[allow(clippy::cast_possible_truncation)]
    let update = |done: usize, total: usize| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    };

    match cmd {
        CliCmd::Curvilinear {
            vertices,
            width,
            line_step,
            cross_step,
        } => {
            let baseline: LineString<f64> = vertices.into_iter().map(|XY(coord)| coord).collect();
            let mut builder = CurvilinearSwath::builder()
                .width(width)
                .criterion(criterion)
                .parallel(parallel);
            if let Some(line_step) = line_step {
                builder = builder.line_step(line_step);
            }
            if let Some(cross_step) = cross_step {
                builder = builder.cross_step(cross_step);
            }
            let swath = builder.build_with(&raster, &baseline, &update)?;
            pb.finish_and_clear();
            match output {
                Output::Points => print_points(&swath, format)?,
                Output::Stats => print_stats(&swath.distances, &swath.profile_stats(), format)?,
                Output::Cross => {
                    let cross = swath.cross_section(&swath.elevations(), swath.segment(None, None));
                    print_stats(&cross.distances, &cross.stats(), format)?;
                }
            }
        }
        CliCmd::Circular {
            center: XY(center),
            radius,
            start,
            end,
            angle_step,
            radial_step,
        } => {
            if output == Output::Cross {
                bail!("cross sections need a baseline");
            }
            let mut builder = CircularSwath::builder()
                .center(center)
                .radius(radius)
                .angles(start, end)
                .angle_step(angle_step)
                .criterion(criterion)
                .parallel(parallel);
            if let Some(radial_step) = radial_step {
                builder = builder.radial_step(radial_step);
            }
            let swath = builder.build_with(&raster, &update)?;
            pb.finish_and_clear();
            match output {
                Output::Points => print_points(&swath, format)?,
                _ => print_stats(&swath.distances(), &swath.profile_stats(), format)?,
            }
        }
    }
    Ok(())
}

fn print_points<S: SwathProfile>(swath: &S, format: Format) -> Result<(), AnyError> {
    match format {
        Format::Csv => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "Transect,Offset,X,Y,Elevation")?;
            for (idx, transect) in swath.transects().iter().enumerate() {
                for ((point, elevation), offset) in transect
                    .points
                    .iter()
                    .zip(&transect.elevations)
                    .zip(&transect.offsets)
                {
                    writeln!(stdout, "{idx},{offset},{},{},{elevation}", point.x, point.y)?;
                }
            }
        }
        Format::Json => {
            #[derive(Serialize)]
            struct JsonTransect<'a> {
                offsets: &'a [isize],
                points: Vec<[f64; 3]>,
            }

            let reshaped: Vec<JsonTransect> = swath
                .transects()
                .iter()
                .map(|transect| JsonTransect {
                    offsets: &transect.offsets,
                    points: transect
                        .points
                        .iter()
                        .zip(&transect.elevations)
                        .map(|(point, elevation)| [point.x, point.y, *elevation])
                        .collect(),
                })
                .collect();
            let json = serde_json::to_string(&reshaped)?;
            println!("{json}");
        }
    }
    Ok(())
}

fn print_stats(distances: &[f64], stats: &[Stats], format: Format) -> Result<(), AnyError> {
    match format {
        Format::Csv => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "Distance,Min,Q1,Mean,Q3,Max,Count")?;
            for (distance, s) in distances.iter().zip(stats) {
                writeln!(
                    stdout,
                    "{distance},{},{},{},{},{},{}",
                    s.min, s.q1, s.mean, s.q3, s.max, s.count
                )?;
            }
        }
        Format::Json => {
            #[derive(Serialize)]
            struct JsonStats<'a> {
                distance: f64,
                #[serde(flatten)]
                stats: &'a Stats,
            }

            let reshaped: Vec<JsonStats> = distances
                .iter()
                .zip(stats)
                .map(|(&distance, stats)| JsonStats { distance, stats })
                .collect();
            let json = serde_json::to_string(&reshaped)?;
            println!("{json}");
        }
    }
    Ok(())
}
