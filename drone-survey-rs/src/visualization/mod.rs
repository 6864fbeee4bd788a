//! Visualization tools for facet orientations and camera tracks.
//!
//! This module renders PNG plots with the plotters bitmap backend:
//! - an equal-area (Schmidt) lower-hemisphere stereonet of facet poles
//! - the East/North track of interpolated camera positions
//!
//! No text is drawn, so no font backend is required.

use std::f64::consts::SQRT_2;
use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::processors::camera::CameraPosition;
use crate::processors::plane::{normalize_azimuth, PlaneMeasurement};

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("Plotting error: {0}")]
    PlottingError(String),

    #[error("Nothing to plot")]
    Empty,
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Stereonet image size in pixels (square).
const STEREONET_SIZE: u32 = 1080;

/// Default track plot width in pixels.
const DEFAULT_WIDTH: u32 = 1920;

/// Default track plot height in pixels.
const DEFAULT_HEIGHT: u32 = 1080;

/// Pole colors by dip class: gentle (< 30°), moderate, steep (>= 60°).
const POLE_COLORS: [(u8, u8, u8); 3] = [
    (55, 126, 184), // Blue
    (77, 175, 74),  // Green
    (228, 26, 28),  // Red
];

fn plot_err<E: std::fmt::Display>(e: E) -> VisualizationError {
    VisualizationError::PlottingError(e.to_string())
}

/// Position of a plane's pole on a unit lower-hemisphere Schmidt net.
///
/// The pole plunges `90 - dip` towards `dip direction + 180`; its
/// equal-area radius is `sqrt(2) * sin(dip / 2)`, so horizontal planes plot
/// at the centre and vertical planes on the primitive circle. Returns
/// (east, north).
pub fn pole_position(dip: f64, dip_direction: f64) -> (f64, f64) {
    let trend = normalize_azimuth(dip_direction + 180.0).to_radians();
    let radius = SQRT_2 * (dip.to_radians() / 2.0).sin();
    (radius * trend.sin(), radius * trend.cos())
}

fn dip_color(dip: f64) -> RGBColor {
    let (r, g, b) = match dip {
        d if d < 30.0 => POLE_COLORS[0],
        d if d < 60.0 => POLE_COLORS[1],
        _ => POLE_COLORS[2],
    };
    RGBColor(r, g, b)
}

/// Plot facet poles on an equal-area lower-hemisphere stereonet and save
/// as PNG.
pub fn plot_poles(output_path: &Path, measurements: &[PlaneMeasurement]) -> Result<()> {
    if measurements.is_empty() {
        return Err(VisualizationError::Empty);
    }

    let root = BitMapBackend::new(output_path, (STEREONET_SIZE, STEREONET_SIZE))
        .into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(-1.05f64..1.05f64, -1.05f64..1.05f64)
        .map_err(plot_err)?;

    // primitive circle
    chart
        .draw_series(LineSeries::new(
            (0..=360).map(|deg| {
                let a = (deg as f64).to_radians();
                (a.sin(), a.cos())
            }),
            BLACK.stroke_width(2),
        ))
        .map_err(plot_err)?;

    // centre cross and North tick
    chart
        .draw_series([
            PathElement::new(vec![(-0.03, 0.0), (0.03, 0.0)], BLACK),
            PathElement::new(vec![(0.0, -0.03), (0.0, 0.03)], BLACK),
            PathElement::new(vec![(0.0, 1.0), (0.0, 1.05)], BLACK.stroke_width(2)),
        ])
        .map_err(plot_err)?;

    chart
        .draw_series(measurements.iter().map(|m| {
            let (x, y) = pole_position(m.dip, m.dip_direction);
            Circle::new((x, y), 5, dip_color(m.dip).filled())
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Plot camera positions (East vs North) joined in image order and save
/// as PNG.
pub fn plot_camera_track(output_path: &Path, positions: &[CameraPosition]) -> Result<()> {
    if positions.is_empty() {
        return Err(VisualizationError::Empty);
    }

    let points: Vec<(f64, f64)> = positions.iter().map(|p| (p.east, p.north)).collect();

    let (x_min, x_max, y_min, y_max) = compute_bounds(&points);
    let x_padding = (x_max - x_min) * 0.05;
    let y_padding = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(output_path, (DEFAULT_WIDTH, DEFAULT_HEIGHT))
        .into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            (y_min - y_padding)..(y_max + y_padding),
        )
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            points.iter().copied(),
            RGBColor(153, 153, 153),
        ))
        .map_err(plot_err)?;

    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 3, RGBColor(100, 149, 237).filled())),
        )
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Compute the bounds (min/max) for x and y coordinates.
fn compute_bounds(points: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for &(x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}
