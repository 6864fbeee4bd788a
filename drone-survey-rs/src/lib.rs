//! Post-processing tools for drone surveys.
//!
//! This crate provides tools for:
//! - Evaluating the dip, dip direction and area of triangular facets picked
//!   in DXF drawings, with a perturbation-based variance estimate
//! - Interpolating camera positions from `.MRK` trigger logs and `.pos`
//!   GNSS solutions
//! - Correcting RINEX observation files from the drone's base receiver
//! - Plotting facet poles on an equal-area stereonet
//!
//! # Example
//!
//! ```no_run
//! use drone_survey::processors::facets::analyze_points;
//! use drone_survey::processors::plane::PlaneEvaluator;
//! use std::path::Path;
//!
//! let batch = analyze_points(Path::new("faces.dxf"), &PlaneEvaluator::default()).unwrap();
//! for record in &batch.records {
//!     let m = &record.measurement;
//!     println!("{}: {:.1}/{:.1}", record.label, m.dip, m.dip_direction);
//! }
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{CameraConfig, DxfConfig, PlaneConfig, RinexConfig, SurveyConfig};
pub use crate::core::geometry::Point3D;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
