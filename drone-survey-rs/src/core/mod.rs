//! Core geometry types and I/O operations.

pub mod geometry;
pub mod loaders;
pub mod writers;

pub use geometry::{Point3D, Vector3};
pub use loaders::{LoaderError, MrkEvent, Polyline, PosSample};
pub use writers::{write_camera_positions, write_face_report, write_polyline_report, WriteError};
