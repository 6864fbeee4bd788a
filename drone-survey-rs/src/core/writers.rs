//! Report writers for facet measurements, camera positions and text files.
//!
//! Writers own all rounding: measurements arrive unrounded and are
//! formatted here.
//! - Face report (CSV): coordinates to 6 decimals, angles and area to 2
//! - Polyline report: a coordinate section (2 decimals) and a geological
//!   section (angles to 1 decimal, area and trace to 2), separated by a
//!   blank line
//! - Camera positions: `name,east,north,elevation`, no header

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::processors::camera::CameraPosition;
use crate::processors::facets::FacetRecord;

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Header of the face report.
pub const FACE_HEADER: [&str; 14] = [
    "Point1_X",
    "Point1_Y",
    "Point1_Z",
    "Point2_X",
    "Point2_Y",
    "Point2_Z",
    "Point3_X",
    "Point3_Y",
    "Point3_Z",
    "Dip",
    "Dip_Direction",
    "Area",
    "Dip_Variance",
    "Dip_Direction_Variance",
];

const POLYLINE_COORD_HEADER: [&str; 10] = [
    "Polyline",
    "Vertex1_X",
    "Vertex1_Y",
    "Vertex1_Z",
    "Vertex2_X",
    "Vertex2_Y",
    "Vertex2_Z",
    "Vertex3_X",
    "Vertex3_Y",
    "Vertex3_Z",
];

const POLYLINE_GEOLOGY_HEADER: [&str; 7] = [
    "Polyline",
    "Dip",
    "Dip_Direction",
    "Area",
    "Trace",
    "Dip_Variance",
    "Dip_Direction_Variance",
];

/// Path next to `input` named `<stem><suffix>.<extension>`.
pub fn derived_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}.{}", stem, suffix, extension))
}

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Creates a buffered writer for the given path.
fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    ensure_parent_dirs(path)?;
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

fn write_err(path: &Path) -> impl Fn(std::io::Error) -> WriteError + '_ {
    move |e| WriteError::WriteFile {
        path: path.display().to_string(),
        source: e,
    }
}

/// Formats a variance column: the spread range, or empty when the
/// variance analysis was disabled.
fn variance_column(range: Option<f64>, decimals: usize) -> String {
    range
        .map(|r| format!("{:.*}", decimals, r))
        .unwrap_or_default()
}

/// Write the face report for facets built from DXF POINT triples.
///
/// One row per facet with the nine coordinates, dip, dip direction, area
/// and the dip / dip-direction variance ranges.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_face_report(path: &Path, records: &[FacetRecord]) -> Result<()> {
    let writer = create_buffered_writer(path)?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    let path_str = path.display().to_string();

    csv_writer
        .write_record(FACE_HEADER)
        .map_err(|e| WriteError::CsvError {
            path: path_str.clone(),
            source: e,
        })?;

    for record in records {
        let m = &record.measurement;
        let mut row: Vec<String> = record
            .points
            .iter()
            .flat_map(|p| p.to_array())
            .map(|c| format!("{:.6}", c))
            .collect();
        row.push(format!("{:.2}", m.dip));
        row.push(format!("{:.2}", m.dip_direction));
        row.push(format!("{:.2}", m.area));
        row.push(variance_column(m.variance.map(|v| v.dip.range), 2));
        row.push(variance_column(m.variance.map(|v| v.dip_direction.range), 2));

        csv_writer
            .write_record(&row)
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write the two-section polyline report.
///
/// The first section lists each polyline's vertices, the second its
/// geological measurements, both in the order given.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_polyline_report(path: &Path, records: &[FacetRecord]) -> Result<()> {
    let writer = create_buffered_writer(path)?;
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);
    let path_str = path.display().to_string();
    let csv_err = |e: csv::Error| WriteError::CsvError {
        path: path_str.clone(),
        source: e,
    };
    let err = write_err(path);

    csv_writer.write_record(POLYLINE_COORD_HEADER).map_err(csv_err)?;
    for record in records {
        let [v1, v2, v3] = record.points;
        let mut row = vec![record.label.clone()];
        row.extend(
            [v1.x, v1.y, v1.z, v2.x, v2.y, v2.z, v3.x, v3.y, v3.z]
                .iter()
                .map(|c| format!("{:.2}", c)),
        );
        csv_writer.write_record(&row).map_err(csv_err)?;
    }

    // An empty record would be written as `""`, so the separator goes
    // straight to the underlying file.
    csv_writer.flush().map_err(&err)?;
    let mut inner = csv_writer.into_inner().map_err(|e| err(e.into_error()))?;
    inner.write_all(b"\n").map_err(&err)?;
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_writer(inner);

    csv_writer.write_record(POLYLINE_GEOLOGY_HEADER).map_err(csv_err)?;
    for record in records {
        let m = &record.measurement;
        csv_writer
            .write_record(&[
                record.label.clone(),
                format!("{:.1}", m.dip),
                format!("{:.1}", m.dip_direction),
                format!("{:.2}", m.area),
                format!("{:.2}", m.trace),
                variance_column(m.variance.map(|v| v.dip.range), 1),
                variance_column(m.variance.map(|v| v.dip_direction.range), 1),
            ])
            .map_err(csv_err)?;
    }

    csv_writer.flush().map_err(&err)?;
    Ok(())
}

/// Write interpolated camera positions as `name,east,north,elevation`
/// rows without a header, at full precision.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_camera_positions(path: &Path, positions: &[CameraPosition]) -> Result<()> {
    let writer = create_buffered_writer(path)?;
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    let path_str = path.display().to_string();

    for pos in positions {
        csv_writer
            .write_record(&[
                pos.image_name.clone(),
                pos.east.to_string(),
                pos.north.to_string(),
                pos.elevation.to_string(),
            ])
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    csv_writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write a text document verbatim.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    let mut writer = create_buffered_writer(path)?;
    let err = write_err(path);
    writer.write_all(content.as_bytes()).map_err(&err)?;
    writer.flush().map_err(&err)?;
    Ok(())
}
