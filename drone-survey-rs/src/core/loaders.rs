//! Data loaders for survey input files.
//!
//! This module provides parsers for:
//! - ASCII DXF drawings (POINT entities and VERTEX entities grouped into
//!   polylines by layer)
//! - GNSS position solutions (`.pos`, whitespace-separated columns)
//! - Drone camera event logs (`.MRK`, tab-separated)

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use log::{debug, warn};
use thiserror::Error;

use super::geometry::Point3D;
use crate::config::{CameraConfig, DxfConfig};

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty file: {0}")]
    EmptyFile(PathBuf),

    #[error("No {kind} entities found in {path}")]
    NoEntities { kind: &'static str, path: PathBuf },

    #[error("Missing required columns: {0}")]
    MissingColumns(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// One entity from a DXF drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct DxfEntity {
    /// Entity type as written after group code 0 (e.g. `POINT`, `VERTEX`).
    pub kind: String,
    /// Layer name (group code 8).
    pub layer: Option<String>,
    /// First location (group codes 10/20/30). A missing 30 means z = 0.
    pub location: Option<Point3D>,
    /// 1-based line number of the entity's type line.
    pub line: usize,
}

#[derive(Default)]
struct EntityBuilder {
    kind: String,
    layer: Option<String>,
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    line: usize,
}

impl EntityBuilder {
    fn finish(self) -> DxfEntity {
        let location = match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point3D::new(x, y, self.z.unwrap_or(0.0))),
            _ => None,
        };
        DxfEntity {
            kind: self.kind,
            layer: self.layer,
            location,
            line: self.line,
        }
    }
}

/// A named group of vertices read from a DXF polyline layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub name: String,
    pub vertices: Vec<Point3D>,
    /// Vertices dropped because they repeated an existing vertex.
    pub duplicates: usize,
}

impl Polyline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vertices: Vec::new(),
            duplicates: 0,
        }
    }

    /// Adds a vertex unless it repeats one already present (a misclick
    /// while digitising). Returns whether the vertex was added.
    pub fn add_vertex(&mut self, vertex: Point3D, tolerance: f64) -> bool {
        if self.vertices.iter().any(|v| v.approx_eq(&vertex, tolerance)) {
            self.duplicates += 1;
            return false;
        }
        self.vertices.push(vertex);
        true
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// True if the polyline describes a triangular facet.
    #[inline]
    pub fn is_facet(&self) -> bool {
        self.vertices.len() == 3
    }
}

/// Parse DXF group-code/value pairs into entities.
///
/// Every group code 0 starts a new entity; for each entity the layer and
/// the first 10/20/30 coordinate triple are kept. Other group codes are
/// ignored. Lines are decoded lossily, so bytes from a legacy code page in
/// header strings or layer names do not fail the read.
///
/// # Errors
///
/// Returns an error if a group code line is not an integer.
pub fn parse_dxf_entities<R: BufRead>(reader: R) -> Result<Vec<DxfEntity>> {
    let mut entities = Vec::new();
    let mut current: Option<EntityBuilder> = None;
    let mut lines = reader
        .split(b'\n')
        .map(|line| line.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
        .enumerate();

    while let Some((idx, code_line)) = lines.next() {
        let code_line = code_line?;
        let code_str = code_line.trim();
        if code_str.is_empty() {
            continue;
        }
        let code: i32 = code_str.parse().map_err(|_| {
            LoaderError::ParseError(format!("line {}: invalid group code '{}'", idx + 1, code_str))
        })?;

        let Some((value_idx, value_line)) = lines.next() else {
            break;
        };
        let value_line = value_line?;
        let value = value_line.trim();

        match code {
            0 => {
                if let Some(done) = current.take() {
                    entities.push(done.finish());
                }
                current = Some(EntityBuilder {
                    kind: value.to_string(),
                    line: value_idx + 1,
                    ..Default::default()
                });
            }
            8 | 10 | 20 | 30 => {
                let Some(entity) = current.as_mut() else {
                    continue;
                };
                if code == 8 {
                    entity.layer = Some(value.to_string());
                    continue;
                }
                let slot = match code {
                    10 => &mut entity.x,
                    20 => &mut entity.y,
                    _ => &mut entity.z,
                };
                if slot.is_none() {
                    match value.parse::<f64>() {
                        Ok(v) => *slot = Some(v),
                        Err(_) => warn!(
                            "line {}: ignoring non-numeric coordinate '{}'",
                            value_idx + 1,
                            value
                        ),
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(done) = current.take() {
        entities.push(done.finish());
    }

    Ok(entities)
}

fn load_dxf_entities(path: &Path) -> Result<Vec<DxfEntity>> {
    let file = File::open(path)?;
    let entities = parse_dxf_entities(BufReader::new(file))?;
    debug!("{}: {} DXF entities", path.display(), entities.len());
    Ok(entities)
}

/// Load the locations of all POINT entities in a DXF file, in file order.
///
/// POINT entities without a location are skipped with a warning.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds no usable POINT.
pub fn load_dxf_points<P: AsRef<Path>>(path: P) -> Result<Vec<Point3D>> {
    let path = path.as_ref();
    let entities = load_dxf_entities(path)?;

    let mut points = Vec::new();
    for entity in entities.iter().filter(|e| e.kind == "POINT") {
        match entity.location {
            Some(p) => points.push(p),
            None => warn!("line {}: POINT without coordinates, skipped", entity.line),
        }
    }

    if points.is_empty() {
        return Err(LoaderError::NoEntities {
            kind: "POINT",
            path: path.to_path_buf(),
        });
    }

    Ok(points)
}

/// Load VERTEX entities grouped into polylines by layer name.
///
/// Only layers whose name starts with `config.polyline_layer_prefix` are
/// kept. Repeated vertices within a polyline are dropped with a warning.
/// Polylines are returned in natural name order, so "Polyline 2" comes
/// before "Polyline 10".
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds no matching VERTEX.
pub fn load_dxf_polylines<P: AsRef<Path>>(path: P, config: &DxfConfig) -> Result<Vec<Polyline>> {
    let path = path.as_ref();
    let entities = load_dxf_entities(path)?;

    let mut polylines: Vec<Polyline> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entity in entities.iter().filter(|e| e.kind == "VERTEX") {
        let Some(layer) = entity.layer.as_deref() else {
            continue;
        };
        if !layer.starts_with(config.polyline_layer_prefix.as_str()) {
            continue;
        }
        let Some(vertex) = entity.location else {
            warn!("line {}: VERTEX without coordinates, skipped", entity.line);
            continue;
        };

        let slot = *index.entry(layer.to_string()).or_insert_with(|| {
            polylines.push(Polyline::new(layer));
            polylines.len() - 1
        });
        if !polylines[slot].add_vertex(vertex, config.duplicate_tolerance) {
            warn!("Duplicate vertex found in {}, skipping", layer);
        }
    }

    if polylines.is_empty() {
        return Err(LoaderError::NoEntities {
            kind: "VERTEX",
            path: path.to_path_buf(),
        });
    }

    polylines.sort_by(|a, b| natural_cmp(&a.name, &b.name));
    Ok(polylines)
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NameChunk<'a> {
    Number(u64),
    Text(&'a str),
}

fn name_chunks(name: &str) -> Vec<NameChunk<'_>> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut in_digits = false;

    for (i, c) in name.char_indices() {
        let is_digit = c.is_ascii_digit();
        if i > start && is_digit != in_digits {
            chunks.push(chunk(&name[start..i], in_digits));
            start = i;
        }
        in_digits = is_digit;
    }
    if start < name.len() {
        chunks.push(chunk(&name[start..], in_digits));
    }
    chunks
}

fn chunk(text: &str, digits: bool) -> NameChunk<'_> {
    match text.parse::<u64>() {
        Ok(n) if digits => NameChunk::Number(n),
        _ => NameChunk::Text(text),
    }
}

/// Compare names treating embedded digit runs as numbers.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    name_chunks(a).cmp(&name_chunks(b)).then_with(|| a.cmp(b))
}

/// One epoch of a GNSS position solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PosSample {
    /// Time of day in decimal hours.
    pub hours: f64,
    pub east: f64,
    pub north: f64,
    pub elevation: f64,
}

/// Parse an `HH:MM:SS(.sss)` time of day into decimal hours.
pub fn parse_hms(text: &str) -> Option<f64> {
    let mut parts = text.trim().split(':');
    let h: f64 = parts.next()?.parse().ok()?;
    let m: f64 = parts.next()?.parse().ok()?;
    let s: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((h * 3600.0 + m * 60.0 + s) / 3600.0)
}

/// Load a GNSS position solution (`.pos`).
///
/// Skips `config.pos_header_lines` lines, blank lines and `%` comments,
/// then reads the time, East, North and elevation columns configured in
/// `config` from each whitespace-separated row. Times are returned as
/// decimal hours of day; no day rollover is applied here.
///
/// # Errors
///
/// Returns an error if a row is too short or a value cannot be parsed.
pub fn load_pos<P: AsRef<Path>>(path: P, config: &CameraConfig) -> Result<Vec<PosSample>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let needed = [
        config.time_column,
        config.east_column,
        config.north_column,
        config.elevation_column,
    ]
    .into_iter()
    .max()
    .unwrap_or(0)
        + 1;

    let mut samples = Vec::with_capacity(4096);

    for (idx, line) in reader.lines().enumerate().skip(config.pos_header_lines) {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < needed {
            return Err(LoaderError::MissingColumns(format!(
                "{} line {}: expected at least {} columns, found {}",
                path.display(),
                idx + 1,
                needed,
                fields.len()
            )));
        }

        let number = |col: usize| -> Result<f64> {
            fields[col].parse().map_err(|_| {
                LoaderError::ParseError(format!(
                    "{} line {}: invalid number '{}' in column {}",
                    path.display(),
                    idx + 1,
                    fields[col],
                    col
                ))
            })
        };

        let hours = parse_hms(fields[config.time_column]).ok_or_else(|| {
            LoaderError::ParseError(format!(
                "{} line {}: invalid time '{}'",
                path.display(),
                idx + 1,
                fields[config.time_column]
            ))
        })?;

        samples.push(PosSample {
            hours,
            east: number(config.east_column)?,
            north: number(config.north_column)?,
            elevation: number(config.elevation_column)?,
        });
    }

    if samples.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(samples)
}

/// One camera trigger event from an `.MRK` file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MrkEvent {
    pub image_id: u32,
    /// GPS seconds of week.
    pub gps_seconds: f64,
    /// Antenna-to-camera offsets as logged (millimetres).
    pub north_offset: f64,
    pub east_offset: f64,
    pub vertical_offset: f64,
}

/// Load camera events from a tab-separated `.MRK` file.
///
/// Columns: 0 image id, 1 GPS seconds of week, 3 North offset,
/// 4 East offset, 5 vertical offset. Offsets are written as
/// `value,Label` (e.g. `-12,N`); only the value is kept.
///
/// # Errors
///
/// Returns an error if the file cannot be read, a row has fewer than six
/// columns, or a value cannot be parsed.
pub fn load_mrk<P: AsRef<Path>>(path: P) -> Result<Vec<MrkEvent>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(BufReader::new(file));

    let mut events = Vec::with_capacity(1024);

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() < 6 {
            return Err(LoaderError::MissingColumns(format!(
                "{} row {}: expected at least 6 columns, found {}",
                path.display(),
                row + 1,
                record.len()
            )));
        }

        let field = |col: usize| -> Result<f64> {
            let raw = record.get(col).unwrap_or_default();
            let value = raw.split(',').next().unwrap_or_default().trim();
            value.parse().map_err(|_| {
                LoaderError::ParseError(format!(
                    "{} row {}: invalid value '{}' in column {}",
                    path.display(),
                    row + 1,
                    raw,
                    col
                ))
            })
        };

        let image_id = record
            .get(0)
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or_else(|| {
                LoaderError::ParseError(format!(
                    "{} row {}: invalid image id '{}'",
                    path.display(),
                    row + 1,
                    record.get(0).unwrap_or_default()
                ))
            })?;

        events.push(MrkEvent {
            image_id,
            gps_seconds: field(1)?,
            north_offset: field(3)?,
            east_offset: field(4)?,
            vertical_offset: field(5)?,
        });
    }

    if events.is_empty() {
        return Err(LoaderError::EmptyFile(path.to_path_buf()));
    }

    Ok(events)
}
