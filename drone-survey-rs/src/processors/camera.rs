//! Camera position interpolation.
//!
//! Matches drone images to `.MRK` trigger events by image id, then
//! interpolates each event's time of day along the `.pos` GNSS track and
//! applies the logged antenna offsets.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use regex::Regex;
use thiserror::Error;

use crate::config::CameraConfig;
use crate::core::loaders::{load_mrk, load_pos, MrkEvent, PosSample};
use crate::core::writers::write_camera_positions;

/// Image id: the digits forming the third `_`-separated part of the name,
/// e.g. `DJI_20230801_0042.JPG` -> 42.
const IMAGE_ID_PATTERN: &str = r"^[^_]*_[^_]*_(\d+)(?:[._]|$)";

/// Errors that can occur during camera position calculation.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("No {kind} file found in {dir}")]
    MissingInput { kind: &'static str, dir: PathBuf },

    #[error("No JPG images found in {0}")]
    NoImages(PathBuf),

    #[error("No image could be matched with the timestamp and position data")]
    NoMatches,
}

/// Interpolated position of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPosition {
    pub image_name: String,
    pub east: f64,
    pub north: f64,
    pub elevation: f64,
}

/// Why an image did not get a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedReason {
    /// The file name holds no image id.
    NoImageId,
    /// No `.MRK` event carries the image's id.
    NoEvent,
    /// The event time lies outside the position track.
    OutsideTrack,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedImage {
    pub image_name: String,
    pub image_id: Option<u32>,
    pub reason: UnmatchedReason,
}

/// A camera trigger with its time of day in decimal hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraEvent {
    pub image_id: u32,
    pub hours: f64,
    pub east_offset: f64,
    pub north_offset: f64,
    pub vertical_offset: f64,
}

/// Outcome of a `camera` run.
#[derive(Debug, Clone)]
pub struct CameraSummary {
    pub images: usize,
    pub positions: Vec<CameraPosition>,
    pub unmatched: Vec<UnmatchedImage>,
    pub output: PathBuf,
}

/// Extract the image id from a file name.
pub fn image_id(file_name: &str, pattern: &Regex) -> Option<u32> {
    pattern
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Add 24 h to every time from the first backwards step on.
///
/// With `strict`, an equal consecutive time also counts as a step.
/// Only the first step is handled; a track spanning more than one
/// midnight is not supported.
pub fn apply_day_rollover(hours: &mut [f64], strict: bool) {
    let step = hours.windows(2).position(|w| {
        if strict {
            w[1] <= w[0]
        } else {
            w[1] < w[0]
        }
    });
    if let Some(idx) = step {
        for h in &mut hours[idx + 1..] {
            *h += 24.0;
        }
    }
}

/// GNSS position track in increasing time order.
#[derive(Debug, Clone)]
pub struct PositionTrack {
    samples: Vec<PosSample>,
}

impl PositionTrack {
    /// Builds a track, unwrapping a midnight rollover.
    pub fn new(mut samples: Vec<PosSample>) -> Self {
        let mut hours: Vec<f64> = samples.iter().map(|s| s.hours).collect();
        apply_day_rollover(&mut hours, true);
        for (s, h) in samples.iter_mut().zip(hours) {
            s.hours = h;
        }
        Self { samples }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// First and last sample times.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        Some((self.samples.first()?.hours, self.samples.last()?.hours))
    }

    /// East, North and elevation at `hour`.
    ///
    /// An exact sample time returns that sample; otherwise the two
    /// surrounding samples are interpolated linearly. Returns `None`
    /// outside the track.
    pub fn position_at(&self, hour: f64) -> Option<[f64; 3]> {
        let idx = self.samples.partition_point(|s| s.hours < hour);
        let after = self.samples.get(idx)?;
        if after.hours == hour {
            return Some([after.east, after.north, after.elevation]);
        }
        if idx == 0 {
            return None;
        }

        let before = &self.samples[idx - 1];
        let weight = (hour - before.hours) / (after.hours - before.hours);
        let lerp = |a: f64, b: f64| a + (b - a) * weight;

        Some([
            lerp(before.east, after.east),
            lerp(before.north, after.north),
            lerp(before.elevation, after.elevation),
        ])
    }
}

/// Convert `.MRK` events to times of day, unwrapping a midnight rollover.
pub fn camera_events(events: &[MrkEvent]) -> Vec<CameraEvent> {
    let mut hours: Vec<f64> = events
        .iter()
        .map(|e| {
            let h = e.gps_seconds / 3600.0;
            h - (h / 24.0).trunc() * 24.0
        })
        .collect();
    apply_day_rollover(&mut hours, false);

    events
        .iter()
        .zip(hours)
        .map(|(e, hours)| CameraEvent {
            image_id: e.image_id,
            hours,
            east_offset: e.east_offset,
            north_offset: e.north_offset,
            vertical_offset: e.vertical_offset,
        })
        .collect()
}

/// Position every named image.
///
/// East and North offsets are added and the vertical offset subtracted,
/// each after dividing by `offset_scale`. When several events share an
/// id the first one is used.
pub fn locate_images(
    image_names: &[String],
    events: &[CameraEvent],
    track: &PositionTrack,
    offset_scale: f64,
    pattern: &Regex,
) -> (Vec<CameraPosition>, Vec<UnmatchedImage>) {
    let mut positions = Vec::with_capacity(image_names.len());
    let mut unmatched = Vec::new();

    for name in image_names {
        let unmatched_image = |id, reason| UnmatchedImage {
            image_name: name.clone(),
            image_id: id,
            reason,
        };

        let Some(id) = image_id(name, pattern) else {
            unmatched.push(unmatched_image(None, UnmatchedReason::NoImageId));
            continue;
        };
        let Some(event) = events.iter().find(|e| e.image_id == id) else {
            unmatched.push(unmatched_image(Some(id), UnmatchedReason::NoEvent));
            continue;
        };
        let Some([east, north, elevation]) = track.position_at(event.hours) else {
            unmatched.push(unmatched_image(Some(id), UnmatchedReason::OutsideTrack));
            continue;
        };

        debug!("{} (id {}): t = {:.6} h", name, id, event.hours);
        positions.push(CameraPosition {
            image_name: name.clone(),
            east: east + event.east_offset / offset_scale,
            north: north + event.north_offset / offset_scale,
            elevation: elevation - event.vertical_offset / offset_scale,
        });
    }

    (positions, unmatched)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Files in `dir` with the given extension (case-insensitive), sorted.
pub fn files_with_extension(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_extension(path, ext))
        .collect();
    files.sort();
    Ok(files)
}

fn first_input(dir: &Path, ext: &'static str) -> Result<PathBuf> {
    let files = files_with_extension(dir, ext)?;
    if files.len() > 1 {
        warn!(
            "Multiple .{} files found, using {}",
            ext,
            files[0].display()
        );
    }
    files.into_iter().next().ok_or_else(|| {
        CameraError::MissingInput {
            kind: ext,
            dir: dir.to_path_buf(),
        }
        .into()
    })
}

/// Compute camera positions for the JPG images in `dir`.
///
/// Reads the first `.pos` and `.MRK` file of the directory and writes
/// `config.output_name` into `output_dir` (default: `dir`).
pub fn run_camera(
    dir: &Path,
    output_dir: Option<&Path>,
    config: &CameraConfig,
) -> Result<CameraSummary> {
    let pattern = Regex::new(IMAGE_ID_PATTERN).context("Invalid image id pattern")?;

    let image_names: Vec<String> = files_with_extension(dir, "jpg")?
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect();
    if image_names.is_empty() {
        return Err(CameraError::NoImages(dir.to_path_buf()).into());
    }
    info!("Found {} image files", image_names.len());

    let pos_path = first_input(dir, "pos")?;
    let samples = load_pos(&pos_path, config)
        .with_context(|| format!("Failed to read position file {}", pos_path.display()))?;
    let track = PositionTrack::new(samples);
    info!("{}: {} position samples", pos_path.display(), track.len());

    let mrk_path = first_input(dir, "mrk")?;
    let events = load_mrk(&mrk_path)
        .with_context(|| format!("Failed to read timestamp file {}", mrk_path.display()))?;
    let events = camera_events(&events);
    info!("{}: {} camera events", mrk_path.display(), events.len());

    let (positions, unmatched) =
        locate_images(&image_names, &events, &track, config.offset_scale, &pattern);

    for image in &unmatched {
        warn!("{}: no position ({:?})", image.image_name, image.reason);
    }
    if positions.is_empty() {
        return Err(CameraError::NoMatches.into());
    }

    let output = output_dir.unwrap_or(dir).join(&config.output_name);
    write_camera_positions(&output, &positions)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} camera positions to {}", positions.len(), output.display());

    Ok(CameraSummary {
        images: image_names.len(),
        positions,
        unmatched,
        output,
    })
}
