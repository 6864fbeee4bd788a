//! RINEX observation file correction.
//!
//! Rewrites `.obs` files exported by the drone's base receiver so that
//! post-processing software accepts them:
//! - epoch lines (`> yyyy mm dd hh mi ss.sssssss flag nsat`) are padded to
//!   fixed column widths and the receiver clock offset is dropped
//! - the first epoch block is removed
//! - the `PGM / RUN BY / DATE` and `TIME OF FIRST OBS` header lines are
//!   regenerated from the second epoch, and an `INTERVAL` line is added
//! - blank lines and everything from `END OF RINEX OBS DATA` on are removed

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::RinexConfig;
use crate::core::writers::{derived_path, write_text};
use crate::processors::camera::files_with_extension;

const PGM_LABEL: &str = "PGM / RUN BY / DATE";
const FIRST_OBS_LABEL: &str = "TIME OF FIRST OBS";
const END_MARKER: &str = "END OF RINEX OBS DATA";

/// Errors that can occur while correcting an observation file.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RinexError {
    #[error("line {line}: malformed epoch line '{text}'")]
    MalformedEpoch { line: usize, text: String },

    #[error("fewer than two epochs; no time available for the header")]
    MissingEpoch,
}

/// Parsed epoch line. Token strings are kept as written so the
/// reformatted line preserves the receiver's precision.
#[derive(Debug, Clone, PartialEq)]
pub struct Epoch {
    year: String,
    month: String,
    day: String,
    hour: String,
    minute: String,
    second: String,
    flag: String,
    satellites: String,
}

fn pad_short(token: &str) -> String {
    format!("{:>2}", token)
}

fn pad_seconds(token: &str) -> String {
    if token.as_bytes().get(1) == Some(&b'.') {
        format!(" {}", token)
    } else {
        token.to_string()
    }
}

fn number(token: &str) -> u32 {
    token.parse().unwrap_or(0)
}

impl Epoch {
    /// Parse an epoch line; `None` if it is not a complete, numeric one.
    pub fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 9 || tokens[0] != ">" {
            return None;
        }
        if !tokens[1..6]
            .iter()
            .chain(&tokens[7..9])
            .all(|t| t.parse::<u32>().is_ok())
            || tokens[6].parse::<f64>().is_err()
        {
            return None;
        }

        Some(Self {
            year: tokens[1].to_string(),
            month: tokens[2].to_string(),
            day: tokens[3].to_string(),
            hour: tokens[4].to_string(),
            minute: tokens[5].to_string(),
            second: tokens[6].to_string(),
            flag: tokens[7].to_string(),
            satellites: tokens[8].to_string(),
        })
    }

    /// Epoch line with fixed-width fields.
    pub fn format_line(&self) -> String {
        format!(
            "> {} {} {} {} {} {} {} {}",
            self.year,
            pad_short(&self.month),
            pad_short(&self.day),
            pad_short(&self.hour),
            pad_short(&self.minute),
            pad_seconds(&self.second),
            pad_short(&self.flag),
            pad_short(&self.satellites)
        )
    }

    /// `PGM / RUN BY / DATE` header line stamped with this epoch.
    pub fn program_line(&self, program: &str) -> String {
        let seconds = self.second.parse::<f64>().unwrap_or(0.0).floor() as u32;
        format!(
            "{:<40}{}{:02}{:02} {:02}{:02}{:02} UTC {}",
            program,
            self.year,
            number(&self.month),
            number(&self.day),
            number(&self.hour),
            number(&self.minute),
            seconds,
            PGM_LABEL
        )
    }

    /// `TIME OF FIRST OBS` header line for this epoch.
    pub fn first_obs_line(&self) -> String {
        format!(
            "  {}    {}    {}    {}    {}   {}     GPS         {}",
            self.year,
            pad_short(&self.month),
            pad_short(&self.day),
            pad_short(&self.hour),
            pad_short(&self.minute),
            pad_seconds(&self.second),
            FIRST_OBS_LABEL
        )
    }
}

/// `INTERVAL` header line.
pub fn interval_line(interval: f64) -> String {
    format!("{}{:.4} INTERVAL     ", " ".repeat(60), interval)
}

/// Correct the text of one observation file.
///
/// # Errors
///
/// - [`RinexError::MalformedEpoch`] if an epoch line cannot be parsed.
/// - [`RinexError::MissingEpoch`] if the file has fewer than two epochs.
pub fn correct_observations(
    content: &str,
    config: &RinexConfig,
) -> std::result::Result<String, RinexError> {
    let mut kept: Vec<String> = Vec::new();
    let mut epochs = 0usize;
    let mut header_epoch: Option<Epoch> = None;

    for (idx, line) in content.lines().enumerate() {
        if line.starts_with('>') {
            let epoch = Epoch::parse(line).ok_or_else(|| RinexError::MalformedEpoch {
                line: idx + 1,
                text: line.to_string(),
            })?;
            epochs += 1;
            if epochs == 2 {
                header_epoch = Some(epoch.clone());
            }
            if epochs > 1 {
                kept.push(epoch.format_line());
            }
            continue;
        }
        if epochs == 1 {
            continue;
        }
        kept.push(line.to_string());
    }

    let epoch = header_epoch.ok_or(RinexError::MissingEpoch)?;
    debug!("{} epochs, header time from '{}'", epochs, epoch.format_line());

    let mut out = String::with_capacity(content.len());
    for line in &kept {
        if line.trim().is_empty() {
            continue;
        }
        if line.contains(END_MARKER) {
            break;
        }
        if line.contains(PGM_LABEL) {
            out.push_str(&epoch.program_line(&config.program));
        } else if line.contains(FIRST_OBS_LABEL) {
            out.push_str(&interval_line(config.interval));
            out.push('\n');
            out.push_str(&epoch.first_obs_line());
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }
    out.push(' ');

    Ok(out)
}

/// Correct one `.obs` file, writing the result to `output`.
pub fn correct_file(input: &Path, output: &Path, config: &RinexConfig) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let content = String::from_utf8_lossy(&bytes);
    let corrected = correct_observations(&content, config)
        .with_context(|| format!("Failed to correct {}", input.display()))?;
    write_text(output, &corrected)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

/// Outcome of a `rinex` run.
#[derive(Debug, Clone, Default)]
pub struct RinexSummary {
    /// (input, output) pairs written successfully.
    pub corrected: Vec<(PathBuf, PathBuf)>,
    /// Inputs that failed, with the error message.
    pub failed: Vec<(PathBuf, String)>,
}

impl RinexSummary {
    #[inline]
    pub fn total(&self) -> usize {
        self.corrected.len() + self.failed.len()
    }
}

/// Correct every `.obs` file in `dir` into `<stem><suffix>.obs`.
///
/// Files whose stem already ends with the suffix are left alone. A failing
/// file is recorded in the summary and does not stop the others.
pub fn run_rinex(dir: &Path, config: &RinexConfig) -> Result<RinexSummary> {
    let inputs: Vec<PathBuf> = files_with_extension(dir, "obs")?
        .into_iter()
        .filter(|p| {
            !p.file_stem()
                .map(|s| s.to_string_lossy().ends_with(config.suffix.as_str()))
                .unwrap_or(false)
        })
        .collect();
    info!("Found {} observation files in {}", inputs.len(), dir.display());

    let results: Vec<(PathBuf, PathBuf, Result<()>)> = inputs
        .into_par_iter()
        .map(|input| {
            let output = derived_path(&input, &config.suffix, "obs");
            let result = correct_file(&input, &output, config);
            (input, output, result)
        })
        .collect();

    let mut summary = RinexSummary::default();
    for (input, output, result) in results {
        match result {
            Ok(()) => {
                info!("{} -> {}", input.display(), output.display());
                summary.corrected.push((input, output));
            }
            Err(e) => {
                warn!("{:#}", e);
                summary.failed.push((input, format!("{:#}", e)));
            }
        }
    }

    Ok(summary)
}
