//! Configuration types for the survey tools.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default coordinate perturbation used by the variance analysis.
pub const DEFAULT_PERTURBATION: f64 = 0.05;

/// How perturbed facet variants are enumerated for the variance analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerturbationScheme {
    /// Every ± combination over all nine coordinates (512 variants).
    #[default]
    Corners,
    /// One coordinate displaced at a time, in both directions (18 variants).
    Axes,
}

/// Configuration for the geological plane evaluator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneConfig {
    /// Coordinate displacement for the variance analysis (0 disables it)
    #[serde(default = "default_perturbation")]
    pub perturbation: f64,

    /// Variant enumeration scheme
    #[serde(default)]
    pub scheme: PerturbationScheme,

    /// Minimum sine of the angle between facet edges before the facet
    /// counts as collinear
    #[serde(default = "default_collinear_tolerance")]
    pub collinear_tolerance: f64,
}

fn default_perturbation() -> f64 {
    DEFAULT_PERTURBATION
}

fn default_collinear_tolerance() -> f64 {
    1e-9
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            perturbation: default_perturbation(),
            scheme: PerturbationScheme::default(),
            collinear_tolerance: default_collinear_tolerance(),
        }
    }
}

/// Configuration for DXF entity extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DxfConfig {
    /// Only VERTEX entities on layers starting with this prefix are grouped
    /// into polylines (empty accepts every layer)
    #[serde(default = "default_polyline_prefix")]
    pub polyline_layer_prefix: String,

    /// Vertices closer than this on every axis are treated as duplicates
    #[serde(default = "default_duplicate_tolerance")]
    pub duplicate_tolerance: f64,
}

fn default_polyline_prefix() -> String {
    "Polyline".to_string()
}

fn default_duplicate_tolerance() -> f64 {
    1e-6
}

impl Default for DxfConfig {
    fn default() -> Self {
        Self {
            polyline_layer_prefix: default_polyline_prefix(),
            duplicate_tolerance: default_duplicate_tolerance(),
        }
    }
}

/// Configuration for camera position interpolation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Lines to skip at the top of the .pos file (preamble plus column header)
    #[serde(default = "default_pos_header_lines")]
    pub pos_header_lines: usize,

    /// Column holding the HH:MM:SS time of day
    #[serde(default = "default_time_column")]
    pub time_column: usize,

    #[serde(default = "default_east_column")]
    pub east_column: usize,

    #[serde(default = "default_north_column")]
    pub north_column: usize,

    #[serde(default = "default_elevation_column")]
    pub elevation_column: usize,

    /// Divisor converting .MRK antenna offsets to survey units (mm -> m)
    #[serde(default = "default_offset_scale")]
    pub offset_scale: f64,

    /// Output file name, written into the image directory
    #[serde(default = "default_camera_output")]
    pub output_name: String,
}

fn default_pos_header_lines() -> usize {
    6
}

fn default_time_column() -> usize {
    5
}

fn default_east_column() -> usize {
    24
}

fn default_north_column() -> usize {
    25
}

fn default_elevation_column() -> usize {
    33
}

fn default_offset_scale() -> f64 {
    1000.0
}

fn default_camera_output() -> String {
    "Camera_coords.txt".to_string()
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            pos_header_lines: default_pos_header_lines(),
            time_column: default_time_column(),
            east_column: default_east_column(),
            north_column: default_north_column(),
            elevation_column: default_elevation_column(),
            offset_scale: default_offset_scale(),
            output_name: default_camera_output(),
        }
    }
}

/// Configuration for RINEX observation file correction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RinexConfig {
    /// Program name written into the PGM / RUN BY / DATE header line
    #[serde(default = "default_program")]
    pub program: String,

    /// Observation interval in seconds written into the INTERVAL header line
    #[serde(default = "default_interval")]
    pub interval: f64,

    /// Suffix appended to the file stem of corrected files
    #[serde(default = "default_suffix")]
    pub suffix: String,
}

fn default_program() -> String {
    "RTKCONV 2.4.3 b29".to_string()
}

fn default_interval() -> f64 {
    0.2
}

fn default_suffix() -> String {
    "_corrected".to_string()
}

impl Default for RinexConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            interval: default_interval(),
            suffix: default_suffix(),
        }
    }
}

/// Top-level configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(default)]
    pub plane: PlaneConfig,

    #[serde(default)]
    pub dxf: DxfConfig,

    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub rinex: RinexConfig,
}

impl SurveyConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: SurveyConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_plane_config() {
        let config = PlaneConfig::default();
        assert_eq!(config.perturbation, 0.05);
        assert_eq!(config.scheme, PerturbationScheme::Corners);
    }

    #[test]
    fn test_default_survey_config() {
        let config = SurveyConfig::default();
        assert_eq!(config.camera.pos_header_lines, 6);
        assert_eq!(config.camera.elevation_column, 33);
        assert_eq!(config.dxf.polyline_layer_prefix, "Polyline");
        assert_eq!(config.rinex.program, "RTKCONV 2.4.3 b29");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "plane:\n  perturbation: 0.005\n  scheme: axes\n";
        let config: SurveyConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.plane.perturbation, 0.005);
        assert_eq!(config.plane.scheme, PerturbationScheme::Axes);
        assert_eq!(config.plane.collinear_tolerance, 1e-9);
        assert_eq!(config.camera.offset_scale, 1000.0);
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("survey.yaml");

        let mut config = SurveyConfig::default();
        config.rinex.interval = 1.0;
        config.dxf.polyline_layer_prefix = String::new();
        config.to_yaml(&path).unwrap();

        let loaded = SurveyConfig::from_yaml(&path).unwrap();
        assert_eq!(loaded.rinex.interval, 1.0);
        assert!(loaded.dxf.polyline_layer_prefix.is_empty());
    }
}
