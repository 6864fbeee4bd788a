//! Batch evaluation of DXF facets.
//!
//! Facets come from two DXF layouts:
//! - consecutive POINT triples (3-point faces)
//! - VERTEX entities grouped into polylines by layer
//!
//! Every facet is evaluated in parallel; results keep input order. A facet
//! that cannot be evaluated is recorded as skipped and never aborts the
//! batch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};
use rayon::prelude::*;

use crate::config::DxfConfig;
use crate::core::geometry::Point3D;
use crate::core::loaders::{load_dxf_points, load_dxf_polylines};
use crate::core::writers::{derived_path, write_face_report, write_polyline_report};
use crate::processors::plane::{Facet, PlaneError, PlaneEvaluator, PlaneMeasurement};

/// Suffix of the face report written next to the input DXF.
pub const FACE_REPORT_SUFFIX: &str = "_geological_analysis";

/// Suffix of the polyline report written next to the input DXF.
pub const POLYLINE_REPORT_SUFFIX: &str = "_vertices";

/// Candidate facet: a label and the points that should form it.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledFacet {
    pub label: String,
    pub points: Vec<Point3D>,
}

/// An evaluated facet.
#[derive(Debug, Clone, PartialEq)]
pub struct FacetRecord {
    pub label: String,
    pub points: [Point3D; 3],
    pub measurement: PlaneMeasurement,
}

/// A facet that could not be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFacet {
    pub label: String,
    pub reason: PlaneError,
}

/// Evaluated and skipped facets of one batch, each in input order.
#[derive(Debug, Clone, Default)]
pub struct FacetBatch {
    pub records: Vec<FacetRecord>,
    pub skipped: Vec<SkippedFacet>,
}

impl FacetBatch {
    #[inline]
    pub fn evaluated(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.records.len() + self.skipped.len()
    }

    pub fn measurements(&self) -> Vec<PlaneMeasurement> {
        self.records.iter().map(|r| r.measurement).collect()
    }
}

/// Outcome of a `faces` or `vertices` run.
#[derive(Debug, Clone)]
pub struct FacetSummary {
    pub input: PathBuf,
    pub output: PathBuf,
    pub batch: FacetBatch,
}

/// Group points into consecutive triples labelled `Face 1`, `Face 2`, ...
///
/// A trailing group of fewer than three points is logged and ignored.
pub fn facets_from_points(points: &[Point3D]) -> Vec<LabelledFacet> {
    let chunks = points.chunks_exact(3);
    let leftover = chunks.remainder().len();

    let facets: Vec<LabelledFacet> = chunks
        .enumerate()
        .map(|(i, chunk)| LabelledFacet {
            label: format!("Face {}", i + 1),
            points: chunk.to_vec(),
        })
        .collect();

    if leftover > 0 {
        warn!(
            "{} trailing point(s) do not form a complete face, ignored",
            leftover
        );
    }

    facets
}

/// Evaluate candidate facets in parallel.
pub fn evaluate_facets(candidates: Vec<LabelledFacet>, evaluator: &PlaneEvaluator) -> FacetBatch {
    let results: Vec<(String, std::result::Result<FacetRecord, PlaneError>)> = candidates
        .into_par_iter()
        .map(|candidate| {
            let result = Facet::new(&candidate.points).and_then(|facet| {
                let measurement = evaluator.evaluate(&facet)?;
                Ok(FacetRecord {
                    label: candidate.label.clone(),
                    points: *facet.points(),
                    measurement,
                })
            });
            (candidate.label, result)
        })
        .collect();

    let mut batch = FacetBatch::default();
    for (label, result) in results {
        match result {
            Ok(record) => batch.records.push(record),
            Err(reason) => {
                warn!("{}: skipped ({})", label, reason);
                batch.skipped.push(SkippedFacet { label, reason });
            }
        }
    }
    batch
}

/// Load POINT triples from a DXF file and evaluate them.
pub fn analyze_points(path: &Path, evaluator: &PlaneEvaluator) -> Result<FacetBatch> {
    let points = load_dxf_points(path)
        .with_context(|| format!("Failed to read points from {}", path.display()))?;
    info!("{}: {} points", path.display(), points.len());

    Ok(evaluate_facets(facets_from_points(&points), evaluator))
}

/// Load polylines from a DXF file and evaluate those with three vertices.
///
/// Polylines with any other vertex count are reported as skipped.
pub fn analyze_polylines(
    path: &Path,
    evaluator: &PlaneEvaluator,
    config: &DxfConfig,
) -> Result<FacetBatch> {
    let polylines = load_dxf_polylines(path, config)
        .with_context(|| format!("Failed to read polylines from {}", path.display()))?;
    info!("{}: {} polylines", path.display(), polylines.len());

    let candidates = polylines
        .into_iter()
        .map(|p| LabelledFacet {
            label: p.name,
            points: p.vertices,
        })
        .collect();

    Ok(evaluate_facets(candidates, evaluator))
}

fn summarize(input: &Path, output: PathBuf, batch: FacetBatch) -> FacetSummary {
    info!(
        "{}: {} facet(s) evaluated, {} skipped",
        output.display(),
        batch.records.len(),
        batch.skipped.len()
    );
    FacetSummary {
        input: input.to_path_buf(),
        output,
        batch,
    }
}

/// Evaluate the 3-point faces of a DXF file and write the face report.
///
/// Without an explicit output path the report is written next to the input
/// as `<stem>_geological_analysis.csv`.
pub fn run_faces(
    input: &Path,
    output: Option<&Path>,
    evaluator: &PlaneEvaluator,
) -> Result<FacetSummary> {
    let batch = analyze_points(input, evaluator)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derived_path(input, FACE_REPORT_SUFFIX, "csv"));

    write_face_report(&output, &batch.records)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(summarize(input, output, batch))
}

/// Evaluate the polylines of a DXF file and write the polyline report.
///
/// Without an explicit output path the report is written next to the input
/// as `<stem>_vertices.csv`.
pub fn run_vertices(
    input: &Path,
    output: Option<&Path>,
    evaluator: &PlaneEvaluator,
    config: &DxfConfig,
) -> Result<FacetSummary> {
    let batch = analyze_polylines(input, evaluator, config)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| derived_path(input, POLYLINE_REPORT_SUFFIX, "csv"));

    write_polyline_report(&output, &batch.records)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(summarize(input, output, batch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_entity(file: &mut File, kind: &str, layer: &str, p: [f64; 3]) {
        writeln!(
            file,
            "  0\n{}\n  8\n{}\n 10\n{}\n 20\n{}\n 30\n{}",
            kind, layer, p[0], p[1], p[2]
        )
        .unwrap();
    }

    fn create_points_dxf(dir: &Path, points: &[[f64; 3]]) -> PathBuf {
        let path = dir.join("faces.dxf");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "  0\nSECTION\n  2\nENTITIES").unwrap();
        for p in points {
            write_entity(&mut file, "POINT", "0", *p);
        }
        writeln!(file, "  0\nENDSEC\n  0\nEOF").unwrap();
        path
    }

    fn create_polyline_dxf(dir: &Path, polylines: &[(&str, Vec<[f64; 3]>)]) -> PathBuf {
        let path = dir.join("mapping.dxf");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "  0\nSECTION\n  2\nENTITIES").unwrap();
        for (name, vertices) in polylines {
            writeln!(file, "  0\nPOLYLINE\n  8\n{}", name).unwrap();
            for v in vertices {
                write_entity(&mut file, "VERTEX", name, *v);
            }
            writeln!(file, "  0\nSEQEND\n  8\n{}", name).unwrap();
        }
        writeln!(file, "  0\nENDSEC\n  0\nEOF").unwrap();
        path
    }

    fn p(x: f64, y: f64, z: f64) -> Point3D {
        Point3D::new(x, y, z)
    }

    #[test]
    fn test_facets_from_points_ignores_trailing_group() {
        let points: Vec<Point3D> = (0..8).map(|i| p(i as f64, 0.0, 0.0)).collect();
        let facets = facets_from_points(&points);

        assert_eq!(facets.len(), 2);
        assert_eq!(facets[0].label, "Face 1");
        assert_eq!(facets[1].label, "Face 2");
        assert_eq!(facets[1].points[0], p(3.0, 0.0, 0.0));
    }

    #[test]
    fn test_evaluate_facets_keeps_order_and_skips() {
        let candidates = vec![
            LabelledFacet {
                label: "A".into(),
                points: vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)],
            },
            LabelledFacet {
                label: "B".into(),
                points: vec![p(0.0, 0.0, 0.0), p(1.0, 1.0, 1.0), p(2.0, 2.0, 2.0)],
            },
            LabelledFacet {
                label: "C".into(),
                points: vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0)],
            },
            LabelledFacet {
                label: "D".into(),
                points: vec![p(0.0, 0.0, 0.0), p(0.0, 1.0, 0.0), p(1.0, 0.0, -1.0)],
            },
        ];

        let batch = evaluate_facets(candidates, &PlaneEvaluator::new(0.0));

        let labels: Vec<&str> = batch.records.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "D"]);
        assert_eq!(batch.skipped.len(), 2);
        assert_eq!(batch.skipped[0].label, "B");
        assert_eq!(batch.skipped[0].reason, PlaneError::DegenerateFacet);
        assert!(matches!(batch.skipped[1].reason, PlaneError::InvalidInput(_)));
        assert!((batch.records[1].measurement.dip - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let candidates: Vec<LabelledFacet> = (0..200)
            .map(|i| {
                let t = i as f64;
                LabelledFacet {
                    label: format!("F{}", i),
                    points: vec![
                        p(t, 0.0, 0.0),
                        p(t + 1.0, 0.5, t * 0.01),
                        p(t, 1.0, -0.3 * (t % 7.0)),
                    ],
                }
            })
            .collect();
        let evaluator = PlaneEvaluator::default();

        let batch = evaluate_facets(candidates.clone(), &evaluator);

        assert_eq!(batch.records.len(), 200);
        for (record, candidate) in batch.records.iter().zip(&candidates) {
            let facet = Facet::new(&candidate.points).unwrap();
            assert_eq!(record.label, candidate.label);
            assert_eq!(record.measurement, evaluator.evaluate(&facet).unwrap());
        }
    }

    #[test]
    fn test_run_faces_writes_default_output() {
        let temp_dir = TempDir::new().unwrap();
        let input = create_points_dxf(
            temp_dir.path(),
            &[
                [0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [1.0, 0.0, -1.0],
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 1.0],
                [2.0, 2.0, 2.0],
                [5.0, 5.0, 5.0],
            ],
        );

        let summary = run_faces(&input, None, &PlaneEvaluator::default()).unwrap();

        assert_eq!(summary.output, temp_dir.path().join("faces_geological_analysis.csv"));
        assert_eq!(summary.batch.evaluated(), 1);
        assert_eq!(summary.batch.skipped.len(), 1);
        assert_eq!(summary.batch.total(), 2);

        let content = fs::read_to_string(&summary.output).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_run_vertices_skips_non_triangles() {
        let temp_dir = TempDir::new().unwrap();
        let input = create_polyline_dxf(
            temp_dir.path(),
            &[
                (
                    "Polyline 10",
                    vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, -1.0]],
                ),
                ("Polyline 3", vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
                (
                    "Polyline 2",
                    vec![[0.0, 0.0, 5.0], [1.0, 0.0, 5.0], [0.0, 1.0, 5.0]],
                ),
            ],
        );
        let output = temp_dir.path().join("out").join("report.csv");

        let summary = run_vertices(
            &input,
            Some(&output),
            &PlaneEvaluator::default(),
            &DxfConfig::default(),
        )
        .unwrap();

        assert_eq!(summary.batch.evaluated(), 2);
        assert_eq!(summary.batch.skipped.len(), 1);
        assert_eq!(summary.batch.skipped[0].label, "Polyline 3");

        let content = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[1].starts_with("Polyline 2,"));
        assert!(lines[2].starts_with("Polyline 10,"));
        assert!(lines[5].starts_with("Polyline 2,0.0,"));
        assert!(lines[6].starts_with("Polyline 10,45.0,90.0,"));
    }

    #[test]
    fn test_run_faces_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.dxf");
        assert!(run_faces(&missing, None, &PlaneEvaluator::default()).is_err());
    }
}
