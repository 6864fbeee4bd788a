//! Data processing modules.

pub mod camera;
pub mod facets;
pub mod plane;
pub mod rinex;

// Re-export key types for convenience
pub use camera::{run_camera, CameraError, CameraPosition, CameraSummary, PositionTrack};
pub use facets::{
    analyze_points, analyze_polylines, facets_from_points, run_faces, run_vertices, FacetBatch,
    FacetRecord, FacetSummary, SkippedFacet,
};
pub use plane::{evaluate, Facet, PlaneError, PlaneEvaluator, PlaneMeasurement, VarianceRecord};
pub use rinex::{correct_observations, run_rinex, RinexError, RinexSummary};
