//! Geological plane evaluation for triangular facets.
//!
//! Given three points on a surface, this module derives:
//! - the unit normal of the plane through them (oriented upward)
//! - dip: angle between the plane and the horizontal, in degrees [0, 90]
//! - dip direction: compass azimuth of steepest descent, in degrees [0, 360)
//! - facet area and trace (sum of the two edges leaving the first point)
//! - a variance record obtained by re-evaluating deterministically
//!   perturbed copies of the facet
//!
//! Azimuths follow the survey frame: 0° = North (+y), 90° = East (+x).
//! Evaluation is pure; the same facet and perturbation always produce a
//! bit-identical [`PlaneMeasurement`].
//!
//! # Example
//!
//! ```
//! use drone_survey::core::geometry::Point3D;
//! use drone_survey::processors::plane::{evaluate, Facet};
//!
//! let facet = Facet::new(&[
//!     Point3D::new(0.0, 0.0, 0.0),
//!     Point3D::new(0.0, 1.0, 0.0),
//!     Point3D::new(1.0, 0.0, -1.0),
//! ])
//! .unwrap();
//! let m = evaluate(&facet, 0.05).unwrap();
//! assert!((m.dip - 45.0).abs() < 1e-9);
//! assert!((m.dip_direction - 90.0).abs() < 1e-9);
//! ```

use thiserror::Error;

use crate::config::{PerturbationScheme, PlaneConfig};
use crate::core::geometry::{Point3D, Vector3};

/// Errors produced by facet validation and evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaneError {
    /// The points are collinear or coincident, so no plane can be fit.
    #[error("degenerate facet: points are collinear or coincident")]
    DegenerateFacet,

    /// Wrong point count, non-finite coordinate or invalid perturbation.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for plane evaluation.
pub type Result<T> = std::result::Result<T, PlaneError>;

/// A triangular facet: exactly three points with finite coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    points: [Point3D; 3],
}

impl Facet {
    /// Builds a facet from a slice of points.
    ///
    /// # Errors
    ///
    /// Returns [`PlaneError::InvalidInput`] if the slice does not hold
    /// exactly three points or any coordinate is NaN or infinite.
    pub fn new(points: &[Point3D]) -> Result<Self> {
        let points: [Point3D; 3] = points.try_into().map_err(|_| {
            PlaneError::InvalidInput(format!(
                "a facet needs exactly 3 points, got {}",
                points.len()
            ))
        })?;
        Self::from_points(points)
    }

    /// Builds a facet from three points.
    pub fn from_points(points: [Point3D; 3]) -> Result<Self> {
        if let Some(idx) = points.iter().position(|p| !p.is_finite()) {
            return Err(PlaneError::InvalidInput(format!(
                "point {} has a non-finite coordinate",
                idx + 1
            )));
        }
        Ok(Self { points })
    }

    #[inline]
    pub fn points(&self) -> &[Point3D; 3] {
        &self.points
    }
}

/// Dispersion of one derived quantity across the perturbed variants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub min: f64,
    pub max: f64,
    /// `max - min`, or the angular width of the spread for azimuths.
    pub range: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
}

impl Spread {
    /// Linear spread of a set of values. Returns `None` for an empty set.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;

        Some(Self {
            min,
            max,
            range: max - min,
            mean,
            std_dev: variance.sqrt(),
        })
    }

    /// Spread of azimuths around a reference azimuth.
    ///
    /// Each value is unwrapped to its signed offset from `reference` in
    /// [-180, 180), so a spread that straddles North is measured across
    /// North rather than around the whole circle. `min`, `max` and `mean`
    /// are reported as azimuths in [0, 360); `min > max` means the spread
    /// crosses North.
    pub fn from_azimuths(reference: f64, values: &[f64]) -> Option<Self> {
        let offsets: Vec<f64> = values
            .iter()
            .map(|v| (v - reference + 180.0).rem_euclid(360.0) - 180.0)
            .collect();
        let linear = Self::from_values(&offsets)?;

        Some(Self {
            min: normalize_azimuth(reference + linear.min),
            max: normalize_azimuth(reference + linear.max),
            range: linear.range,
            mean: normalize_azimuth(reference + linear.mean),
            std_dev: linear.std_dev,
        })
    }
}

/// Sensitivity of a measurement to coordinate noise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceRecord {
    pub dip: Spread,
    pub dip_direction: Spread,
    pub area: Spread,
    /// Number of perturbed variants that produced a plane.
    pub variants: usize,
    /// Number of perturbed variants skipped as degenerate.
    pub degenerate: usize,
}

/// Orientation and size of a facet's plane.
///
/// All values are unrounded; formatting belongs to the report writers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneMeasurement {
    /// Dip in degrees, 0 = horizontal, 90 = vertical.
    pub dip: f64,
    /// Azimuth of steepest descent in degrees [0, 360). Arbitrary when
    /// the facet is horizontal.
    pub dip_direction: f64,
    /// Facet area in squared input units.
    pub area: f64,
    /// Sum of the lengths of the two edges leaving the first point.
    pub trace: f64,
    /// Upward-oriented unit normal (`normal.z >= 0`).
    pub normal: Vector3,
    /// Present when the evaluation ran with a non-zero perturbation.
    pub variance: Option<VarianceRecord>,
}

/// Configurable facet evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneEvaluator {
    pub perturbation: f64,
    pub scheme: PerturbationScheme,
    pub collinear_tolerance: f64,
}

impl Default for PlaneEvaluator {
    fn default() -> Self {
        Self::from_config(&PlaneConfig::default())
    }
}

impl PlaneEvaluator {
    /// Evaluator with the given perturbation and default scheme/tolerance.
    pub fn new(perturbation: f64) -> Self {
        Self {
            perturbation,
            ..Self::default()
        }
    }

    pub fn from_config(config: &PlaneConfig) -> Self {
        Self {
            perturbation: config.perturbation,
            scheme: config.scheme,
            collinear_tolerance: config.collinear_tolerance,
        }
    }

    pub fn with_scheme(mut self, scheme: PerturbationScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_perturbation(mut self, perturbation: f64) -> Self {
        self.perturbation = perturbation;
        self
    }

    /// Evaluates a facet.
    ///
    /// # Errors
    ///
    /// - [`PlaneError::DegenerateFacet`] if the facet's points are collinear
    ///   or coincident.
    /// - [`PlaneError::InvalidInput`] if the perturbation is negative or
    ///   not finite.
    pub fn evaluate(&self, facet: &Facet) -> Result<PlaneMeasurement> {
        if !self.perturbation.is_finite() || self.perturbation < 0.0 {
            return Err(PlaneError::InvalidInput(format!(
                "perturbation must be a finite non-negative number, got {}",
                self.perturbation
            )));
        }

        let nominal = measure(facet.points(), self.collinear_tolerance)?;
        let variance = if self.perturbation > 0.0 {
            self.variance(facet, &nominal)
        } else {
            None
        };

        Ok(PlaneMeasurement {
            dip: nominal.dip,
            dip_direction: nominal.dip_direction,
            area: nominal.area,
            trace: nominal.trace,
            normal: nominal.normal,
            variance,
        })
    }

    /// Perturbed copies of a facet, in the scheme's enumeration order.
    ///
    /// Coordinates are indexed 0..9 as p1.x, p1.y, p1.z, p2.x, ..., p3.z.
    /// - `Corners`: variant `m` (0..512) displaces coordinate `k` by
    ///   `+perturbation` when bit `k` of `m` is set, `-perturbation` otherwise.
    /// - `Axes`: for each coordinate `k` in order, one variant displaced by
    ///   `-perturbation` then one by `+perturbation`; all other coordinates
    ///   untouched.
    pub fn variants(&self, facet: &Facet) -> Vec<[Point3D; 3]> {
        let base = facet.points();
        let p = self.perturbation;

        match self.scheme {
            PerturbationScheme::Corners => (0u32..1 << 9)
                .map(|mask| {
                    let mut deltas = [0.0; 9];
                    for (k, delta) in deltas.iter_mut().enumerate() {
                        *delta = if (mask >> k) & 1 == 1 { p } else { -p };
                    }
                    displace(base, &deltas)
                })
                .collect(),
            PerturbationScheme::Axes => (0..9)
                .flat_map(|k| {
                    [-p, p].into_iter().map(move |delta| {
                        let mut deltas = [0.0; 9];
                        deltas[k] = delta;
                        displace(base, &deltas)
                    })
                })
                .collect(),
        }
    }

    fn variance(&self, facet: &Facet, nominal: &Nominal) -> Option<VarianceRecord> {
        let variants = self.variants(facet);
        let mut dips = Vec::with_capacity(variants.len());
        let mut directions = Vec::with_capacity(variants.len());
        let mut areas = Vec::with_capacity(variants.len());
        let mut degenerate = 0;

        for points in &variants {
            match measure(points, self.collinear_tolerance) {
                Ok(m) => {
                    dips.push(m.dip);
                    directions.push(m.dip_direction);
                    areas.push(m.area);
                }
                Err(_) => degenerate += 1,
            }
        }

        Some(VarianceRecord {
            dip: Spread::from_values(&dips)?,
            dip_direction: Spread::from_azimuths(nominal.dip_direction, &directions)?,
            area: Spread::from_values(&areas)?,
            variants: dips.len(),
            degenerate,
        })
    }
}

/// Evaluates a facet with the default scheme and collinearity tolerance.
///
/// `perturbation` is the coordinate displacement used by the variance
/// analysis ([`crate::config::DEFAULT_PERTURBATION`] = 0.05 in input
/// units); pass 0 to skip it.
pub fn evaluate(facet: &Facet, perturbation: f64) -> Result<PlaneMeasurement> {
    PlaneEvaluator::new(perturbation).evaluate(facet)
}

/// Validates a point slice as a facet and evaluates it.
pub fn evaluate_points(points: &[Point3D], perturbation: f64) -> Result<PlaneMeasurement> {
    evaluate(&Facet::new(points)?, perturbation)
}

/// Compass azimuth of the horizontal vector (`east`, `north`), in [0, 360).
pub fn azimuth(east: f64, north: f64) -> f64 {
    normalize_azimuth(east.atan2(north).to_degrees())
}

/// Folds an angle in degrees into [0, 360).
pub fn normalize_azimuth(degrees: f64) -> f64 {
    let a = degrees.rem_euclid(360.0);
    // rem_euclid can round a tiny negative input up to exactly 360
    if a == 0.0 || a >= 360.0 {
        0.0
    } else {
        a
    }
}

struct Nominal {
    dip: f64,
    dip_direction: f64,
    area: f64,
    trace: f64,
    normal: Vector3,
}

fn measure(points: &[Point3D; 3], collinear_tolerance: f64) -> Result<Nominal> {
    let [p1, p2, p3] = *points;
    let e1 = p2 - p1;
    let e2 = p3 - p1;
    let cross = e1.cross(&e2);

    let magnitude = cross.length();
    let l1 = e1.length();
    let l2 = e2.length();

    // |e1 x e2| = |e1||e2| sin(angle); coincident points give 0 on both sides
    if !(magnitude > collinear_tolerance * l1 * l2) {
        return Err(PlaneError::DegenerateFacet);
    }

    let mut normal = cross.normalized().ok_or(PlaneError::DegenerateFacet)?;
    if normal.z < 0.0 {
        normal = -normal;
    }

    // The horizontal part of an upward normal points down-slope.
    let dip = normal.z.clamp(0.0, 1.0).acos().to_degrees().clamp(0.0, 90.0);
    let dip_direction = azimuth(normal.x, normal.y);

    Ok(Nominal {
        dip,
        dip_direction,
        area: magnitude / 2.0,
        trace: l1 + l2,
        normal,
    })
}

fn displace(points: &[Point3D; 3], deltas: &[f64; 9]) -> [Point3D; 3] {
    let mut out = *points;
    for (i, p) in out.iter_mut().enumerate() {
        p.x += deltas[3 * i];
        p.y += deltas[3 * i + 1];
        p.z += deltas[3 * i + 2];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facet(coords: [[f64; 3]; 3]) -> Facet {
        Facet::from_points(coords.map(Point3D::from)).unwrap()
    }

    fn angle_diff(a: f64, b: f64) -> f64 {
        ((a - b + 180.0).rem_euclid(360.0) - 180.0).abs()
    }

    /// Rotates a point clockwise (compass sense) about the vertical axis.
    fn rotate_compass(p: Point3D, degrees: f64) -> Point3D {
        let (s, c) = degrees.to_radians().sin_cos();
        Point3D::new(p.x * c + p.y * s, -p.x * s + p.y * c, p.z)
    }

    /// Small deterministic generator so the property tests need no RNG crate.
    struct Lcg(u64);

    impl Lcg {
        fn next_f64(&mut self) -> f64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((self.0 >> 11) as f64 / (1u64 << 53) as f64) * 200.0 - 100.0
        }

        fn next_point(&mut self) -> Point3D {
            Point3D::new(self.next_f64(), self.next_f64(), self.next_f64())
        }
    }

    #[test]
    fn test_unit_right_triangle_area() {
        let m = evaluate(&facet([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]), 0.0).unwrap();
        assert!((m.area - 0.5).abs() < 1e-12);
        assert!((m.trace - 2.0).abs() < 1e-12);
        assert!(m.variance.is_none());
    }

    #[test]
    fn test_horizontal_facet_has_zero_dip() {
        let m = evaluate(&facet([[5.0, 2.0, 7.5], [9.0, 2.0, 7.5], [6.0, 8.0, 7.5]]), 0.0).unwrap();
        assert_eq!(m.dip, 0.0);
        assert!(m.normal.z > 0.0);

        // Clockwise winding flips the raw normal; the dip must not change.
        let m = evaluate(&facet([[5.0, 2.0, 7.5], [6.0, 8.0, 7.5], [9.0, 2.0, 7.5]]), 0.0).unwrap();
        assert_eq!(m.dip, 0.0);
    }

    #[test]
    fn test_vertical_facet_has_ninety_dip() {
        let m = evaluate(&facet([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]), 0.0).unwrap();
        assert!((m.dip - 90.0).abs() < 1e-9);
        assert!(m.dip <= 90.0);
    }

    #[test]
    fn test_dip_direction_points_down_slope() {
        // Plane z = -x descends toward East.
        let f = facet([[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, -1.0]]);
        let m = evaluate(&f, 0.0).unwrap();
        assert!((m.dip - 45.0).abs() < 1e-9);
        assert!((m.dip_direction - 90.0).abs() < 1e-9);

        // Plane z = y descends toward South.
        let f = facet([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, -2.0, -2.0]]);
        let m = evaluate(&f, 0.0).unwrap();
        assert!((m.dip - 45.0).abs() < 1e-9);
        assert!((m.dip_direction - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_azimuth_quadrants() {
        assert!((azimuth(1.0, 1.0) - 45.0).abs() < 1e-12);
        assert!((azimuth(1.0, -1.0) - 135.0).abs() < 1e-12);
        assert!((azimuth(-1.0, -1.0) - 225.0).abs() < 1e-12);
        assert!((azimuth(-1.0, 1.0) - 315.0).abs() < 1e-12);
        assert_eq!(azimuth(0.0, 1.0), 0.0);
        assert_eq!(azimuth(1.0, 0.0), 90.0);
        assert_eq!(azimuth(0.0, -1.0), 180.0);
        assert_eq!(azimuth(-1.0, 0.0), 270.0);
    }

    #[test]
    fn test_normalize_azimuth_stays_below_360() {
        assert_eq!(normalize_azimuth(360.0), 0.0);
        assert_eq!(normalize_azimuth(-1e-20), 0.0);
        assert_eq!(normalize_azimuth(-0.0), 0.0);
        assert!((normalize_azimuth(-90.0) - 270.0).abs() < 1e-12);
        assert!((normalize_azimuth(725.0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_collinear_points_are_degenerate() {
        let err = evaluate(&facet([[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]]), 0.05);
        assert_eq!(err, Err(PlaneError::DegenerateFacet));
    }

    #[test]
    fn test_coincident_points_are_degenerate() {
        let err = evaluate(&facet([[3.0, 4.0, 5.0], [3.0, 4.0, 5.0], [7.0, 1.0, 0.0]]), 0.0);
        assert_eq!(err, Err(PlaneError::DegenerateFacet));
    }

    #[test]
    fn test_collinearity_is_scale_invariant() {
        // Far from the origin and tiny, but a perfectly good triangle.
        let m = evaluate(
            &facet([
                [500_000.0, 6_000_000.0, 300.0],
                [500_000.001, 6_000_000.0, 300.0],
                [500_000.0, 6_000_000.001, 300.0],
            ]),
            0.0,
        );
        assert!(m.is_ok());
    }

    #[test]
    fn test_two_points_are_invalid() {
        let points = [Point3D::new(0.0, 0.0, 0.0), Point3D::new(1.0, 0.0, 0.0)];
        assert!(matches!(Facet::new(&points), Err(PlaneError::InvalidInput(_))));
        assert!(matches!(evaluate_points(&points, 0.05), Err(PlaneError::InvalidInput(_))));
    }

    #[test]
    fn test_non_finite_coordinates_are_invalid() {
        let points = [
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, f64::NAN, 0.0),
            Point3D::new(0.0, 1.0, 0.0),
        ];
        assert!(matches!(Facet::new(&points), Err(PlaneError::InvalidInput(_))));
    }

    #[test]
    fn test_negative_perturbation_is_invalid() {
        let f = facet([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(matches!(evaluate(&f, -0.1), Err(PlaneError::InvalidInput(_))));
        assert!(matches!(evaluate(&f, f64::NAN), Err(PlaneError::InvalidInput(_))));
    }

    #[test]
    fn test_ranges_hold_for_arbitrary_facets() {
        let mut rng = Lcg(42);
        let mut checked = 0;

        for _ in 0..500 {
            let points = [rng.next_point(), rng.next_point(), rng.next_point()];
            match evaluate_points(&points, 0.0) {
                Ok(m) => {
                    assert!((0.0..=90.0).contains(&m.dip), "dip {}", m.dip);
                    assert!(
                        (0.0..360.0).contains(&m.dip_direction),
                        "dip direction {}",
                        m.dip_direction
                    );
                    assert!(m.area > 0.0);
                    checked += 1;
                }
                Err(e) => assert_eq!(e, PlaneError::DegenerateFacet),
            }
        }
        assert!(checked > 450);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let f = facet([[10.0, 20.0, 5.0], [14.0, 21.0, 3.5], [11.0, 25.0, 4.0]]);
        let a = evaluate(&f, 0.05).unwrap();
        let b = evaluate(&f, 0.05).unwrap();

        assert_eq!(a, b);
        assert_eq!(a.dip.to_bits(), b.dip.to_bits());
        assert_eq!(a.dip_direction.to_bits(), b.dip_direction.to_bits());
        assert_eq!(a.area.to_bits(), b.area.to_bits());
    }

    #[test]
    fn test_rotation_about_vertical_shifts_dip_direction() {
        let base = [
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(0.0, 3.0, 0.5),
            Point3D::new(2.0, 0.0, -1.0),
        ];
        let reference = evaluate_points(&base, 0.0).unwrap();

        for theta in [15.0, 90.0, 137.5, 200.0, 300.0] {
            let rotated = base.map(|p| rotate_compass(p, theta));
            let m = evaluate_points(&rotated, 0.0).unwrap();

            assert!((m.dip - reference.dip).abs() < 1e-9);
            assert!((m.area - reference.area).abs() < 1e-9);
            let expected = normalize_azimuth(reference.dip_direction + theta);
            assert!(
                angle_diff(m.dip_direction, expected) < 1e-9,
                "theta {}: got {}, expected {}",
                theta,
                m.dip_direction,
                expected
            );
        }
    }

    #[test]
    fn test_corner_scheme_enumerates_all_sign_combinations() {
        let f = facet([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let variants = PlaneEvaluator::new(0.5).variants(&f);

        assert_eq!(variants.len(), 512);
        // Mask 0: everything displaced downward.
        assert_eq!(variants[0][0], Point3D::new(-0.5, -0.5, -0.5));
        assert_eq!(variants[0][2], Point3D::new(-0.5, 0.5, -0.5));
        // Mask 1: only p1.x displaced upward.
        assert_eq!(variants[1][0], Point3D::new(0.5, -0.5, -0.5));
        // Last mask: everything displaced upward.
        assert_eq!(variants[511][1], Point3D::new(1.5, 0.5, 0.5));
    }

    #[test]
    fn test_axes_scheme_moves_one_coordinate() {
        let f = facet([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let variants = PlaneEvaluator::new(0.1)
            .with_scheme(PerturbationScheme::Axes)
            .variants(&f);

        assert_eq!(variants.len(), 18);
        assert_eq!(variants[0][0], Point3D::new(-0.1, 0.0, 0.0));
        assert_eq!(variants[1][0], Point3D::new(0.1, 0.0, 0.0));
        assert_eq!(variants[17][2], Point3D::new(0.0, 1.0, 0.1));
        assert_eq!(variants[17][0], f.points()[0]);
    }

    #[test]
    fn test_flat_facet_variance_is_small_and_centred() {
        let f = facet([[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        let m = evaluate(&f, 0.05).unwrap();
        let v = m.variance.unwrap();

        assert_eq!(v.variants, 512);
        assert_eq!(v.degenerate, 0);

        assert!(v.dip.min >= 0.0);
        assert!(v.dip.max < 15.0);

        assert!(v.area.min < m.area && m.area < v.area.max);
        assert!((v.area.mean - m.area).abs() < 0.05);
        assert!(v.area.std_dev > 0.0);
    }

    #[test]
    fn test_tilted_facet_variance_is_centred_on_nominal() {
        let m = evaluate(
            &facet([[0.0, 0.0, 0.0], [0.0, 10.0, 0.0], [10.0, 0.0, -10.0]]),
            0.05,
        )
        .unwrap();
        let v = m.variance.unwrap();

        assert!((v.dip.mean - m.dip).abs() < 0.5);
        assert!(v.dip.range < 5.0);
        assert!(angle_diff(v.dip_direction.mean, m.dip_direction) < 0.5);
        assert!(v.dip_direction.range < 6.0);
        assert!(v.dip.min <= m.dip && m.dip <= v.dip.max);
    }

    #[test]
    fn test_axes_scheme_variance() {
        let f = facet([[0.0, 0.0, 0.0], [0.0, 10.0, 0.0], [10.0, 0.0, -10.0]]);
        let m = PlaneEvaluator::new(0.05)
            .with_scheme(PerturbationScheme::Axes)
            .evaluate(&f)
            .unwrap();

        assert_eq!(m.variance.unwrap().variants, 18);
    }

    #[test]
    fn test_azimuth_spread_across_north() {
        let s = Spread::from_azimuths(359.0, &[358.0, 359.0, 1.0, 2.0]).unwrap();
        assert!((s.range - 4.0).abs() < 1e-12);
        assert!((s.min - 358.0).abs() < 1e-12);
        assert!((s.max - 2.0).abs() < 1e-12);
        assert!(s.mean.abs() < 1e-12);
    }

    #[test]
    fn test_linear_spread() {
        let s = Spread::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert_eq!(s.range, 3.0);
        assert_eq!(s.mean, 2.5);
        assert!((s.std_dev - 1.25f64.sqrt()).abs() < 1e-12);

        assert!(Spread::from_values(&[]).is_none());
    }
}
