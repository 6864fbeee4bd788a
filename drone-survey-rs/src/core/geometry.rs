//! Point and vector primitives for facet geometry.
//!
//! Coordinates live in a local survey frame: x = East, y = North, z = Up.

use std::ops::{Add, Neg, Sub};

/// A 3D point in survey coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Returns true if every coordinate is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Returns true if the two points agree within `tolerance` on every axis.
    pub fn approx_eq(&self, other: &Point3D, tolerance: f64) -> bool {
        (self.x - other.x).abs() < tolerance
            && (self.y - other.y).abs() < tolerance
            && (self.z - other.z).abs() < tolerance
    }

    /// Coordinates as an array, in x, y, z order.
    #[inline]
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[inline]
    pub fn from_array(coords: [f64; 3]) -> Self {
        Self::new(coords[0], coords[1], coords[2])
    }
}

impl From<[f64; 3]> for Point3D {
    fn from(coords: [f64; 3]) -> Self {
        Self::from_array(coords)
    }
}

/// A displacement between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(&self, other: &Vector3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    pub fn cross(&self, other: &Vector3) -> Vector3 {
        Vector3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Returns the unit vector, or `None` for a zero-length vector.
    pub fn normalized(&self) -> Option<Vector3> {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        Some(Vector3::new(self.x / len, self.y / len, self.z / len))
    }
}

impl Sub for Point3D {
    type Output = Vector3;

    fn sub(self, rhs: Point3D) -> Vector3 {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Add<Vector3> for Point3D {
    type Output = Point3D;

    fn add(mut self, rhs: Vector3) -> Point3D {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
        self
    }
}

impl Neg for Vector3 {
    type Output = Vector3;

    fn neg(self) -> Vector3 {
        Vector3::new(-self.x, -self.y, -self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_difference_and_offset() {
        let a = Point3D::new(1.0, 2.0, 3.0);
        let b = Point3D::new(4.0, 6.0, 3.0);

        let v = b - a;
        assert_eq!(v, Vector3::new(3.0, 4.0, 0.0));
        assert_eq!(v.length(), 5.0);
        assert_eq!(a + v, b);
    }

    #[test]
    fn test_cross_product_right_handed() {
        let x = Vector3::new(1.0, 0.0, 0.0);
        let y = Vector3::new(0.0, 1.0, 0.0);

        assert_eq!(x.cross(&y), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(y.cross(&x), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(x.cross(&x), Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_normalized() {
        let v = Vector3::new(0.0, 3.0, 4.0).normalized().unwrap();
        assert!((v.length() - 1.0).abs() < 1e-12);
        assert!((v.y - 0.6).abs() < 1e-12);

        assert!(Vector3::new(0.0, 0.0, 0.0).normalized().is_none());
    }

    #[test]
    fn test_approx_eq_and_finite() {
        let a = Point3D::new(1.0, 1.0, 1.0);
        assert!(a.approx_eq(&Point3D::new(1.0 + 5e-7, 1.0, 1.0 - 5e-7), 1e-6));
        assert!(!a.approx_eq(&Point3D::new(1.0 + 2e-6, 1.0, 1.0), 1e-6));

        assert!(a.is_finite());
        assert!(!Point3D::new(f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Point3D::new(0.0, f64::INFINITY, 0.0).is_finite());
    }
}
