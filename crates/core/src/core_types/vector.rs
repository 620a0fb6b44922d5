//! Vector aliases and the arithmetic the integrator needs from them.
//!
//! Planar rays carry `(range, depth)` pairs and spatial rays carry
//! `(x, y, depth)` triples. Depth is always the last component and grows
//! downwards. The integrator is written once against [`RayVector`] and
//! monomorphised for both arities.

use nalgebra::{Vector2, Vector3};
use std::fmt::Debug;
use std::ops::{Add, Mul, Neg, Sub};

/// 2D vector type for planar ray positions and slowness vectors.
pub type Vec2 = Vector2<f64>;

/// 3D vector type for spatial ray state.
pub type Vec3 = Vector3<f64>;

/// Absolute ocean coordinates `(x, y, depth)` in meters.
pub type Point3 = Vector3<f64>;

/// Operations shared by planar and spatial ray vectors.
pub trait RayVector:
    Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + 'static
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
    + Neg<Output = Self>
{
    /// All components zero.
    fn zero() -> Self;

    /// Euclidean inner product.
    fn inner(&self, other: &Self) -> f64;

    /// Depth component (positive down).
    fn depth(&self) -> f64;

    /// Copy with the depth component replaced.
    #[must_use]
    fn with_depth(self, depth: f64) -> Self;

    /// Euclidean length.
    fn length(&self) -> f64 {
        self.inner(self).sqrt()
    }

    /// Length of the horizontal part.
    fn horizontal_length(&self) -> f64;
}

impl RayVector for Vec2 {
    #[inline]
    fn zero() -> Self {
        Vector2::zeros()
    }

    #[inline]
    fn inner(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    fn depth(&self) -> f64 {
        self.y
    }

    #[inline]
    fn with_depth(self, depth: f64) -> Self {
        Vector2::new(self.x, depth)
    }

    #[inline]
    fn horizontal_length(&self) -> f64 {
        self.x.abs()
    }
}

impl RayVector for Vec3 {
    #[inline]
    fn zero() -> Self {
        Vector3::zeros()
    }

    #[inline]
    fn inner(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    fn depth(&self) -> f64 {
        self.z
    }

    #[inline]
    fn with_depth(self, depth: f64) -> Self {
        Vector3::new(self.x, self.y, depth)
    }

    #[inline]
    fn horizontal_length(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_planar_depth_is_second_component() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.depth(), 4.0);
        assert_eq!(v.with_depth(9.0), Vec2::new(3.0, 9.0));
        assert_relative_eq!(v.length(), 5.0);
        assert_eq!(Vec2::new(-7.0, 1.0).horizontal_length(), 7.0);
    }

    #[test]
    fn test_spatial_horizontal_length() {
        let v = Vec3::new(3.0, 4.0, 12.0);
        assert_relative_eq!(v.horizontal_length(), 5.0);
        assert_relative_eq!(v.length(), 13.0);
        assert_eq!(v.depth(), 12.0);
    }
}
