//! Compile-time dimensionality
//!
//! Two independent choices describe a run:
//!
//! - The **ray space** ([`RaySpace`]) fixes the arity of the ray state.
//!   [`Planar`] rays live in a `(range, depth)` plane, [`Spatial`] rays in
//!   `(x, y, depth)`.
//! - The **dimensionality** ([`Dimensionality`]) fixes the environment
//!   geometry and how a ray sees it:
//!   - [`TwoD`] traces planar rays through a range/depth environment.
//!   - [`Nx2D`] traces planar rays through vertical slices of a 3D
//!     environment, one slice per bearing.
//!   - [`ThreeD`] traces spatial rays through the 3D environment.
//!
//! Both are type parameters, so the integrator is monomorphised per mode
//! and the hot loop never branches on dimensionality.

pub mod medium;

pub use medium::{BoundaryPatch, Medium, PlanarMedium, SliceMedium, SoundSpeed, SpatialMedium};

use crate::core_types::{Point3, RayVector, Vec2, Vec3};
use crate::environment::{
    AttenuationModel, BoundaryGeometry, BoundaryGrid, BoundaryProfile, BoundarySide, Environment,
};
use nalgebra::{Matrix2, Matrix3};
use std::fmt::Debug;

/// Where a ray frame sits in the ocean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayOrigin {
    /// Source position in ocean coordinates.
    pub source: Point3,
    /// Bearing of the vertical plane, radians from +x toward +y.
    pub bearing: f64,
}

impl RayOrigin {
    /// Frame at `source` along `bearing` (radians).
    pub fn new(source: Point3, bearing: f64) -> Self {
        Self { source, bearing }
    }

    /// Unit horizontal direction of the bearing.
    #[inline]
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.bearing.cos(), self.bearing.sin())
    }
}

/// Arity-specific ray geometry.
pub trait RaySpace: Copy + Debug + PartialEq + Send + Sync + 'static {
    /// Position and slowness vector type.
    type Vector: RayVector;
    /// Sound-speed Hessian type.
    type Hessian: Copy + Debug + Send + Sync;

    /// Name for logs.
    const NAME: &'static str;

    /// Source position expressed in the ray frame.
    fn launch_position(origin: &RayOrigin) -> Self::Vector;

    /// Unit launch direction for a declination (positive down) and bearing,
    /// both in radians.
    fn launch_direction(declination: f64, bearing: f64) -> Self::Vector;

    /// Ray-frame position to absolute ocean coordinates.
    fn to_ocean(x: &Self::Vector, origin: &RayOrigin) -> Point3;

    /// Horizontal distance from the source.
    fn horizontal_range(x: &Self::Vector, origin: &RayOrigin) -> f64;

    /// Transverse curvature `n·H·n / c²` for each paraxial component.
    fn transverse_curvature(hessian: &Self::Hessian, t: &Self::Vector, c: f64) -> Vec2;

    /// Paraxial `(p, q)` at the source.
    fn initial_paraxial() -> (Vec2, Vec2);

    /// Change of `p` per unit `q` across a reflection.
    fn reflection_curvature(jump: &ReflectionJump<Self>) -> Vec2;
}

/// Inputs to the paraxial curvature jump at a reflection.
#[derive(Debug, Clone, Copy)]
pub struct ReflectionJump<S: RaySpace> {
    /// Sound speed at the reflection point.
    pub c: f64,
    /// Sound-speed gradient at the reflection point.
    pub gradient: S::Vector,
    /// Incident slowness.
    pub incident: S::Vector,
    /// Reflected slowness.
    pub reflected: S::Vector,
    /// Incident slowness along the boundary tangent.
    pub tangential: f64,
    /// Incident slowness along the outward normal.
    pub normal: f64,
    /// Which boundary reflected the ray.
    pub side: BoundarySide,
}

/// `(range, depth)` rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Planar;

/// `(x, y, depth)` rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spatial;

impl RaySpace for Planar {
    type Vector = Vec2;
    type Hessian = Matrix2<f64>;

    const NAME: &'static str = "planar";

    fn launch_position(origin: &RayOrigin) -> Vec2 {
        Vec2::new(0.0, origin.source.z)
    }

    fn launch_direction(declination: f64, _bearing: f64) -> Vec2 {
        Vec2::new(declination.cos(), declination.sin())
    }

    fn to_ocean(x: &Vec2, origin: &RayOrigin) -> Point3 {
        let dir = origin.direction();
        Point3::new(
            origin.source.x + x.x * dir.x,
            origin.source.y + x.x * dir.y,
            x.y,
        )
    }

    fn horizontal_range(x: &Vec2, _origin: &RayOrigin) -> f64 {
        x.x.abs()
    }

    fn transverse_curvature(hessian: &Matrix2<f64>, t: &Vec2, _c: f64) -> Vec2 {
        let crr = hessian[(0, 0)];
        let crz = hessian[(0, 1)];
        let czz = hessian[(1, 1)];
        let k = t.y * t.y * crr - 2.0 * t.x * t.y * crz + t.x * t.x * czz;
        Vec2::new(k, k)
    }

    fn initial_paraxial() -> (Vec2, Vec2) {
        (Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0))
    }

    fn reflection_curvature(jump: &ReflectionJump<Self>) -> Vec2 {
        let c = jump.c;
        let ray_t = jump.incident * c;
        let ray_n = Vec2::new(-ray_t.y, ray_t.x);
        let ray_t_out = jump.reflected * c;
        let ray_n_out = -Vec2::new(-ray_t_out.y, ray_t_out.x);

        let mut cn_jump = -jump.gradient.inner(&(ray_n_out - ray_n));
        let cs_jump = jump.gradient.inner(&(ray_t_out - ray_t));
        if jump.side == BoundarySide::Top {
            cn_jump = -cn_jump;
        }
        if jump.normal == 0.0 {
            return Vec2::zeros();
        }
        let rm = jump.tangential / jump.normal;
        let rn = rm * (2.0 * cn_jump - rm * cs_jump) / (c * c);
        Vec2::new(rn, rn)
    }
}

impl RaySpace for Spatial {
    type Vector = Vec3;
    type Hessian = Matrix3<f64>;

    const NAME: &'static str = "spatial";

    fn launch_position(origin: &RayOrigin) -> Vec3 {
        origin.source
    }

    fn launch_direction(declination: f64, bearing: f64) -> Vec3 {
        let horizontal = declination.cos();
        Vec3::new(
            horizontal * bearing.cos(),
            horizontal * bearing.sin(),
            declination.sin(),
        )
    }

    fn to_ocean(x: &Vec3, _origin: &RayOrigin) -> Point3 {
        *x
    }

    fn horizontal_range(x: &Vec3, origin: &RayOrigin) -> f64 {
        (x.x - origin.source.x).hypot(x.y - origin.source.y)
    }

    fn transverse_curvature(hessian: &Matrix3<f64>, t: &Vec3, c: f64) -> Vec2 {
        let (e1, e2) = transverse_frame(&(*t * c));
        let c2 = c * c;
        Vec2::new(
            e1.dot(&(hessian * e1)) / c2,
            e2.dot(&(hessian * e2)) / c2,
        )
    }

    fn initial_paraxial() -> (Vec2, Vec2) {
        (Vec2::new(1.0, 1.0), Vec2::zeros())
    }

    fn reflection_curvature(_jump: &ReflectionJump<Self>) -> Vec2 {
        Vec2::zeros()
    }
}

/// Unit vectors normal to `u`: `e1` in the vertical plane of the ray,
/// `e2` horizontal.
pub fn transverse_frame(u: &Vec3) -> (Vec3, Vec3) {
    let horizontal = u.x.hypot(u.y);
    let e2 = if horizontal > 1.0e-12 {
        Vec3::new(u.y / horizontal, -u.x / horizontal, 0.0)
    } else {
        Vec3::new(0.0, 1.0, 0.0)
    };
    let e1 = e2.cross(u);
    let norm = e1.norm();
    (if norm > 0.0 { e1 / norm } else { e1 }, e2)
}

/// Ocean-mode tag binding a ray space to an environment geometry.
pub trait Dimensionality: Copy + Debug + Send + Sync + 'static {
    /// Ray state arity.
    type Space: RaySpace;
    /// Boundary geometry of the environment.
    type Geometry: BoundaryGeometry;
    /// View of the environment along one ray frame.
    type Medium<'a>: Medium<Self::Space>
    where
        Self: 'a;

    /// Name for logs.
    const NAME: &'static str;

    /// Whether launches fan out over bearings as well as declinations.
    const USES_BEARINGS: bool;

    /// Whether each bearing is traced as an independent planar slice.
    const SLICED: bool;

    /// Build the view a ray launched from `origin` sees.
    fn medium<'a>(
        env: &'a Environment<Self::Geometry>,
        attenuation: AttenuationModel,
        origin: &RayOrigin,
    ) -> Self::Medium<'a>;
}

/// Range/depth environment, planar rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TwoD;

/// 3D environment, planar rays in one vertical slice per bearing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Nx2D;

/// 3D environment, spatial rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThreeD;

impl Dimensionality for TwoD {
    type Space = Planar;
    type Geometry = BoundaryProfile;
    type Medium<'a> = PlanarMedium<'a>;

    const NAME: &'static str = "2D";
    const USES_BEARINGS: bool = false;
    const SLICED: bool = false;

    fn medium<'a>(
        env: &'a Environment<BoundaryProfile>,
        attenuation: AttenuationModel,
        _origin: &RayOrigin,
    ) -> PlanarMedium<'a> {
        PlanarMedium::new(env, attenuation)
    }
}

impl Dimensionality for Nx2D {
    type Space = Planar;
    type Geometry = BoundaryGrid;
    type Medium<'a> = SliceMedium<'a>;

    const NAME: &'static str = "Nx2D";
    const USES_BEARINGS: bool = true;
    const SLICED: bool = true;

    fn medium<'a>(
        env: &'a Environment<BoundaryGrid>,
        attenuation: AttenuationModel,
        origin: &RayOrigin,
    ) -> SliceMedium<'a> {
        SliceMedium::new(env, attenuation, origin)
    }
}

impl Dimensionality for ThreeD {
    type Space = Spatial;
    type Geometry = BoundaryGrid;
    type Medium<'a> = SpatialMedium<'a>;

    const NAME: &'static str = "3D";
    const USES_BEARINGS: bool = true;
    const SLICED: bool = false;

    fn medium<'a>(
        env: &'a Environment<BoundaryGrid>,
        attenuation: AttenuationModel,
        _origin: &RayOrigin,
    ) -> SpatialMedium<'a> {
        SpatialMedium::new(env, attenuation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_planar_to_ocean_follows_bearing() {
        let origin = RayOrigin::new(Point3::new(100.0, 200.0, 50.0), 30f64.to_radians());
        let p = Planar::to_ocean(&Vec2::new(1000.0, 75.0), &origin);
        assert_relative_eq!(p.x, 100.0 + 1000.0 * 30f64.to_radians().cos(), epsilon = 1e-9);
        assert_relative_eq!(p.y, 200.0 + 500.0, epsilon = 1e-9);
        assert_eq!(p.z, 75.0);
    }

    #[test]
    fn test_spatial_frame_is_identity() {
        let origin = RayOrigin::new(Point3::new(1.0, 2.0, 3.0), 0.0);
        let x = Vec3::new(4.0, 6.0, 9.0);
        assert_eq!(Spatial::to_ocean(&x, &origin), x);
        assert_relative_eq!(Spatial::horizontal_range(&x, &origin), 5.0);
        assert_eq!(Spatial::launch_position(&origin), origin.source);
    }

    #[test]
    fn test_launch_directions_are_unit() {
        let a = 20f64.to_radians();
        let b = 135f64.to_radians();
        assert_relative_eq!(Planar::launch_direction(a, b).norm(), 1.0);
        let s = Spatial::launch_direction(a, b);
        assert_relative_eq!(s.norm(), 1.0);
        assert!(s.z > 0.0, "positive declination points down");
    }

    #[test]
    fn test_transverse_frame_is_orthonormal() {
        let u = Spatial::launch_direction(0.3, 1.1);
        let (e1, e2) = transverse_frame(&u);
        assert_relative_eq!(e1.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(e2.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(e1.dot(&u), 0.0, epsilon = 1e-12);
        assert_relative_eq!(e2.dot(&u), 0.0, epsilon = 1e-12);
        assert_relative_eq!(e1.dot(&e2), 0.0, epsilon = 1e-12);
        assert_eq!(e2.z, 0.0);
    }

    #[test]
    fn test_planar_curvature_of_vertical_gradient() {
        // Horizontal ray in a medium with curvature only in depth
        let c = 1500.0;
        let h = Matrix2::new(0.0, 0.0, 0.0, 2.0e-3);
        let t = Vec2::new(1.0 / c, 0.0);
        let k = Planar::transverse_curvature(&h, &t, c);
        assert_relative_eq!(k.x, 2.0e-3 / (c * c));
        assert_eq!(k.x, k.y);
    }

    #[test]
    fn test_spatial_curvature_matches_planar_in_vertical_plane() {
        let c = 1500.0;
        let a = 0.2_f64;
        let t2 = Vec2::new(a.cos() / c, a.sin() / c);
        let t3 = Vec3::new(a.cos() / c, 0.0, a.sin() / c);
        let h2 = Matrix2::new(0.0, 0.0, 0.0, 1.0e-3);
        let mut h3 = Matrix3::zeros();
        h3[(2, 2)] = 1.0e-3;
        let k2 = Planar::transverse_curvature(&h2, &t2, c);
        let k3 = Spatial::transverse_curvature(&h3, &t3, c);
        assert_relative_eq!(k3.x, k2.x, max_relative = 1e-12);
        assert_relative_eq!(k3.y, 0.0, epsilon = 1e-20);
    }

    #[test]
    fn test_reflection_curvature_vanishes_without_gradient() {
        let c = 1500.0;
        let jump = ReflectionJump::<Planar> {
            c,
            gradient: Vec2::zeros(),
            incident: Vec2::new(0.8 / c, 0.6 / c),
            reflected: Vec2::new(0.8 / c, -0.6 / c),
            tangential: 0.8 / c,
            normal: 0.6 / c,
            side: BoundarySide::Bottom,
        };
        assert_eq!(Planar::reflection_curvature(&jump), Vec2::zeros());
    }
}
