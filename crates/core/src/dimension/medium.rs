//! Environment views in ray-frame coordinates.
//!
//! A [`Medium`] answers every question the integrator asks about the ocean
//! at a ray-frame position: sound speed and its derivatives, the boundary
//! beneath or above, and how far a straight step may run before it leaves
//! the current profile layer or boundary segment. Views are small `Copy`
//! structs borrowing the shared environment, built once per ray.

use super::{Planar, RayOrigin, RaySpace, Spatial};
use crate::core_types::{RayVector, Vec2, Vec3};
use crate::environment::{
    AttenuationModel, BoundaryCondition, BoundaryGrid, BoundarySide, Environment2D, Environment3D,
    SoundSpeedProfile,
};
use nalgebra::{Matrix2, Matrix3};
use num_complex::Complex64;

/// Sound speed and derivatives at a ray-frame position.
#[derive(Debug, Clone, Copy)]
pub struct SoundSpeed<S: RaySpace> {
    /// Real sound speed in m/s.
    pub c: f64,
    /// Complex speed carrying volume attenuation.
    pub complex: Complex64,
    /// Gradient of `c`.
    pub gradient: S::Vector,
    /// Hessian of `c`.
    pub hessian: S::Hessian,
    /// Water density in g/cm³.
    pub density: f64,
}

/// Local boundary surface at a ray-frame position.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryPatch<S: RaySpace> {
    /// Boundary depth.
    pub depth: f64,
    /// Unit normal pointing out of the water column.
    pub normal: S::Vector,
    /// Unit tangent in the ray's plane of incidence.
    pub tangent: S::Vector,
}

/// Environment as seen from one ray frame.
pub trait Medium<S: RaySpace>: Sync {
    /// Sound speed at `x`; interface ties follow `heading`.
    fn sound_speed(&self, x: &S::Vector, heading: &S::Vector) -> SoundSpeed<S>;

    /// Boundary depth above or below `x`.
    fn boundary_depth(&self, side: BoundarySide, x: &S::Vector, heading: &S::Vector) -> f64;

    /// Boundary surface at `x`; vertex ties follow `heading`.
    fn boundary(&self, side: BoundarySide, x: &S::Vector, heading: &S::Vector) -> BoundaryPatch<S>;

    /// Largest distance along the unit `direction` before the ray leaves the
    /// current profile layer or boundary segment.
    fn step_limit(&self, x: &S::Vector, direction: &S::Vector) -> f64;

    /// Reflection behaviour of one side.
    fn condition(&self, side: BoundarySide) -> &BoundaryCondition;

    /// Frequency and attenuation units of the run.
    fn attenuation(&self) -> &AttenuationModel;

    /// Signed vertical distance to a boundary, negative inside the water.
    fn gap(&self, side: BoundarySide, x: &S::Vector, heading: &S::Vector) -> f64 {
        let depth = self.boundary_depth(side, x, heading);
        match side {
            BoundarySide::Top => depth - x.depth(),
            BoundarySide::Bottom => x.depth() - depth,
        }
    }
}

fn planar_normals(side: BoundarySide, slope: f64) -> (Vec2, Vec2) {
    let norm = slope.hypot(1.0);
    let tangent = Vec2::new(1.0 / norm, slope / norm);
    let normal = match side {
        BoundarySide::Top => Vec2::new(slope / norm, -1.0 / norm),
        BoundarySide::Bottom => Vec2::new(-slope / norm, 1.0 / norm),
    };
    (normal, tangent)
}

fn axis_distance(position: f64, lo: f64, hi: f64, speed: f64) -> f64 {
    if speed > 0.0 {
        (hi - position) / speed
    } else if speed < 0.0 {
        (lo - position) / speed
    } else {
        f64::INFINITY
    }
}

fn layer_distance(ssp: &SoundSpeedProfile, depth: f64, direction_z: f64) -> f64 {
    let (lo, hi) = ssp.layer_bounds(depth, direction_z);
    axis_distance(depth, lo, hi, direction_z)
}

fn planar_sound_speed(
    ssp: &SoundSpeedProfile,
    model: &AttenuationModel,
    x: &Vec2,
    heading: &Vec2,
) -> SoundSpeed<Planar> {
    let s = ssp.evaluate_directed(x.x, x.y, heading.x, heading.y);
    SoundSpeed {
        c: s.c,
        complex: model.water_speed(s.c, s.attenuation),
        gradient: Vec2::new(s.dc_dr, s.dc_dz),
        hessian: Matrix2::new(s.d2c_dr2, s.d2c_drdz, s.d2c_drdz, s.d2c_dz2),
        density: s.density,
    }
}

/// Range/depth environment seen by planar rays.
#[derive(Debug, Clone, Copy)]
pub struct PlanarMedium<'a> {
    env: &'a Environment2D,
    model: AttenuationModel,
}

impl<'a> PlanarMedium<'a> {
    /// View of `env` at the run's frequency.
    pub fn new(env: &'a Environment2D, model: AttenuationModel) -> Self {
        Self { env, model }
    }
}

impl Medium<Planar> for PlanarMedium<'_> {
    fn sound_speed(&self, x: &Vec2, heading: &Vec2) -> SoundSpeed<Planar> {
        planar_sound_speed(self.env.ssp(), &self.model, x, heading)
    }

    fn boundary_depth(&self, side: BoundarySide, x: &Vec2, heading: &Vec2) -> f64 {
        self.env.geometry(side).query_directed(x.x, heading.x).depth
    }

    fn boundary(&self, side: BoundarySide, x: &Vec2, heading: &Vec2) -> BoundaryPatch<Planar> {
        let q = self.env.geometry(side).query_directed(x.x, heading.x);
        let (normal, tangent) = planar_normals(side, q.slope);
        BoundaryPatch {
            depth: q.depth,
            normal,
            tangent,
        }
    }

    fn step_limit(&self, x: &Vec2, direction: &Vec2) -> f64 {
        let ssp = self.env.ssp();
        let mut limit = layer_distance(ssp, x.y, direction.y);
        if let Some((lo, hi)) = ssp.range_bounds(x.x, direction.x) {
            limit = limit.min(axis_distance(x.x, lo, hi, direction.x));
        }
        for side in BoundarySide::BOTH {
            let geometry = self.env.geometry(side);
            let segment = geometry.query_directed(x.x, direction.x).segment;
            let (lo, hi) = geometry.segment_bounds(segment);
            limit = limit.min(axis_distance(x.x, lo, hi, direction.x));
        }
        limit
    }

    fn condition(&self, side: BoundarySide) -> &BoundaryCondition {
        self.env.condition(side)
    }

    fn attenuation(&self) -> &AttenuationModel {
        &self.model
    }
}

/// Vertical slice of a 3D environment along one bearing.
#[derive(Debug, Clone, Copy)]
pub struct SliceMedium<'a> {
    env: &'a Environment3D,
    model: AttenuationModel,
    origin: Vec2,
    direction: Vec2,
}

impl<'a> SliceMedium<'a> {
    /// Slice through `origin.source` along `origin.bearing`.
    pub fn new(env: &'a Environment3D, model: AttenuationModel, origin: &RayOrigin) -> Self {
        Self {
            env,
            model,
            origin: Vec2::new(origin.source.x, origin.source.y),
            direction: origin.direction(),
        }
    }

    fn horizontal(&self, range: f64) -> Vec2 {
        self.origin + self.direction * range
    }

    fn heading(&self, heading_r: f64) -> Vec2 {
        self.direction * heading_r.signum()
    }
}

impl Medium<Planar> for SliceMedium<'_> {
    fn sound_speed(&self, x: &Vec2, heading: &Vec2) -> SoundSpeed<Planar> {
        planar_sound_speed(self.env.ssp(), &self.model, x, heading)
    }

    fn boundary_depth(&self, side: BoundarySide, x: &Vec2, heading: &Vec2) -> f64 {
        let p = self.horizontal(x.x);
        let h = self.heading(heading.x);
        self.env.geometry(side).query_directed(p.x, p.y, h.x, h.y).depth
    }

    fn boundary(&self, side: BoundarySide, x: &Vec2, heading: &Vec2) -> BoundaryPatch<Planar> {
        let p = self.horizontal(x.x);
        let h = self.heading(heading.x);
        let q = self.env.geometry(side).query_directed(p.x, p.y, h.x, h.y);
        let slope = q.gradient.dot(&self.direction);
        let (normal, tangent) = planar_normals(side, slope);
        BoundaryPatch {
            depth: q.depth,
            normal,
            tangent,
        }
    }

    fn step_limit(&self, x: &Vec2, direction: &Vec2) -> f64 {
        let mut limit = layer_distance(self.env.ssp(), x.y, direction.y);
        if direction.x != 0.0 {
            let p = self.horizontal(x.x);
            let h = self.direction * direction.x;
            for side in BoundarySide::BOTH {
                limit = limit.min(grid_cell_distance(self.env.geometry(side), &p, &h));
            }
        }
        limit
    }

    fn condition(&self, side: BoundarySide) -> &BoundaryCondition {
        self.env.condition(side)
    }

    fn attenuation(&self) -> &AttenuationModel {
        &self.model
    }
}

/// Full 3D environment seen by spatial rays.
#[derive(Debug, Clone, Copy)]
pub struct SpatialMedium<'a> {
    env: &'a Environment3D,
    model: AttenuationModel,
}

impl<'a> SpatialMedium<'a> {
    /// View of `env` at the run's frequency.
    pub fn new(env: &'a Environment3D, model: AttenuationModel) -> Self {
        Self { env, model }
    }
}

impl Medium<Spatial> for SpatialMedium<'_> {
    fn sound_speed(&self, x: &Vec3, heading: &Vec3) -> SoundSpeed<Spatial> {
        let s = self.env.ssp().evaluate_directed(0.0, x.z, 0.0, heading.z);
        let mut hessian = Matrix3::zeros();
        hessian[(2, 2)] = s.d2c_dz2;
        SoundSpeed {
            c: s.c,
            complex: self.model.water_speed(s.c, s.attenuation),
            gradient: Vec3::new(0.0, 0.0, s.dc_dz),
            hessian,
            density: s.density,
        }
    }

    fn boundary_depth(&self, side: BoundarySide, x: &Vec3, heading: &Vec3) -> f64 {
        self.env
            .geometry(side)
            .query_directed(x.x, x.y, heading.x, heading.y)
            .depth
    }

    fn boundary(&self, side: BoundarySide, x: &Vec3, heading: &Vec3) -> BoundaryPatch<Spatial> {
        let q = self
            .env
            .geometry(side)
            .query_directed(x.x, x.y, heading.x, heading.y);
        let g = q.gradient;
        let normal = match side {
            BoundarySide::Top => Vec3::new(g.x, g.y, -1.0),
            BoundarySide::Bottom => Vec3::new(-g.x, -g.y, 1.0),
        }
        .normalize();
        let along = *heading - normal * heading.dot(&normal);
        let length = along.norm();
        let tangent = if length > 0.0 {
            along / length
        } else {
            Vec3::zeros()
        };
        BoundaryPatch {
            depth: q.depth,
            normal,
            tangent,
        }
    }

    fn step_limit(&self, x: &Vec3, direction: &Vec3) -> f64 {
        let mut limit = layer_distance(self.env.ssp(), x.z, direction.z);
        let p = Vec2::new(x.x, x.y);
        let h = Vec2::new(direction.x, direction.y);
        if h.x != 0.0 || h.y != 0.0 {
            for side in BoundarySide::BOTH {
                limit = limit.min(grid_cell_distance(self.env.geometry(side), &p, &h));
            }
        }
        limit
    }

    fn condition(&self, side: BoundarySide) -> &BoundaryCondition {
        self.env.condition(side)
    }

    fn attenuation(&self) -> &AttenuationModel {
        &self.model
    }
}

/// Distance along the horizontal velocity `h` until `p` leaves its grid cell.
fn grid_cell_distance(grid: &BoundaryGrid, p: &Vec2, h: &Vec2) -> f64 {
    let cell = grid.query_directed(p.x, p.y, h.x, h.y).cell;
    let (x0, x1, y0, y1) = grid.cell_bounds(cell);
    axis_distance(p.x, x0, x1, h.x).min(axis_distance(p.y, y0, y1, h.y))
}

/// Borrowed environments are media too, for callers holding a reference.
impl<S: RaySpace, M: Medium<S>> Medium<S> for &M {
    fn sound_speed(&self, x: &S::Vector, heading: &S::Vector) -> SoundSpeed<S> {
        (**self).sound_speed(x, heading)
    }

    fn boundary_depth(&self, side: BoundarySide, x: &S::Vector, heading: &S::Vector) -> f64 {
        (**self).boundary_depth(side, x, heading)
    }

    fn boundary(&self, side: BoundarySide, x: &S::Vector, heading: &S::Vector) -> BoundaryPatch<S> {
        (**self).boundary(side, x, heading)
    }

    fn step_limit(&self, x: &S::Vector, direction: &S::Vector) -> f64 {
        (**self).step_limit(x, direction)
    }

    fn condition(&self, side: BoundarySide) -> &BoundaryCondition {
        (**self).condition(side)
    }

    fn attenuation(&self) -> &AttenuationModel {
        (**self).attenuation()
    }
}

/// Environment constructor shared by the tests in this crate.
#[cfg(test)]
pub(crate) fn flat_environment<G: crate::environment::BoundaryGeometry>(
    top: G,
    bottom: G,
    speed: f64,
    depth: f64,
) -> crate::environment::Environment<G> {
    crate::environment::Environment::new(
        SoundSpeedProfile::isovelocity(speed, 0.0, depth).unwrap(),
        top,
        bottom,
        BoundaryCondition::PressureRelease,
        BoundaryCondition::Rigid,
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Point3;
    use crate::environment::{
        AttenuationUnits, BoundaryProfile, BoundaryVertex, Environment, GridSpec, SspInterpolation,
        SspPoint,
    };
    use approx::assert_relative_eq;

    fn model() -> AttenuationModel {
        AttenuationModel {
            frequency: 100.0,
            units: AttenuationUnits::DecibelsPerWavelength,
            thorp: false,
        }
    }

    fn sloped_2d() -> Environment2D {
        Environment::new(
            SoundSpeedProfile::new(
                SspInterpolation::CLinear,
                vec![
                    SspPoint::new(0.0, 1500.0),
                    SspPoint::new(40.0, 1490.0),
                    SspPoint::new(200.0, 1510.0),
                ],
            )
            .unwrap(),
            BoundaryProfile::flat(0.0),
            BoundaryProfile::new(vec![
                BoundaryVertex::new(0.0, 100.0),
                BoundaryVertex::new(1000.0, 200.0),
            ])
            .unwrap(),
            BoundaryCondition::PressureRelease,
            BoundaryCondition::Rigid,
        )
        .unwrap()
    }

    #[test]
    fn test_planar_normals_point_out_of_water() {
        let env = sloped_2d();
        let medium = PlanarMedium::new(&env, model());
        let heading = Vec2::new(1.0, 0.0);
        let bottom = medium.boundary(BoundarySide::Bottom, &Vec2::new(500.0, 150.0), &heading);
        assert_relative_eq!(bottom.depth, 150.0);
        assert!(bottom.normal.y > 0.0);
        assert_relative_eq!(bottom.normal.dot(&bottom.tangent), 0.0, epsilon = 1e-15);
        let top = medium.boundary(BoundarySide::Top, &Vec2::new(500.0, 10.0), &heading);
        assert_eq!(top.normal, Vec2::new(0.0, -1.0));
    }

    #[test]
    fn test_gap_sign_convention() {
        let env = sloped_2d();
        let medium = PlanarMedium::new(&env, model());
        let h = Vec2::new(1.0, 0.0);
        let x = Vec2::new(0.0, 30.0);
        assert_relative_eq!(medium.gap(BoundarySide::Top, &x, &h), -30.0);
        assert_relative_eq!(medium.gap(BoundarySide::Bottom, &x, &h), -70.0);
        let below = Vec2::new(0.0, 120.0);
        assert!(medium.gap(BoundarySide::Bottom, &below, &h) > 0.0);
    }

    #[test]
    fn test_step_limit_stops_at_layer_and_segment() {
        let env = sloped_2d();
        let medium = PlanarMedium::new(&env, model());
        // Straight down from 10 m stops at the 40 m interface
        let down = Vec2::new(0.0, 1.0);
        assert_relative_eq!(medium.step_limit(&Vec2::new(500.0, 10.0), &down), 30.0);
        // Horizontal from 500 m stops at the 1000 m bottom vertex
        let along = Vec2::new(1.0, 0.0);
        assert_relative_eq!(medium.step_limit(&Vec2::new(500.0, 50.0), &along), 500.0);
        // On the interface heading up, the next stop is the surface layer top
        let up = Vec2::new(0.0, -1.0);
        assert_relative_eq!(medium.step_limit(&Vec2::new(500.0, 40.0), &up), 40.0);
    }

    #[test]
    fn test_slice_projects_grid_slope_onto_bearing() {
        let env = Environment::new(
            SoundSpeedProfile::isovelocity(1500.0, 0.0, 300.0).unwrap(),
            BoundaryGrid::flat(0.0),
            BoundaryGrid::new(GridSpec {
                xs: vec![0.0, 1000.0],
                ys: vec![0.0, 1000.0],
                depths: vec![100.0, 200.0, 100.0, 200.0],
            })
            .unwrap(),
            BoundaryCondition::PressureRelease,
            BoundaryCondition::Rigid,
        )
        .unwrap();
        let origin = RayOrigin::new(Point3::new(0.0, 500.0, 50.0), 0.0);
        let along_x = SliceMedium::new(&env, model(), &origin);
        let h = Vec2::new(1.0, 0.0);
        let patch = along_x.boundary(BoundarySide::Bottom, &Vec2::new(500.0, 100.0), &h);
        assert_relative_eq!(patch.depth, 150.0);
        assert_relative_eq!(patch.tangent.y / patch.tangent.x, 0.1, epsilon = 1e-12);

        let across = RayOrigin::new(Point3::new(500.0, 0.0, 50.0), std::f64::consts::FRAC_PI_2);
        let along_y = SliceMedium::new(&env, model(), &across);
        let patch = along_y.boundary(BoundarySide::Bottom, &Vec2::new(300.0, 100.0), &h);
        assert_relative_eq!(patch.depth, 150.0, epsilon = 1e-9);
        assert_relative_eq!(patch.tangent.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_spatial_boundary_normal_on_slope() {
        let env = Environment::new(
            SoundSpeedProfile::isovelocity(1500.0, 0.0, 300.0).unwrap(),
            BoundaryGrid::flat(0.0),
            BoundaryGrid::new(GridSpec {
                xs: vec![0.0, 1000.0],
                ys: vec![0.0, 1000.0],
                depths: vec![100.0, 200.0, 100.0, 200.0],
            })
            .unwrap(),
            BoundaryCondition::PressureRelease,
            BoundaryCondition::Rigid,
        )
        .unwrap();
        let medium = SpatialMedium::new(&env, model());
        let heading = Vec3::new(1.0, 0.0, 0.0);
        let patch = medium.boundary(BoundarySide::Bottom, &Vec3::new(500.0, 500.0, 150.0), &heading);
        let expected = Vec3::new(-0.1, 0.0, 1.0).normalize();
        assert_relative_eq!(patch.normal, expected, epsilon = 1e-12);
        assert_relative_eq!(patch.tangent.dot(&patch.normal), 0.0, epsilon = 1e-12);
    }
}
