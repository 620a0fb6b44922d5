//! Ray state and completed ray histories.

use crate::core_types::{Point3, Vec2};
use crate::dimension::{RayOrigin, RaySpace};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Ray state at one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayPoint<S: RaySpace> {
    /// Position in the ray frame.
    pub x: S::Vector,
    /// Slowness vector, tangent to the ray with length `1/c`.
    pub t: S::Vector,
    /// Paraxial slowness.
    pub p: Vec2,
    /// Paraxial spreading.
    pub q: Vec2,
    /// Sound speed at `x`.
    pub c: f64,
    /// Travel time; the imaginary part carries volume attenuation.
    pub tau: Complex64,
    /// Amplitude lost to boundary reflections, 1 at launch.
    pub amp: f64,
    /// Phase picked up at boundary reflections.
    pub phase: f64,
    /// Surface reflections so far.
    pub top_bounces: u32,
    /// Seabed reflections so far.
    pub bottom_bounces: u32,
}

impl<S: RaySpace> RayPoint<S> {
    /// `(top, bottom)` bounce counts.
    #[inline]
    pub fn bounces(&self) -> (u32, u32) {
        (self.top_bounces, self.bottom_bounces)
    }
}

/// Launch direction in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Launch {
    /// Declination below horizontal.
    pub declination: f64,
    /// Bearing from +x toward +y.
    pub bearing: f64,
}

impl Launch {
    /// Launch at `declination` degrees on `bearing` degrees.
    pub const fn new(declination: f64, bearing: f64) -> Self {
        Self {
            declination,
            bearing,
        }
    }
}

/// Why a ray stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Termination {
    /// Reached the box range.
    RangeLimit,
    /// Reached the box depth.
    DepthLimit,
    /// Amplitude fell below the floor after a lossy reflection.
    AmplitudeExhausted,
    /// Used the whole step budget; the history is truncated.
    StepBudget,
}

/// Completed history of one ray.
#[derive(Debug, Clone, PartialEq)]
pub struct RayResult<S: RaySpace> {
    /// Index of the source in the session's source list.
    pub source_index: usize,
    /// Ray-frame placement.
    pub origin: RayOrigin,
    /// Launch direction.
    pub launch: Launch,
    /// State at every stored step, launch first.
    pub points: Vec<RayPoint<S>>,
    /// Why tracing stopped.
    pub termination: Termination,
}

impl<S: RaySpace> RayResult<S> {
    /// Number of stored steps.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether nothing was stored.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Final stored state.
    pub fn last(&self) -> Option<&RayPoint<S>> {
        self.points.last()
    }

    /// Bounce counts at the end of the ray.
    pub fn bounces(&self) -> (u32, u32) {
        self.last().map_or((0, 0), RayPoint::bounces)
    }

    /// Whether the step budget cut the ray short.
    pub fn is_truncated(&self) -> bool {
        self.termination == Termination::StepBudget
    }

    /// Position of step `index` in ocean coordinates.
    pub fn ocean_point(&self, index: usize) -> Option<Point3> {
        self.points
            .get(index)
            .map(|point| S::to_ocean(&point.x, &self.origin))
    }

    /// Whole trajectory in ocean coordinates.
    pub fn ocean_path(&self) -> Vec<Point3> {
        self.points
            .iter()
            .map(|point| S::to_ocean(&point.x, &self.origin))
            .collect()
    }
}
