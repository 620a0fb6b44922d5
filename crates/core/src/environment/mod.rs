//! Ocean environment: sound-speed profile, boundaries and boundary conditions.
//!
//! An [`Environment`] is generic over its boundary geometry. Range/depth
//! runs use [`BoundaryProfile`] (piecewise-linear in range) and fully 3D
//! runs use [`BoundaryGrid`] (bilinear over an `(x, y)` grid). Everything
//! here is read-only once validated; runs share it across threads by
//! reference.
//!
//! # Interpolation conventions
//!
//! - Queries outside the tabulated domain extend flat from the nearest end.
//! - A query that lands exactly on a knot uses the segment starting at that
//!   knot; the last knot belongs to the last segment.
//! - Directed queries, used while integrating, pick the segment the ray is
//!   moving into when it sits exactly on a knot.

pub mod attenuation;
pub mod boundary;
pub mod boundary_grid;
pub mod reflection;
pub mod ssp;

pub use attenuation::{thorp_nepers_per_meter, AttenuationModel, AttenuationUnits};
pub use boundary::{BoundaryProfile, BoundaryQuery, BoundaryVertex};
pub use boundary_grid::{BoundaryGrid, GridQuery, GridSpec};
pub use reflection::{BoundaryCondition, HalfSpace, Incidence};
pub use ssp::{SoundSpeedProfile, SspColumns, SspInterpolation, SspPoint, SspSample};

use crate::error::ConfigError;
use std::fmt::Debug;
use tracing::debug;

/// Range of the sentinel vertices that pad boundary tables.
pub(crate) const EXTENSION: f64 = 1.0e150;

/// Surface or seabed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundarySide {
    /// Sea surface (or ice canopy).
    Top,
    /// Seabed.
    Bottom,
}

impl BoundarySide {
    /// Both sides, surface first.
    pub const BOTH: [BoundarySide; 2] = [BoundarySide::Top, BoundarySide::Bottom];
}

/// Boundary surface shape shared by top and bottom.
pub trait BoundaryGeometry: Clone + Debug + PartialEq + Send + Sync + 'static {
    /// Name used in errors.
    const NAME: &'static str;

    /// Whether range-dependent sound-speed columns make sense with this geometry.
    const SUPPORTS_RANGE_DEPENDENT_SSP: bool;

    /// Shallowest and deepest tabulated depth.
    fn depth_span(&self) -> (f64, f64);

    /// Depth at horizontal position `(x, y)`. Profiles read `x` as range.
    fn depth_at(&self, x: f64, y: f64) -> f64;

    /// Require `top` to lie strictly above `bottom` at every tabulated node.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::BoundariesCross`] at the first offending node.
    fn check_separation(top: &Self, bottom: &Self) -> Result<(), ConfigError>;
}

/// Complete, validated ocean environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment<G> {
    ssp: SoundSpeedProfile,
    top: G,
    bottom: G,
    top_condition: BoundaryCondition,
    bottom_condition: BoundaryCondition,
}

/// Environment with range/depth boundary profiles.
pub type Environment2D = Environment<BoundaryProfile>;

/// Environment with `(x, y)` boundary grids.
pub type Environment3D = Environment<BoundaryGrid>;

impl<G: BoundaryGeometry> Environment<G> {
    /// Assemble and validate an environment.
    ///
    /// # Errors
    ///
    /// Returns an error when the boundaries cross, the profile does not
    /// span the water column, a half-space is malformed, or the profile
    /// type needs range columns the geometry cannot provide.
    pub fn new(
        ssp: SoundSpeedProfile,
        top: G,
        bottom: G,
        top_condition: BoundaryCondition,
        bottom_condition: BoundaryCondition,
    ) -> Result<Self, ConfigError> {
        let env = Self {
            ssp,
            top,
            bottom,
            top_condition,
            bottom_condition,
        };
        env.validate()?;
        Ok(env)
    }

    /// Re-run every consistency check.
    ///
    /// # Errors
    ///
    /// See [`Environment::new`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ssp.is_range_dependent() && !G::SUPPORTS_RANGE_DEPENDENT_SSP {
            return Err(ConfigError::UnsupportedProfile {
                profile: self.ssp.interpolation().name(),
                geometry: G::NAME,
            });
        }
        G::check_separation(&self.top, &self.bottom)?;
        self.top_condition.validate()?;
        self.bottom_condition.validate()?;

        let (ssp_top, ssp_bottom) = self.ssp.depth_span();
        let (water_top, _) = self.top.depth_span();
        let (_, water_bottom) = self.bottom.depth_span();
        if ssp_top > water_top || ssp_bottom < water_bottom {
            return Err(ConfigError::ProfileTooShallow {
                ssp_top,
                ssp_bottom,
                water_top,
                water_bottom,
            });
        }
        debug!(
            "Environment validated: {} profile with {} samples, {} boundaries, top {}, bottom {}",
            self.ssp.interpolation().name(),
            self.ssp.points().len(),
            G::NAME,
            self.top_condition.name(),
            self.bottom_condition.name()
        );
        Ok(())
    }

    /// Sound-speed profile.
    pub fn ssp(&self) -> &SoundSpeedProfile {
        &self.ssp
    }

    /// Boundary geometry for one side.
    pub fn geometry(&self, side: BoundarySide) -> &G {
        match side {
            BoundarySide::Top => &self.top,
            BoundarySide::Bottom => &self.bottom,
        }
    }

    /// Boundary condition for one side.
    pub fn condition(&self, side: BoundarySide) -> &BoundaryCondition {
        match side {
            BoundarySide::Top => &self.top_condition,
            BoundarySide::Bottom => &self.bottom_condition,
        }
    }

    /// Distance from the shallowest surface point to the deepest seabed point.
    pub fn water_depth(&self) -> f64 {
        self.bottom.depth_span().1 - self.top.depth_span().0
    }

    /// Replace the sound-speed profile, keeping everything else.
    ///
    /// # Errors
    ///
    /// Returns an error and leaves `self` unchanged if the new profile does
    /// not fit the boundaries.
    pub fn with_ssp(&self, ssp: SoundSpeedProfile) -> Result<Self, ConfigError> {
        Self::new(
            ssp,
            self.top.clone(),
            self.bottom.clone(),
            self.top_condition,
            self.bottom_condition,
        )
    }

    /// Replace one side's boundary condition.
    ///
    /// # Errors
    ///
    /// Returns an error and leaves `self` unchanged if the condition is
    /// malformed.
    pub fn with_condition(&self, side: BoundarySide, condition: BoundaryCondition) -> Result<Self, ConfigError> {
        condition.validate()?;
        let mut env = self.clone();
        match side {
            BoundarySide::Top => env.top_condition = condition,
            BoundarySide::Bottom => env.bottom_condition = condition,
        }
        Ok(env)
    }

    /// Require a point to lie inside the water column.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::OutsideWaterColumn`] otherwise.
    pub fn check_in_water(&self, what: &'static str, x: f64, y: f64, depth: f64) -> Result<(), ConfigError> {
        let top = self.top.depth_at(x, y);
        let bottom = self.bottom.depth_at(x, y);
        if depth < top || depth > bottom || !depth.is_finite() {
            return Err(ConfigError::OutsideWaterColumn {
                what,
                depth,
                top,
                bottom,
            });
        }
        Ok(())
    }
}

/// Index `i` of the segment `[knots[i], knots[i + 1]]` holding `value`.
///
/// The segment starting at `value` wins a tie; with `heading < 0` the
/// segment ending there wins instead. Values outside the knots clamp to the
/// first or last segment. `knots` must hold at least two strictly
/// increasing values.
pub(crate) fn locate_segment(knots: &[f64], value: f64, heading: f64) -> usize {
    let last = knots.len() - 2;
    let count = knots.partition_point(|k| *k <= value);
    let mut i = count.saturating_sub(1).min(last);
    if heading < 0.0 && i > 0 && knots[i] == value {
        i -= 1;
    }
    i
}
