//! Launch-angle tables
//!
//! Declinations (positive down) and bearings are given either as explicit
//! lists or as a fan `min..=max` with a fixed or automatic count. Tables
//! are sorted, near-duplicates collapse to one entry and a bearing sweep
//! that closes the circle drops its repeated last angle. The surviving
//! count is reported as-is; tables are never padded back to the request.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Angles closer than this many degrees are the same launch.
const DUPLICATE_TOLERANCE_DEG: f64 = 1.0e-9;

/// Declinations used by ray runs with an automatic count.
const RAY_RUN_DECLINATIONS: usize = 50;

/// Lower bound on automatic declinations for field and eigenray runs.
const MIN_AUTO_DECLINATIONS: usize = 300;

/// Bearings used by ray runs with an automatic count.
const RAY_RUN_BEARINGS: usize = 16;

/// Lower bound on automatic bearings for field and eigenray runs.
const MIN_AUTO_BEARINGS: usize = 36;

/// Number of angles in a fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleCount {
    /// Exactly this many, before duplicate removal.
    Exact(usize),
    /// Chosen from frequency, range and depth.
    Auto,
}

/// Compact description of a set of launch angles in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AngleSpec {
    /// Use these angles.
    Explicit(Vec<f64>),
    /// Evenly spaced angles from `min` to `max` inclusive.
    Fan {
        /// First angle.
        min: f64,
        /// Last angle.
        max: f64,
        /// How many.
        count: AngleCount,
    },
}

impl AngleSpec {
    /// Fan of exactly `count` angles.
    pub fn fan(min: f64, max: f64, count: usize) -> Self {
        AngleSpec::Fan {
            min,
            max,
            count: AngleCount::Exact(count),
        }
    }

    /// Fan with an automatic count.
    pub fn auto(min: f64, max: f64) -> Self {
        AngleSpec::Fan {
            min,
            max,
            count: AngleCount::Auto,
        }
    }

    /// Same spec with a fan's count switched to automatic. Explicit lists
    /// are unchanged.
    #[must_use]
    pub fn with_auto_count(&self) -> Self {
        match self {
            AngleSpec::Fan { min, max, .. } => AngleSpec::auto(*min, *max),
            AngleSpec::Explicit(_) => self.clone(),
        }
    }

    /// Check the description.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty list or zero count, non-finite angles,
    /// or `min > max`.
    pub fn validate(&self, what: &'static str) -> Result<(), ConfigError> {
        match self {
            AngleSpec::Explicit(angles) => {
                if angles.is_empty() {
                    return Err(ConfigError::Empty { what });
                }
                for a in angles {
                    ConfigError::check_finite(what, *a)?;
                }
            }
            AngleSpec::Fan { min, max, count } => {
                ConfigError::check_finite(what, *min)?;
                ConfigError::check_finite(what, *max)?;
                if min > max {
                    return Err(ConfigError::invalid(what, format!("min {min} exceeds max {max}")));
                }
                if *count == AngleCount::Exact(0) {
                    return Err(ConfigError::Empty { what });
                }
            }
        }
        Ok(())
    }
}

/// What the angles measure; bearings wrap at 360 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AngleKind {
    /// Elevation below horizontal.
    Declination,
    /// Horizontal direction.
    Bearing,
}

/// Inputs for an automatic angle count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoDensity {
    /// Whether the run stores rays (few angles) rather than fields or eigenrays.
    pub ray_run: bool,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Farthest receiver range in meters.
    pub max_range: f64,
    /// Water depth in meters.
    pub water_depth: f64,
    /// Sound speed at the source in m/s.
    pub reference_speed: f64,
}

impl AutoDensity {
    fn count(&self, kind: AngleKind, span_deg: f64) -> usize {
        let phase_limited =
            (0.3 * self.max_range * self.frequency / self.reference_speed * span_deg / 360.0) as usize;
        match kind {
            AngleKind::Declination if self.ray_run => RAY_RUN_DECLINATIONS,
            AngleKind::Declination => {
                let recommended = (self.water_depth / (10.0 * self.max_range)).atan();
                let depth_limited = if recommended > 0.0 {
                    (PI / recommended) as usize
                } else {
                    0
                };
                phase_limited.max(depth_limited).max(MIN_AUTO_DECLINATIONS)
            }
            AngleKind::Bearing if self.ray_run => RAY_RUN_BEARINGS,
            AngleKind::Bearing => phase_limited.max(MIN_AUTO_BEARINGS),
        }
    }
}

/// Concrete, ordered, duplicate-free launch angles.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleTable {
    angles: Vec<f64>,
    requested: usize,
    step: f64,
}

impl AngleTable {
    /// Expand `spec` into a table.
    pub fn generate(spec: &AngleSpec, kind: AngleKind, density: &AutoDensity) -> Self {
        let mut angles = match spec {
            AngleSpec::Explicit(list) => list.clone(),
            AngleSpec::Fan { min, max, count } => {
                let n = match count {
                    AngleCount::Exact(n) => *n,
                    AngleCount::Auto => density.count(kind, max - min),
                };
                linear_fill(*min, *max, n)
            }
        };
        let requested = angles.len();

        angles.sort_by(f64::total_cmp);
        angles.dedup_by(|b, a| (*b - *a).abs() <= DUPLICATE_TOLERANCE_DEG * a.abs().max(1.0));

        let mut full_circle = false;
        if kind == AngleKind::Bearing && angles.len() > 1 {
            let span = angles[angles.len() - 1] - angles[0];
            let wrapped = span % 360.0;
            if span > 0.0
                && (wrapped.abs() <= DUPLICATE_TOLERANCE_DEG
                    || (360.0 - wrapped).abs() <= DUPLICATE_TOLERANCE_DEG)
            {
                angles.pop();
                full_circle = true;
            }
        }

        let n = angles.len();
        let step = if n < 2 {
            0.0
        } else if full_circle {
            2.0 * PI / n as f64
        } else {
            (angles[n - 1] - angles[0]).to_radians() / (n - 1) as f64
        };

        if n < requested {
            debug!(
                "{:?} table reduced from {} to {} angles after removing duplicates",
                kind, requested, n
            );
        }
        Self {
            angles,
            requested,
            step,
        }
    }

    /// Angles in degrees, ascending.
    pub fn angles(&self) -> &[f64] {
        &self.angles
    }

    /// Number of distinct angles.
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }

    /// Count before duplicate removal.
    pub fn requested(&self) -> usize {
        self.requested
    }

    /// How many duplicates were removed.
    pub fn removed(&self) -> usize {
        self.requested - self.angles.len()
    }

    /// Mean spacing between adjacent angles in radians.
    pub fn step_radians(&self) -> f64 {
        self.step
    }

    /// Single-angle table.
    pub fn single(angle: f64) -> Self {
        Self {
            angles: vec![angle],
            requested: 1,
            step: 0.0,
        }
    }
}

fn linear_fill(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let delta = (max - min) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { max } else { min + delta * i as f64 })
                .collect()
        }
    }
}
