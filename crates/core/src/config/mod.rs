//! Run configuration
//!
//! [`RunConfig`] gathers every read-only input of a run except the
//! environment. [`Params`] pairs it with an environment of the geometry the
//! session's dimensionality needs. Every field has a default, and the
//! parameter registry in [`params`] validates and logs them kind by kind.

pub mod params;

pub use params::ParamKind;

use crate::angles::AngleSpec;
use crate::core_types::Point3;
use crate::dimension::Dimensionality;
use crate::eigen::EigenSettings;
use crate::environment::{AttenuationUnits, Environment};
use crate::field::{BeamType, FieldMode, ReceiverGrid};
use crate::solver::Parallelism;
use serde::{Deserialize, Serialize};

/// Default source frequency in Hz.
pub const DEFAULT_FREQUENCY: f64 = 50.0;

/// Default declination fan limits in degrees.
pub const DEFAULT_DECLINATION_LIMITS: (f64, f64) = (-80.0, 80.0);

/// Default bearing fan for full 3D runs, in degrees.
pub const DEFAULT_BEARING_LIMITS: (f64, f64) = (0.0, 360.0);

/// Default per-ray step budget.
pub const DEFAULT_MAX_STEPS: usize = 50_000;

/// What a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunType {
    /// Ray trajectories.
    #[default]
    Ray,
    /// Rays connecting sources to receivers.
    Eigenray,
    /// Coherent transmission-loss field.
    Coherent,
    /// Incoherent transmission-loss field.
    Incoherent,
}

impl RunType {
    /// Accumulation mode for field runs.
    pub fn field_mode(self) -> Option<FieldMode> {
        match self {
            RunType::Coherent => Some(FieldMode::Coherent),
            RunType::Incoherent => Some(FieldMode::Incoherent),
            RunType::Ray | RunType::Eigenray => None,
        }
    }

    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            RunType::Ray => "ray",
            RunType::Eigenray => "eigenray",
            RunType::Coherent => "coherent",
            RunType::Incoherent => "incoherent",
        }
    }
}

/// Source coordinates; every combination of the three lists is a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sources {
    /// x coordinates in meters.
    pub xs: Vec<f64>,
    /// y coordinates in meters.
    pub ys: Vec<f64>,
    /// Depths in meters.
    pub depths: Vec<f64>,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            xs: vec![0.0],
            ys: vec![0.0],
            depths: vec![50.0],
        }
    }
}

impl Sources {
    /// Every source position, x outermost and depth innermost.
    pub fn positions(&self) -> Vec<Point3> {
        let mut out = Vec::with_capacity(self.xs.len() * self.ys.len() * self.depths.len());
        for &x in &self.xs {
            for &y in &self.ys {
                for &z in &self.depths {
                    out.push(Point3::new(x, y, z));
                }
            }
        }
        out
    }

    /// Number of sources.
    pub fn count(&self) -> usize {
        self.xs.len() * self.ys.len() * self.depths.len()
    }
}

/// Limits of the traced region.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BeamBox {
    /// Horizontal range at which rays stop; `None` uses just past the
    /// farthest receiver.
    pub max_range: Option<f64>,
    /// Depth at which rays stop; `None` uses just below the deepest seabed.
    pub max_depth: Option<f64>,
}

/// Every run input except the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// What the run produces.
    pub run_type: RunType,
    /// Beam shape for field runs.
    pub beam_type: BeamType,
    /// Source frequency in Hz.
    pub frequency: f64,
    /// Source positions.
    pub sources: Sources,
    /// Receiver grid.
    pub receivers: ReceiverGrid,
    /// Launch declinations in degrees, positive down.
    pub declinations: AngleSpec,
    /// Launch bearings in degrees. `None` traces the receiver bearings in
    /// Nx2D runs and a full circle in 3D runs.
    pub bearings: Option<AngleSpec>,
    /// Nominal step in meters; zero uses a tenth of the water depth.
    pub step_size: f64,
    /// Most points stored per ray.
    pub max_steps: usize,
    /// Traced region.
    pub beam_box: BeamBox,
    /// Units of every attenuation value.
    pub attenuation_units: AttenuationUnits,
    /// Add Thorp volume attenuation.
    pub thorp: bool,
    /// Eigenray search settings.
    pub eigen: EigenSettings,
    /// Execution strategy.
    pub parallelism: Parallelism,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_type: RunType::default(),
            beam_type: BeamType::default(),
            frequency: DEFAULT_FREQUENCY,
            sources: Sources::default(),
            receivers: ReceiverGrid::default(),
            declinations: AngleSpec::auto(DEFAULT_DECLINATION_LIMITS.0, DEFAULT_DECLINATION_LIMITS.1),
            bearings: None,
            step_size: 0.0,
            max_steps: DEFAULT_MAX_STEPS,
            beam_box: BeamBox::default(),
            attenuation_units: AttenuationUnits::default(),
            thorp: false,
            eigen: EigenSettings::default(),
            parallelism: Parallelism::default(),
        }
    }
}

/// Everything a session is set up from.
#[derive(Debug, Clone, PartialEq)]
pub struct Params<D: Dimensionality> {
    /// Ocean environment.
    pub environment: Environment<D::Geometry>,
    /// Run inputs.
    pub run: RunConfig,
}

impl<D: Dimensionality> Params<D> {
    /// Pair an environment with default run inputs.
    pub fn new(environment: Environment<D::Geometry>) -> Self {
        Self {
            environment,
            run: RunConfig::default(),
        }
    }

    /// Run every registered validator.
    ///
    /// # Errors
    ///
    /// Returns the first failing parameter kind's error.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        ParamKind::ALL.iter().try_for_each(|kind| kind.validate(self))
    }

    /// Log every parameter.
    pub fn echo(&self) {
        for kind in ParamKind::ALL {
            kind.echo(self);
        }
    }

    /// Source positions as traced. Range/depth runs put every source at
    /// the origin of the range axis.
    pub fn source_positions(&self) -> Vec<Point3> {
        if D::USES_BEARINGS {
            self.run.sources.positions()
        } else {
            self.run
                .sources
                .depths
                .iter()
                .map(|z| Point3::new(0.0, 0.0, *z))
                .collect()
        }
    }

    /// Receiver grid as seen by this dimensionality.
    pub fn receiver_grid(&self) -> ReceiverGrid {
        if D::USES_BEARINGS {
            self.run.receivers.clone()
        } else {
            self.run.receivers.planar()
        }
    }
}
