//! Parameter registry
//!
//! Each physical input of a run is one [`ParamKind`]. A kind knows how to
//! reset its part of [`Params`] to the default, how to validate it and how
//! to echo it to the log. [`ParamKind::ALL`] fixes the order in which setup
//! walks them.

use super::{BeamBox, Params, RunType, Sources, DEFAULT_DECLINATION_LIMITS, DEFAULT_FREQUENCY, DEFAULT_MAX_STEPS};
use crate::angles::AngleSpec;
use crate::dimension::Dimensionality;
use crate::eigen::EigenSettings;
use crate::environment::{BoundaryCondition, BoundarySide, SoundSpeedProfile};
use crate::error::ConfigError;
use crate::field::{BeamType, ReceiverGrid};
use tracing::info;

/// Speed of the default isovelocity profile in m/s.
const DEFAULT_SOUND_SPEED: f64 = 1500.0;

/// One independently validated input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Source frequency.
    Frequency,
    /// Output kind.
    RunType,
    /// Beam shape.
    BeamType,
    /// Sound-speed profile.
    SoundSpeed,
    /// Surface geometry and condition.
    TopBoundary,
    /// Seabed geometry and condition.
    BottomBoundary,
    /// Source positions.
    Sources,
    /// Receiver grid.
    Receivers,
    /// Launch declinations.
    Declinations,
    /// Launch bearings.
    Bearings,
    /// Step length and budget.
    Step,
    /// Traced region.
    BeamBox,
    /// Eigenray search.
    Eigen,
}

impl ParamKind {
    /// Every kind in setup order.
    pub const ALL: [ParamKind; 13] = [
        ParamKind::Frequency,
        ParamKind::RunType,
        ParamKind::BeamType,
        ParamKind::SoundSpeed,
        ParamKind::TopBoundary,
        ParamKind::BottomBoundary,
        ParamKind::Sources,
        ParamKind::Receivers,
        ParamKind::Declinations,
        ParamKind::Bearings,
        ParamKind::Step,
        ParamKind::BeamBox,
        ParamKind::Eigen,
    ];

    /// Name for logs.
    pub fn name(self) -> &'static str {
        match self {
            ParamKind::Frequency => "frequency",
            ParamKind::RunType => "run type",
            ParamKind::BeamType => "beam type",
            ParamKind::SoundSpeed => "sound speed",
            ParamKind::TopBoundary => "top boundary",
            ParamKind::BottomBoundary => "bottom boundary",
            ParamKind::Sources => "sources",
            ParamKind::Receivers => "receivers",
            ParamKind::Declinations => "declinations",
            ParamKind::Bearings => "bearings",
            ParamKind::Step => "step",
            ParamKind::BeamBox => "beam box",
            ParamKind::Eigen => "eigenray search",
        }
    }

    /// Reset this kind's part of `params` to its default.
    ///
    /// Environment kinds reset what has a meaningful default: an
    /// isovelocity profile spanning the water column, a pressure-release
    /// surface and a rigid seabed. Boundary geometry is always user input.
    pub fn apply_default<D: Dimensionality>(self, params: &mut Params<D>) {
        let run = &mut params.run;
        match self {
            ParamKind::Frequency => run.frequency = DEFAULT_FREQUENCY,
            ParamKind::RunType => run.run_type = RunType::default(),
            ParamKind::BeamType => run.beam_type = BeamType::default(),
            ParamKind::SoundSpeed => {
                let env = &params.environment;
                let (top, bottom) = env.ssp().depth_span();
                if let Ok(env) = SoundSpeedProfile::isovelocity(DEFAULT_SOUND_SPEED, top, bottom)
                    .and_then(|ssp| env.with_ssp(ssp))
                {
                    params.environment = env;
                }
            }
            ParamKind::TopBoundary => {
                if let Ok(env) = params
                    .environment
                    .with_condition(BoundarySide::Top, BoundaryCondition::PressureRelease)
                {
                    params.environment = env;
                }
            }
            ParamKind::BottomBoundary => {
                if let Ok(env) = params
                    .environment
                    .with_condition(BoundarySide::Bottom, BoundaryCondition::Rigid)
                {
                    params.environment = env;
                }
            }
            ParamKind::Sources => run.sources = Sources::default(),
            ParamKind::Receivers => run.receivers = ReceiverGrid::default(),
            ParamKind::Declinations => {
                run.declinations = AngleSpec::auto(DEFAULT_DECLINATION_LIMITS.0, DEFAULT_DECLINATION_LIMITS.1);
            }
            ParamKind::Bearings => run.bearings = None,
            ParamKind::Step => {
                run.step_size = 0.0;
                run.max_steps = DEFAULT_MAX_STEPS;
            }
            ParamKind::BeamBox => run.beam_box = BeamBox::default(),
            ParamKind::Eigen => run.eigen = EigenSettings::default(),
        }
    }

    /// Check this kind's part of `params`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first problem found.
    pub fn validate<D: Dimensionality>(self, params: &Params<D>) -> Result<(), ConfigError> {
        let run = &params.run;
        let env = &params.environment;
        match self {
            ParamKind::Frequency => ConfigError::check_positive("frequency", run.frequency),
            ParamKind::RunType | ParamKind::BeamType => Ok(()),
            ParamKind::SoundSpeed => env.validate(),
            ParamKind::TopBoundary => env.condition(BoundarySide::Top).validate(),
            ParamKind::BottomBoundary => env.condition(BoundarySide::Bottom).validate(),
            ParamKind::Sources => {
                for (what, list) in [
                    ("source x coordinates", &run.sources.xs),
                    ("source y coordinates", &run.sources.ys),
                    ("source depths", &run.sources.depths),
                ] {
                    if list.is_empty() {
                        return Err(ConfigError::Empty { what });
                    }
                }
                for source in params.source_positions() {
                    env.check_in_water("source", source.x, source.y, source.z)?;
                }
                Ok(())
            }
            ParamKind::Receivers => run.receivers.validate(),
            ParamKind::Declinations => {
                run.declinations.validate("declinations")?;
                let outside = match &run.declinations {
                    AngleSpec::Explicit(list) => list.iter().any(|a| a.abs() > 90.0),
                    AngleSpec::Fan { min, max, .. } => min.abs() > 90.0 || max.abs() > 90.0,
                };
                if outside {
                    return Err(ConfigError::invalid("declinations", "angles must lie within -90..90 degrees"));
                }
                Ok(())
            }
            ParamKind::Bearings => run
                .bearings
                .as_ref()
                .map_or(Ok(()), |spec| spec.validate("bearings")),
            ParamKind::Step => {
                ConfigError::check_finite("step size", run.step_size)?;
                if run.step_size < 0.0 {
                    return Err(ConfigError::invalid("step size", format!("negative step {}", run.step_size)));
                }
                if run.max_steps < 2 {
                    return Err(ConfigError::invalid(
                        "step budget",
                        format!("{} steps cannot hold a launch and one step", run.max_steps),
                    ));
                }
                Ok(())
            }
            ParamKind::BeamBox => {
                if let Some(r) = run.beam_box.max_range {
                    ConfigError::check_positive("beam box range", r)?;
                }
                if let Some(z) = run.beam_box.max_depth {
                    ConfigError::check_positive("beam box depth", z)?;
                }
                Ok(())
            }
            ParamKind::Eigen => {
                ConfigError::check_positive("eigenray tolerance", run.eigen.tolerance)
            }
        }
    }

    /// Log this kind's part of `params`.
    pub fn echo<D: Dimensionality>(self, params: &Params<D>) {
        let run = &params.run;
        let env = &params.environment;
        match self {
            ParamKind::Frequency => info!("Frequency: {} Hz", run.frequency),
            ParamKind::RunType => info!("Run type: {} ({})", run.run_type.name(), D::NAME),
            ParamKind::BeamType => info!("Beam type: {:?}", run.beam_type),
            ParamKind::SoundSpeed => {
                let (top, bottom) = env.ssp().depth_span();
                info!(
                    "Sound speed: {} profile, {} samples over {}..{} m, attenuation in {:?}{}",
                    env.ssp().interpolation().name(),
                    env.ssp().points().len(),
                    top,
                    bottom,
                    run.attenuation_units,
                    if run.thorp { " plus Thorp" } else { "" }
                );
            }
            ParamKind::TopBoundary => info!("Top boundary: {}", env.condition(BoundarySide::Top).name()),
            ParamKind::BottomBoundary => {
                info!("Bottom boundary: {}", env.condition(BoundarySide::Bottom).name());
            }
            ParamKind::Sources => info!(
                "Sources: {} x {} x {} positions, depths {:?} m",
                run.sources.xs.len(),
                run.sources.ys.len(),
                run.sources.depths.len(),
                run.sources.depths
            ),
            ParamKind::Receivers => info!(
                "Receivers: {} ranges up to {} m, {} depths, {} bearings",
                run.receivers.ranges.len(),
                run.receivers.max_range(),
                run.receivers.depths.len(),
                run.receivers.bearings.len()
            ),
            ParamKind::Declinations => info!("Declinations: {:?}", run.declinations),
            ParamKind::Bearings => match &run.bearings {
                Some(spec) => info!("Bearings: {:?}", spec),
                None if D::USES_BEARINGS => info!("Bearings: default"),
                None => {}
            },
            ParamKind::Step => info!(
                "Step: {} m (0 = automatic), at most {} points per ray",
                run.step_size, run.max_steps
            ),
            ParamKind::BeamBox => info!(
                "Beam box: range {:?} m, depth {:?} m",
                run.beam_box.max_range, run.beam_box.max_depth
            ),
            ParamKind::Eigen => info!(
                "Eigenray search: tolerance {} m, {} refinement iterations",
                run.eigen.tolerance, run.eigen.refine_iterations
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Params;
    use crate::dimension::medium::flat_environment;
    use crate::dimension::TwoD;
    use crate::environment::BoundaryProfile;

    fn params() -> Params<TwoD> {
        Params::new(flat_environment(
            BoundaryProfile::flat(0.0),
            BoundaryProfile::flat(100.0),
            1500.0,
            100.0,
        ))
    }

    #[test]
    fn test_defaults_validate() {
        let p = params();
        for kind in ParamKind::ALL {
            assert!(kind.validate(&p).is_ok(), "{} failed", kind.name());
            kind.echo(&p);
        }
    }

    #[test]
    fn test_each_kind_rejects_bad_input() {
        let mut p = params();
        p.run.frequency = 0.0;
        assert!(ParamKind::Frequency.validate(&p).is_err());
        ParamKind::Frequency.apply_default(&mut p);
        assert_eq!(p.run.frequency, DEFAULT_FREQUENCY);

        p.run.sources.depths = vec![150.0];
        assert!(matches!(
            ParamKind::Sources.validate(&p),
            Err(ConfigError::OutsideWaterColumn { .. })
        ));
        ParamKind::Sources.apply_default(&mut p);
        assert!(ParamKind::Sources.validate(&p).is_ok());

        p.run.declinations = AngleSpec::fan(-95.0, 10.0, 5);
        assert!(ParamKind::Declinations.validate(&p).is_err());

        p.run.max_steps = 1;
        assert!(ParamKind::Step.validate(&p).is_err());
        ParamKind::Step.apply_default(&mut p);
        assert!(ParamKind::Step.validate(&p).is_ok());

        p.run.beam_box.max_range = Some(-1.0);
        assert!(ParamKind::BeamBox.validate(&p).is_err());

        p.run.eigen.tolerance = 0.0;
        assert!(ParamKind::Eigen.validate(&p).is_err());
    }

    #[test]
    fn test_boundary_defaults() {
        let mut p = params();
        p.environment = p
            .environment
            .with_condition(BoundarySide::Bottom, BoundaryCondition::PressureRelease)
            .unwrap();
        ParamKind::BottomBoundary.apply_default(&mut p);
        assert_eq!(*p.environment.condition(BoundarySide::Bottom), BoundaryCondition::Rigid);
        ParamKind::SoundSpeed.apply_default(&mut p);
        assert_eq!(p.environment.ssp().evaluate(0.0, 30.0).c, DEFAULT_SOUND_SPEED);
    }

    #[test]
    fn test_all_lists_every_kind_once() {
        let mut seen = rustc_hash::FxHashSet::default();
        for kind in ParamKind::ALL {
            assert!(seen.insert(kind));
        }
        assert_eq!(seen.len(), 13);
    }
}
