//! Run orchestration
//!
//! A [`Session`] owns one validated [`Params`] set and the execution
//! backend. [`Session::run`] generates the launch tables, traces every launch
//! and, depending on the run type, stores the rays, reduces them to
//! eigenrays or accumulates them into one field per source. Outputs stay
//! readable until the next run or edit.
//!
//! Launches are ordered source-major, then bearing, then declination. Every
//! reduction walks them in that order, so results do not depend on the
//! backend.

use crate::angles::{AngleKind, AngleSpec, AngleTable, AutoDensity};
use crate::config::{Params, RunType, DEFAULT_BEARING_LIMITS};
use crate::core_types::Point3;
use crate::dimension::{Dimensionality, RayOrigin};
use crate::eigen::{EigenSearch, Eigenray};
use crate::environment::{AttenuationModel, BoundaryGeometry, BoundarySide, Environment, SoundSpeedProfile};
use crate::error::ConfigError;
use crate::field::{BeamInfluence, BeamSettings, Field, ReceiverGrid, FIELD_CHUNK};
use crate::ray::{self, Launch, RayPoint, RayResult, TraceParams, DEFAULT_AMPLITUDE_FLOOR};
use crate::solver::{ProfilerScope, RayTracer};
use tracing::{debug, info, warn};

/// Launch angles of the latest run.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchTables {
    /// Declinations in degrees.
    pub declinations: AngleTable,
    /// Bearings in degrees; a single zero for range/depth runs.
    pub bearings: AngleTable,
}

/// What a run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Output kind.
    pub run_type: RunType,
    /// Sources traced.
    pub sources: usize,
    /// Distinct declinations.
    pub declinations: usize,
    /// Distinct bearings.
    pub bearings: usize,
    /// Rays traced, refinement re-traces excluded.
    pub rays_traced: usize,
    /// Rays stopped by the step budget.
    pub truncated: usize,
    /// Eigenrays found.
    pub eigenrays: usize,
    /// Fields produced.
    pub fields: usize,
}

/// One ray to trace.
#[derive(Debug, Clone, Copy)]
struct Job {
    source: usize,
    frame: usize,
    launch: Launch,
}

/// A configured tracer and the outputs of its latest run.
pub struct Session<D: Dimensionality> {
    params: Params<D>,
    tracer: RayTracer,
    rays: Vec<RayResult<D::Space>>,
    eigenrays: Vec<Eigenray<D::Space>>,
    fields: Vec<Field>,
    tables: Option<LaunchTables>,
    runs: usize,
}

impl<D> Session<D>
where
    D: Dimensionality,
    D::Space: BeamInfluence + EigenSearch,
{
    /// Validate `params`, log them and build the backend.
    ///
    /// # Errors
    ///
    /// Returns the first invalid parameter.
    pub fn setup(params: Params<D>) -> Result<Self, ConfigError> {
        params.validate()?;
        info!("Setting up {} session", D::NAME);
        params.echo();
        let tracer = RayTracer::new(params.run.parallelism);
        Ok(Self {
            params,
            tracer,
            rays: Vec::new(),
            eigenrays: Vec::new(),
            fields: Vec::new(),
            tables: None,
            runs: 0,
        })
    }

    /// Trace every launch and produce the configured output.
    pub fn run(&mut self) -> RunSummary {
        let _scope = ProfilerScope::new("run");
        self.invalidate();

        let env = &self.params.environment;
        let run = &self.params.run;
        let sources = self.params.source_positions();
        let receivers = self.params.receiver_grid();
        let model = AttenuationModel {
            frequency: run.frequency,
            units: run.attenuation_units,
            thorp: run.thorp,
        };

        let tables = launch_tables(&self.params, &sources, &receivers);
        let trace_params = trace_params(&self.params, &receivers);
        debug!(
            "Trace limits: step {} m, range {} m, depth {} m, {} points",
            trace_params.step, trace_params.max_range, trace_params.max_depth, trace_params.max_steps
        );

        let mut frames = Vec::with_capacity(sources.len() * tables.bearings.len());
        for source in &sources {
            for bearing in tables.bearings.angles() {
                frames.push(RayOrigin::new(*source, bearing.to_radians()));
            }
        }
        let media: Vec<D::Medium<'_>> = frames.iter().map(|o| D::medium(env, model, o)).collect();

        let per_frame = tables.declinations.len();
        let frames_per_source = tables.bearings.len();
        let jobs: Vec<Job> = (0..frames.len())
            .flat_map(|frame| {
                let bearing = tables.bearings.angles()[frame % frames_per_source];
                tables.declinations.angles().iter().map(move |declination| Job {
                    source: frame / frames_per_source,
                    frame,
                    launch: Launch::new(*declination, bearing),
                })
            })
            .collect();

        let trace_job = |history: &mut Vec<RayPoint<D::Space>>, job: &Job| -> RayResult<D::Space> {
            let origin = &frames[job.frame];
            let termination = ray::trace_into(&media[job.frame], origin, &job.launch, &trace_params, history);
            RayResult {
                source_index: job.source,
                origin: *origin,
                launch: job.launch,
                points: std::mem::take(history),
                termination,
            }
        };

        let mut truncated = 0;
        match run.run_type.field_mode() {
            None => {
                let rays = {
                    let _trace = ProfilerScope::new("ray tracing");
                    self.tracer.map(&jobs, Vec::new, trace_job)
                };
                truncated = rays.iter().filter(|r| r.is_truncated()).count();

                if run.run_type == RunType::Ray {
                    self.rays = rays;
                } else {
                    let _select = ProfilerScope::new("eigenray selection");
                    for source_rays in rays.chunk_by(|a, b| a.source_index == b.source_index) {
                        let source = source_rays[0].source_index;
                        let retrace = |origin: &RayOrigin, launch: Launch| {
                            let medium = D::medium(env, model, origin);
                            ray::trace(&medium, origin, launch, source, &trace_params)
                        };
                        self.eigenrays.extend(<D::Space as EigenSearch>::select(
                            source_rays,
                            &receivers,
                            &run.eigen,
                            retrace,
                        ));
                    }
                }
            }
            Some(mode) => {
                let _fields = ProfilerScope::new("field accumulation");
                let beams: Vec<BeamSettings> = sources
                    .iter()
                    .map(|source| BeamSettings {
                        beam_type: run.beam_type,
                        frequency: run.frequency,
                        declination_step: tables.declinations.step_radians(),
                        bearing_step: tables.bearings.step_radians(),
                        source_speed: env.ssp().evaluate(0.0, source.z).c,
                    })
                    .collect();

                let chunks: Vec<&[Job]> = jobs
                    .chunks((frames_per_source * per_frame).max(1))
                    .flat_map(|s| s.chunks(FIELD_CHUNK))
                    .collect();

                let partials = self.tracer.map(&chunks, Vec::new, |history, chunk: &&[Job]| {
                    let source = chunk[0].source;
                    let mut partial = Field::new(source, receivers.clone(), mode);
                    let mut cut = 0;
                    for job in chunk.iter() {
                        let ray = trace_job(history, job);
                        if ray.is_truncated() {
                            cut += 1;
                        }
                        <D::Space as BeamInfluence>::accumulate(&mut partial, &ray, &beams[source]);
                        *history = ray.points;
                    }
                    (partial, cut)
                });

                for (partial, cut) in partials {
                    truncated += cut;
                    match self.fields.last_mut() {
                        Some(field) if field.source_index() == partial.source_index() => field.add(&partial),
                        _ => self.fields.push(partial),
                    }
                }
                for field in &mut self.fields {
                    field.finalize::<D::Space>();
                }
            }
        }

        if truncated > 0 {
            warn!(
                "{} of {} rays stopped at the step budget of {} points",
                truncated,
                jobs.len(),
                trace_params.max_steps
            );
        }

        self.runs += 1;
        let summary = RunSummary {
            run_type: run.run_type,
            sources: sources.len(),
            declinations: tables.declinations.len(),
            bearings: tables.bearings.len(),
            rays_traced: jobs.len(),
            truncated,
            eigenrays: self.eigenrays.len(),
            fields: self.fields.len(),
        };
        info!(
            "Run {} ({} {}) on {} backend: {} rays from {} sources, {} eigenrays, {} fields",
            self.runs,
            D::NAME,
            run.run_type.name(),
            self.tracer.name(),
            summary.rays_traced,
            summary.sources,
            summary.eigenrays,
            summary.fields
        );
        self.tables = Some(tables);
        summary
    }

    /// Rays stored by the latest ray run.
    pub fn rays(&self) -> &[RayResult<D::Space>] {
        &self.rays
    }

    /// Eigenrays found by the latest eigenray run.
    pub fn eigenrays(&self) -> &[Eigenray<D::Space>] {
        &self.eigenrays
    }

    /// One finalized field per source from the latest field run.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Launch tables of the latest run.
    pub fn tables(&self) -> Option<&LaunchTables> {
        self.tables.as_ref()
    }

    /// Current parameters.
    pub fn params(&self) -> &Params<D> {
        &self.params
    }

    /// Execution backend.
    pub fn tracer(&self) -> &RayTracer {
        &self.tracer
    }

    /// Completed runs.
    pub fn run_count(&self) -> usize {
        self.runs
    }

    /// Replace the sound-speed profile.
    ///
    /// # Errors
    ///
    /// Returns an error and keeps the current profile if the new one does
    /// not fit the environment.
    pub fn set_sound_speed_profile(&mut self, ssp: SoundSpeedProfile) -> Result<(), ConfigError> {
        self.update(|p| {
            p.environment = p.environment.with_ssp(ssp)?;
            Ok(())
        })
    }

    /// Replace the whole environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the sources or receivers no longer fit.
    pub fn set_environment(&mut self, environment: Environment<D::Geometry>) -> Result<(), ConfigError> {
        self.update(|p| {
            p.environment = environment;
            Ok(())
        })
    }

    /// Put every source at one depth.
    ///
    /// # Errors
    ///
    /// Returns an error if the depth is outside the water column.
    pub fn set_source_depth(&mut self, depth: f64) -> Result<(), ConfigError> {
        self.update(|p| {
            p.run.sources.depths = vec![depth];
            Ok(())
        })
    }

    /// Replace the receiver grid.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or malformed grid.
    pub fn set_receiver(&mut self, receivers: ReceiverGrid) -> Result<(), ConfigError> {
        self.update(|p| {
            p.run.receivers = receivers;
            Ok(())
        })
    }

    /// Switch the output kind. Fans go back to automatic counts, which
    /// differ between ray runs and the rest.
    ///
    /// # Errors
    ///
    /// Never fails for a valid session; kept fallible like the other edits.
    pub fn set_run_type(&mut self, run_type: RunType) -> Result<(), ConfigError> {
        self.update(|p| {
            p.run.run_type = run_type;
            p.run.declinations = p.run.declinations.with_auto_count();
            p.run.bearings = p.run.bearings.as_ref().map(AngleSpec::with_auto_count);
            Ok(())
        })
    }

    /// Replace the declination spec.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty or malformed spec.
    pub fn set_declinations(&mut self, declinations: AngleSpec) -> Result<(), ConfigError> {
        self.update(|p| {
            p.run.declinations = declinations;
            Ok(())
        })
    }

    /// End the session, releasing every output.
    pub fn finalize(self) {
        info!("{} session finished after {} runs", D::NAME, self.runs);
    }

    fn update<F>(&mut self, edit: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Params<D>) -> Result<(), ConfigError>,
    {
        let mut next = self.params.clone();
        edit(&mut next)?;
        next.validate()?;
        self.params = next;
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.rays.clear();
        self.eigenrays.clear();
        self.fields.clear();
        self.tables = None;
    }
}

fn launch_tables<D: Dimensionality>(params: &Params<D>, sources: &[Point3], receivers: &ReceiverGrid) -> LaunchTables {
    let run = &params.run;
    let env = &params.environment;
    let reference_speed = sources
        .first()
        .map_or(1500.0, |s| env.ssp().evaluate(0.0, s.z).c);
    let density = AutoDensity {
        ray_run: run.run_type == RunType::Ray,
        frequency: run.frequency,
        max_range: receivers.max_range(),
        water_depth: env.water_depth(),
        reference_speed,
    };
    let declinations = AngleTable::generate(&run.declinations, AngleKind::Declination, &density);
    let bearings = if !D::USES_BEARINGS {
        AngleTable::single(0.0)
    } else {
        let spec = match &run.bearings {
            Some(spec) => spec.clone(),
            None if D::SLICED => AngleSpec::Explicit(receivers.bearings.clone()),
            None => AngleSpec::auto(DEFAULT_BEARING_LIMITS.0, DEFAULT_BEARING_LIMITS.1),
        };
        AngleTable::generate(&spec, AngleKind::Bearing, &density)
    };
    for (what, table) in [("declinations", &declinations), ("bearings", &bearings)] {
        if table.removed() > 0 {
            info!(
                "{} duplicate {} removed, {} remain",
                table.removed(),
                what,
                table.len()
            );
        }
    }
    LaunchTables { declinations, bearings }
}

fn trace_params<D: Dimensionality>(params: &Params<D>, receivers: &ReceiverGrid) -> TraceParams {
    let run = &params.run;
    let env = &params.environment;
    let step = if run.step_size > 0.0 {
        run.step_size
    } else {
        env.water_depth() / 10.0
    };
    let deepest = env.geometry(BoundarySide::Bottom).depth_span().1;
    TraceParams {
        step,
        max_steps: run.max_steps,
        max_range: run
            .beam_box
            .max_range
            .unwrap_or(receivers.max_range() * 1.01 + 1.0),
        max_depth: run.beam_box.max_depth.unwrap_or(deepest.abs() * 1.01 + 1.0),
        amplitude_floor: DEFAULT_AMPLITUDE_FLOOR,
    }
}
