use ocean_acoustics_core::{
    AngleSpec, BeamType, BoundaryCondition, BoundaryProfile, BoundaryVertex, Environment, Environment2D, HalfSpace,
    Parallelism, Params, ReceiverGrid, RunConfig, RunType, Session, SoundSpeedProfile, SspInterpolation, SspPoint,
    TwoD,
};
use std::ptr;
use std::sync::RwLock;

use crate::error::{AcousticsErrorCode, DefaultAcousticsError};
use crate::helpers::{handle_ffi_result_error, read_slice, write_out};

/// A range/depth acoustics session.
///
/// # Thread Safety
/// The session sits behind an `RwLock`: readouts take the read lock and may
/// run concurrently, while `acoustics_run` and the setters take the write
/// lock.
pub struct AcousticsInstance {
    pub(crate) session: RwLock<Session<TwoD>>,
}

/// Output kind of a run.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcousticsRunType {
    /// Ray trajectories.
    Ray = 0,
    /// Rays connecting the source to receivers.
    Eigenray = 1,
    /// Coherent transmission loss.
    Coherent = 2,
    /// Incoherent transmission loss.
    Incoherent = 3,
}

impl From<AcousticsRunType> for RunType {
    fn from(value: AcousticsRunType) -> Self {
        match value {
            AcousticsRunType::Ray => RunType::Ray,
            AcousticsRunType::Eigenray => RunType::Eigenray,
            AcousticsRunType::Coherent => RunType::Coherent,
            AcousticsRunType::Incoherent => RunType::Incoherent,
        }
    }
}

/// Beam shape for field runs.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcousticsBeamType {
    /// Triangular beams.
    GeometricHat = 0,
    /// Gaussian beams.
    GeometricGaussian = 1,
}

impl From<AcousticsBeamType> for BeamType {
    fn from(value: AcousticsBeamType) -> Self {
        match value {
            AcousticsBeamType::GeometricHat => BeamType::GeometricHat,
            AcousticsBeamType::GeometricGaussian => BeamType::GeometricGaussian,
        }
    }
}

/// Sound-speed interpolation.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcousticsSspInterpolation {
    /// Speed linear in depth.
    CLinear = 0,
    /// Squared index of refraction linear in depth.
    N2Linear = 1,
    /// Monotone cubic.
    Pchip = 2,
}

impl From<AcousticsSspInterpolation> for SspInterpolation {
    fn from(value: AcousticsSspInterpolation) -> Self {
        match value {
            AcousticsSspInterpolation::CLinear => SspInterpolation::CLinear,
            AcousticsSspInterpolation::N2Linear => SspInterpolation::N2Linear,
            AcousticsSspInterpolation::Pchip => SspInterpolation::Pchip,
        }
    }
}

/// Kind of boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcousticsBoundaryKind {
    /// Reflection coefficient -1.
    PressureRelease = 0,
    /// Reflection coefficient +1.
    Rigid = 1,
    /// Fluid or elastic half-space described by the remaining fields.
    HalfSpace = 2,
}

/// Boundary condition. Speeds, density and attenuations are read only for
/// `HalfSpace`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcousticsBoundary {
    pub kind: AcousticsBoundaryKind,
    pub compressional_speed: f64,
    pub shear_speed: f64,
    pub density: f64,
    pub compressional_attenuation: f64,
    pub shear_attenuation: f64,
}

impl From<AcousticsBoundary> for BoundaryCondition {
    fn from(value: AcousticsBoundary) -> Self {
        match value.kind {
            AcousticsBoundaryKind::PressureRelease => BoundaryCondition::PressureRelease,
            AcousticsBoundaryKind::Rigid => BoundaryCondition::Rigid,
            AcousticsBoundaryKind::HalfSpace => BoundaryCondition::HalfSpace(HalfSpace {
                compressional_speed: value.compressional_speed,
                shear_speed: value.shear_speed,
                density: value.density,
                compressional_attenuation: value.compressional_attenuation,
                shear_attenuation: value.shear_attenuation,
            }),
        }
    }
}

/// Range/depth ocean environment.
///
/// Arrays are borrowed for the duration of the call and copied.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AcousticsEnvironment {
    /// Profile interpolation.
    pub interpolation: AcousticsSspInterpolation,
    /// Profile depths in meters, strictly increasing.
    pub ssp_depths: *const f64,
    /// Sound speeds in m/s, one per depth.
    pub ssp_speeds: *const f64,
    /// Number of profile samples.
    pub ssp_len: usize,
    /// Flat surface depth in meters, usually 0.
    pub surface_depth: f64,
    /// Seabed vertex ranges in meters.
    pub bottom_ranges: *const f64,
    /// Seabed vertex depths in meters.
    pub bottom_depths: *const f64,
    /// Number of seabed vertices; 0 puts a flat seabed at the deepest
    /// profile sample.
    pub bottom_len: usize,
    /// Surface condition.
    pub top: AcousticsBoundary,
    /// Seabed condition.
    pub bottom: AcousticsBoundary,
}

/// Run settings. Zero counts and steps select the automatic defaults.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AcousticsSettings {
    pub run_type: AcousticsRunType,
    pub beam_type: AcousticsBeamType,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Source depth in meters.
    pub source_depth: f64,
    pub receiver_ranges: *const f64,
    pub receiver_range_count: usize,
    pub receiver_depths: *const f64,
    pub receiver_depth_count: usize,
    /// Declination fan in degrees, positive down.
    pub declination_min: f64,
    pub declination_max: f64,
    /// Number of declinations; 0 chooses automatically.
    pub declination_count: usize,
    /// Step in meters; 0 uses a tenth of the water depth.
    pub step_size: f64,
    /// Point budget per ray; 0 keeps the default.
    pub max_steps: usize,
    /// Worker threads; 0 lets the pool decide, 1 runs sequentially.
    pub threads: usize,
}

/// Sound-speed profile from caller arrays.
///
/// # Safety
/// Non-null arrays must hold `len` values.
pub(crate) unsafe fn profile_from_raw(
    interpolation: AcousticsSspInterpolation,
    depths: *const f64,
    speeds: *const f64,
    len: usize,
) -> Result<SoundSpeedProfile, DefaultAcousticsError> {
    // SAFETY: forwarded caller contract.
    let depths = unsafe { read_slice(depths, len, "ssp_depths") }?;
    let speeds = unsafe { read_slice(speeds, len, "ssp_speeds") }?;
    let points = depths
        .iter()
        .zip(speeds)
        .map(|(z, c)| SspPoint::new(*z, *c))
        .collect();
    Ok(SoundSpeedProfile::new(interpolation.into(), points)?)
}

impl AcousticsEnvironment {
    /// Copy into a validated environment.
    ///
    /// # Safety
    /// Every non-null array must hold its stated length.
    pub(crate) unsafe fn to_environment(&self) -> Result<Environment2D, DefaultAcousticsError> {
        // SAFETY: forwarded caller contract.
        let ssp = unsafe { profile_from_raw(self.interpolation, self.ssp_depths, self.ssp_speeds, self.ssp_len) }?;
        let bottom = if self.bottom_len == 0 {
            BoundaryProfile::flat(ssp.depth_span().1)
        } else {
            let ranges = unsafe { read_slice(self.bottom_ranges, self.bottom_len, "bottom_ranges") }?;
            let depths = unsafe { read_slice(self.bottom_depths, self.bottom_len, "bottom_depths") }?;
            BoundaryProfile::new(
                ranges
                    .iter()
                    .zip(depths)
                    .map(|(r, z)| BoundaryVertex::new(*r, *z))
                    .collect(),
            )?
        };
        Ok(Environment::new(
            ssp,
            BoundaryProfile::flat(self.surface_depth),
            bottom,
            self.top.into(),
            self.bottom.into(),
        )?)
    }
}

impl AcousticsSettings {
    /// Copy onto `run`.
    ///
    /// # Safety
    /// Every non-null array must hold its stated length.
    pub(crate) unsafe fn apply(&self, run: &mut RunConfig) -> Result<(), DefaultAcousticsError> {
        run.run_type = self.run_type.into();
        run.beam_type = self.beam_type.into();
        run.frequency = self.frequency;
        run.sources.depths = vec![self.source_depth];
        // SAFETY: forwarded caller contract.
        let ranges = unsafe { read_slice(self.receiver_ranges, self.receiver_range_count, "receiver_ranges") }?;
        let depths = unsafe { read_slice(self.receiver_depths, self.receiver_depth_count, "receiver_depths") }?;
        run.receivers = ReceiverGrid {
            ranges: ranges.to_vec(),
            depths: depths.to_vec(),
            bearings: vec![0.0],
        };
        run.declinations = declination_spec(self.declination_min, self.declination_max, self.declination_count);
        run.step_size = self.step_size;
        if self.max_steps > 0 {
            run.max_steps = self.max_steps;
        }
        run.parallelism = match self.threads {
            1 => Parallelism::Sequential,
            threads => Parallelism::Parallel { threads },
        };
        Ok(())
    }
}

/// Fan of `count` declinations, automatic when `count` is zero.
pub(crate) fn declination_spec(min: f64, max: f64, count: usize) -> AngleSpec {
    if count == 0 {
        AngleSpec::auto(min, max)
    } else {
        AngleSpec::fan(min, max, count)
    }
}

impl AcousticsInstance {
    /// Validate the inputs and set up a session.
    ///
    /// # Safety
    /// Every non-null array in `environment` and `settings` must hold its
    /// stated length.
    pub(crate) unsafe fn new(
        environment: &AcousticsEnvironment,
        settings: &AcousticsSettings,
    ) -> Result<Self, DefaultAcousticsError> {
        // SAFETY: forwarded caller contract.
        let environment = unsafe { environment.to_environment() }?;
        let mut params = Params::<TwoD>::new(environment);
        unsafe { settings.apply(&mut params.run) }?;
        let session = Session::setup(params)?;
        Ok(Self {
            session: RwLock::new(session),
        })
    }
}

/// Create a new acoustics session and return it via out-parameter.
///
/// - Returns `AcousticsErrorCode::Ok` (0) on success with a valid instance in `out_instance`
/// - Returns a non-zero error code on failure with `out_instance` set to null
///
/// Call `acoustics_get_last_error()` for a description of the failure.
///
/// # Safety
///
/// - `environment` and `settings` must be null or point to valid structs whose arrays
///   hold their stated lengths. The arrays are copied.
/// - `out_instance` must be a valid, non-null pointer to writable memory.
/// - The caller owns the returned instance and MUST call `acoustics_destroy` exactly once.
///
/// Example (C)
/// ```c
/// AcousticsInstance* session = NULL;
/// if (acoustics_new(&env, &settings, &session) != Ok) {
///     fprintf(stderr, "setup failed: %s\n", acoustics_get_last_error());
///     return;
/// }
/// acoustics_run(session, NULL);
/// acoustics_destroy(session);
/// ```
#[no_mangle]
pub unsafe extern "C" fn acoustics_new(
    environment: *const AcousticsEnvironment,
    settings: *const AcousticsSettings,
    out_instance: *mut *mut AcousticsInstance,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        if out_instance.is_null() {
            return Err(DefaultAcousticsError::null_pointer("out_instance"));
        }
        // SAFETY: checked non-null above.
        unsafe { *out_instance = ptr::null_mut() };
        // SAFETY: the caller guarantees both pointers are null or valid.
        let environment = unsafe { environment.as_ref() }.ok_or_else(|| DefaultAcousticsError::null_pointer("environment"))?;
        let settings = unsafe { settings.as_ref() }.ok_or_else(|| DefaultAcousticsError::null_pointer("settings"))?;
        let instance = unsafe { AcousticsInstance::new(environment, settings) }?;
        // SAFETY: checked non-null above.
        unsafe { write_out(out_instance, Box::into_raw(Box::new(instance)), "out_instance") }
    })
}

/// Destroys an instance created by `acoustics_new`, releasing every output.
///
/// A null `ptr` is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `acoustics_new` and not freed already.
/// - After this call the pointer must not be used again.
#[no_mangle]
pub unsafe extern "C" fn acoustics_destroy(ptr: *mut AcousticsInstance) {
    if ptr.is_null() {
        return;
    }

    // SAFETY: the pointer came from `Box::into_raw` in `acoustics_new` and
    // has not been freed.
    let instance = unsafe { Box::from_raw(ptr) };
    if let Ok(session) = instance.session.into_inner() {
        session.finalize();
    }
}

