use ocean_acoustics_core::{ReceiverGrid, RunSummary};
use tracing::debug;

use crate::error::AcousticsErrorCode;
use crate::helpers::{handle_ffi_result_error, instance_from_ptr, read_slice, with_session_mut};
use crate::instance::{declination_spec, profile_from_raw, AcousticsInstance, AcousticsRunType, AcousticsSspInterpolation};

#[repr(C)]
/// Counts from one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcousticsRunSummary {
    pub sources: usize,
    pub declinations: usize,
    pub rays_traced: usize,
    /// Rays that used their whole step budget.
    pub truncated: usize,
    pub eigenrays: usize,
    pub fields: usize,
}

impl From<RunSummary> for AcousticsRunSummary {
    fn from(summary: RunSummary) -> Self {
        Self {
            sources: summary.sources,
            declinations: summary.declinations,
            rays_traced: summary.rays_traced,
            truncated: summary.truncated,
            eigenrays: summary.eigenrays,
            fields: summary.fields,
        }
    }
}

/// Trace every ray and replace the stored outputs.
///
/// Takes the write lock for the whole run; concurrent readouts wait.
/// `out_summary` may be null.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_summary` must be null or point to a writable `AcousticsRunSummary`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_run(
    ptr: *const AcousticsInstance,
    out_summary: *mut AcousticsRunSummary,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let summary = with_session_mut(instance, |session| Ok(session.run()))?;
        debug!("FFI run finished: {} rays", summary.rays_traced);
        // SAFETY: the caller guarantees `out_summary` is null or writable.
        if let Some(out) = unsafe { out_summary.as_mut() } {
            *out = summary.into();
        }
        Ok(())
    })
}

/// Replace the sound-speed profile. On failure the session keeps its
/// current profile.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `depths` and `speeds` must each point to `len` readable `double`s.
#[no_mangle]
pub unsafe extern "C" fn acoustics_set_sound_speed(
    ptr: *const AcousticsInstance,
    interpolation: AcousticsSspInterpolation,
    depths: *const f64,
    speeds: *const f64,
    len: usize,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        // SAFETY: forwarded caller contract.
        let ssp = unsafe { profile_from_raw(interpolation, depths, speeds, len) }?;
        with_session_mut(instance, |session| Ok(session.set_sound_speed_profile(ssp)?))
    })
}

/// Move the source to `depth` meters.
///
/// # Safety
///
/// `ptr` must be a valid pointer returned by `acoustics_new` or null.
#[no_mangle]
pub unsafe extern "C" fn acoustics_set_source_depth(ptr: *const AcousticsInstance, depth: f64) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session_mut(instance, |session| Ok(session.set_source_depth(depth)?))
    })
}

/// Replace the receiver ranges and depths.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `ranges` must point to `range_count` readable `double`s, `depths` to `depth_count`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_set_receivers(
    ptr: *const AcousticsInstance,
    ranges: *const f64,
    range_count: usize,
    depths: *const f64,
    depth_count: usize,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        // SAFETY: forwarded caller contract.
        let ranges = unsafe { read_slice(ranges, range_count, "ranges") }?;
        let depths = unsafe { read_slice(depths, depth_count, "depths") }?;
        let grid = ReceiverGrid {
            ranges: ranges.to_vec(),
            depths: depths.to_vec(),
            bearings: vec![0.0],
        };
        with_session_mut(instance, |session| Ok(session.set_receiver(grid)?))
    })
}

/// Switch the output kind. Declination fans return to automatic counts.
///
/// # Safety
///
/// `ptr` must be a valid pointer returned by `acoustics_new` or null.
#[no_mangle]
pub unsafe extern "C" fn acoustics_set_run_type(
    ptr: *const AcousticsInstance,
    run_type: AcousticsRunType,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session_mut(instance, |session| Ok(session.set_run_type(run_type.into())?))
    })
}

/// Replace the declination fan; a `count` of 0 chooses automatically.
///
/// # Safety
///
/// `ptr` must be a valid pointer returned by `acoustics_new` or null.
#[no_mangle]
pub unsafe extern "C" fn acoustics_set_declinations(
    ptr: *const AcousticsInstance,
    min: f64,
    max: f64,
    count: usize,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        with_session_mut(instance, |session| Ok(session.set_declinations(declination_spec(min, max, count))?))
    })
}
