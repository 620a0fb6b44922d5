use ocean_acoustics_core::{Eigenray, Planar, RayPoint, RayResult, Termination};

use crate::error::{AcousticsErrorCode, DefaultAcousticsError};
use crate::helpers::{copy_out, handle_ffi_result_error, instance_from_ptr, with_session, write_out};
use crate::instance::AcousticsInstance;

#[repr(C)]
/// One ray point in ocean coordinates.
/// Keep this layout stable for C/C++/C# consumers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcousticsRayPoint {
    /// East coordinate (m).
    pub x: f64,
    /// North coordinate (m).
    pub y: f64,
    /// Depth (m, positive down).
    pub z: f64,
    /// Travel time from the source (s).
    pub travel_time: f64,
    /// Amplitude after boundary losses.
    pub amplitude: f64,
    /// Accumulated boundary phase (rad).
    pub phase: f64,
    /// Surface reflections so far.
    pub top_bounces: u32,
    /// Seabed reflections so far.
    pub bottom_bounces: u32,
}

/// Why a ray stopped.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcousticsTermination {
    RangeLimit = 0,
    DepthLimit = 1,
    AmplitudeExhausted = 2,
    /// The step budget ran out; the path is truncated.
    StepBudget = 3,
}

impl From<Termination> for AcousticsTermination {
    fn from(value: Termination) -> Self {
        match value {
            Termination::RangeLimit => AcousticsTermination::RangeLimit,
            Termination::DepthLimit => AcousticsTermination::DepthLimit,
            Termination::AmplitudeExhausted => AcousticsTermination::AmplitudeExhausted,
            Termination::StepBudget => AcousticsTermination::StepBudget,
        }
    }
}

#[repr(C)]
/// Summary of one stored ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcousticsRayInfo {
    pub source_index: usize,
    /// Launch declination (degrees, positive down).
    pub declination: f64,
    /// Number of points in the path.
    pub point_count: usize,
    pub top_bounces: u32,
    pub bottom_bounces: u32,
    pub termination: AcousticsTermination,
}

impl From<&RayResult<Planar>> for AcousticsRayInfo {
    fn from(ray: &RayResult<Planar>) -> Self {
        let (top_bounces, bottom_bounces) = ray.bounces();
        Self {
            source_index: ray.source_index,
            declination: ray.launch.declination,
            point_count: ray.len(),
            top_bounces,
            bottom_bounces,
            termination: ray.termination.into(),
        }
    }
}

#[repr(C)]
/// One eigenray connecting a source to a receiver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcousticsEigenray {
    pub source_index: usize,
    /// Receiver depth slot.
    pub depth_index: usize,
    /// Receiver range slot.
    pub range_index: usize,
    /// Refined launch declination (degrees).
    pub declination: f64,
    /// Travel time (s).
    pub travel_time: f64,
    /// Amplitude after boundary losses.
    pub amplitude: f64,
    /// Boundary phase (rad).
    pub phase: f64,
    /// Depth miss at the receiver range (m).
    pub miss: f64,
    pub top_bounces: u32,
    pub bottom_bounces: u32,
    /// Number of points in the path.
    pub point_count: usize,
}

impl From<&Eigenray<Planar>> for AcousticsEigenray {
    fn from(eigenray: &Eigenray<Planar>) -> Self {
        Self {
            source_index: eigenray.source_index(),
            depth_index: eigenray.receiver.depth,
            range_index: eigenray.receiver.range,
            declination: eigenray.declination,
            travel_time: eigenray.delay.re,
            amplitude: eigenray.amplitude,
            phase: eigenray.phase,
            miss: eigenray.miss,
            top_bounces: eigenray.topology.top,
            bottom_bounces: eigenray.topology.bottom,
            point_count: eigenray.ray.len(),
        }
    }
}

/// Ray path in ocean coordinates.
fn ocean_points(ray: &RayResult<Planar>) -> Vec<AcousticsRayPoint> {
    ray.points
        .iter()
        .zip(ray.ocean_path())
        .map(|(point, ocean): (&RayPoint<Planar>, _)| AcousticsRayPoint {
            x: ocean.x,
            y: ocean.y,
            z: ocean.z,
            travel_time: point.tau.re,
            amplitude: point.amp,
            phase: point.phase,
            top_bounces: point.top_bounces,
            bottom_bounces: point.bottom_bounces,
        })
        .collect()
}

/// Number of rays stored by the latest ray run.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_count` must be a valid, non-null pointer to a `usize`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_ray_count(
    ptr: *const AcousticsInstance,
    out_count: *mut usize,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let count = with_session(instance, |session| Ok(session.rays().len()))?;
        // SAFETY: the caller guarantees `out_count` is null or writable.
        unsafe { write_out(out_count, count, "out_count") }
    })
}

/// Summary of ray `index`.
///
/// Returns `OutOfRange` when `index` is past the stored rays.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_info` must be a valid, non-null pointer to an `AcousticsRayInfo`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_get_ray_info(
    ptr: *const AcousticsInstance,
    index: usize,
    out_info: *mut AcousticsRayInfo,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let info = with_session(instance, |session| {
            let rays = session.rays();
            rays.get(index)
                .map(AcousticsRayInfo::from)
                .ok_or_else(|| DefaultAcousticsError::out_of_range("ray", index, rays.len()))
        })?;
        // SAFETY: the caller guarantees `out_info` is null or writable.
        unsafe { write_out(out_info, info, "out_info") }
    })
}

/// Copy the path of ray `index` into a caller buffer.
///
/// The number of points always goes to `out_len`. Pass a null `out_points`
/// to size the buffer first; otherwise at most `capacity` points are copied.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_points` must be null or point to `capacity` writable `AcousticsRayPoint`s.
/// - `out_len` must be a valid, non-null pointer to a `usize`.
///
/// # Example Usage (C)
/// ```c
/// uintptr_t len = 0;
/// acoustics_get_ray(session, 0, NULL, 0, &len);
/// AcousticsRayPoint* path = malloc(len * sizeof(AcousticsRayPoint));
/// acoustics_get_ray(session, 0, path, len, &len);
/// ```
#[no_mangle]
pub unsafe extern "C" fn acoustics_get_ray(
    ptr: *const AcousticsInstance,
    index: usize,
    out_points: *mut AcousticsRayPoint,
    capacity: usize,
    out_len: *mut usize,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let points = with_session(instance, |session| {
            let rays = session.rays();
            rays.get(index)
                .map(ocean_points)
                .ok_or_else(|| DefaultAcousticsError::out_of_range("ray", index, rays.len()))
        })?;
        // SAFETY: forwarded caller contract.
        unsafe { copy_out(&points, out_points, capacity, out_len) }
    })
}

/// Number of eigenrays found by the latest eigenray run.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_count` must be a valid, non-null pointer to a `usize`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_eigenray_count(
    ptr: *const AcousticsInstance,
    out_count: *mut usize,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let count = with_session(instance, |session| Ok(session.eigenrays().len()))?;
        // SAFETY: the caller guarantees `out_count` is null or writable.
        unsafe { write_out(out_count, count, "out_count") }
    })
}

/// Summary of eigenray `index`.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_eigenray` must be a valid, non-null pointer to an `AcousticsEigenray`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_get_eigenray(
    ptr: *const AcousticsInstance,
    index: usize,
    out_eigenray: *mut AcousticsEigenray,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let eigenray = with_session(instance, |session| {
            let eigenrays = session.eigenrays();
            eigenrays
                .get(index)
                .map(AcousticsEigenray::from)
                .ok_or_else(|| DefaultAcousticsError::out_of_range("eigenray", index, eigenrays.len()))
        })?;
        // SAFETY: the caller guarantees `out_eigenray` is null or writable.
        unsafe { write_out(out_eigenray, eigenray, "out_eigenray") }
    })
}

/// Copy the path of eigenray `index` into a caller buffer. Sizing works as
/// in `acoustics_get_ray`.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_points` must be null or point to `capacity` writable `AcousticsRayPoint`s.
/// - `out_len` must be a valid, non-null pointer to a `usize`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_get_eigenray_path(
    ptr: *const AcousticsInstance,
    index: usize,
    out_points: *mut AcousticsRayPoint,
    capacity: usize,
    out_len: *mut usize,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let points = with_session(instance, |session| {
            let eigenrays = session.eigenrays();
            eigenrays
                .get(index)
                .map(|e| ocean_points(&e.ray))
                .ok_or_else(|| DefaultAcousticsError::out_of_range("eigenray", index, eigenrays.len()))
        })?;
        // SAFETY: forwarded caller contract.
        unsafe { copy_out(&points, out_points, capacity, out_len) }
    })
}
