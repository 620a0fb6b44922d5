use crate::error::{AcousticsErrorCode, DefaultAcousticsError};
use crate::helpers::{copy_out, handle_ffi_result_error, instance_from_ptr, with_session, write_out};
use crate::instance::AcousticsInstance;
use ocean_acoustics_core::{Field, Session, TwoD};

#[repr(C)]
/// Complex pressure value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AcousticsComplex {
    pub re: f64,
    pub im: f64,
}

#[repr(C)]
/// Shape of one field, depth-major then range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AcousticsFieldDimensions {
    pub source_index: usize,
    pub depth_count: usize,
    pub range_count: usize,
}

fn field_at(session: &Session<TwoD>, index: usize) -> Result<&Field, DefaultAcousticsError> {
    let fields = session.fields();
    fields
        .get(index)
        .ok_or_else(|| DefaultAcousticsError::out_of_range("field", index, fields.len()))
}

/// Number of fields from the latest field run, one per source.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_count` must be a valid, non-null pointer to a `usize`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_field_count(
    ptr: *const AcousticsInstance,
    out_count: *mut usize,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let count = with_session(instance, |session| Ok(session.fields().len()))?;
        // SAFETY: the caller guarantees `out_count` is null or writable.
        unsafe { write_out(out_count, count, "out_count") }
    })
}

/// Shape of field `index`.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_dimensions` must be a valid, non-null pointer to an `AcousticsFieldDimensions`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_field_dimensions(
    ptr: *const AcousticsInstance,
    index: usize,
    out_dimensions: *mut AcousticsFieldDimensions,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let dimensions = with_session(instance, |session| {
            let field = field_at(session, index)?;
            let (_, depth_count, range_count) = field.dims();
            Ok(AcousticsFieldDimensions {
                source_index: field.source_index(),
                depth_count,
                range_count,
            })
        })?;
        // SAFETY: the caller guarantees `out_dimensions` is null or writable.
        unsafe { write_out(out_dimensions, dimensions, "out_dimensions") }
    })
}

/// Copy the complex pressure of field `index`, depth-major then range.
///
/// The value count always goes to `out_len`; a null `out_values` only
/// reports it.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_values` must be null or point to `capacity` writable `AcousticsComplex` values.
/// - `out_len` must be a valid, non-null pointer to a `usize`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_get_field(
    ptr: *const AcousticsInstance,
    index: usize,
    out_values: *mut AcousticsComplex,
    capacity: usize,
    out_len: *mut usize,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let values: Vec<AcousticsComplex> = with_session(instance, |session| {
            Ok(field_at(session, index)?
                .values()
                .iter()
                .map(|p| AcousticsComplex { re: p.re, im: p.im })
                .collect())
        })?;
        // SAFETY: forwarded caller contract.
        unsafe { copy_out(&values, out_values, capacity, out_len) }
    })
}

/// Copy the transmission loss of field `index` in dB, laid out like
/// `acoustics_get_field`. Receivers no beam reached read as infinity.
///
/// # Safety
///
/// - `ptr` must be a valid pointer returned by `acoustics_new` or null.
/// - `out_values` must be null or point to `capacity` writable `double`s.
/// - `out_len` must be a valid, non-null pointer to a `usize`.
#[no_mangle]
pub unsafe extern "C" fn acoustics_get_transmission_loss(
    ptr: *const AcousticsInstance,
    index: usize,
    out_values: *mut f64,
    capacity: usize,
    out_len: *mut usize,
) -> AcousticsErrorCode {
    handle_ffi_result_error(|| {
        // SAFETY: the caller guarantees `ptr` is null or valid.
        let instance = unsafe { instance_from_ptr(ptr) }?;
        let values: Vec<f64> = with_session(instance, |session| {
            Ok(field_at(session, index)?
                .values()
                .iter()
                .map(|p| -20.0 * p.norm().log10())
                .collect())
        })?;
        // SAFETY: forwarded caller contract.
        unsafe { copy_out(&values, out_values, capacity, out_len) }
    })
}
