use crate::error::{with_last_error_mut, AcousticsError, AcousticsErrorCode, DefaultAcousticsError};
use crate::instance::AcousticsInstance;
use ocean_acoustics_core::{Session, TwoD};
use std::ffi::CString;

/// Set the thread-local error message and code.
pub(crate) fn set_last_error(error: &impl AcousticsError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl AcousticsError) -> AcousticsErrorCode {
    set_last_error(error);
    error.code()
}

/// Clear the thread-local error message and code.
/// Called on successful operations.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = AcousticsErrorCode::Ok;
    });
}

/// Run `body`, recording any error and returning the code for the caller.
pub(crate) fn handle_ffi_result_error<F>(body: F) -> AcousticsErrorCode
where
    F: FnOnce() -> Result<(), DefaultAcousticsError>,
{
    match body() {
        Ok(()) => {
            clear_last_error();
            AcousticsErrorCode::Ok
        }
        Err(error) => track_error(&error),
    }
}

/// Borrow the instance behind `ptr`.
///
/// # Safety
/// `ptr` must be null or a live pointer returned by `acoustics_new`.
pub(crate) unsafe fn instance_from_ptr<'a>(
    ptr: *const AcousticsInstance,
) -> Result<&'a AcousticsInstance, DefaultAcousticsError> {
    // SAFETY: the caller guarantees `ptr` is null or valid.
    unsafe { ptr.as_ref() }.ok_or_else(|| DefaultAcousticsError::null_pointer("ptr"))
}

/// Run `f` under the session's read lock.
pub(crate) fn with_session<F, T>(instance: &AcousticsInstance, f: F) -> Result<T, DefaultAcousticsError>
where
    F: FnOnce(&Session<TwoD>) -> Result<T, DefaultAcousticsError>,
{
    let session = instance
        .session
        .read()
        .map_err(|_| DefaultAcousticsError::lock_poisoned("RwLock"))?;
    f(&session)
}

/// Run `f` under the session's write lock.
pub(crate) fn with_session_mut<F, T>(instance: &AcousticsInstance, f: F) -> Result<T, DefaultAcousticsError>
where
    F: FnOnce(&mut Session<TwoD>) -> Result<T, DefaultAcousticsError>,
{
    let mut session = instance
        .session
        .write()
        .map_err(|_| DefaultAcousticsError::lock_poisoned("RwLock"))?;
    f(&mut session)
}

/// Borrow `len` values from a caller-owned array. A zero length never
/// touches the pointer.
///
/// # Safety
/// A non-null `ptr` must point to `len` readable values that outlive the call.
pub(crate) unsafe fn read_slice<'a>(
    ptr: *const f64,
    len: usize,
    name: &str,
) -> Result<&'a [f64], DefaultAcousticsError> {
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(DefaultAcousticsError::null_pointer(name));
    }
    // SAFETY: non-null and the caller guarantees `len` readable elements.
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// Write one value through an out-parameter.
///
/// # Safety
/// A non-null `out` must point to writable memory for one `T`.
pub(crate) unsafe fn write_out<T>(out: *mut T, value: T, name: &str) -> Result<(), DefaultAcousticsError> {
    if out.is_null() {
        return Err(DefaultAcousticsError::null_pointer(name));
    }
    // SAFETY: checked non-null; the caller guarantees it is writable.
    unsafe { out.write(value) };
    Ok(())
}

/// Copy `items` into a caller buffer.
///
/// The full length always goes to `out_len`. With a null `out` nothing else
/// is written, so callers can size their buffer first; otherwise at most
/// `capacity` items are copied.
///
/// # Safety
/// `out_len` must be writable; a non-null `out` must hold `capacity` items.
pub(crate) unsafe fn copy_out<T: Copy>(
    items: &[T],
    out: *mut T,
    capacity: usize,
    out_len: *mut usize,
) -> Result<(), DefaultAcousticsError> {
    // SAFETY: forwarded caller contract.
    unsafe { write_out(out_len, items.len(), "out_len") }?;
    if out.is_null() {
        return Ok(());
    }
    let n = items.len().min(capacity);
    // SAFETY: `out` holds at least `capacity >= n` items and cannot overlap
    // the session-owned `items`.
    unsafe { std::ptr::copy_nonoverlapping(items.as_ptr(), out, n) };
    Ok(())
}
