use ocean_acoustics_core::ConfigError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// - `code()` is what crosses the FFI boundary
/// - `msg()` is kept in thread-local storage for diagnostics
pub(crate) trait AcousticsError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> AcousticsErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `AcousticsError` for every FFI failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultAcousticsError {
    code: AcousticsErrorCode,
    msg: String,
}

impl DefaultAcousticsError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_instance"`, `"ptr"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: AcousticsErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for poisoned lock.
    pub fn lock_poisoned(lock_name: &str) -> Self {
        Self {
            code: AcousticsErrorCode::LockPoisoned,
            msg: format!("Lock '{lock_name}' was poisoned by a panic in another thread"),
        }
    }

    /// Create error for an index past the end of an output list.
    ///
    /// # Arguments
    /// * `what` - The list being indexed (e.g., `"ray"`, `"field"`)
    /// * `index` - The requested index
    /// * `len` - The list length
    pub fn out_of_range(what: &str, index: usize, len: usize) -> Self {
        Self {
            code: AcousticsErrorCode::OutOfRange,
            msg: format!("{what} index {index} out of range ({len} available)"),
        }
    }

    /// Create error for invalid parameter.
    #[allow(dead_code)] // kept for API completeness; no entry point produces InvalidParameter yet (REVIEW_FINDINGS F9)
    pub fn invalid_parameter(message: String) -> Self {
        Self {
            code: AcousticsErrorCode::InvalidParameter,
            msg: message,
        }
    }
}

impl From<ConfigError> for DefaultAcousticsError {
    fn from(error: ConfigError) -> Self {
        Self {
            code: AcousticsErrorCode::InvalidConfiguration,
            msg: error.to_string(),
        }
    }
}

impl AcousticsError for DefaultAcousticsError {
    fn code(&self) -> AcousticsErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by acoustics functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcousticsErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Lock poisoned: internal synchronization primitive was poisoned by a panic.
    LockPoisoned = 2,

    /// The environment or run configuration failed validation.
    InvalidConfiguration = 3,

    /// Invalid parameter passed to function.
    InvalidParameter = 4,

    /// Index past the end of a ray, eigenray or field list.
    OutOfRange = 5,
}

impl From<DefaultAcousticsError> for AcousticsErrorCode {
    fn from(error: DefaultAcousticsError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The CString is stored here so the pointer handed out stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, AcousticsErrorCode)> = const { RefCell::new((None, AcousticsErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, AcousticsErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, AcousticsErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if an error occurred.
/// - `null` if the last call on this thread succeeded.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```c
/// AcousticsInstance* session = NULL;
/// AcousticsErrorCode err = acoustics_new(&env, &settings, &session);
/// if (err != Ok) {
///     const char* error = acoustics_get_last_error();
///     if (error) {
///         printf("Setup failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn acoustics_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Error codes are stored per thread.
#[no_mangle]
pub extern "C" fn acoustics_get_last_error_code() -> AcousticsErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
