//! C interface to the ocean acoustics ray tracer.
//!
//! Exposes range/depth sessions through an opaque `AcousticsInstance`
//! handle. Every call returns an [`AcousticsErrorCode`]; on failure a
//! message is kept per thread and read back with
//! `acoustics_get_last_error`.
//!
//! Typical use:
//!
//! 1. `acoustics_new` with an environment and run settings
//! 2. `acoustics_run`
//! 3. read rays, eigenrays or fields
//! 4. optionally edit inputs with the `acoustics_set_*` calls and run again
//! 5. `acoustics_destroy`
//!
//! Output buffers are owned by the caller. Path and field readouts report
//! their length first so a buffer can be sized with one extra call.

mod error;
mod field_queries;
mod helpers;
mod instance;
mod queries;
mod session;

pub use error::{acoustics_get_last_error, acoustics_get_last_error_code, AcousticsErrorCode};
pub use field_queries::{
    acoustics_field_count, acoustics_field_dimensions, acoustics_get_field, acoustics_get_transmission_loss,
    AcousticsComplex, AcousticsFieldDimensions,
};
pub use instance::{
    acoustics_destroy, acoustics_new, AcousticsBeamType, AcousticsBoundary, AcousticsBoundaryKind,
    AcousticsEnvironment, AcousticsInstance, AcousticsRunType, AcousticsSettings, AcousticsSspInterpolation,
};
pub use queries::{
    acoustics_eigenray_count, acoustics_get_eigenray, acoustics_get_eigenray_path, acoustics_get_ray,
    acoustics_get_ray_info, acoustics_ray_count, AcousticsEigenray, AcousticsRayInfo, AcousticsRayPoint,
    AcousticsTermination,
};
pub use session::{
    acoustics_run, acoustics_set_declinations, acoustics_set_receivers, acoustics_set_run_type,
    acoustics_set_source_depth, acoustics_set_sound_speed, AcousticsRunSummary,
};
