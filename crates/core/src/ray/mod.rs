//! Ray tracing through a [`Medium`](crate::dimension::Medium).

pub mod integrator;
pub mod reflect;
pub mod state;

pub use integrator::{first_crossing, launch_point, trace_into, TraceParams, DEFAULT_AMPLITUDE_FLOOR};
pub use reflect::reflect;
pub use state::{Launch, RayPoint, RayResult, Termination};

use crate::dimension::{Medium, RayOrigin, RaySpace};

/// Trace one ray into a fresh [`RayResult`].
pub fn trace<S: RaySpace, M: Medium<S>>(
    medium: &M,
    origin: &RayOrigin,
    launch: Launch,
    source_index: usize,
    params: &TraceParams,
) -> RayResult<S> {
    let mut points = Vec::new();
    let termination = trace_into(medium, origin, &launch, params, &mut points);
    RayResult {
        source_index,
        origin: *origin,
        launch,
        points,
        termination,
    }
}
