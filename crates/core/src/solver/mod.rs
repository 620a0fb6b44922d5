//! Ray tracing backends
//!
//! The core abstraction is [`RayTracer`], a strategy over how a batch of
//! independent rays is executed. The per-ray work is identical for every
//! backend; only scheduling differs.
//!
//! # Feature Flags
//!
//! - `parallel` (default): Enables the rayon thread-pool backend. Disable
//!   with `--no-default-features` for single-threaded builds.
//!
//! # Backend Selection
//!
//! [`RayTracer::new`] honours the requested [`Parallelism`]:
//! 1. Try to build a thread pool (if `parallel` is enabled)
//! 2. Fall back to sequential tracing (always available)

mod backend;
pub mod profiler;

pub use backend::{Parallelism, RayTracer};
pub use profiler::ProfilerScope;
