//! Ocean Acoustics Core Library
//!
//! Ray and beam tracing through a stratified ocean. Given a sound-speed
//! profile, reflecting surface and seabed boundaries and a set of sources,
//! a [`Session`] traces rays from every source and produces one of:
//!
//! - ray trajectories,
//! - eigenrays connecting sources to receivers,
//! - coherent or incoherent pressure fields on a receiver grid.
//!
//! ## Dimensionality
//!
//! Runs are generic over a [`Dimensionality`]: [`TwoD`] traces range/depth
//! rays through range-dependent profiles, [`Nx2D`] traces one vertical slice
//! of a 3D environment per bearing and [`ThreeD`] traces fully spatial rays.
//! The choice is made at compile time.
//!
//! ## Conventions
//!
//! Depth `z` is positive down, angles are given in degrees (declination
//! positive down, bearing counter-clockwise from +x) and boundary normals
//! point out of the water.

// Core types and utilities
pub mod core_types;
pub mod error;

// Inputs
pub mod angles;
pub mod config;
pub mod environment;

// Tracing engine
pub mod dimension;
pub mod ray;
pub mod solver;

// Outputs
pub mod eigen;
pub mod field;

// Orchestration
pub mod session;

// Re-export core types
pub use core_types::{Point3, Vec2, Vec3};
pub use error::ConfigError;

// Re-export inputs
pub use angles::{AngleCount, AngleSpec, AngleTable};
pub use config::{BeamBox, ParamKind, Params, RunConfig, RunType, Sources};
pub use environment::{
    AttenuationUnits, BoundaryCondition, BoundaryGrid, BoundaryProfile, BoundarySide, BoundaryVertex, Environment,
    Environment2D, Environment3D, GridSpec, HalfSpace, SoundSpeedProfile, SspInterpolation, SspPoint,
};

// Re-export engine and outputs
pub use dimension::{Dimensionality, Nx2D, Planar, RayOrigin, RaySpace, Spatial, ThreeD, TwoD};
pub use eigen::{EigenSettings, Eigenray, ReceiverIndex, Topology};
pub use field::{BeamType, Field, FieldMode, ReceiverGrid};
pub use ray::{Launch, RayPoint, RayResult, Termination, TraceParams};
pub use session::{LaunchTables, RunSummary, Session};
pub use solver::{Parallelism, RayTracer};
