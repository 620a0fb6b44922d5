//! Core types and utilities

pub mod vector;

pub use vector::{Point3, RayVector, Vec2, Vec3};
