//! Piecewise-linear boundary profiles for range/depth environments.
//!
//! The vertex list is padded with one sentinel vertex far to each side,
//! carrying the end depth, so every range maps to a valid segment and the
//! profile extends flat beyond the last vertex.

use super::{locate_segment, BoundaryGeometry, EXTENSION};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// One `(range, depth)` vertex in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryVertex {
    /// Range from the origin in meters.
    pub range: f64,
    /// Depth in meters (positive down).
    pub depth: f64,
}

impl BoundaryVertex {
    /// Create a vertex.
    pub const fn new(range: f64, depth: f64) -> Self {
        Self { range, depth }
    }
}

/// Depth, slope and segment of a profile query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryQuery {
    /// Boundary depth at the queried range.
    pub depth: f64,
    /// d(depth)/d(range) of the segment.
    pub slope: f64,
    /// Segment index in the padded vertex list.
    pub segment: usize,
}

/// Validated piecewise-linear boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryProfile {
    vertices: Vec<BoundaryVertex>,
    ranges: Vec<f64>,
    depths: Vec<f64>,
}

impl BoundaryProfile {
    /// Build a profile from vertices ordered by range.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty list, non-increasing ranges or
    /// non-finite depths.
    pub fn new(vertices: Vec<BoundaryVertex>) -> Result<Self, ConfigError> {
        if vertices.is_empty() {
            return Err(ConfigError::Empty {
                what: "boundary vertices",
            });
        }
        let user_ranges: Vec<f64> = vertices.iter().map(|v| v.range).collect();
        ConfigError::check_increasing("boundary ranges", &user_ranges)?;
        for v in &vertices {
            ConfigError::check_finite("boundary depth", v.depth)?;
        }

        let first = vertices[0].depth;
        let last = vertices[vertices.len() - 1].depth;
        let mut ranges = Vec::with_capacity(vertices.len() + 2);
        let mut depths = Vec::with_capacity(vertices.len() + 2);
        ranges.push(-EXTENSION);
        depths.push(first);
        ranges.extend_from_slice(&user_ranges);
        depths.extend(vertices.iter().map(|v| v.depth));
        ranges.push(EXTENSION);
        depths.push(last);

        Ok(Self {
            vertices,
            ranges,
            depths,
        })
    }

    /// Flat boundary at `depth`.
    pub fn flat(depth: f64) -> Self {
        let vertex = BoundaryVertex::new(0.0, depth);
        Self {
            vertices: vec![vertex],
            ranges: vec![-EXTENSION, 0.0, EXTENSION],
            depths: vec![depth, depth, depth],
        }
    }

    /// User-supplied vertices, without padding.
    pub fn vertices(&self) -> &[BoundaryVertex] {
        &self.vertices
    }

    /// Query at `range`; at a vertex the segment starting there wins.
    pub fn query(&self, range: f64) -> BoundaryQuery {
        self.query_directed(range, 0.0)
    }

    /// Query at `range`; at an exact vertex the segment in the direction of
    /// `heading_r` is used.
    pub fn query_directed(&self, range: f64, heading_r: f64) -> BoundaryQuery {
        let segment = locate_segment(&self.ranges, range, heading_r);
        let (r0, r1) = (self.ranges[segment], self.ranges[segment + 1]);
        let (d0, d1) = (self.depths[segment], self.depths[segment + 1]);
        let slope = (d1 - d0) / (r1 - r0);
        let depth = if slope == 0.0 {
            d0
        } else {
            d0 + (range - r0) * slope
        };
        BoundaryQuery {
            depth,
            slope,
            segment,
        }
    }

    /// Range interval of a padded segment.
    pub fn segment_bounds(&self, segment: usize) -> (f64, f64) {
        (self.ranges[segment], self.ranges[segment + 1])
    }
}

impl BoundaryGeometry for BoundaryProfile {
    const NAME: &'static str = "range-depth profile";
    const SUPPORTS_RANGE_DEPENDENT_SSP: bool = true;

    fn depth_span(&self) -> (f64, f64) {
        self.vertices
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v.depth), hi.max(v.depth))
            })
    }

    fn depth_at(&self, x: f64, _y: f64) -> f64 {
        self.query(x).depth
    }

    fn check_separation(top: &Self, bottom: &Self) -> Result<(), ConfigError> {
        let samples = top
            .vertices
            .iter()
            .chain(bottom.vertices.iter())
            .map(|v| v.range);
        for range in samples {
            let t = top.query(range).depth;
            let b = bottom.query(range).depth;
            if t >= b {
                return Err(ConfigError::BoundariesCross {
                    top: t,
                    bottom: b,
                    location: format!("range {range} m"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ridge() -> BoundaryProfile {
        BoundaryProfile::new(vec![
            BoundaryVertex::new(0.0, 100.0),
            BoundaryVertex::new(1000.0, 50.0),
            BoundaryVertex::new(2000.0, 100.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_linear_interpolation() {
        let q = ridge().query(500.0);
        assert_relative_eq!(q.depth, 75.0);
        assert_relative_eq!(q.slope, -0.05);
    }

    #[test]
    fn test_flat_extension_beyond_vertices() {
        let b = ridge();
        let before = b.query(-300.0);
        assert_eq!(before.depth, 100.0);
        assert_eq!(before.slope, 0.0);
        let after = b.query(1.0e7);
        assert_eq!(after.depth, 100.0);
        assert_eq!(after.slope, 0.0);
    }

    #[test]
    fn test_vertex_tie_break_follows_heading() {
        let b = ridge();
        let plain = b.query(1000.0);
        let forward = b.query_directed(1000.0, 1.0);
        let backward = b.query_directed(1000.0, -1.0);
        assert_eq!(plain.depth, 50.0);
        assert_eq!(plain.segment, forward.segment);
        assert_relative_eq!(forward.slope, 0.05);
        assert_relative_eq!(backward.slope, -0.05);
        assert_eq!(backward.segment + 1, forward.segment);
    }

    #[test]
    fn test_plain_query_at_vertex_uses_segment_starting_there() {
        let b = ridge();
        let q = b.query(1000.0);
        assert_eq!(b.segment_bounds(q.segment).0, 1000.0);
        assert_relative_eq!(q.slope, 0.05);
    }

    #[test]
    fn test_flat_profile() {
        let b = BoundaryProfile::flat(42.0);
        assert_eq!(b.query(-1.0e6).depth, 42.0);
        assert_eq!(b.query(3.0).depth, 42.0);
        assert_eq!(b.depth_span(), (42.0, 42.0));
    }

    #[test]
    fn test_separation_check() {
        let top = BoundaryProfile::flat(0.0);
        assert!(BoundaryProfile::check_separation(&top, &ridge()).is_ok());
        let shallow = BoundaryProfile::new(vec![
            BoundaryVertex::new(0.0, 10.0),
            BoundaryVertex::new(500.0, -1.0),
        ])
        .unwrap();
        assert!(matches!(
            BoundaryProfile::check_separation(&top, &shallow),
            Err(ConfigError::BoundariesCross { .. })
        ));
    }

    #[test]
    fn test_rejects_unordered_vertices() {
        assert!(BoundaryProfile::new(vec![
            BoundaryVertex::new(10.0, 100.0),
            BoundaryVertex::new(10.0, 50.0),
        ])
        .is_err());
        assert!(BoundaryProfile::new(Vec::new()).is_err());
    }
}
