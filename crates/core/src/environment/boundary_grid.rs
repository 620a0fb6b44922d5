//! Rectilinear boundary grids for fully three-dimensional environments.
//!
//! Depths are bilinear inside each `(x, y)` cell. As with
//! [`BoundaryProfile`](super::BoundaryProfile) the axes are padded with a
//! sentinel node far out on each side, so the surface extends flat past the
//! supplied grid and every query lands in a real cell.

use super::{locate_segment, BoundaryGeometry, EXTENSION};
use crate::core_types::Vec2;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Grid description as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Node x coordinates in meters, strictly increasing.
    pub xs: Vec<f64>,
    /// Node y coordinates in meters, strictly increasing.
    pub ys: Vec<f64>,
    /// Depths in row-major order (`iy * xs.len() + ix`).
    pub depths: Vec<f64>,
}

/// Depth, gradient and cell of a grid query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridQuery {
    /// Boundary depth.
    pub depth: f64,
    /// `(∂depth/∂x, ∂depth/∂y)`.
    pub gradient: Vec2,
    /// `(ix, iy)` in the padded grid.
    pub cell: (usize, usize),
}

/// Validated, padded boundary grid.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryGrid {
    spec: GridSpec,
    xs: Vec<f64>,
    ys: Vec<f64>,
    depths: Vec<f64>,
}

impl BoundaryGrid {
    /// Build a grid.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or non-increasing axes, a depth array of
    /// the wrong length, or non-finite depths.
    pub fn new(spec: GridSpec) -> Result<Self, ConfigError> {
        if spec.xs.is_empty() {
            return Err(ConfigError::Empty { what: "grid x axis" });
        }
        if spec.ys.is_empty() {
            return Err(ConfigError::Empty { what: "grid y axis" });
        }
        ConfigError::check_increasing("grid x axis", &spec.xs)?;
        ConfigError::check_increasing("grid y axis", &spec.ys)?;
        let expected = spec.xs.len() * spec.ys.len();
        if spec.depths.len() != expected {
            return Err(ConfigError::LengthMismatch {
                what: "grid depths",
                expected,
                actual: spec.depths.len(),
            });
        }
        for depth in &spec.depths {
            ConfigError::check_finite("grid depth", *depth)?;
        }

        let pad = |axis: &[f64]| -> Vec<f64> {
            let mut padded = Vec::with_capacity(axis.len() + 2);
            padded.push(-EXTENSION);
            padded.extend_from_slice(axis);
            padded.push(EXTENSION);
            padded
        };
        let xs = pad(&spec.xs);
        let ys = pad(&spec.ys);
        let (nx, ny) = (spec.xs.len(), spec.ys.len());
        let mut depths = Vec::with_capacity(xs.len() * ys.len());
        for jy in 0..ys.len() {
            let iy = jy.saturating_sub(1).min(ny - 1);
            for jx in 0..xs.len() {
                let ix = jx.saturating_sub(1).min(nx - 1);
                depths.push(spec.depths[iy * nx + ix]);
            }
        }
        Ok(Self {
            spec,
            xs,
            ys,
            depths,
        })
    }

    /// Flat surface at `depth`.
    pub fn flat(depth: f64) -> Self {
        Self {
            spec: GridSpec {
                xs: vec![0.0],
                ys: vec![0.0],
                depths: vec![depth],
            },
            xs: vec![-EXTENSION, 0.0, EXTENSION],
            ys: vec![-EXTENSION, 0.0, EXTENSION],
            depths: vec![depth; 9],
        }
    }

    /// Grid as supplied.
    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Query at `(x, y)`; on a grid line the cell starting there wins.
    pub fn query(&self, x: f64, y: f64) -> GridQuery {
        self.query_directed(x, y, 0.0, 0.0)
    }

    /// Query at `(x, y)`; on a grid line the cell in the heading direction
    /// is used.
    pub fn query_directed(&self, x: f64, y: f64, heading_x: f64, heading_y: f64) -> GridQuery {
        let ix = locate_segment(&self.xs, x, heading_x);
        let iy = locate_segment(&self.ys, y, heading_y);
        let nx = self.xs.len();
        let d00 = self.depths[iy * nx + ix];
        let d10 = self.depths[iy * nx + ix + 1];
        let d01 = self.depths[(iy + 1) * nx + ix];
        let d11 = self.depths[(iy + 1) * nx + ix + 1];

        let dx = self.xs[ix + 1] - self.xs[ix];
        let dy = self.ys[iy + 1] - self.ys[iy];
        let tx = ((x - self.xs[ix]) / dx).clamp(0.0, 1.0);
        let ty = ((y - self.ys[iy]) / dy).clamp(0.0, 1.0);

        let depth = (1.0 - tx) * (1.0 - ty) * d00
            + tx * (1.0 - ty) * d10
            + (1.0 - tx) * ty * d01
            + tx * ty * d11;
        let gradient = Vec2::new(
            ((1.0 - ty) * (d10 - d00) + ty * (d11 - d01)) / dx,
            ((1.0 - tx) * (d01 - d00) + tx * (d11 - d10)) / dy,
        );
        GridQuery {
            depth,
            gradient,
            cell: (ix, iy),
        }
    }

    /// `(x0, x1, y0, y1)` extent of a padded cell.
    pub fn cell_bounds(&self, cell: (usize, usize)) -> (f64, f64, f64, f64) {
        let (ix, iy) = cell;
        (self.xs[ix], self.xs[ix + 1], self.ys[iy], self.ys[iy + 1])
    }
}

impl BoundaryGeometry for BoundaryGrid {
    const NAME: &'static str = "rectilinear grid";
    const SUPPORTS_RANGE_DEPENDENT_SSP: bool = false;

    fn depth_span(&self) -> (f64, f64) {
        self.spec
            .depths
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(*d), hi.max(*d))
            })
    }

    fn depth_at(&self, x: f64, y: f64) -> f64 {
        self.query(x, y).depth
    }

    fn check_separation(top: &Self, bottom: &Self) -> Result<(), ConfigError> {
        for grid in [top, bottom] {
            for y in &grid.spec.ys {
                for x in &grid.spec.xs {
                    let t = top.depth_at(*x, *y);
                    let b = bottom.depth_at(*x, *y);
                    if t >= b {
                        return Err(ConfigError::BoundariesCross {
                            top: t,
                            bottom: b,
                            location: format!("({x}, {y}) m"),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sloped() -> BoundaryGrid {
        // depth = 100 + 0.1 x + 0.2 y on a 2x2 grid
        BoundaryGrid::new(GridSpec {
            xs: vec![0.0, 100.0],
            ys: vec![0.0, 100.0],
            depths: vec![100.0, 110.0, 120.0, 130.0],
        })
        .unwrap()
    }

    #[test]
    fn test_bilinear_plane_is_exact() {
        let q = sloped().query(25.0, 50.0);
        assert_relative_eq!(q.depth, 100.0 + 2.5 + 10.0);
        assert_relative_eq!(q.gradient.x, 0.1);
        assert_relative_eq!(q.gradient.y, 0.2);
    }

    #[test]
    fn test_flat_extension_outside_grid() {
        let q = sloped().query(500.0, -500.0);
        assert_relative_eq!(q.depth, 110.0);
        assert_relative_eq!(q.gradient.x, 0.0);
        assert_relative_eq!(q.gradient.y, 0.0);
    }

    #[test]
    fn test_grid_line_tie_break() {
        let g = sloped();
        let forward = g.query_directed(100.0, 50.0, 1.0, 0.0);
        let backward = g.query_directed(100.0, 50.0, -1.0, 0.0);
        assert_eq!(forward.cell.0, backward.cell.0 + 1);
        assert_relative_eq!(forward.depth, backward.depth);
        assert_relative_eq!(backward.gradient.x, 0.1);
        assert_relative_eq!(forward.gradient.x, 0.0);
        // without a heading the cell starting on the line is used
        assert_eq!(g.query(100.0, 50.0).cell, forward.cell);
    }

    #[test]
    fn test_depth_length_mismatch() {
        let err = BoundaryGrid::new(GridSpec {
            xs: vec![0.0, 1.0],
            ys: vec![0.0],
            depths: vec![1.0],
        })
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::LengthMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_flat_grid() {
        let g = BoundaryGrid::flat(5000.0);
        assert_eq!(g.query(1.0e5, -3.0e4).depth, 5000.0);
        assert!(BoundaryGrid::check_separation(&BoundaryGrid::flat(0.0), &g).is_ok());
    }
}
