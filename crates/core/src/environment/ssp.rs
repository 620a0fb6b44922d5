//! Sound-speed profile interpolation
//!
//! A profile is a depth-ordered list of samples plus an interpolation rule.
//! Four rules are supported:
//!
//! - **C-linear**: speed linear in depth, piecewise constant gradient.
//! - **N²-linear**: `1/c²` linear in depth, which keeps ray curvature smooth
//!   inside a layer.
//! - **PCHIP**: monotone piecewise cubic Hermite, continuous gradient.
//! - **Quadrilateral**: a set of speed columns at increasing ranges, C-linear
//!   in depth and linear in range between columns.
//!
//! Queries outside the tabulated depths (or ranges) return the end value with
//! zero slope. At an interface the segment whose upper endpoint is `<=` the
//! query wins; the integrator uses [`SoundSpeedProfile::evaluate_directed`] so
//! that a ray sitting exactly on an interface sees the layer it is entering.

use super::locate_segment;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Interpolation rule for a sound-speed profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SspInterpolation {
    /// Speed linear in depth.
    #[default]
    CLinear,
    /// Squared index of refraction linear in depth.
    N2Linear,
    /// Monotone piecewise cubic Hermite in depth.
    Pchip,
    /// Range-dependent columns, linear in range and depth.
    Quadrilateral,
}

impl SspInterpolation {
    /// Short name used in logs and errors.
    pub const fn name(self) -> &'static str {
        match self {
            SspInterpolation::CLinear => "c-linear",
            SspInterpolation::N2Linear => "n2-linear",
            SspInterpolation::Pchip => "pchip",
            SspInterpolation::Quadrilateral => "quadrilateral",
        }
    }
}

/// One tabulated sample of the water column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SspPoint {
    /// Depth in meters (positive down).
    pub depth: f64,
    /// Compressional speed in m/s.
    pub speed: f64,
    /// Density in g/cm³.
    #[serde(default = "default_density")]
    pub density: f64,
    /// Attenuation in the run's attenuation units.
    #[serde(default)]
    pub attenuation: f64,
}

fn default_density() -> f64 {
    1.0
}

impl SspPoint {
    /// Lossless sample with unit density.
    pub const fn new(depth: f64, speed: f64) -> Self {
        Self {
            depth,
            speed,
            density: 1.0,
            attenuation: 0.0,
        }
    }
}

/// Speed columns for the quadrilateral profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SspColumns {
    /// Column ranges in meters.
    pub ranges: Vec<f64>,
    /// `speeds[j][i]` is the speed at range `ranges[j]` and depth `points[i].depth`.
    pub speeds: Vec<Vec<f64>>,
}

/// Result of a profile query.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SspSample {
    /// Sound speed in m/s.
    pub c: f64,
    /// ∂c/∂r
    pub dc_dr: f64,
    /// ∂c/∂z
    pub dc_dz: f64,
    /// ∂²c/∂r²
    pub d2c_dr2: f64,
    /// ∂²c/∂r∂z
    pub d2c_drdz: f64,
    /// ∂²c/∂z²
    pub d2c_dz2: f64,
    /// Density in g/cm³.
    pub density: f64,
    /// Attenuation in the run's units.
    pub attenuation: f64,
    /// Depth segment index.
    pub layer: usize,
}

/// Validated sound-speed profile.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundSpeedProfile {
    interpolation: SspInterpolation,
    points: Vec<SspPoint>,
    depths: Vec<f64>,
    /// Per-sample derivative for PCHIP, `1/c²` for N²-linear, empty otherwise.
    aux: Vec<f64>,
    columns: Option<SspColumns>,
}

impl SoundSpeedProfile {
    /// Build a depth-only profile.
    ///
    /// # Errors
    ///
    /// Returns an error for fewer than two samples, non-increasing depths,
    /// non-positive speeds or densities, or when `interpolation` is
    /// [`SspInterpolation::Quadrilateral`] (use [`Self::range_dependent`]).
    pub fn new(interpolation: SspInterpolation, points: Vec<SspPoint>) -> Result<Self, ConfigError> {
        if interpolation == SspInterpolation::Quadrilateral {
            return Err(ConfigError::invalid(
                "sound speed",
                "quadrilateral profiles need range columns",
            ));
        }
        Self::build(interpolation, points, None)
    }

    /// Build a range-dependent quadrilateral profile. `points` supplies the
    /// depth axis, densities and attenuation.
    ///
    /// # Errors
    ///
    /// Returns an error when the columns do not match the depth axis or the
    /// ranges are not strictly increasing.
    pub fn range_dependent(points: Vec<SspPoint>, columns: SspColumns) -> Result<Self, ConfigError> {
        if columns.ranges.is_empty() {
            return Err(ConfigError::Empty {
                what: "sound speed column ranges",
            });
        }
        ConfigError::check_increasing("sound speed column ranges", &columns.ranges)?;
        if columns.speeds.len() != columns.ranges.len() {
            return Err(ConfigError::LengthMismatch {
                what: "sound speed columns",
                expected: columns.ranges.len(),
                actual: columns.speeds.len(),
            });
        }
        for column in &columns.speeds {
            if column.len() != points.len() {
                return Err(ConfigError::LengthMismatch {
                    what: "sound speed column depths",
                    expected: points.len(),
                    actual: column.len(),
                });
            }
            for speed in column {
                ConfigError::check_positive("sound speed", *speed)?;
            }
        }
        Self::build(SspInterpolation::Quadrilateral, points, Some(columns))
    }

    /// Constant-speed profile spanning `top..bottom`.
    ///
    /// # Errors
    ///
    /// Returns an error if `top >= bottom` or `speed` is not positive.
    pub fn isovelocity(speed: f64, top: f64, bottom: f64) -> Result<Self, ConfigError> {
        Self::new(
            SspInterpolation::CLinear,
            vec![SspPoint::new(top, speed), SspPoint::new(bottom, speed)],
        )
    }

    fn build(
        interpolation: SspInterpolation,
        points: Vec<SspPoint>,
        columns: Option<SspColumns>,
    ) -> Result<Self, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::TooFewSamples {
                count: points.len(),
            });
        }
        let depths: Vec<f64> = points.iter().map(|p| p.depth).collect();
        ConfigError::check_increasing("sound speed depths", &depths)?;
        for point in &points {
            ConfigError::check_positive("sound speed", point.speed)?;
            ConfigError::check_positive("density", point.density)?;
            ConfigError::check_finite("attenuation", point.attenuation)?;
            if point.attenuation < 0.0 {
                return Err(ConfigError::invalid(
                    "attenuation",
                    format!("negative value {} at {} m", point.attenuation, point.depth),
                ));
            }
        }
        let speeds: Vec<f64> = points.iter().map(|p| p.speed).collect();
        let aux = match interpolation {
            SspInterpolation::Pchip => pchip_slopes(&depths, &speeds),
            SspInterpolation::N2Linear => speeds.iter().map(|c| 1.0 / (c * c)).collect(),
            SspInterpolation::CLinear | SspInterpolation::Quadrilateral => Vec::new(),
        };
        Ok(Self {
            interpolation,
            points,
            depths,
            aux,
            columns,
        })
    }

    /// Interpolation rule.
    pub fn interpolation(&self) -> SspInterpolation {
        self.interpolation
    }

    /// Tabulated samples.
    pub fn points(&self) -> &[SspPoint] {
        &self.points
    }

    /// Range columns of a quadrilateral profile.
    pub fn columns(&self) -> Option<&SspColumns> {
        self.columns.as_ref()
    }

    /// Shallowest and deepest tabulated depth.
    pub fn depth_span(&self) -> (f64, f64) {
        (self.depths[0], self.depths[self.depths.len() - 1])
    }

    /// Whether the speed varies with range.
    pub fn is_range_dependent(&self) -> bool {
        self.columns.is_some()
    }

    /// Evaluate at `(range, depth)`; on a knot the layer starting there wins.
    pub fn evaluate(&self, range: f64, depth: f64) -> SspSample {
        self.evaluate_directed(range, depth, 0.0, 0.0)
    }

    /// Evaluate at `(range, depth)`, resolving interface ties toward the
    /// segment the heading `(heading_r, heading_z)` moves into.
    pub fn evaluate_directed(&self, range: f64, depth: f64, heading_r: f64, heading_z: f64) -> SspSample {
        let layer = locate_segment(&self.depths, depth, heading_z);
        let mut sample = match &self.columns {
            Some(columns) => self.quadrilateral(columns, layer, range, depth, heading_r),
            None => self.depth_only(layer, depth),
        };
        let (density, attenuation) = self.lerp_properties(layer, depth);
        sample.density = density;
        sample.attenuation = attenuation;
        sample.layer = layer;
        sample
    }

    /// Depth interfaces bounding the layer the ray occupies or is entering.
    /// Outside the table the open side extends to infinity.
    pub fn layer_bounds(&self, depth: f64, heading_z: f64) -> (f64, f64) {
        let (top, bottom) = self.depth_span();
        if depth < top || (depth == top && heading_z < 0.0) {
            return (f64::NEG_INFINITY, top);
        }
        if depth > bottom || (depth == bottom && heading_z > 0.0) {
            return (bottom, f64::INFINITY);
        }
        let i = locate_segment(&self.depths, depth, heading_z);
        (self.depths[i], self.depths[i + 1])
    }

    /// Range interval of the current column pair, if range dependent.
    pub fn range_bounds(&self, range: f64, heading_r: f64) -> Option<(f64, f64)> {
        let columns = self.columns.as_ref()?;
        let ranges = &columns.ranges;
        if ranges.len() < 2 {
            return None;
        }
        let last = ranges.len() - 1;
        if range < ranges[0] || (range == ranges[0] && heading_r < 0.0) {
            return Some((f64::NEG_INFINITY, ranges[0]));
        }
        if range > ranges[last] || (range == ranges[last] && heading_r > 0.0) {
            return Some((ranges[last], f64::INFINITY));
        }
        let j = locate_segment(ranges, range, heading_r);
        Some((ranges[j], ranges[j + 1]))
    }

    fn depth_only(&self, layer: usize, depth: f64) -> SspSample {
        let z0 = self.depths[layer];
        let z1 = self.depths[layer + 1];
        let c0 = self.points[layer].speed;
        let c1 = self.points[layer + 1].speed;

        // Flat extension outside the table
        if depth < z0 {
            return constant_sample(c0);
        }
        if depth > z1 {
            return constant_sample(c1);
        }

        let h = z1 - z0;
        match self.interpolation {
            SspInterpolation::CLinear | SspInterpolation::Quadrilateral => {
                let gradient = (c1 - c0) / h;
                SspSample {
                    c: c0 + (depth - z0) * gradient,
                    dc_dz: gradient,
                    ..SspSample::default()
                }
            }
            SspInterpolation::N2Linear => {
                let n0 = self.aux[layer];
                let slope = (self.aux[layer + 1] - n0) / h;
                let n2 = n0 + (depth - z0) * slope;
                let c = 1.0 / n2.sqrt();
                let dc_dz = -0.5 * slope * c * c * c;
                SspSample {
                    c,
                    dc_dz,
                    d2c_dz2: 3.0 * dc_dz * dc_dz / c,
                    ..SspSample::default()
                }
            }
            SspInterpolation::Pchip => {
                let (c, dc_dz, d2c_dz2) =
                    hermite(depth, z0, z1, c0, c1, self.aux[layer], self.aux[layer + 1]);
                SspSample {
                    c,
                    dc_dz,
                    d2c_dz2,
                    ..SspSample::default()
                }
            }
        }
    }

    fn quadrilateral(
        &self,
        columns: &SspColumns,
        layer: usize,
        range: f64,
        depth: f64,
        heading_r: f64,
    ) -> SspSample {
        let column_sample = |j: usize| -> (f64, f64) {
            let speeds = &columns.speeds[j];
            let z0 = self.depths[layer];
            let z1 = self.depths[layer + 1];
            if depth < z0 && layer == 0 {
                return (speeds[0], 0.0);
            }
            if depth > z1 && layer + 2 == self.depths.len() {
                return (speeds[layer + 1], 0.0);
            }
            let gradient = (speeds[layer + 1] - speeds[layer]) / (z1 - z0);
            (speeds[layer] + (depth - z0) * gradient, gradient)
        };

        let ranges = &columns.ranges;
        if ranges.len() == 1 {
            let (c, dc_dz) = column_sample(0);
            return SspSample {
                c,
                dc_dz,
                ..SspSample::default()
            };
        }
        let last = ranges.len() - 1;
        let before = range < ranges[0] || (range == ranges[0] && heading_r < 0.0);
        let after = range > ranges[last] || (range == ranges[last] && heading_r > 0.0);
        if before || after {
            let (c, dc_dz) = column_sample(if before { 0 } else { last });
            return SspSample {
                c,
                dc_dz,
                ..SspSample::default()
            };
        }
        let j = locate_segment(ranges, range, heading_r);
        let width = ranges[j + 1] - ranges[j];
        let s = (range - ranges[j]) / width;
        let (c1, cz1) = column_sample(j);
        let (c2, cz2) = column_sample(j + 1);
        SspSample {
            c: (1.0 - s) * c1 + s * c2,
            dc_dz: (1.0 - s) * cz1 + s * cz2,
            dc_dr: (c2 - c1) / width,
            d2c_drdz: (cz2 - cz1) / width,
            ..SspSample::default()
        }
    }

    fn lerp_properties(&self, layer: usize, depth: f64) -> (f64, f64) {
        let a = &self.points[layer];
        let b = &self.points[layer + 1];
        let s = ((depth - a.depth) / (b.depth - a.depth)).clamp(0.0, 1.0);
        (
            a.density + s * (b.density - a.density),
            a.attenuation + s * (b.attenuation - a.attenuation),
        )
    }
}

fn constant_sample(c: f64) -> SspSample {
    SspSample {
        c,
        ..SspSample::default()
    }
}

/// Fritsch–Carlson shape-preserving knot derivatives.
fn pchip_slopes(z: &[f64], c: &[f64]) -> Vec<f64> {
    let n = z.len();
    let h: Vec<f64> = z.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = (0..n - 1).map(|i| (c[i + 1] - c[i]) / h[i]).collect();
    if n == 2 {
        return vec![delta[0]; 2];
    }

    let mut d = vec![0.0; n];
    for i in 1..n - 1 {
        if delta[i - 1] * delta[i] > 0.0 {
            let w1 = 2.0 * h[i] + h[i - 1];
            let w2 = h[i] + 2.0 * h[i - 1];
            d[i] = (w1 + w2) / (w1 / delta[i - 1] + w2 / delta[i]);
        }
    }
    d[0] = pchip_end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = pchip_end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

fn pchip_end_slope(h0: f64, h1: f64, delta0: f64, delta1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * delta0 - h0 * delta1) / (h0 + h1);
    if d.signum() != delta0.signum() || delta0 == 0.0 {
        0.0
    } else if delta0.signum() != delta1.signum() && d.abs() > 3.0 * delta0.abs() {
        3.0 * delta0
    } else {
        d
    }
}

/// Cubic Hermite value, first and second derivative on `[z0, z1]`.
fn hermite(z: f64, z0: f64, z1: f64, c0: f64, c1: f64, d0: f64, d1: f64) -> (f64, f64, f64) {
    let h = z1 - z0;
    let t = (z - z0) / h;
    let t2 = t * t;
    let t3 = t2 * t;

    let value = (2.0 * t3 - 3.0 * t2 + 1.0) * c0
        + (t3 - 2.0 * t2 + t) * h * d0
        + (-2.0 * t3 + 3.0 * t2) * c1
        + (t3 - t2) * h * d1;
    let first = ((6.0 * t2 - 6.0 * t) * c0
        + (3.0 * t2 - 4.0 * t + 1.0) * h * d0
        + (-6.0 * t2 + 6.0 * t) * c1
        + (3.0 * t2 - 2.0 * t) * h * d1)
        / h;
    let second = ((12.0 * t - 6.0) * c0
        + (6.0 * t - 4.0) * h * d0
        + (-12.0 * t + 6.0) * c1
        + (6.0 * t - 2.0) * h * d1)
        / (h * h);
    (value, first, second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn munk_like() -> Vec<SspPoint> {
        vec![
            SspPoint::new(0.0, 1548.52),
            SspPoint::new(200.0, 1530.29),
            SspPoint::new(250.0, 1526.69),
            SspPoint::new(400.0, 1517.78),
            SspPoint::new(600.0, 1509.49),
            SspPoint::new(800.0, 1504.30),
            SspPoint::new(1000.0, 1501.38),
            SspPoint::new(1200.0, 1500.14),
            SspPoint::new(1400.0, 1500.12),
            SspPoint::new(1600.0, 1501.02),
            SspPoint::new(2000.0, 1503.09),
        ]
    }

    #[test]
    fn test_clinear_interpolates_and_reports_gradient() {
        let ssp = SoundSpeedProfile::new(
            SspInterpolation::CLinear,
            vec![SspPoint::new(0.0, 1500.0), SspPoint::new(100.0, 1520.0)],
        )
        .unwrap();
        let s = ssp.evaluate(0.0, 25.0);
        assert_relative_eq!(s.c, 1505.0);
        assert_relative_eq!(s.dc_dz, 0.2);
        assert_eq!(s.d2c_dz2, 0.0);
    }

    #[test]
    fn test_flat_extension_outside_table() {
        let ssp = SoundSpeedProfile::new(
            SspInterpolation::CLinear,
            vec![SspPoint::new(10.0, 1500.0), SspPoint::new(100.0, 1520.0)],
        )
        .unwrap();
        let above = ssp.evaluate(0.0, 0.0);
        assert_eq!(above.c, 1500.0);
        assert_eq!(above.dc_dz, 0.0);
        let below = ssp.evaluate(0.0, 500.0);
        assert_eq!(below.c, 1520.0);
        assert_eq!(below.dc_dz, 0.0);
    }

    #[test]
    fn test_interface_tie_break_and_directed_lookup() {
        let ssp = SoundSpeedProfile::new(
            SspInterpolation::CLinear,
            vec![
                SspPoint::new(0.0, 1500.0),
                SspPoint::new(50.0, 1510.0),
                SspPoint::new(100.0, 1490.0),
            ],
        )
        .unwrap();
        // Exactly on the interface: the segment starting there wins
        let plain = ssp.evaluate(0.0, 50.0);
        assert_eq!(plain.layer, 1);
        assert_relative_eq!(plain.dc_dz, -0.4);
        // A ray moving up sees the layer above
        let upward = ssp.evaluate_directed(0.0, 50.0, 1.0, -1.0);
        assert_eq!(upward.layer, 0);
        assert_relative_eq!(upward.dc_dz, 0.2);
        assert_relative_eq!(upward.c, plain.c);
        // The last knot resolves to the last segment
        assert_eq!(ssp.evaluate(0.0, 100.0).layer, 1);
    }

    #[test]
    fn test_n2_linear_matches_endpoints() {
        let ssp = SoundSpeedProfile::new(
            SspInterpolation::N2Linear,
            vec![SspPoint::new(0.0, 1500.0), SspPoint::new(100.0, 1600.0)],
        )
        .unwrap();
        assert_relative_eq!(ssp.evaluate(0.0, 0.0).c, 1500.0, max_relative = 1e-12);
        assert_relative_eq!(ssp.evaluate(0.0, 100.0).c, 1600.0, max_relative = 1e-12);
        let mid = ssp.evaluate(0.0, 50.0);
        let expected = 1.0 / (0.5_f64 / (1500.0 * 1500.0) + 0.5 / (1600.0 * 1600.0)).sqrt();
        assert_relative_eq!(mid.c, expected, max_relative = 1e-12);
        assert!(mid.dc_dz > 0.0);
        assert!(mid.d2c_dz2 > 0.0);
    }

    #[test]
    fn test_pchip_is_monotone_between_knots() {
        let ssp = SoundSpeedProfile::new(SspInterpolation::Pchip, munk_like()).unwrap();
        for p in munk_like() {
            assert_relative_eq!(ssp.evaluate(0.0, p.depth).c, p.speed, epsilon = 1e-9);
        }
        // Strictly decreasing data between 0 and 1200 m stays decreasing
        let mut previous = f64::INFINITY;
        for i in 0..=120 {
            let c = ssp.evaluate(0.0, f64::from(i) * 10.0).c;
            assert!(c <= previous + 1e-9, "not monotone at {} m", i * 10);
            previous = c;
        }
    }

    #[test]
    fn test_pchip_gradient_matches_finite_difference() {
        let ssp = SoundSpeedProfile::new(SspInterpolation::Pchip, munk_like()).unwrap();
        let z = 700.0;
        let dz = 1e-3;
        let fd = (ssp.evaluate(0.0, z + dz).c - ssp.evaluate(0.0, z - dz).c) / (2.0 * dz);
        assert_relative_eq!(ssp.evaluate(0.0, z).dc_dz, fd, epsilon = 1e-6);
    }

    #[test]
    fn test_knot_resolves_to_layer_starting_there() {
        let ssp = SoundSpeedProfile::new(SspInterpolation::CLinear, munk_like()).unwrap();
        assert_eq!(ssp.evaluate(0.0, 200.0).layer, 1);
        assert_eq!(ssp.evaluate_directed(0.0, 200.0, 0.0, -1.0).layer, 0);
    }

    #[test]
    fn test_quadrilateral_linear_in_range() {
        let points = vec![SspPoint::new(0.0, 1500.0), SspPoint::new(100.0, 1500.0)];
        let columns = SspColumns {
            ranges: vec![0.0, 1000.0],
            speeds: vec![vec![1500.0, 1500.0], vec![1520.0, 1540.0]],
        };
        let ssp = SoundSpeedProfile::range_dependent(points, columns).unwrap();
        let s = ssp.evaluate(500.0, 100.0);
        assert_relative_eq!(s.c, 1520.0);
        assert_relative_eq!(s.dc_dr, 0.04);
        // Depth gradient is 0 in the first column and 0.2 in the second
        assert_relative_eq!(s.dc_dz, 0.1, epsilon = 1e-12);
        assert_relative_eq!(s.d2c_drdz, 0.2 / 1000.0, epsilon = 1e-15);
        // Beyond the last column the speed is flat in range
        let far = ssp.evaluate(5000.0, 0.0);
        assert_relative_eq!(far.c, 1520.0);
        assert_eq!(far.dc_dr, 0.0);
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert!(matches!(
            SoundSpeedProfile::new(SspInterpolation::CLinear, vec![SspPoint::new(0.0, 1500.0)]),
            Err(ConfigError::TooFewSamples { count: 1 })
        ));
        assert!(SoundSpeedProfile::new(
            SspInterpolation::CLinear,
            vec![SspPoint::new(10.0, 1500.0), SspPoint::new(5.0, 1500.0)]
        )
        .is_err());
        assert!(SoundSpeedProfile::new(
            SspInterpolation::CLinear,
            vec![SspPoint::new(0.0, 1500.0), SspPoint::new(5.0, -1.0)]
        )
        .is_err());
        assert!(SoundSpeedProfile::range_dependent(
            vec![SspPoint::new(0.0, 1500.0), SspPoint::new(5.0, 1500.0)],
            SspColumns {
                ranges: vec![0.0, 10.0],
                speeds: vec![vec![1500.0, 1500.0]],
            }
        )
        .is_err());
    }

    #[test]
    fn test_layer_bounds_follow_heading() {
        let ssp = SoundSpeedProfile::new(
            SspInterpolation::CLinear,
            vec![
                SspPoint::new(0.0, 1500.0),
                SspPoint::new(50.0, 1510.0),
                SspPoint::new(100.0, 1490.0),
            ],
        )
        .unwrap();
        assert_eq!(ssp.layer_bounds(50.0, 1.0), (50.0, 100.0));
        assert_eq!(ssp.layer_bounds(50.0, -1.0), (0.0, 50.0));
        assert_eq!(ssp.layer_bounds(100.0, 1.0), (100.0, f64::INFINITY));
        assert_eq!(ssp.layer_bounds(-5.0, 1.0), (f64::NEG_INFINITY, 0.0));
    }
}
