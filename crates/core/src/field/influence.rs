//! Geometric beam influence in Cartesian form.
//!
//! A beam contributes to a receiver wherever one of its step segments
//! straddles the receiver's range. State is interpolated linearly along the
//! segment, the receiver's normal distance from the ray sets the weight, and
//! the paraxial `q` sets both the beam radius and the spreading amplitude.
//! Every sign change of `q` (a caustic) advances the phase by π/2.

use super::{BeamType, Field};
use crate::core_types::{RayVector, Vec2, Vec3};
use crate::dimension::{transverse_frame, Planar, RaySpace, Spatial};
use crate::ray::{RayPoint, RayResult};
use num_complex::Complex64;
use std::f64::consts::{FRAC_PI_2, PI};

/// Gaussian beams are evaluated out to this many standard deviations.
const BEAM_WINDOW: f64 = 4.0;

/// Run constants shared by every beam from one source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamSettings {
    /// Beam shape.
    pub beam_type: BeamType,
    /// Frequency in Hz.
    pub frequency: f64,
    /// Declination spacing in radians.
    pub declination_step: f64,
    /// Bearing spacing in radians.
    pub bearing_step: f64,
    /// Sound speed at the source.
    pub source_speed: f64,
}

impl BeamSettings {
    /// Angular frequency.
    #[inline]
    pub fn omega(&self) -> f64 {
        2.0 * PI * self.frequency
    }

    /// Weight of a receiver `n` meters off the ray for a beam of half-width
    /// `radius`, or `None` outside the beam.
    pub fn weight(&self, n: f64, radius: f64, delay: f64) -> Option<f64> {
        match self.beam_type {
            BeamType::GeometricHat => (radius > 0.0 && n < radius).then(|| (radius - n) / radius),
            BeamType::GeometricGaussian => {
                let lambda = self.source_speed / self.frequency;
                let sigma = radius.max((0.2 * self.frequency * delay).min(PI * lambda));
                (sigma > 0.0 && n < BEAM_WINDOW * sigma).then(|| {
                    (-0.5 * (n / sigma).powi(2)).exp() * radius / (sigma * (2.0 * PI).sqrt())
                })
            }
        }
    }
}

/// How beams of one ray space deposit into a field.
pub trait BeamInfluence: RaySpace {
    /// Spreading scale applied at finalize for a receiver at `range`.
    fn range_scale(range: f64) -> f64;

    /// Deposit every arrival of `ray` into `field`.
    fn accumulate(field: &mut Field, ray: &RayResult<Self>, beam: &BeamSettings);
}

/// Whether `q` changed sign going from `before` to `after`.
#[inline]
fn crosses_caustic(before: f64, after: f64) -> bool {
    (after <= 0.0 && before > 0.0) || (after >= 0.0 && before < 0.0)
}

/// Whether `range` lies in the half-open span from `r0` toward `r1`.
#[inline]
fn straddles(r0: f64, r1: f64, range: f64) -> bool {
    (r0 <= range && range < r1) || (r1 < range && range <= r0)
}

/// Linearly interpolated state at fraction `s` of a segment.
struct Crossing<S: RaySpace> {
    x: S::Vector,
    q: Vec2,
    c: f64,
    tau: Complex64,
}

fn interpolate<S: RaySpace>(a: &RayPoint<S>, b: &RayPoint<S>, s: f64) -> Crossing<S> {
    Crossing {
        x: a.x + (b.x - a.x) * s,
        q: a.q + (b.q - a.q) * s,
        c: a.c + (b.c - a.c) * s,
        tau: a.tau + (b.tau - a.tau) * s,
    }
}

impl BeamInfluence for Planar {
    fn range_scale(range: f64) -> f64 {
        if range == 0.0 {
            0.0
        } else {
            -1.0 / range.abs().sqrt()
        }
    }

    fn accumulate(field: &mut Field, ray: &RayResult<Planar>, beam: &BeamSettings) {
        let Some(bearing) = field.bearing_slot(ray.launch.bearing) else {
            return;
        };
        let omega = beam.omega();
        let launch_ratio = ray.launch.declination.to_radians().cos().abs().sqrt();
        let (_, nd, nr) = field.dims();
        let mut caustics = 0.0;

        for pair in ray.points.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let next_caustics = if crosses_caustic(a.q.x, b.q.x) {
                caustics + FRAC_PI_2
            } else {
                caustics
            };
            let delta = b.x - a.x;
            if delta.x != 0.0 {
                let along = (delta.x / delta.norm()).abs();
                for ir in 0..nr {
                    let range = field.grid().ranges[ir];
                    if !straddles(a.x.x, b.x.x, range) {
                        continue;
                    }
                    let at = interpolate(a, b, (range - a.x.x) / delta.x);
                    let q = at.q.x;
                    if q == 0.0 {
                        continue;
                    }
                    let phase = b.phase
                        + if crosses_caustic(a.q.x, q) {
                            caustics + FRAC_PI_2
                        } else {
                            caustics
                        };
                    let radius = q.abs() * beam.declination_step / beam.source_speed;
                    let amplitude = b.amp * launch_ratio * (at.c / q.abs()).sqrt();

                    for id in 0..nd {
                        let n = (field.grid().depths[id] - at.x.y).abs() * along;
                        if let Some(w) = beam.weight(n, radius, at.tau.re) {
                            field.deposit((bearing, id, ir), amplitude * w, at.tau, phase, omega);
                        }
                    }
                }
            }
            caustics = next_caustics;
        }
    }
}

impl BeamInfluence for Spatial {
    fn range_scale(_range: f64) -> f64 {
        -1.0
    }

    fn accumulate(field: &mut Field, ray: &RayResult<Spatial>, beam: &BeamSettings) {
        let omega = beam.omega();
        let source = ray.origin.source;
        let launch_cos = ray.launch.declination.to_radians().cos().abs();
        let (nb, nd, nr) = field.dims();
        let mut caustics = 0.0;

        for pair in ray.points.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let qa = a.q.x * a.q.y;
            let next_caustics = if crosses_caustic(qa, b.q.x * b.q.y) {
                caustics + FRAC_PI_2
            } else {
                caustics
            };
            let ra = Spatial::horizontal_range(&a.x, &ray.origin);
            let rb = Spatial::horizontal_range(&b.x, &ray.origin);
            let delta = b.x - a.x;
            let length = delta.length();
            if ra != rb && length > 0.0 {
                let (e1, e2) = transverse_frame(&(delta / length));
                for ir in 0..nr {
                    let range = field.grid().ranges[ir];
                    if !straddles(ra, rb, range) {
                        continue;
                    }
                    let at = interpolate(a, b, (range - ra) / (rb - ra));
                    let qq = at.q.x * at.q.y;
                    if qq == 0.0 {
                        continue;
                    }
                    let phase = b.phase
                        + if crosses_caustic(qa, qq) {
                            caustics + FRAC_PI_2
                        } else {
                            caustics
                        };
                    let radius1 = at.q.x.abs() * beam.declination_step / beam.source_speed;
                    let radius2 = at.q.y.abs() * beam.bearing_step * launch_cos / beam.source_speed;
                    let amplitude = b.amp * at.c / qq.abs().sqrt();

                    for ib in 0..nb {
                        let bearing = field.grid().bearings[ib].to_radians();
                        let rx = source.x + range * bearing.cos();
                        let ry = source.y + range * bearing.sin();
                        for id in 0..nd {
                            let offset = Vec3::new(rx, ry, field.grid().depths[id]) - at.x;
                            let w1 = beam.weight(offset.dot(&e1).abs(), radius1, at.tau.re);
                            let w2 = beam.weight(offset.dot(&e2).abs(), radius2, at.tau.re);
                            if let (Some(w1), Some(w2)) = (w1, w2) {
                                field.deposit((ib, id, ir), amplitude * w1 * w2, at.tau, phase, omega);
                            }
                        }
                    }
                }
            }
            caustics = next_caustics;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Point3;
    use crate::dimension::medium::flat_environment;
    use crate::dimension::{PlanarMedium, RayOrigin};
    use crate::environment::{AttenuationModel, AttenuationUnits, BoundaryProfile};
    use crate::field::{FieldMode, ReceiverGrid};
    use crate::ray::{trace, Launch, TraceParams, DEFAULT_AMPLITUDE_FLOOR};
    use approx::assert_relative_eq;

    fn beam(beam_type: BeamType) -> BeamSettings {
        BeamSettings {
            beam_type,
            frequency: 100.0,
            declination_step: 1f64.to_radians(),
            bearing_step: 0.0,
            source_speed: 1500.0,
        }
    }

    fn horizontal_ray() -> RayResult<Planar> {
        let env = flat_environment(BoundaryProfile::flat(0.0), BoundaryProfile::flat(200.0), 1500.0, 200.0);
        let medium = PlanarMedium::new(
            &env,
            AttenuationModel {
                frequency: 100.0,
                units: AttenuationUnits::DecibelsPerWavelength,
                thorp: false,
            },
        );
        let params = TraceParams {
            step: 20.0,
            max_steps: 10_000,
            max_range: 1000.0,
            max_depth: 1.0e4,
            amplitude_floor: DEFAULT_AMPLITUDE_FLOOR,
        };
        let origin = RayOrigin::new(Point3::new(0.0, 0.0, 100.0), 0.0);
        trace(&medium, &origin, Launch::new(0.0, 0.0), 0, &params)
    }

    #[test]
    fn test_hat_weight() {
        let b = beam(BeamType::GeometricHat);
        assert_eq!(b.weight(0.0, 2.0, 0.1), Some(1.0));
        assert_eq!(b.weight(1.0, 2.0, 0.1), Some(0.5));
        assert_eq!(b.weight(2.0, 2.0, 0.1), None);
        assert_eq!(b.weight(0.0, 0.0, 0.1), None);
    }

    #[test]
    fn test_gaussian_weight_has_minimum_width() {
        let b = beam(BeamType::GeometricGaussian);
        // Tiny radius: the width floor keeps the beam alive off-axis
        let w = b.weight(5.0, 0.01, 1.0).unwrap();
        assert!(w > 0.0);
        let lambda = 15.0;
        let sigma = (0.2 * 100.0 * 1.0f64).min(PI * lambda);
        assert_eq!(b.weight(BEAM_WINDOW * sigma + 1.0, 0.01, 1.0), None);
    }

    #[test]
    fn test_caustic_detection() {
        assert!(crosses_caustic(1.0, -1.0));
        assert!(crosses_caustic(1.0, 0.0));
        assert!(crosses_caustic(-1.0, 0.0));
        assert!(!crosses_caustic(0.0, 1.0));
        assert!(!crosses_caustic(2.0, 1.0));
    }

    #[test]
    fn test_straddles_is_half_open() {
        assert!(straddles(0.0, 10.0, 0.0));
        assert!(!straddles(0.0, 10.0, 10.0));
        assert!(straddles(10.0, 0.0, 10.0));
        assert!(!straddles(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_horizontal_beam_deposits_on_axis() {
        let ray = horizontal_ray();
        let grid = ReceiverGrid {
            ranges: vec![500.0],
            depths: vec![100.0, 150.0],
            bearings: vec![0.0],
        };
        let mut field = Field::new(0, grid, FieldMode::Coherent);
        let b = beam(BeamType::GeometricHat);
        Planar::accumulate(&mut field, &ray, &b);

        // On axis: weight 1, amplitude sqrt(c / q) with q = c * r
        let p = field.pressure(0, 0, 0).unwrap();
        assert_relative_eq!(p.norm(), (1.0 / 500.0f64).sqrt(), max_relative = 1e-9);
        let delay = 500.0 / 1500.0;
        let expected_phase = -(b.omega() * delay);
        assert_relative_eq!(
            (p / p.norm()).re,
            expected_phase.cos(),
            epsilon = 1e-6
        );
        // 50 m off a beam of radius 500 * 1500 * (pi/180) / 1500 ~ 8.7 m
        assert_eq!(field.pressure(0, 1, 0), Some(Complex64::new(0.0, 0.0)));
    }

    #[test]
    fn test_ray_on_other_bearing_is_ignored() {
        let mut ray = horizontal_ray();
        ray.launch.bearing = 45.0;
        let mut field = Field::new(0, ReceiverGrid::default(), FieldMode::Coherent);
        Planar::accumulate(&mut field, &ray, &beam(BeamType::GeometricHat));
        assert!(field.values().iter().all(|v| v.norm() == 0.0));
    }

    #[test]
    fn test_accumulating_twice_after_reset_is_identical() {
        let ray = horizontal_ray();
        let grid = ReceiverGrid {
            ranges: vec![100.0, 250.0, 700.0],
            depths: vec![95.0, 100.0, 104.0],
            bearings: vec![0.0],
        };
        let b = beam(BeamType::GeometricGaussian);
        let mut field = Field::new(0, grid, FieldMode::Coherent);
        Planar::accumulate(&mut field, &ray, &b);
        let first = field.clone();
        field.reset();
        Planar::accumulate(&mut field, &ray, &b);
        assert_eq!(field, first);
        assert!(first.values().iter().any(|v| v.norm() > 0.0));
    }

    #[test]
    fn test_planar_range_scale() {
        assert_eq!(Planar::range_scale(0.0), 0.0);
        assert_relative_eq!(Planar::range_scale(100.0), -0.1);
        assert_eq!(Spatial::range_scale(100.0), -1.0);
    }
}
