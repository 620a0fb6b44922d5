//! Ray and paraxial integration.
//!
//! Each step is a two-stage Runge-Kutta update of position, slowness, the
//! paraxial pair `(p, q)` and complex travel time. Step length is cut so a
//! step never straddles a sound-speed layer, a range column, a boundary
//! segment or the edge of the beam box; a step that still ends past a
//! boundary is re-integrated to land on it, and the ray reflects there.

use super::reflect::reflect;
use super::state::{Launch, RayPoint, Termination};
use crate::core_types::RayVector;
use crate::dimension::{Medium, RayOrigin, RaySpace, SoundSpeed};
use crate::environment::BoundarySide;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Smallest step as a fraction of the nominal step.
const MIN_STEP_FRACTION: f64 = 1.0e-4;

/// Relative slack when deciding that a ray has reached the box range.
const BOX_TOLERANCE: f64 = 1.0e-9;

/// Relative slack when deciding that a step ended on a boundary.
const LANDING_TOLERANCE: f64 = 1.0e-12;

/// Default amplitude below which a ray is dropped.
pub const DEFAULT_AMPLITUDE_FLOOR: f64 = 0.005;

/// Per-ray integration limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraceParams {
    /// Nominal step length in meters.
    pub step: f64,
    /// Most points a ray may store, reflections included.
    pub max_steps: usize,
    /// Horizontal range at which rays stop.
    pub max_range: f64,
    /// Depth magnitude at which rays stop.
    pub max_depth: f64,
    /// Amplitude below which a ray stops.
    pub amplitude_floor: f64,
}

impl TraceParams {
    fn min_step(&self) -> f64 {
        self.step * MIN_STEP_FRACTION
    }

    fn reached_range(&self, range: f64) -> bool {
        range >= self.max_range - BOX_TOLERANCE * self.max_range.max(1.0)
    }
}

/// Which boundary a step hit first, given each side's crossing fraction.
///
/// The earlier crossing wins. An exact tie goes to the surface so a ray
/// grazing a corner reflects once, deterministically.
pub fn first_crossing(top: Option<f64>, bottom: Option<f64>) -> Option<BoundarySide> {
    match (top, bottom) {
        (Some(t), Some(b)) if b < t => Some(BoundarySide::Bottom),
        (Some(_), _) => Some(BoundarySide::Top),
        (None, Some(_)) => Some(BoundarySide::Bottom),
        (None, None) => None,
    }
}

/// Initial ray state for a launch from `origin`.
pub fn launch_point<S: RaySpace, M: Medium<S>>(medium: &M, origin: &RayOrigin, launch: &Launch) -> RayPoint<S> {
    let x = S::launch_position(origin);
    let u = S::launch_direction(launch.declination.to_radians(), launch.bearing.to_radians());
    let c = medium.sound_speed(&x, &u).c;
    let (p, q) = S::initial_paraxial();
    RayPoint {
        x,
        t: u * (1.0 / c),
        p,
        q,
        c,
        tau: Complex64::new(0.0, 0.0),
        amp: 1.0,
        phase: 0.0,
        top_bounces: 0,
        bottom_bounces: 0,
    }
}

/// Trace one ray into `history`, replacing its contents.
///
/// Returns why the ray stopped. `history` never holds more than
/// `params.max_steps` points; reaching that bound reports
/// [`Termination::StepBudget`].
pub fn trace_into<S: RaySpace, M: Medium<S>>(
    medium: &M,
    origin: &RayOrigin,
    launch: &Launch,
    params: &TraceParams,
    history: &mut Vec<RayPoint<S>>,
) -> Termination {
    history.clear();
    if params.max_steps == 0 {
        return Termination::StepBudget;
    }
    let mut ray = launch_point(medium, origin, launch);
    history.push(ray);

    loop {
        if history.len() >= params.max_steps {
            return Termination::StepBudget;
        }
        let (next, crossing) = step(medium, &ray, params, origin);
        ray = next;
        history.push(ray);

        if let Some(side) = crossing {
            if history.len() >= params.max_steps {
                return Termination::StepBudget;
            }
            ray = reflect(medium, &ray, side);
            history.push(ray);
            if ray.amp < params.amplitude_floor {
                return Termination::AmplitudeExhausted;
            }
        }

        if params.reached_range(S::horizontal_range(&ray.x, origin)) {
            return Termination::RangeLimit;
        }
        if ray.x.depth().abs() >= params.max_depth {
            return Termination::DepthLimit;
        }
    }
}

/// One full step from `ray0`, reporting the boundary it ended on, if any.
fn step<S: RaySpace, M: Medium<S>>(
    medium: &M,
    ray0: &RayPoint<S>,
    params: &TraceParams,
    origin: &RayOrigin,
) -> (RayPoint<S>, Option<BoundarySide>) {
    let ss0 = medium.sound_speed(&ray0.x, &ray0.t);
    let (ray, h) = advance(medium, ray0, &ss0, params.step, Some((params, origin)));

    let mut fractions = [None, None];
    for (slot, side) in fractions.iter_mut().zip(BoundarySide::BOTH) {
        let gap = medium.gap(side, &ray.x, &ray.t);
        if gap < -LANDING_TOLERANCE * ray.x.depth().abs().max(1.0) {
            continue;
        }
        let gap0 = medium.gap(side, &ray0.x, &ray0.t);
        let fraction = if gap <= 0.0 {
            1.0
        } else if gap0 < 0.0 {
            (-gap0 / (gap - gap0)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        *slot = Some(fraction);
    }

    let Some(side) = first_crossing(fractions[0], fractions[1]) else {
        return (ray, None);
    };
    let fraction = match side {
        BoundarySide::Top => fractions[0],
        BoundarySide::Bottom => fractions[1],
    }
    .unwrap_or(1.0);

    let mut landed = if fraction < 1.0 {
        advance(medium, ray0, &ss0, (h * fraction).max(params.min_step()), None).0
    } else {
        ray
    };
    let depth = medium.boundary_depth(side, &landed.x, &landed.t);
    landed.x = landed.x.with_depth(depth);

    let outward = medium.boundary(side, &landed.x, &landed.t).normal.inner(&landed.t) > 0.0;
    (landed, outward.then_some(side))
}

/// Two-stage update over at most `h`; returns the new state and the step used.
///
/// With `limits`, the step is shortened before each stage so it stops at the
/// next interface, boundary or box edge.
fn advance<S: RaySpace, M: Medium<S>>(
    medium: &M,
    ray0: &RayPoint<S>,
    ss0: &SoundSpeed<S>,
    h: f64,
    limits: Option<(&TraceParams, &RayOrigin)>,
) -> (RayPoint<S>, f64) {
    let c0 = ss0.c;
    let csq0 = c0 * c0;
    let k0 = S::transverse_curvature(&ss0.hessian, &ray0.t, c0);
    let u0 = ray0.t * c0;

    let mut h = h;
    if let Some((params, origin)) = limits {
        h = reduce_step(medium, &ray0.x, &u0, h, params, origin);
    }
    let half = 0.5 * h;

    // Half step
    let x1 = ray0.x + u0 * half;
    let t1 = ray0.t - ss0.gradient * (half / csq0);
    let p1 = ray0.p - k0.component_mul(&ray0.q) * half;
    let q1 = ray0.q + ray0.p * (half * c0);

    let ss1 = medium.sound_speed(&x1, &t1);
    let c1 = ss1.c;
    let csq1 = c1 * c1;
    let k1 = S::transverse_curvature(&ss1.hessian, &t1, c1);
    let u1 = t1 * c1;

    if let Some((params, origin)) = limits {
        h = reduce_step(medium, &ray0.x, &u1, h, params, origin);
    }
    let w1 = if half > 0.0 { h / (2.0 * half) } else { 0.0 };
    let w0 = 1.0 - w1;

    // Full step, blending both stages
    let x = ray0.x + (u0 * w0 + u1 * w1) * h;
    let t = ray0.t - (ss0.gradient * (w0 / csq0) + ss1.gradient * (w1 / csq1)) * h;
    let p = ray0.p - (k0.component_mul(&ray0.q) * w0 + k1.component_mul(&q1) * w1) * h;
    let q = ray0.q + (ray0.p * (w0 * c0) + p1 * (w1 * c1)) * h;
    let tau = ray0.tau + (w0 / ss0.complex + w1 / ss1.complex) * h;

    let c = medium.sound_speed(&x, &t).c;
    (
        RayPoint {
            x,
            t,
            p,
            q,
            c,
            tau,
            ..*ray0
        },
        h,
    )
}

/// Shorten `h` so a straight step from `x0` along `u` stays inside the
/// current layer and segment, stops at a boundary it would cross and lands
/// on the box edge.
fn reduce_step<S: RaySpace, M: Medium<S>>(
    medium: &M,
    x0: &S::Vector,
    u: &S::Vector,
    h: f64,
    params: &TraceParams,
    origin: &RayOrigin,
) -> f64 {
    let mut limit = h.min(medium.step_limit(x0, u));
    let trial = *x0 + *u * limit;

    for side in BoundarySide::BOTH {
        let gap0 = medium.gap(side, x0, u);
        let gap = medium.gap(side, &trial, u);
        if gap0 < 0.0 && gap > 0.0 {
            limit = limit.min(limit * -gap0 / (gap - gap0));
        }
    }

    let r0 = S::horizontal_range(x0, origin);
    let r = S::horizontal_range(&trial, origin);
    if r0 < params.max_range && r > params.max_range {
        limit = limit.min(h.min(medium.step_limit(x0, u)) * (params.max_range - r0) / (r - r0));
    }
    let z0 = x0.depth().abs();
    let z = trial.depth().abs();
    if z0 < params.max_depth && z > params.max_depth {
        limit = limit.min(h.min(medium.step_limit(x0, u)) * (params.max_depth - z0) / (z - z0));
    }

    limit.max(params.min_step())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{Point3, Vec2};
    use crate::dimension::medium::flat_environment;
    use crate::dimension::{Planar, PlanarMedium};
    use crate::environment::{
        AttenuationModel, AttenuationUnits, BoundaryCondition, BoundaryProfile, BoundaryVertex,
        Environment, SoundSpeedProfile, SspInterpolation, SspPoint,
    };
    use approx::assert_relative_eq;

    fn model() -> AttenuationModel {
        AttenuationModel {
            frequency: 50.0,
            units: AttenuationUnits::DecibelsPerWavelength,
            thorp: false,
        }
    }

    fn params(max_range: f64) -> TraceParams {
        TraceParams {
            step: 10.0,
            max_steps: 100_000,
            max_range,
            max_depth: 1.0e4,
            amplitude_floor: DEFAULT_AMPLITUDE_FLOOR,
        }
    }

    fn origin(depth: f64) -> RayOrigin {
        RayOrigin::new(Point3::new(0.0, 0.0, depth), 0.0)
    }

    fn trace(
        medium: &PlanarMedium<'_>,
        depth: f64,
        declination: f64,
        params: &TraceParams,
    ) -> (Vec<RayPoint<Planar>>, Termination) {
        let mut history = Vec::new();
        let end = trace_into(medium, &origin(depth), &Launch::new(declination, 0.0), params, &mut history);
        (history, end)
    }

    #[test]
    fn test_first_crossing() {
        assert_eq!(first_crossing(None, None), None);
        assert_eq!(first_crossing(Some(0.4), None), Some(BoundarySide::Top));
        assert_eq!(first_crossing(None, Some(0.4)), Some(BoundarySide::Bottom));
        assert_eq!(first_crossing(Some(0.4), Some(0.3)), Some(BoundarySide::Bottom));
        assert_eq!(first_crossing(Some(0.2), Some(0.3)), Some(BoundarySide::Top));
        // Simultaneous crossing resolves to the surface
        assert_eq!(first_crossing(Some(0.5), Some(0.5)), Some(BoundarySide::Top));
    }

    #[test]
    fn test_straight_ray_in_isovelocity_water() {
        let env = flat_environment(BoundaryProfile::flat(0.0), BoundaryProfile::flat(1000.0), 1500.0, 1000.0);
        let medium = PlanarMedium::new(&env, model());
        let (history, end) = trace(&medium, 500.0, 0.0, &params(1000.0));

        assert_eq!(end, Termination::RangeLimit);
        let last = history.last().unwrap();
        assert_relative_eq!(last.x.x, 1000.0, epsilon = 1e-6);
        assert_relative_eq!(last.x.y, 500.0, epsilon = 1e-9);
        assert_relative_eq!(last.tau.re, 1000.0 / 1500.0, max_relative = 1e-12);
        assert_eq!(last.tau.im, 0.0);
        // q' = c p, so in isovelocity water q grows as c times the arc length
        assert_relative_eq!(last.q.x, 1500.0 * last.x.x, max_relative = 1e-9);
        assert_eq!(last.q.y, 1.0);
    }

    #[test]
    fn test_ray_reflects_off_flat_bottom_with_equal_angles() {
        let env = flat_environment(BoundaryProfile::flat(0.0), BoundaryProfile::flat(100.0), 1500.0, 100.0);
        let medium = PlanarMedium::new(&env, model());
        let (history, _) = trace(&medium, 50.0, 30.0, &params(150.0));

        let hit = history
            .windows(2)
            .position(|w| w[1].bottom_bounces > w[0].bottom_bounces)
            .unwrap();
        let before = &history[hit];
        let after = &history[hit + 1];
        assert_eq!(before.x, after.x, "reflection keeps the position");
        assert_relative_eq!(before.x.y, 100.0, epsilon = 1e-9);
        assert_relative_eq!(before.x.x, 50.0 / 30f64.to_radians().tan(), max_relative = 1e-9);
        assert_relative_eq!(after.t.y, -before.t.y, max_relative = 1e-12);
        assert_relative_eq!(after.t.x, before.t.x, max_relative = 1e-12);
        assert_eq!(after.amp, 1.0);
    }

    #[test]
    fn test_pressure_release_surface_flips_phase() {
        let env = flat_environment(BoundaryProfile::flat(0.0), BoundaryProfile::flat(100.0), 1500.0, 100.0);
        let medium = PlanarMedium::new(&env, model());
        let (history, _) = trace(&medium, 50.0, -45.0, &params(80.0));
        let last = history.last().unwrap();
        assert_eq!(last.top_bounces, 1);
        assert_eq!(last.bottom_bounces, 0);
        assert_relative_eq!(last.phase, std::f64::consts::PI);
    }

    #[test]
    fn test_step_budget_truncates() {
        let env = flat_environment(BoundaryProfile::flat(0.0), BoundaryProfile::flat(100.0), 1500.0, 100.0);
        let medium = PlanarMedium::new(&env, model());
        let mut p = params(1.0e6);
        p.max_steps = 25;
        let (history, end) = trace(&medium, 50.0, 10.0, &p);
        assert_eq!(end, Termination::StepBudget);
        assert_eq!(history.len(), 25);
    }

    #[test]
    fn test_lossless_bottom_keeps_amplitude_and_absorbing_one_stops() {
        let env = flat_environment(BoundaryProfile::flat(0.0), BoundaryProfile::flat(100.0), 1500.0, 100.0);
        let medium = PlanarMedium::new(&env, model());
        let (history, _) = trace(&medium, 50.0, 20.0, &params(2000.0));
        assert!(history.iter().all(|r| (r.amp - 1.0).abs() < 1e-12));

        let matched = Environment::new(
            SoundSpeedProfile::isovelocity(1500.0, 0.0, 100.0).unwrap(),
            BoundaryProfile::flat(0.0),
            BoundaryProfile::flat(100.0),
            BoundaryCondition::PressureRelease,
            BoundaryCondition::HalfSpace(crate::environment::HalfSpace::fluid(1500.0, 1.0)),
        )
        .unwrap();
        let medium = PlanarMedium::new(&matched, model());
        let (_, end) = trace(&medium, 50.0, 20.0, &params(2000.0));
        assert_eq!(end, Termination::AmplitudeExhausted);
    }

    #[test]
    fn test_steps_stop_on_layer_interfaces() {
        let env = Environment::new(
            SoundSpeedProfile::new(
                SspInterpolation::CLinear,
                vec![
                    SspPoint::new(0.0, 1500.0),
                    SspPoint::new(37.0, 1500.0),
                    SspPoint::new(100.0, 1500.0),
                ],
            )
            .unwrap(),
            BoundaryProfile::flat(0.0),
            BoundaryProfile::flat(100.0),
            BoundaryCondition::PressureRelease,
            BoundaryCondition::Rigid,
        )
        .unwrap();
        let medium = PlanarMedium::new(&env, model());
        let (history, _) = trace(&medium, 10.0, 60.0, &params(50.0));
        assert!(
            history.iter().any(|r| (r.x.y - 37.0).abs() < 1e-9),
            "a step lands on the 37 m interface"
        );
    }

    #[test]
    fn test_ray_follows_sloped_bottom_segments() {
        let env = Environment::new(
            SoundSpeedProfile::isovelocity(1500.0, 0.0, 300.0).unwrap(),
            BoundaryProfile::flat(0.0),
            BoundaryProfile::new(vec![
                BoundaryVertex::new(0.0, 100.0),
                BoundaryVertex::new(500.0, 100.0),
                BoundaryVertex::new(1500.0, 300.0),
            ])
            .unwrap(),
            BoundaryCondition::PressureRelease,
            BoundaryCondition::Rigid,
        )
        .unwrap();
        let medium = PlanarMedium::new(&env, model());
        let (history, end) = trace(&medium, 50.0, 15.0, &params(3000.0));
        assert_eq!(end, Termination::RangeLimit);
        for r in &history {
            let bottom = medium.boundary_depth(BoundarySide::Bottom, &r.x, &r.t);
            assert!(r.x.y <= bottom + 1e-9, "ray stays above the seabed");
            assert!(r.x.y >= -1e-9, "ray stays below the surface");
        }
        assert!(history.iter().any(|r| (r.x.x - 500.0).abs() < 1e-9));
    }

    #[test]
    fn test_launch_point() {
        let env = flat_environment(BoundaryProfile::flat(0.0), BoundaryProfile::flat(100.0), 1500.0, 100.0);
        let medium = PlanarMedium::new(&env, model());
        let r: RayPoint<Planar> = launch_point(&medium, &origin(25.0), &Launch::new(90.0, 0.0));
        assert_eq!(r.x, Vec2::new(0.0, 25.0));
        assert_relative_eq!(r.t.y, 1.0 / 1500.0);
        assert_eq!((r.p, r.q), (Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)));
    }
}
