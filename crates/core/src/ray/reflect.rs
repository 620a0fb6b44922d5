//! Specular reflection at the surface and seabed.

use super::state::RayPoint;
use crate::core_types::RayVector;
use crate::dimension::{Medium, RaySpace, ReflectionJump};
use crate::environment::{BoundarySide, Incidence};

/// Reflection coefficients weaker than this kill the ray outright.
const NEGLIGIBLE_REFLECTION: f64 = 1.0e-5;

/// Reflect `ray`, which sits on boundary `side`, about the local normal.
///
/// The slowness component along the outward normal flips sign, the
/// tangential component is kept, amplitude and phase pick up the boundary's
/// reflection coefficient and the paraxial slowness takes the curvature
/// jump. Exactly one bounce counter is incremented.
pub fn reflect<S: RaySpace, M: Medium<S>>(medium: &M, ray: &RayPoint<S>, side: BoundarySide) -> RayPoint<S> {
    let patch = medium.boundary(side, &ray.x, &ray.t);
    let normal_slowness = ray.t.inner(&patch.normal);
    let tangential_slowness = ray.t.inner(&patch.tangent);
    let t = ray.t - patch.normal * (2.0 * normal_slowness);

    let ss = medium.sound_speed(&ray.x, &t);
    let curvature = S::reflection_curvature(&ReflectionJump {
        c: ss.c,
        gradient: ss.gradient,
        incident: ray.t,
        reflected: t,
        tangential: tangential_slowness,
        normal: normal_slowness,
        side,
    });

    let incidence = Incidence {
        tangential: tangential_slowness.abs(),
        normal: normal_slowness.abs(),
        water_density: ss.density,
    };
    let r = medium.condition(side).coefficient(&incidence, medium.attenuation());

    let mut out = *ray;
    out.t = t;
    out.c = ss.c;
    out.p = ray.p + ray.q.component_mul(&curvature);
    if r.norm() < NEGLIGIBLE_REFLECTION {
        out.amp = 0.0;
    } else {
        out.amp *= r.norm();
        out.phase += r.arg();
    }
    match side {
        BoundarySide::Top => out.top_bounces += 1,
        BoundarySide::Bottom => out.bottom_bounces += 1,
    }
    out
}
