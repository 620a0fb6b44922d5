//! Eigenray selection
//!
//! An eigenray is a traced ray that passes through a receiver. Range/depth
//! runs find them by bracketing: where two neighbouring launch angles with
//! the same bounce history straddle a receiver depth, the angle between
//! them is refined by regula falsi, re-tracing the ray at each guess. Full
//! 3D runs keep the closest ray of each bounce history instead, with its
//! angles nudged toward the receiver by inverse-miss weighting of the two
//! nearest rays.

use crate::core_types::{Point3, RayVector};
use crate::dimension::{Planar, RayOrigin, RaySpace, Spatial};
use crate::field::ReceiverGrid;
use crate::ray::{Launch, RayResult};
use num_complex::Complex64;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Eigenray search settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EigenSettings {
    /// Largest accepted miss distance in meters.
    pub tolerance: f64,
    /// Most re-traces while refining one bracket.
    pub refine_iterations: usize,
}

impl Default for EigenSettings {
    fn default() -> Self {
        Self {
            tolerance: 1.0,
            refine_iterations: 3,
        }
    }
}

/// Position of a receiver in its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReceiverIndex {
    /// Bearing slot.
    pub bearing: usize,
    /// Depth slot.
    pub depth: usize,
    /// Range slot.
    pub range: usize,
}

/// Bounce history of a ray at one receiver range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topology {
    /// Surface reflections before the crossing.
    pub top: u32,
    /// Seabed reflections before the crossing.
    pub bottom: u32,
    /// How many earlier crossings of the same range had the same bounces.
    pub occurrence: u32,
}

/// Ray that reaches a receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct Eigenray<S: RaySpace> {
    /// The connecting ray.
    pub ray: RayResult<S>,
    /// Receiver it reaches.
    pub receiver: ReceiverIndex,
    /// Bounce history at the receiver.
    pub topology: Topology,
    /// Refined declination in degrees.
    pub declination: f64,
    /// Refined bearing in degrees.
    pub bearing: f64,
    /// Distance from the receiver at closest approach, in meters.
    pub miss: f64,
    /// Complex travel time to the receiver.
    pub delay: Complex64,
    /// Amplitude left after boundary losses.
    pub amplitude: f64,
    /// Phase picked up at boundary reflections.
    pub phase: f64,
}

impl<S: RaySpace> Eigenray<S> {
    /// Index of the source in the session's source list.
    pub fn source_index(&self) -> usize {
        self.ray.source_index
    }
}

/// Ray state where it crosses one receiver range.
#[derive(Debug, Clone, Copy)]
struct RangeCrossing<S: RaySpace> {
    x: S::Vector,
    tau: Complex64,
    amp: f64,
    phase: f64,
    topology: Topology,
}

/// Every crossing of horizontal `range` along `ray`, in travel order.
fn crossings_at<S: RaySpace>(ray: &RayResult<S>, range: f64) -> Vec<RangeCrossing<S>> {
    let mut seen: FxHashMap<(u32, u32), u32> = FxHashMap::default();
    let mut out = Vec::new();
    for pair in ray.points.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        let ra = S::horizontal_range(&a.x, &ray.origin);
        let rb = S::horizontal_range(&b.x, &ray.origin);
        let forward = ra <= range && range < rb;
        let backward = rb < range && range <= ra;
        if !(forward || backward) {
            continue;
        }
        let s = (range - ra) / (rb - ra);
        let bounces = b.bounces();
        let occurrence = seen.entry(bounces).or_insert(0);
        out.push(RangeCrossing {
            x: a.x + (b.x - a.x) * s,
            tau: a.tau + (b.tau - a.tau) * s,
            amp: b.amp,
            phase: b.phase,
            topology: Topology {
                top: bounces.0,
                bottom: bounces.1,
                occurrence: *occurrence,
            },
        });
        *occurrence += 1;
    }
    out
}

fn depth_misses(ray: &RayResult<Planar>, range: f64, depth: f64) -> FxHashMap<Topology, (f64, RangeCrossing<Planar>)> {
    crossings_at(ray, range)
        .into_iter()
        .map(|c| (c.topology, (c.x.depth() - depth, c)))
        .collect()
}

fn planar_eigenray(
    ray: RayResult<Planar>,
    crossing: RangeCrossing<Planar>,
    miss: f64,
    receiver: ReceiverIndex,
) -> Eigenray<Planar> {
    Eigenray {
        declination: ray.launch.declination,
        bearing: ray.launch.bearing,
        ray,
        receiver,
        topology: crossing.topology,
        miss: miss.abs(),
        delay: crossing.tau,
        amplitude: crossing.amp,
        phase: crossing.phase,
    }
}

/// Eigenray search for one ray space.
pub trait EigenSearch: RaySpace {
    /// Eigenrays for every receiver from `rays`, one source's launches in
    /// launch-table order. `retrace` traces a refined launch in a frame.
    fn select<F>(
        rays: &[RayResult<Self>],
        receivers: &ReceiverGrid,
        settings: &EigenSettings,
        retrace: F,
    ) -> Vec<Eigenray<Self>>
    where
        F: Fn(&RayOrigin, Launch) -> RayResult<Self>;
}

impl EigenSearch for Planar {
    fn select<F>(
        rays: &[RayResult<Planar>],
        receivers: &ReceiverGrid,
        settings: &EigenSettings,
        retrace: F,
    ) -> Vec<Eigenray<Planar>>
    where
        F: Fn(&RayOrigin, Launch) -> RayResult<Planar>,
    {
        let mut found = Vec::new();
        for slice in rays.chunk_by(|a, b| a.launch.bearing == b.launch.bearing) {
            let Some(slot) = receivers.bearing_slot(slice[0].launch.bearing) else {
                continue;
            };
            let origin = slice[0].origin;
            found.extend(select_planar(slice, receivers, slot, settings, |launch| {
                retrace(&origin, launch)
            }));
        }
        found
    }
}

impl EigenSearch for Spatial {
    fn select<F>(
        rays: &[RayResult<Spatial>],
        receivers: &ReceiverGrid,
        settings: &EigenSettings,
        _retrace: F,
    ) -> Vec<Eigenray<Spatial>>
    where
        F: Fn(&RayOrigin, Launch) -> RayResult<Spatial>,
    {
        select_spatial(rays, receivers, settings)
    }
}

/// Eigenrays for planar rays traced along one bearing.
///
/// `rays` must be in launch-table order. `bearing` is the receiver slot the
/// rays belong to. `retrace` traces a new ray at a refined launch.
pub fn select_planar<F>(
    rays: &[RayResult<Planar>],
    receivers: &ReceiverGrid,
    bearing: usize,
    settings: &EigenSettings,
    retrace: F,
) -> Vec<Eigenray<Planar>>
where
    F: Fn(Launch) -> RayResult<Planar>,
{
    let mut found = Vec::new();
    for (ir, &range) in receivers.ranges.iter().enumerate() {
        for (id, &depth) in receivers.depths.iter().enumerate() {
            let receiver = ReceiverIndex {
                bearing,
                depth: id,
                range: ir,
            };
            let misses: Vec<_> = rays.iter().map(|ray| depth_misses(ray, range, depth)).collect();
            let mut bracketed: Vec<FxHashSet<Topology>> = vec![FxHashSet::default(); rays.len()];

            for i in 0..rays.len().saturating_sub(1) {
                let mut topologies: Vec<_> = misses[i]
                    .keys()
                    .filter(|k| misses[i + 1].contains_key(k))
                    .copied()
                    .collect();
                topologies.sort_unstable();
                for topology in topologies {
                    let (d0, c0) = misses[i][&topology];
                    let (d1, c1) = misses[i + 1][&topology];
                    if (d0 > 0.0) == (d1 > 0.0) {
                        continue;
                    }
                    bracketed[i].insert(topology);
                    bracketed[i + 1].insert(topology);
                    let refined = refine_bracket(
                        (&rays[i], d0, c0),
                        (&rays[i + 1], d1, c1),
                        range,
                        depth,
                        settings,
                        &retrace,
                    );
                    if let Some((ray, d, c)) = refined {
                        found.push(planar_eigenray(ray, c, d, receiver));
                    }
                }
            }

            for (i, ray) in rays.iter().enumerate() {
                let mut hits: Vec<_> = misses[i]
                    .iter()
                    .filter(|(k, (d, _))| d.abs() <= settings.tolerance && !bracketed[i].contains(k))
                    .map(|(_, hit)| *hit)
                    .collect();
                hits.sort_by(|a, b| a.1.topology.cmp(&b.1.topology));
                for (d, c) in hits {
                    found.push(planar_eigenray(ray.clone(), c, d, receiver));
                }
            }
        }
    }
    found
}

/// Regula falsi between two launches whose misses differ in sign.
fn refine_bracket<F>(
    lo: (&RayResult<Planar>, f64, RangeCrossing<Planar>),
    hi: (&RayResult<Planar>, f64, RangeCrossing<Planar>),
    range: f64,
    depth: f64,
    settings: &EigenSettings,
    retrace: &F,
) -> Option<(RayResult<Planar>, f64, RangeCrossing<Planar>)>
where
    F: Fn(Launch) -> RayResult<Planar>,
{
    let topology = lo.2.topology;
    let bearing = lo.0.launch.bearing;
    let (mut a0, mut d0) = (lo.0.launch.declination, lo.1);
    let (mut a1, mut d1) = (hi.0.launch.declination, hi.1);

    let mut best = if d0.abs() <= d1.abs() {
        (lo.0.clone(), lo.1, lo.2)
    } else {
        (hi.0.clone(), hi.1, hi.2)
    };

    for _ in 0..settings.refine_iterations {
        if best.1 == 0.0 || d1 == d0 {
            break;
        }
        let angle = a0 - d0 * (a1 - a0) / (d1 - d0);
        let ray = retrace(Launch::new(angle, bearing));
        let Some((d, c)) = depth_misses(&ray, range, depth).remove(&topology) else {
            break;
        };
        let improved = d.abs() < best.1.abs();
        if (d > 0.0) == (d0 > 0.0) {
            a0 = angle;
            d0 = d;
        } else {
            a1 = angle;
            d1 = d;
        }
        if improved {
            best = (ray, d, c);
        }
    }
    (best.1.abs() <= settings.tolerance).then_some(best)
}

/// Weighted mean of two bearings in degrees, taken the short way round the
/// circle. Results stay in `[0, 360)` when both inputs are.
fn blend_bearing(a: f64, wa: f64, b: f64, wb: f64) -> f64 {
    let delta = (b - a + 180.0).rem_euclid(360.0) - 180.0;
    let mean = a + delta * wb / (wa + wb);
    if a >= 0.0 && b >= 0.0 {
        mean.rem_euclid(360.0)
    } else {
        mean
    }
}

/// Eigenrays for spatial rays from one source.
///
/// `rays` must be in launch order; each receiver keeps the closest ray of
/// every bounce history within tolerance.
pub fn select_spatial(
    rays: &[RayResult<Spatial>],
    receivers: &ReceiverGrid,
    settings: &EigenSettings,
) -> Vec<Eigenray<Spatial>> {
    let mut found = Vec::new();
    let Some(first) = rays.first() else {
        return found;
    };
    let source = first.origin.source;

    for (ib, bearing) in receivers.bearings.iter().enumerate() {
        let (sin, cos) = bearing.to_radians().sin_cos();
        for (id, &depth) in receivers.depths.iter().enumerate() {
            for (ir, &range) in receivers.ranges.iter().enumerate() {
                let target = Point3::new(source.x + range * cos, source.y + range * sin, depth);
                let receiver = ReceiverIndex {
                    bearing: ib,
                    depth: id,
                    range: ir,
                };

                let mut candidates: FxHashMap<Topology, Vec<(f64, usize, RangeCrossing<Spatial>)>> =
                    FxHashMap::default();
                for (i, ray) in rays.iter().enumerate() {
                    for c in crossings_at(ray, range) {
                        let miss = (c.x - target).norm();
                        if miss <= settings.tolerance {
                            candidates.entry(c.topology).or_default().push((miss, i, c));
                        }
                    }
                }

                let mut topologies: Vec<_> = candidates.keys().copied().collect();
                topologies.sort_unstable();
                for topology in topologies {
                    let mut group = candidates.remove(&topology).unwrap_or_default();
                    group.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                    let Some(&(miss, index, crossing)) = group.first() else {
                        continue;
                    };
                    let ray = &rays[index];
                    let (declination, bearing) = match group.get(1) {
                        Some(&(miss2, index2, _)) if miss > 0.0 => {
                            let other = &rays[index2].launch;
                            let (w1, w2) = (1.0 / miss, 1.0 / miss2);
                            (
                                (ray.launch.declination * w1 + other.declination * w2) / (w1 + w2),
                                blend_bearing(ray.launch.bearing, w1, other.bearing, w2),
                            )
                        }
                        _ => (ray.launch.declination, ray.launch.bearing),
                    };
                    found.push(Eigenray {
                        ray: ray.clone(),
                        receiver,
                        topology,
                        declination,
                        bearing,
                        miss,
                        delay: crossing.tau,
                        amplitude: crossing.amp,
                        phase: crossing.phase,
                    });
                }
            }
        }
    }
    found
}
