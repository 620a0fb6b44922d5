//! Execution backends for batches of independent rays
//!
//! Both backends run the same per-item closure and return results in input
//! order, so every reduction downstream sees identical inputs whichever
//! backend produced them.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Requested execution strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parallelism {
    /// Trace every ray on the calling thread.
    Sequential,
    /// Trace on a dedicated thread pool; `threads == 0` lets the pool decide.
    Parallel {
        /// Worker count.
        threads: usize,
    },
}

impl Default for Parallelism {
    fn default() -> Self {
        Parallelism::Parallel { threads: 0 }
    }
}

/// Ray batch executor.
#[derive(Debug)]
pub enum RayTracer {
    /// Calling thread only.
    Sequential,
    /// Rayon thread pool.
    #[cfg(feature = "parallel")]
    Parallel(rayon::ThreadPool),
}

impl RayTracer {
    /// Build the backend for `parallelism`, falling back to sequential
    /// execution when a thread pool is unavailable.
    pub fn new(parallelism: Parallelism) -> Self {
        match parallelism {
            Parallelism::Sequential => {
                info!("Using sequential ray tracer");
                RayTracer::Sequential
            }
            #[cfg(feature = "parallel")]
            Parallelism::Parallel { threads } => {
                match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                    Ok(pool) => {
                        info!("Using parallel ray tracer ({} threads)", pool.current_num_threads());
                        RayTracer::Parallel(pool)
                    }
                    Err(e) => {
                        warn!("Failed to build ray tracing thread pool: {}. Falling back to sequential.", e);
                        RayTracer::Sequential
                    }
                }
            }
            #[cfg(not(feature = "parallel"))]
            Parallelism::Parallel { .. } => {
                warn!("Parallel feature disabled, using sequential ray tracer");
                RayTracer::Sequential
            }
        }
    }

    /// Backend name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            RayTracer::Sequential => "sequential",
            #[cfg(feature = "parallel")]
            RayTracer::Parallel(_) => "parallel",
        }
    }

    /// Worker count.
    pub fn threads(&self) -> usize {
        match self {
            RayTracer::Sequential => 1,
            #[cfg(feature = "parallel")]
            RayTracer::Parallel(pool) => pool.current_num_threads(),
        }
    }

    /// Apply `f` to every item, returning results in item order.
    ///
    /// `init` builds per-worker scratch state handed to each call of `f`.
    pub fn map<T, R, W, I, F>(&self, items: &[T], init: I, f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        I: Fn() -> W + Sync + Send,
        F: Fn(&mut W, &T) -> R + Sync + Send,
    {
        match self {
            RayTracer::Sequential => {
                let mut scratch = init();
                items.iter().map(|item| f(&mut scratch, item)).collect()
            }
            #[cfg(feature = "parallel")]
            RayTracer::Parallel(pool) => {
                pool.install(|| items.par_iter().map_init(&init, |scratch, item| f(scratch, item)).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_map_keeps_order_and_reuses_scratch() {
        let tracer = RayTracer::new(Parallelism::Sequential);
        assert_eq!(tracer.name(), "sequential");
        assert_eq!(tracer.threads(), 1);
        let out = tracer.map(
            &[1, 2, 3, 4],
            Vec::new,
            |seen: &mut Vec<i32>, x| {
                seen.push(*x);
                (*x * 10, seen.len())
            },
        );
        assert_eq!(out, vec![(10, 1), (20, 2), (30, 3), (40, 4)]);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_map_matches_sequential() {
        let items: Vec<u64> = (0..1000).collect();
        let work = |_: &mut (), x: &u64| x.wrapping_mul(2_654_435_761) % 1_000_003;
        let seq = RayTracer::new(Parallelism::Sequential).map(&items, || (), work);
        let par = RayTracer::new(Parallelism::Parallel { threads: 4 });
        assert_eq!(par.name(), "parallel");
        assert_eq!(par.map(&items, || (), work), seq);
    }
}
