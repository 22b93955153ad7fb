// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-frame batch visibility evaluation.
//!
//! Each sampled frame runs in three phases:
//!
//! 1. **Plan** (coordinator): every living observer is paired with every
//!    living opponent; pairs out of range or behind the observer are
//!    dropped before any geometry work.
//! 2. **Trace** (workers): up to `max_workers` workers, never more than
//!    there are jobs, drain a shared job cursor. Each job casts eye→head
//!    and, only if that is blocked, eye→chest. Workers read the level and
//!    the raycast cache but mutate nothing; results go back over a
//!    bounded channel.
//! 3. **Reconcile** (coordinator): once every worker has finished, results
//!    are folded into the raycast cache and the first-seen tracker, then
//!    stale records are swept.

use crate::cache::{CacheKey, RaycastCache};
use crate::config::EngineConfig;
use crate::entity::{EntityId, EntitySnapshot, Frame, ViewAngles};
use crate::error::Result;
use crate::heuristic::HeuristicFilter;
use crate::manager::LineOfSight;
use crate::tracking::{AimError, FirstSeenTracker};
use nalgebra::{Point3, Vector2};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};

/// One (observer, candidate) pair to trace
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityJob {
    pub observer: EntityId,
    pub candidate: EntityId,
    pub eye: Point3<f64>,
    pub head: Point3<f64>,
    pub chest: Point3<f64>,
    pub view: ViewAngles,
    pub flash_duration: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisibilityResult {
    pub observer: EntityId,
    pub candidate: EntityId,
    /// Final verdict, after the heuristic filter when enabled
    pub visible: bool,
    /// Geometry alone
    pub line_of_sight: bool,
    /// Geometry result came from the raycast cache
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub tick: u32,
    /// Sorted by (observer, candidate)
    pub results: Vec<VisibilityResult>,
    /// Workers spawned for this batch
    pub workers: usize,
    pub cache_hits: usize,
}

impl BatchOutcome {
    pub fn is_visible(&self, observer: EntityId, candidate: EntityId) -> Option<bool> {
        self.results
            .binary_search_by_key(&(observer, candidate), |r| (r.observer, r.candidate))
            .ok()
            .map(|i| self.results[i].visible)
    }
}

/// Worker output; borrows its job from the coordinator's job list
struct Traced<'j> {
    job: &'j VisibilityJob,
    key: CacheKey,
    line_of_sight: bool,
    visible: bool,
    cached: bool,
}

/// Shared, read-only inputs of a trace phase
#[derive(Clone, Copy)]
struct TraceContext<'a> {
    los: &'a dyn LineOfSight,
    cache: &'a RaycastCache,
    heuristic: Option<&'a HeuristicFilter>,
    smokes: &'a [Point3<f64>],
    tick: u32,
}

impl TraceContext<'_> {
    fn trace<'j>(&self, job: &'j VisibilityJob) -> Traced<'j> {
        let key = CacheKey::new(&job.eye, &job.head);
        let (line_of_sight, cached) = match self.cache.get(&key, self.tick) {
            Some(hit) => (hit, true),
            None => {
                let clear = self.los.is_visible(&job.eye, &job.head)
                    || self.los.is_visible(&job.eye, &job.chest);
                (clear, false)
            }
        };

        let visible = line_of_sight
            && self.heuristic.map_or(true, |h| {
                h.is_visible(&job.eye, &job.view, job.flash_duration, &job.chest, self.smokes)
            });

        Traced {
            job,
            key,
            line_of_sight,
            visible,
            cached,
        }
    }
}

/// Evaluates visibility between opposing entities, frame by frame
pub struct BatchEvaluator {
    config: EngineConfig,
    los: Arc<dyn LineOfSight>,
    pool: rayon::ThreadPool,
    heuristic: HeuristicFilter,
    cache: RaycastCache,
    tracker: FirstSeenTracker,
}

impl BatchEvaluator {
    /// Build an evaluator with a dedicated pool of `config.max_workers` threads
    pub fn new(config: EngineConfig, los: Arc<dyn LineOfSight>) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_workers.max(1))
            .thread_name(|i| format!("sightline-worker-{i}"))
            .build()?;

        tracing::debug!(
            workers = config.max_workers,
            sample_interval = config.sample_interval,
            max_range = config.max_range,
            "Batch evaluator ready"
        );

        Ok(Self {
            cache: RaycastCache::new(config.raycast_cache_ttl),
            tracker: FirstSeenTracker::new(config.grace_ticks),
            heuristic: HeuristicFilter::default(),
            config,
            los,
            pool,
        })
    }

    pub fn with_heuristic(mut self, heuristic: HeuristicFilter) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tracker(&self) -> &FirstSeenTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut FirstSeenTracker {
        &mut self.tracker
    }

    pub fn cache(&self) -> &RaycastCache {
        &self.cache
    }

    /// Forget cached raycasts and sightings (level change, round start)
    pub fn reset(&mut self) {
        self.cache.clear();
        self.tracker.clear();
    }

    /// Is this tick one the evaluator samples?
    #[inline]
    pub fn samples(&self, tick: u32) -> bool {
        tick % self.config.sample_interval.max(1) == 0
    }

    /// Pairs surviving the range and forward-cone filters
    pub fn plan(&self, frame: &Frame) -> Vec<VisibilityJob> {
        let config = &self.config;
        let max_range_sq = config.max_range_squared();
        let participants: Vec<&EntitySnapshot> =
            frame.entities.iter().filter(|e| e.participates()).collect();

        let mut jobs = Vec::new();
        for observer in &participants {
            let eye = observer.raised(config.eye_height);
            let forward = observer.view.forward_2d();

            for candidate in &participants {
                if candidate.team == observer.team || candidate.id == observer.id {
                    continue;
                }

                let chest = candidate.raised(config.chest_offset);
                let flat = Vector2::new(chest.x - eye.x, chest.y - eye.y);
                if flat.norm_squared() > max_range_sq {
                    continue;
                }
                // Directly above or below counts as in front
                if let Some(dir) = flat.try_normalize(f64::EPSILON) {
                    if dir.dot(&forward) < config.cone_min_dot {
                        continue;
                    }
                }

                jobs.push(VisibilityJob {
                    observer: observer.id,
                    candidate: candidate.id,
                    eye,
                    head: candidate.raised(config.head_offset),
                    chest,
                    view: observer.view,
                    flash_duration: observer.flash_duration,
                });
            }
        }
        jobs
    }

    /// Fan jobs out to the pool and collect every result
    fn trace_all<'j>(&self, jobs: &'j [VisibilityJob], tick: u32, smokes: &[Point3<f64>]) -> (Vec<Traced<'j>>, usize) {
        let workers = self.config.max_workers.max(1).min(jobs.len());
        if workers == 0 {
            return (Vec::new(), 0);
        }

        let ctx = TraceContext {
            los: &*self.los,
            cache: &self.cache,
            heuristic: self.config.heuristic.then_some(&self.heuristic),
            smokes,
            tick,
        };
        let cursor = AtomicUsize::new(0);
        let (tx, rx) = mpsc::sync_channel(jobs.len());

        self.pool.scope(|scope| {
            for _ in 0..workers {
                let tx = tx.clone();
                let cursor = &cursor;
                scope.spawn(move |_| {
                    while let Some(job) = jobs.get(cursor.fetch_add(1, Ordering::Relaxed)) {
                        if tx.send(ctx.trace(job)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(tx);

        (rx.into_iter().collect(), workers)
    }

    /// Evaluate one frame.
    ///
    /// Returns `None` for ticks that are not sampled; state is untouched.
    pub fn evaluate(&mut self, frame: &Frame) -> Option<BatchOutcome> {
        if !self.samples(frame.tick) {
            return None;
        }
        let tick = frame.tick;

        let jobs = self.plan(frame);
        let (traced, workers) = self.trace_all(&jobs, tick, &frame.smokes);

        let mut results = Vec::with_capacity(traced.len());
        let mut cache_hits = 0;
        for t in traced {
            if t.cached {
                cache_hits += 1;
            } else {
                self.cache.insert(t.key, t.line_of_sight, tick);
            }

            let job = t.job;
            self.tracker.observe(job.observer, job.candidate, tick, t.visible, || {
                AimError::between(&job.view, &job.eye, &job.head)
            });

            results.push(VisibilityResult {
                observer: job.observer,
                candidate: job.candidate,
                visible: t.visible,
                line_of_sight: t.line_of_sight,
                cached: t.cached,
            });
        }
        results.sort_unstable_by_key(|r| (r.observer, r.candidate));

        let present: FxHashSet<EntityId> = frame
            .entities
            .iter()
            .filter(|e| e.participates())
            .map(|e| e.id)
            .collect();
        let swept = self.tracker.sweep(tick, &present);

        let purged = if tick % self.config.cache_sweep_interval.max(1) == 0 {
            self.cache.purge(tick)
        } else {
            0
        };

        tracing::debug!(
            tick,
            jobs = jobs.len(),
            workers,
            cache_hits,
            visible = results.iter().filter(|r| r.visible).count(),
            swept,
            purged,
            "Evaluated visibility batch"
        );

        Some(BatchOutcome {
            tick,
            results,
            workers,
            cache_hits,
        })
    }
}
