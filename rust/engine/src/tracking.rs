// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! First-sighting bookkeeping per (observer, candidate) pair.
//!
//! A record starts when a candidate becomes visible and is refreshed while
//! it stays visible. Losing sight keeps the record around for a grace
//! window, so a candidate that ducks out and back in quickly (a jiggle
//! peek) keeps its original first-seen tick. Records go stale once their
//! last confirmation is older than the grace window.

use crate::entity::{normalize_degrees, EntityId, ViewAngles};
use nalgebra::Point3;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

/// Angular distance from an observer's view to a target, in degrees
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AimError {
    /// Combined angular error
    pub crosshair: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl AimError {
    /// Error between `view` at `eye` and the direction to `target`
    pub fn between(view: &ViewAngles, eye: &Point3<f64>, target: &Point3<f64>) -> Self {
        let ideal = ViewAngles::looking_along(&(target - eye));
        let pitch = (ideal.pitch - view.pitch).abs();
        let yaw = normalize_degrees(ideal.yaw - view.yaw).abs();
        Self {
            crosshair: pitch.hypot(yaw),
            pitch,
            yaw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FirstSeenRecord {
    pub first_seen_tick: u32,
    /// Latest tick the candidate was confirmed visible
    pub last_seen_tick: u32,
    /// Aim error at first sight
    pub aim: AimError,
}

#[derive(Debug, Default)]
pub struct FirstSeenTracker {
    grace_ticks: u32,
    latest_tick: Option<u32>,
    records: FxHashMap<(EntityId, EntityId), FirstSeenRecord>,
}

impl FirstSeenTracker {
    pub fn new(grace_ticks: u32) -> Self {
        Self {
            grace_ticks,
            latest_tick: None,
            records: FxHashMap::default(),
        }
    }

    pub fn grace_ticks(&self) -> u32 {
        self.grace_ticks
    }

    /// Fold one visibility result into the table.
    ///
    /// `aim` is only evaluated when a new record starts.
    pub fn observe(
        &mut self,
        observer: EntityId,
        candidate: EntityId,
        tick: u32,
        visible: bool,
        aim: impl FnOnce() -> AimError,
    ) {
        self.latest_tick = Some(self.latest_tick.map_or(tick, |t| t.max(tick)));
        if !visible {
            return;
        }

        let key = (observer, candidate);
        if let Some(record) = self.records.get_mut(&key) {
            if tick.saturating_sub(record.last_seen_tick) <= self.grace_ticks {
                record.last_seen_tick = tick;
                return;
            }
        }

        self.records.insert(
            key,
            FirstSeenRecord {
                first_seen_tick: tick,
                last_seen_tick: tick,
                aim: aim(),
            },
        );
    }

    /// Remove records whose entities left the frame or whose last sighting
    /// is older than the grace window. Returns how many were removed.
    pub fn sweep(&mut self, tick: u32, present: &FxHashSet<EntityId>) -> usize {
        let grace = self.grace_ticks;
        let before = self.records.len();
        self.records.retain(|(observer, candidate), record| {
            present.contains(observer)
                && present.contains(candidate)
                && tick.saturating_sub(record.last_seen_tick) <= grace
        });
        before - self.records.len()
    }

    pub fn get(&self, observer: EntityId, candidate: EntityId) -> Option<&FirstSeenRecord> {
        self.records.get(&(observer, candidate))
    }

    /// All records keyed by `(observer, candidate)`
    pub fn records(&self) -> impl Iterator<Item = (&(EntityId, EntityId), &FirstSeenRecord)> {
        self.records.iter()
    }

    /// Candidates the observer saw on the most recent evaluated tick
    pub fn visible_candidates(&self, observer: EntityId) -> Vec<EntityId> {
        let Some(latest) = self.latest_tick else {
            return Vec::new();
        };
        let mut ids: Vec<EntityId> = self
            .records
            .iter()
            .filter(|((o, _), r)| *o == observer && r.last_seen_tick == latest)
            .map(|((_, c), _)| *c)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Consume a record, e.g. once a reaction has been attributed to it
    pub fn take(&mut self, observer: EntityId, candidate: EntityId) -> Option<FirstSeenRecord> {
        self.records.remove(&(observer, candidate))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Forget everything, e.g. at round start
    pub fn clear(&mut self) {
        self.records.clear();
        self.latest_tick = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn aim() -> AimError {
        AimError {
            crosshair: 5.0,
            pitch: 3.0,
            yaw: 4.0,
        }
    }

    #[test]
    fn continuous_visibility_refreshes_last_seen() {
        let mut t = FirstSeenTracker::new(32);
        for tick in [100, 104, 108] {
            t.observe(1, 2, tick, true, aim);
        }
        let r = t.get(1, 2).unwrap();
        assert_eq!(r.first_seen_tick, 100);
        assert_eq!(r.last_seen_tick, 108);
        assert_eq!(r.aim, aim());
    }

    #[test]
    fn short_gap_keeps_first_seen() {
        let mut t = FirstSeenTracker::new(32);
        t.observe(1, 2, 100, true, aim);
        t.observe(1, 2, 104, false, aim);
        t.observe(1, 2, 108, false, aim);
        t.observe(1, 2, 112, true, AimError::default);
        let r = t.get(1, 2).unwrap();
        assert_eq!(r.first_seen_tick, 100);
        assert_eq!(r.last_seen_tick, 112);
        assert_eq!(r.aim, aim());
    }

    #[test]
    fn long_gap_starts_new_record() {
        let mut t = FirstSeenTracker::new(32);
        t.observe(1, 2, 100, true, aim);
        t.observe(1, 2, 140, true, AimError::default);
        let r = t.get(1, 2).unwrap();
        assert_eq!(r.first_seen_tick, 140);
        assert_eq!(r.aim, AimError::default());
    }

    #[test]
    fn sweep_drops_stale_and_departed() {
        let mut t = FirstSeenTracker::new(32);
        t.observe(1, 2, 100, true, aim);
        t.observe(1, 3, 100, true, aim);
        t.observe(4, 2, 130, true, aim);

        let present: FxHashSet<EntityId> = [1, 2, 4].into_iter().collect();
        assert_eq!(t.sweep(132, &present), 1); // candidate 3 left
        assert_eq!(t.sweep(133, &present), 1); // (1, 2) is stale
        assert!(t.get(4, 2).is_some());
    }

    #[test]
    fn visible_candidates_reflect_latest_tick() {
        let mut t = FirstSeenTracker::new(32);
        t.observe(1, 2, 100, true, aim);
        t.observe(1, 3, 100, true, aim);
        t.observe(1, 2, 104, true, aim);
        t.observe(1, 3, 104, false, aim);
        assert_eq!(t.visible_candidates(1), vec![2]);
        assert!(t.visible_candidates(9).is_empty());

        assert!(t.take(1, 2).is_some());
        assert!(t.take(1, 2).is_none());
        t.clear();
        assert!(t.is_empty());
    }

    #[test]
    fn aim_error_in_degrees() {
        let eye = Point3::new(0.0, 0.0, 64.0);
        let target = Point3::new(100.0, 100.0, 64.0);
        let e = AimError::between(&ViewAngles::new(0.0, 0.0), &eye, &target);
        assert_relative_eq!(e.yaw, 45.0, epsilon = 1e-9);
        assert_relative_eq!(e.pitch, 0.0, epsilon = 1e-9);

        let e = AimError::between(&ViewAngles::new(0.0, 350.0), &eye, &Point3::new(100.0, 0.0, 64.0));
        assert_relative_eq!(e.yaw, 10.0, epsilon = 1e-9);
        assert_relative_eq!(e.crosshair, 10.0, epsilon = 1e-9);
    }
}
