// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Short-lived raycast result cache.
//!
//! Entities barely move between sampled ticks, so a raycast between the
//! same pair of 10-unit cells is reused for a few ticks. Workers only read
//! the cache; the coordinator inserts fresh results after each batch.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

/// Quantization cell size in world units
pub const CELL_SIZE: f64 = 10.0;

/// Pair of quantized points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    from: [i32; 3],
    to: [i32; 3],
}

impl CacheKey {
    pub fn new(from: &Point3<f64>, to: &Point3<f64>) -> Self {
        Self {
            from: quantize(from),
            to: quantize(to),
        }
    }
}

#[inline]
fn quantize(p: &Point3<f64>) -> [i32; 3] {
    [
        (p.x / CELL_SIZE).floor() as i32,
        (p.y / CELL_SIZE).floor() as i32,
        (p.z / CELL_SIZE).floor() as i32,
    ]
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    visible: bool,
    expires_at: u32,
}

#[derive(Debug, Default)]
pub struct RaycastCache {
    ttl: u32,
    entries: FxHashMap<CacheKey, CacheEntry>,
}

impl RaycastCache {
    /// Entries live for `ttl` ticks; 0 disables caching
    pub fn new(ttl: u32) -> Self {
        Self {
            ttl,
            entries: FxHashMap::default(),
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.ttl > 0
    }

    /// Cached geometry result, if still valid at `tick`
    #[inline]
    pub fn get(&self, key: &CacheKey, tick: u32) -> Option<bool> {
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at > tick)
            .map(|entry| entry.visible)
    }

    pub fn insert(&mut self, key: CacheKey, visible: bool, tick: u32) {
        if !self.is_enabled() {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry {
                visible,
                expires_at: tick.saturating_add(self.ttl),
            },
        );
    }

    /// Drop entries expired at `tick`, returning how many were removed
    pub fn purge(&mut self, tick: u32) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > tick);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearby_points_share_a_key() {
        let a = CacheKey::new(&Point3::new(101.0, 5.0, 64.0), &Point3::new(-3.0, 0.0, 0.0));
        let b = CacheKey::new(&Point3::new(109.9, 9.0, 69.0), &Point3::new(-9.5, 9.0, 9.0));
        let c = CacheKey::new(&Point3::new(110.0, 5.0, 64.0), &Point3::new(-3.0, 0.0, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = RaycastCache::new(8);
        let key = CacheKey::new(&Point3::origin(), &Point3::new(100.0, 0.0, 0.0));
        cache.insert(key, false, 100);

        assert_eq!(cache.get(&key, 100), Some(false));
        assert_eq!(cache.get(&key, 107), Some(false));
        assert_eq!(cache.get(&key, 108), None);

        assert_eq!(cache.purge(107), 0);
        assert_eq!(cache.purge(108), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_disables_cache() {
        let mut cache = RaycastCache::new(0);
        let key = CacheKey::new(&Point3::origin(), &Point3::origin());
        cache.insert(key, true, 0);
        assert!(cache.is_empty());
        assert_eq!(cache.get(&key, 0), None);
    }
}
