// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration loaded from environment variables.

use std::path::PathBuf;

pub const DEFAULT_MAPS_DIR: &str = "./maps";
pub const DEFAULT_MAX_WORKERS: usize = 6;
pub const DEFAULT_SAMPLE_INTERVAL: u32 = 4;
pub const DEFAULT_MAX_RANGE: f64 = 3500.0;
pub const DEFAULT_CONE_MIN_DOT: f64 = 0.0;
pub const DEFAULT_EYE_HEIGHT: f64 = 64.0;
pub const DEFAULT_HEAD_OFFSET: f64 = 62.0;
pub const DEFAULT_CHEST_OFFSET: f64 = 40.0;
pub const DEFAULT_GRACE_TICKS: u32 = 32;
pub const DEFAULT_RAYCAST_CACHE_TTL: u32 = 8;
pub const DEFAULT_CACHE_SWEEP_INTERVAL: u32 = 100;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Directory holding level meshes, nav files and callouts.
    pub maps_dir: PathBuf,
    /// Upper bound on concurrent raycast workers.
    pub max_workers: usize,
    /// Only ticks that are a multiple of this are evaluated.
    pub sample_interval: u32,
    /// Pairs further apart than this (2D) are never tested.
    pub max_range: f64,
    /// Minimum 2D dot product between view direction and direction to the candidate.
    pub cone_min_dot: f64,
    /// Eye height above the feet position.
    pub eye_height: f64,
    /// Upper target point above the candidate's feet.
    pub head_offset: f64,
    /// Lower target point above the candidate's feet.
    pub chest_offset: f64,
    /// Ticks a lost sighting may be re-linked within.
    pub grace_ticks: u32,
    /// Ticks a cached raycast stays valid (0 disables the cache).
    pub raycast_cache_ttl: u32,
    /// Expired cache entries are purged every this many ticks.
    pub cache_sweep_interval: u32,
    /// Apply flash/FOV/smoke checks after a clear raycast.
    pub heuristic: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    let Ok(value) = std::env::var(key) else {
        return default;
    };
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!(key, value = %value, "Ignoring unparsable environment value");
            default
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            maps_dir: std::env::var("SIGHTLINE_MAPS_DIR")
                .unwrap_or_else(|_| DEFAULT_MAPS_DIR.into())
                .into(),
            max_workers: env_or("SIGHTLINE_MAX_WORKERS", DEFAULT_MAX_WORKERS).max(1),
            sample_interval: env_or("SIGHTLINE_SAMPLE_INTERVAL", DEFAULT_SAMPLE_INTERVAL).max(1),
            max_range: env_or("SIGHTLINE_MAX_RANGE", DEFAULT_MAX_RANGE),
            cone_min_dot: env_or("SIGHTLINE_CONE_MIN_DOT", DEFAULT_CONE_MIN_DOT),
            eye_height: env_or("SIGHTLINE_EYE_HEIGHT", DEFAULT_EYE_HEIGHT),
            head_offset: env_or("SIGHTLINE_HEAD_OFFSET", DEFAULT_HEAD_OFFSET),
            chest_offset: env_or("SIGHTLINE_CHEST_OFFSET", DEFAULT_CHEST_OFFSET),
            grace_ticks: env_or("SIGHTLINE_GRACE_TICKS", DEFAULT_GRACE_TICKS),
            raycast_cache_ttl: env_or("SIGHTLINE_RAYCAST_CACHE_TTL", DEFAULT_RAYCAST_CACHE_TTL),
            cache_sweep_interval: env_or("SIGHTLINE_CACHE_SWEEP_INTERVAL", DEFAULT_CACHE_SWEEP_INTERVAL)
                .max(1),
            heuristic: env_or("SIGHTLINE_HEURISTIC", true),
        }
    }

    /// Squared 2D range cutoff
    #[inline]
    pub fn max_range_squared(&self) -> f64 {
        self.max_range * self.max_range
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            maps_dir: DEFAULT_MAPS_DIR.into(),
            max_workers: DEFAULT_MAX_WORKERS,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            max_range: DEFAULT_MAX_RANGE,
            cone_min_dot: DEFAULT_CONE_MIN_DOT,
            eye_height: DEFAULT_EYE_HEIGHT,
            head_offset: DEFAULT_HEAD_OFFSET,
            chest_offset: DEFAULT_CHEST_OFFSET,
            grace_ticks: DEFAULT_GRACE_TICKS,
            raycast_cache_ttl: DEFAULT_RAYCAST_CACHE_TTL,
            cache_sweep_interval: DEFAULT_CACHE_SWEEP_INTERVAL,
            heuristic: true,
        }
    }
}
