// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Sightline Engine
//!
//! Answers "who could see whom" for every sampled tick of a recorded match.
//!
//! - [`MapManager`] owns the current level (BVH over its physics mesh plus
//!   optional nav mesh and callouts) and falls back to "always visible"
//!   when no mesh exists.
//! - [`BatchEvaluator`] plans observer/candidate pairs per frame, traces
//!   them on a bounded worker pool and folds the results into a raycast
//!   cache and a [`FirstSeenTracker`].
//!
//! ```rust,ignore
//! use sightline_engine::{BatchEvaluator, EngineConfig, MapManager};
//! use std::sync::Arc;
//!
//! let config = EngineConfig::from_env();
//! let manager = Arc::new(MapManager::new(&config.maps_dir));
//! manager.load_level("de_inferno");
//!
//! let mut evaluator = BatchEvaluator::new(config, manager)?;
//! for frame in frames {
//!     if let Some(outcome) = evaluator.evaluate(&frame) {
//!         // ...
//!     }
//! }
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod heuristic;
pub mod manager;
pub mod tracking;

pub use batch::{BatchEvaluator, BatchOutcome, VisibilityJob, VisibilityResult};
pub use cache::{CacheKey, RaycastCache};
pub use config::EngineConfig;
pub use entity::{EntityId, EntitySnapshot, Frame, Team, ViewAngles};
pub use error::{Error, Result};
pub use heuristic::HeuristicFilter;
pub use manager::{sanitize_level_name, LevelState, LevelStatus, LineOfSight, LoadedLevel, MapManager};
pub use tracking::{AimError, FirstSeenRecord, FirstSeenTracker};
