// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cheap perception checks that need no level geometry.
//!
//! Applied after a clear raycast (or on their own in fallback mode):
//! a fully flashed observer sees nothing, a candidate must sit inside a
//! widescreen-sized view cone, and a smoke cloud near the sight line
//! blocks it.

use crate::entity::ViewAngles;
use nalgebra::{Point3, Vector2};

/// Flash blindness above this many seconds blocks all sight
pub const MAX_FLASH_DURATION: f64 = 1.5;

/// cos(~53°), half of a 16:9 horizontal field of view
pub const FOV_MIN_DOT: f64 = 0.6;

/// Approximate radius of a smoke cloud
pub const SMOKE_RADIUS: f64 = 140.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicFilter {
    pub max_flash_duration: f64,
    pub fov_min_dot: f64,
    pub smoke_radius: f64,
}

impl Default for HeuristicFilter {
    fn default() -> Self {
        Self {
            max_flash_duration: MAX_FLASH_DURATION,
            fov_min_dot: FOV_MIN_DOT,
            smoke_radius: SMOKE_RADIUS,
        }
    }
}

impl HeuristicFilter {
    /// Can an observer at `eye` looking along `view` perceive `target`?
    pub fn is_visible(
        &self,
        eye: &Point3<f64>,
        view: &ViewAngles,
        flash_duration: f64,
        target: &Point3<f64>,
        smokes: &[Point3<f64>],
    ) -> bool {
        if flash_duration > self.max_flash_duration {
            return false;
        }

        let to_target = Vector2::new(target.x - eye.x, target.y - eye.y);
        let dot = to_target
            .try_normalize(f64::EPSILON)
            .map_or(1.0, |dir| dir.dot(&view.forward_2d()));
        if dot < self.fov_min_dot {
            return false;
        }

        !smokes
            .iter()
            .any(|smoke| distance_to_segment(smoke, eye, target) < self.smoke_radius)
    }
}

/// Distance from `p` to the segment `a`-`b`
pub fn distance_to_segment(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return nalgebra::distance(p, a);
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    nalgebra::distance(p, &(a + ab * t))
}
