// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-tick entity snapshots fed in by the event stream decoder.

use nalgebra::{Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Stable entity identifier (0 is never a valid participant)
pub type EntityId = u64;

/// Side an entity plays on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Unassigned,
    Spectator,
    Attackers,
    Defenders,
}

impl Team {
    /// Only the two playing sides take part in visibility checks
    #[inline]
    pub fn is_playing(self) -> bool {
        matches!(self, Team::Attackers | Team::Defenders)
    }
}

/// View angles in degrees.
///
/// Yaw is measured counter-clockwise from +X. Pitch follows the engine
/// convention: positive looks down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewAngles {
    pub pitch: f64,
    pub yaw: f64,
}

impl ViewAngles {
    pub fn new(pitch: f64, yaw: f64) -> Self {
        Self { pitch, yaw }
    }

    /// Unit view direction projected onto the ground plane
    #[inline]
    pub fn forward_2d(&self) -> Vector2<f64> {
        let yaw = self.yaw.to_radians();
        Vector2::new(yaw.cos(), yaw.sin())
    }

    /// Angles that would look along `dir`
    pub fn looking_along(dir: &Vector3<f64>) -> Self {
        let horizontal = dir.x.hypot(dir.y);
        Self {
            pitch: -dir.z.atan2(horizontal).to_degrees(),
            yaw: dir.y.atan2(dir.x).to_degrees(),
        }
    }
}

/// Wrap an angle difference into `[-180, 180]`
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// One entity at one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub team: Team,
    pub alive: bool,
    /// Feet position
    pub position: Point3<f64>,
    pub view: ViewAngles,
    /// Remaining flash blindness in seconds
    pub flash_duration: f64,
}

impl EntitySnapshot {
    /// Living entity on a playing side with a valid id
    #[inline]
    pub fn participates(&self) -> bool {
        self.id != 0 && self.alive && self.team.is_playing()
    }

    /// Point `height` units above the feet
    #[inline]
    pub fn raised(&self, height: f64) -> Point3<f64> {
        Point3::new(self.position.x, self.position.y, self.position.z + height)
    }
}

/// Everything the evaluator needs for one simulation tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u32,
    pub entities: Vec<EntitySnapshot>,
    /// Centres of active smoke clouds
    pub smokes: Vec<Point3<f64>>,
}
