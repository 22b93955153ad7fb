// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named map regions ("callouts").
//!
//! Callout files are a JSON array. Each entry is either a box
//! `{"name", "min": {x,y,z}, "max": {x,y,z}}` or a point seed
//! `{"name", "x", "y", "z"}`.

use crate::error::{Error, Result};
use nalgebra::Point3;
use serde::Deserialize;
use std::path::Path;

/// Seeds further than this from a query never match
pub const MAX_SEED_DISTANCE: f64 = 500.0;

/// Region covered by a callout
#[derive(Debug, Clone, PartialEq)]
pub enum CalloutRegion {
    /// Inclusive axis-aligned box
    Bounds { min: Point3<f64>, max: Point3<f64> },
    /// Single point, matched by proximity
    Seed(Point3<f64>),
}

/// A named region of the map
#[derive(Debug, Clone, PartialEq)]
pub struct Callout {
    pub name: String,
    pub region: CalloutRegion,
}

impl Callout {
    pub fn bounds(name: impl Into<String>, min: Point3<f64>, max: Point3<f64>) -> Self {
        Self {
            name: name.into(),
            region: CalloutRegion::Bounds { min, max },
        }
    }

    pub fn seed(name: impl Into<String>, point: Point3<f64>) -> Self {
        Self {
            name: name.into(),
            region: CalloutRegion::Seed(point),
        }
    }

    /// Box containment; seeds contain nothing
    pub fn contains(&self, pos: &Point3<f64>) -> bool {
        match &self.region {
            CalloutRegion::Bounds { min, max } => {
                (0..3).all(|axis| pos[axis] >= min[axis] && pos[axis] <= max[axis])
            }
            CalloutRegion::Seed(_) => false,
        }
    }
}

#[derive(Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
    z: f64,
}

impl From<RawPoint> for Point3<f64> {
    fn from(p: RawPoint) -> Self {
        Point3::new(p.x, p.y, p.z)
    }
}

#[derive(Deserialize)]
struct RawCallout {
    name: String,
    min: Option<RawPoint>,
    max: Option<RawPoint>,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    z: f64,
}

impl From<RawCallout> for Callout {
    fn from(raw: RawCallout) -> Self {
        match (raw.min, raw.max) {
            (Some(min), Some(max)) => Callout::bounds(raw.name, min.into(), max.into()),
            _ => Callout::seed(raw.name, Point3::new(raw.x, raw.y, raw.z)),
        }
    }
}

/// Decode a callout list from JSON text
pub fn parse_callouts(json: &str) -> Result<Vec<Callout>> {
    let raw: Vec<RawCallout> = serde_json::from_str(json)?;
    Ok(raw.into_iter().map(Callout::from).collect())
}

/// Read and decode a callout file
pub fn load_callouts(path: &Path) -> Result<Vec<Callout>> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let callouts = parse_callouts(&text)?;
    tracing::info!(path = %path.display(), callouts = callouts.len(), "Loaded callouts");
    Ok(callouts)
}

/// Name of the callout at `pos`.
///
/// Boxes take priority (first match in file order). Otherwise the nearest
/// seed strictly within [`MAX_SEED_DISTANCE`] wins.
pub fn find_callout<'a>(pos: &Point3<f64>, callouts: &'a [Callout]) -> Option<&'a str> {
    if let Some(hit) = callouts.iter().find(|c| c.contains(pos)) {
        return Some(&hit.name);
    }

    let mut best: Option<(&'a str, f64)> = None;
    for callout in callouts {
        if let CalloutRegion::Seed(seed) = &callout.region {
            let distance = nalgebra::distance(seed, pos);
            if distance < best.map_or(MAX_SEED_DISTANCE, |(_, d)| d) {
                best = Some((&callout.name, distance));
            }
        }
    }
    best.map(|(name, _)| name)
}
