// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ray–triangle intersection

use crate::primitives::Triangle;
use nalgebra::{Point3, Vector3};

/// Determinants and distances below this are treated as zero
pub const EPSILON: f64 = 1e-6;

/// Möller–Trumbore ray-triangle intersection test.
///
/// Returns the hit distance `t` along the normalized `dir`, with
/// `EPSILON < t < max_distance`. Both windings are hit: level geometry
/// blocks from either side, so there is no backface culling.
#[inline]
pub fn ray_triangle(
    origin: &Point3<f64>,
    dir: &Vector3<f64>,
    tri: &Triangle,
    max_distance: f64,
) -> Option<f64> {
    let edge1 = tri.v1 - tri.v0;
    let edge2 = tri.v2 - tri.v0;

    let h = dir.cross(&edge2);
    let a = edge1.dot(&h);

    if a.abs() < EPSILON {
        return None; // ray parallel to triangle
    }

    let f = 1.0 / a;
    let s = origin - tri.v0;
    let u = f * s.dot(&h);

    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * dir.dot(&q);

    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > EPSILON && t < max_distance).then_some(t)
}
