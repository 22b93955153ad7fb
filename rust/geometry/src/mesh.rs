// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Level mesh: the filtered triangle set plus its BVH

use crate::bvh::{Bvh, BvhStats, RayHit};
use crate::primitives::{Aabb, Triangle};
use nalgebra::{Point3, Vector3};

/// Segments shorter than this are never blocked
const MIN_SEGMENT_LENGTH: f64 = 1e-9;

/// Static level geometry, built once per level load
#[derive(Debug)]
pub struct Mesh {
    bvh: Bvh,
}

impl Mesh {
    /// Build the BVH over `triangles`
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self {
            bvh: Bvh::build(triangles),
        }
    }

    /// Triangles in BVH leaf order
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        self.bvh.triangles()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.bvh.triangles().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bvh.triangles().is_empty()
    }

    /// Bounds of all geometry, `None` for an empty mesh
    pub fn bounds(&self) -> Option<Aabb> {
        self.bvh.bounds()
    }

    pub fn bvh_stats(&self) -> BvhStats {
        self.bvh.stats()
    }

    /// Nearest surface hit along the normalized `dir`
    #[inline]
    pub fn ray_cast(
        &self,
        origin: &Point3<f64>,
        dir: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        self.bvh.ray_cast(origin, dir, max_distance)
    }

    /// Any-hit test along the normalized `dir`
    #[inline]
    pub fn intersects(&self, origin: &Point3<f64>, dir: &Vector3<f64>, max_distance: f64) -> bool {
        self.bvh.intersects(origin, dir, max_distance)
    }

    /// Is the straight segment from `start` to `end` obstructed?
    ///
    /// Degenerate (zero-length) segments have no direction and are never blocked.
    pub fn segment_blocked(&self, start: &Point3<f64>, end: &Point3<f64>) -> bool {
        let delta = end - start;
        let length = delta.norm();
        if length < MIN_SEGMENT_LENGTH {
            return false;
        }
        self.bvh.intersects(start, &(delta / length), length)
    }
}
