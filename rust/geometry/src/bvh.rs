// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounding volume hierarchy over level triangles.
//!
//! The builder splits at the midpoint of the longest axis, partitioning by
//! triangle centroid. Triangles are reordered in place so every leaf owns a
//! contiguous run of the shared triangle array. The finished tree is
//! immutable and safe for concurrent read-only traversal.
//!
//! Two traversals are provided:
//! - [`Bvh::ray_cast`] finds the nearest hit and its surface normal
//! - [`Bvh::intersects`] stops at the first hit, for blocked/clear checks

use crate::intersect::ray_triangle;
use crate::primitives::{Aabb, Triangle};
use nalgebra::{Point3, Vector3};
use std::ops::Range;

/// Leaves are emitted at or below this many triangles
pub const MAX_LEAF_TRIANGLES: usize = 8;

/// Leaves are emitted at this depth regardless of size
pub const MAX_DEPTH: usize = 20;

/// Subtrees larger than this are built on the rayon pool
const PARALLEL_BUILD_THRESHOLD: usize = 4096;

/// Nearest intersection reported by [`Bvh::ray_cast`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance along the (normalized) ray direction
    pub distance: f64,
    /// Unit normal of the triangle that was hit
    pub normal: Vector3<f64>,
}

impl RayHit {
    /// World-space impact point
    #[inline]
    pub fn point(&self, origin: &Point3<f64>, dir: &Vector3<f64>) -> Point3<f64> {
        origin + dir * self.distance
    }
}

#[derive(Debug)]
enum BvhNode {
    Leaf {
        bounds: Aabb,
        triangles: Range<usize>,
    },
    Internal {
        bounds: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    #[inline]
    fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { bounds, .. } | BvhNode::Internal { bounds, .. } => bounds,
        }
    }
}

/// Shape summary of a built hierarchy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BvhStats {
    pub nodes: usize,
    pub leaves: usize,
    pub max_depth: usize,
    /// Sum of leaf sizes; always equals the input triangle count
    pub leaf_triangles: usize,
}

/// Triangle BVH
#[derive(Debug)]
pub struct Bvh {
    triangles: Vec<Triangle>,
    root: Option<BvhNode>,
}

impl Bvh {
    /// Build a hierarchy, taking ownership of the triangles
    pub fn build(mut triangles: Vec<Triangle>) -> Self {
        if triangles.is_empty() {
            return Self {
                triangles,
                root: None,
            };
        }

        let bounds = Aabb::from_triangles(&triangles);
        let root = build_recursive(&mut triangles, 0, bounds, 0);

        Self {
            triangles,
            root: Some(root),
        }
    }

    /// All triangles, in leaf order
    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Bounds of the whole hierarchy, `None` when empty
    pub fn bounds(&self) -> Option<Aabb> {
        self.root.as_ref().map(|root| *root.bounds())
    }

    /// Nearest hit within `max_distance` along the normalized `dir`
    pub fn ray_cast(
        &self,
        origin: &Point3<f64>,
        dir: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        let root = self.root.as_ref()?;
        self.ray_cast_node(root, origin, dir, max_distance)
    }

    /// True as soon as any triangle is hit within `max_distance`
    pub fn intersects(&self, origin: &Point3<f64>, dir: &Vector3<f64>, max_distance: f64) -> bool {
        match &self.root {
            Some(root) => self.intersects_node(root, origin, dir, max_distance),
            None => false,
        }
    }

    pub fn stats(&self) -> BvhStats {
        let mut stats = BvhStats::default();
        if let Some(root) = &self.root {
            collect_stats(root, 0, &mut stats);
        }
        stats
    }

    fn ray_cast_node(
        &self,
        node: &BvhNode,
        origin: &Point3<f64>,
        dir: &Vector3<f64>,
        max_distance: f64,
    ) -> Option<RayHit> {
        if !node.bounds().intersects_ray(origin, dir, max_distance) {
            return None;
        }

        match node {
            BvhNode::Leaf { triangles, .. } => {
                let mut best: Option<RayHit> = None;
                for tri in &self.triangles[triangles.clone()] {
                    let limit = best.map_or(max_distance, |hit| hit.distance);
                    if let Some(distance) = ray_triangle(origin, dir, tri, limit) {
                        best = Some(RayHit {
                            distance,
                            normal: tri.normal,
                        });
                    }
                }
                best
            }
            BvhNode::Internal { left, right, .. } => {
                let left_hit = self.ray_cast_node(left, origin, dir, max_distance);
                // Anything on the right must beat the left hit to matter
                let limit = left_hit.map_or(max_distance, |hit| hit.distance);
                let right_hit = self.ray_cast_node(right, origin, dir, limit);
                right_hit.or(left_hit)
            }
        }
    }

    fn intersects_node(
        &self,
        node: &BvhNode,
        origin: &Point3<f64>,
        dir: &Vector3<f64>,
        max_distance: f64,
    ) -> bool {
        if !node.bounds().intersects_ray(origin, dir, max_distance) {
            return false;
        }

        match node {
            BvhNode::Leaf { triangles, .. } => self.triangles[triangles.clone()]
                .iter()
                .any(|tri| ray_triangle(origin, dir, tri, max_distance).is_some()),
            BvhNode::Internal { left, right, .. } => {
                self.intersects_node(left, origin, dir, max_distance)
                    || self.intersects_node(right, origin, dir, max_distance)
            }
        }
    }
}

/// `offset` is the position of `triangles[0]` in the shared array.
fn build_recursive(triangles: &mut [Triangle], offset: usize, bounds: Aabb, depth: usize) -> BvhNode {
    let range = offset..offset + triangles.len();

    if triangles.len() <= MAX_LEAF_TRIANGLES || depth >= MAX_DEPTH {
        return BvhNode::Leaf {
            bounds,
            triangles: range,
        };
    }

    let axis = bounds.longest_axis();
    let split = bounds.center()[axis];
    let (mid, left_bounds, right_bounds) = partition(triangles, axis, split);

    // Every centroid on one side: splitting again would not make progress
    if mid == 0 || mid == triangles.len() {
        return BvhNode::Leaf {
            bounds,
            triangles: range,
        };
    }

    let (left_tris, right_tris) = triangles.split_at_mut(mid);
    let (left, right) = if left_tris.len() + right_tris.len() > PARALLEL_BUILD_THRESHOLD {
        rayon::join(
            || build_recursive(left_tris, offset, left_bounds, depth + 1),
            || build_recursive(right_tris, offset + mid, right_bounds, depth + 1),
        )
    } else {
        (
            build_recursive(left_tris, offset, left_bounds, depth + 1),
            build_recursive(right_tris, offset + mid, right_bounds, depth + 1),
        )
    };

    BvhNode::Internal {
        bounds: left.bounds().union(right.bounds()),
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Move triangles whose centroid lies below `split` to the front.
/// Returns the partition point and the bounds of both sides.
fn partition(triangles: &mut [Triangle], axis: usize, split: f64) -> (usize, Aabb, Aabb) {
    let mut left_bounds = Aabb::empty();
    let mut right_bounds = Aabb::empty();
    let mut mid = 0;

    for i in 0..triangles.len() {
        if triangles[i].centroid()[axis] < split {
            left_bounds.grow_triangle(&triangles[i]);
            triangles.swap(i, mid);
            mid += 1;
        } else {
            right_bounds.grow_triangle(&triangles[i]);
        }
    }

    (mid, left_bounds, right_bounds)
}

fn collect_stats(node: &BvhNode, depth: usize, stats: &mut BvhStats) {
    stats.nodes += 1;
    stats.max_depth = stats.max_depth.max(depth);
    match node {
        BvhNode::Leaf { triangles, .. } => {
            stats.leaves += 1;
            stats.leaf_triangles += triangles.len();
        }
        BvhNode::Internal { left, right, .. } => {
            collect_stats(left, depth + 1, stats);
            collect_stats(right, depth + 1, stats);
        }
    }
}
