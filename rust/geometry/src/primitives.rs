// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric value types shared by the BVH and the loaders.

use nalgebra::{Point3, Vector3};

/// A single triangle of level geometry with its precomputed unit normal.
///
/// Degenerate (zero-area) triangles carry a zero normal. They are kept:
/// the intersector rejects them as parallel, so they never block a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub v0: Point3<f64>,
    pub v1: Point3<f64>,
    pub v2: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Triangle {
    /// Create a triangle, computing its face normal from the winding
    pub fn new(v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) -> Self {
        let edge1 = v1 - v0;
        let edge2 = v2 - v0;
        let normal = edge1
            .cross(&edge2)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        Self { v0, v1, v2, normal }
    }

    /// Arithmetic mean of the three vertices
    #[inline]
    pub fn centroid(&self) -> Point3<f64> {
        Point3::from((self.v0.coords + self.v1.coords + self.v2.coords) / 3.0)
    }

    /// Triangle area
    #[inline]
    pub fn area(&self) -> f64 {
        (self.v1 - self.v0).cross(&(self.v2 - self.v0)).norm() * 0.5
    }

    /// Tight bounding box of the three vertices
    #[inline]
    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        aabb.grow_triangle(self);
        aabb
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// Create a box from its corners
    #[inline]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Inverted box that any grow operation replaces
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Bounding box of a point set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f64>>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.grow_point(p);
        }
        aabb
    }

    /// Bounding box of a triangle set
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut aabb = Self::empty();
        for tri in triangles {
            aabb.grow_triangle(tri);
        }
        aabb
    }

    /// True until something has been added
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    #[inline]
    pub fn grow_point(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    #[inline]
    pub fn grow_triangle(&mut self, tri: &Triangle) {
        self.grow_point(&tri.v0);
        self.grow_point(&tri.v1);
        self.grow_point(&tri.v2);
    }

    /// Smallest box enclosing both boxes
    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    #[inline]
    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Index of the longest axis (0 = x, 1 = y, 2 = z); ties favour the lower axis
    #[inline]
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// Inclusive containment test
    #[inline]
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Slab test: does the segment `origin + t * dir`, `t` in `[0, max_distance]`,
    /// touch this box?
    ///
    /// Zero direction components produce infinite inverse slopes, which the
    /// interval arithmetic handles without special casing. The only undefined
    /// product (`0 * inf`, origin exactly on a slab plane) means the origin lies
    /// within that slab, so the axis imposes no constraint.
    pub fn intersects_ray(&self, origin: &Point3<f64>, dir: &Vector3<f64>, max_distance: f64) -> bool {
        let mut t_min = 0.0_f64;
        let mut t_max = max_distance;

        for axis in 0..3 {
            let inv = 1.0 / dir[axis];
            let t0 = (self.min[axis] - origin[axis]) * inv;
            let t1 = (self.max[axis] - origin[axis]) * inv;

            if t0.is_nan() || t1.is_nan() {
                continue;
            }

            let (near, far) = if t0 <= t1 { (t0, t1) } else { (t1, t0) };
            if near > t_min {
                t_min = near;
            }
            if far < t_max {
                t_max = far;
            }
            if t_max < t_min {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    /// Independent per-axis interval intersection used as a reference.
    fn reference_hit(b: &Aabb, o: &Point3<f64>, d: &Vector3<f64>, max: f64) -> bool {
        let mut lo = 0.0_f64;
        let mut hi = max;
        for axis in 0..3 {
            if d[axis] == 0.0 {
                if o[axis] < b.min[axis] || o[axis] > b.max[axis] {
                    return false;
                }
                continue;
            }
            let a = (b.min[axis] - o[axis]) / d[axis];
            let c = (b.max[axis] - o[axis]) / d[axis];
            lo = lo.max(a.min(c));
            hi = hi.min(a.max(c));
        }
        lo <= hi
    }

    #[test]
    fn normal_follows_winding() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert_relative_eq!(tri.normal.z, 1.0);
        assert_relative_eq!(tri.area(), 0.5);
    }

    #[test]
    fn degenerate_triangle_has_zero_normal() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(2.0, 2.0, 2.0),
        );
        assert_eq!(tri.normal, Vector3::zeros());
        assert!(tri.normal.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn union_and_longest_axis() {
        let a = unit_box();
        let b = Aabb::new(Point3::new(2.0, -1.0, 0.0), Point3::new(5.0, 0.5, 0.5));
        let u = a.union(&b);
        assert_eq!(u.min, Point3::new(0.0, -1.0, 0.0));
        assert_eq!(u.max, Point3::new(5.0, 1.0, 1.0));
        assert_eq!(u.longest_axis(), 0);
        assert!(Aabb::empty().is_empty());
        assert!(!u.is_empty());
    }

    #[test]
    fn slab_hits_and_misses() {
        let b = unit_box();
        let o = Point3::new(-1.0, 0.5, 0.5);
        let d = Vector3::new(1.0, 0.0, 0.0);
        assert!(b.intersects_ray(&o, &d, 10.0));
        // Segment stops short of the box
        assert!(!b.intersects_ray(&o, &d, 0.5));
        // Pointing away
        assert!(!b.intersects_ray(&o, &(-d), 10.0));
        // Origin inside
        assert!(b.intersects_ray(&Point3::new(0.5, 0.5, 0.5), &d, 0.01));
    }

    #[test]
    fn slab_handles_origin_on_face_with_zero_component() {
        let b = unit_box();
        // Travels along the y = 0 face
        let o = Point3::new(-1.0, 0.0, 0.5);
        let d = Vector3::new(1.0, 0.0, 0.0);
        assert!(b.intersects_ray(&o, &d, 5.0));
    }

    #[test]
    fn slab_hits_flat_box() {
        let flat = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0));
        let o = Point3::new(0.5, 0.5, 1.0);
        let d = Vector3::new(0.0, 0.0, -1.0);
        assert!(flat.intersects_ray(&o, &d, 2.0));
    }

    #[test]
    fn slab_matches_reference_on_a_sweep() {
        let boxes = [
            unit_box(),
            Aabb::new(Point3::new(-3.0, 2.0, -1.0), Point3::new(-1.0, 4.0, 2.5)),
            Aabb::new(Point3::new(5.0, 5.0, 5.0), Point3::new(5.5, 9.0, 6.0)),
        ];
        let mut checked = 0;
        for ox in [-4.0, -0.5, 0.5, 3.0] {
            for oy in [-2.0, 0.25, 3.0, 7.0] {
                for oz in [-1.5, 0.5, 5.5] {
                    let origin = Point3::new(ox, oy, oz);
                    for dx in [-1.0, -0.3, 0.0, 0.7] {
                        for dy in [-0.8, 0.0, 0.6] {
                            for dz in [-1.0, 0.0, 0.4] {
                                let raw = Vector3::new(dx, dy, dz);
                                let Some(dir) = raw.try_normalize(1e-12) else {
                                    continue;
                                };
                                for max in [1.0, 4.0, 50.0] {
                                    for b in &boxes {
                                        assert_eq!(
                                            b.intersects_ray(&origin, &dir, max),
                                            reference_hit(b, &origin, &dir, max),
                                            "origin {origin:?} dir {dir:?} max {max} box {b:?}"
                                        );
                                        checked += 1;
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        assert!(checked > 1000);
    }
}
