// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sightline Geometry
//!
//! Static level geometry for line-of-sight queries: triangle and box
//! primitives, Möller–Trumbore ray tests, a midpoint-split BVH, and
//! loaders for glTF/GLB physics hulls and OBJ meshes.
//!
//! Everything here uses world units, `f64` precision and nalgebra types.

pub mod bvh;
pub mod error;
pub mod intersect;
pub mod loaders;
pub mod mesh;
pub mod primitives;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};

pub use bvh::{Bvh, BvhStats, RayHit};
pub use error::{Error, Result};
pub use intersect::ray_triangle;
pub use loaders::{load_gltf, load_mesh, load_obj, parse_gltf, parse_obj, SubMeshFilter};
pub use mesh::Mesh;
pub use primitives::{Aabb, Triangle};
