// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh loaders
//!
//! Both formats end in the same place: a flat triangle list handed to
//! [`Mesh::from_triangles`], which builds the BVH once.
//!
//! - [`gltf`]: binary chunked-buffer assets (`.gltf` / `.glb`), filtered by sub-mesh group
//! - [`obj`]: plain-text `v` / `f` polygon soup, used as a fallback

pub mod gltf;
pub mod obj;

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use std::path::Path;

pub use self::gltf::{load_gltf, parse_gltf};
pub use self::obj::{load_obj, parse_obj};

/// Physics groups kept by default: player clip, grenade clip,
/// bullet-blocking geometry and glass.
pub const DEFAULT_GROUPS: &[&str] = &["clip", "grenadeclip", "passbullets", "window"];

/// Which sub-meshes of an asset contribute triangles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubMeshFilter {
    /// Keep every triangle primitive
    All,
    /// Keep primitives whose mesh name, or failing that material name,
    /// contains one of these lowercase substrings
    Groups(Vec<String>),
}

impl Default for SubMeshFilter {
    fn default() -> Self {
        Self::Groups(DEFAULT_GROUPS.iter().map(|g| g.to_string()).collect())
    }
}

impl SubMeshFilter {
    pub fn all() -> Self {
        Self::All
    }

    /// Filter on a custom group list (matched case-insensitively)
    pub fn groups<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Groups(
            groups
                .into_iter()
                .map(|g| g.as_ref().to_lowercase())
                .collect(),
        )
    }

    /// Does a name belong to one of the groups?
    pub fn matches_name(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Groups(groups) => {
                let name = name.to_lowercase();
                groups.iter().any(|g| name.contains(g.as_str()))
            }
        }
    }

    /// Mesh name first, material name as a fallback
    pub fn includes(&self, mesh_name: Option<&str>, material_name: Option<&str>) -> bool {
        if matches!(self, Self::All) {
            return true;
        }
        mesh_name.is_some_and(|n| self.matches_name(n))
            || material_name.is_some_and(|n| self.matches_name(n))
    }
}

/// Load a mesh, choosing the loader from the file extension.
///
/// The sub-mesh filter only applies to glTF assets; OBJ files carry no
/// group semantics and are loaded whole.
pub fn load_mesh(path: &Path, filter: &SubMeshFilter) -> Result<Mesh> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("gltf") | Some("glb") => load_gltf(path, filter),
        Some("obj") => load_obj(path),
        _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
    }
}
