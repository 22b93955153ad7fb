// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Level manager: owns the currently loaded level and answers
//! line-of-sight queries against it.
//!
//! States:
//! - `Unloaded`: nothing requested yet, every query is visible
//! - `Loaded`: queries go through the level BVH
//! - `Fallback`: no usable mesh for the requested level, every query is
//!   visible so the heuristic filter has the final say
//!
//! Levels are built outside the lock and swapped in as an `Arc`, so
//! readers never observe a half-loaded level and never block on a load.

use crate::error::{Error, Result};
use nalgebra::{Point3, Vector3};
use sightline_core::{find_callout, load_callouts, Callout, NavMesh};
use sightline_geometry::{load_mesh, Mesh, RayHit, SubMeshFilter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// Boolean line-of-sight oracle shared with worker threads
pub trait LineOfSight: Send + Sync {
    /// Is the segment from `from` to `to` unobstructed?
    fn is_visible(&self, from: &Point3<f64>, to: &Point3<f64>) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    Unloaded,
    Loaded,
    Fallback,
}

/// Outcome of [`MapManager::load_level`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelStatus {
    Loaded { triangles: usize },
    Fallback,
}

/// A level's mesh with its optional navigation mesh and callouts
#[derive(Debug)]
pub struct LoadedLevel {
    name: String,
    source: PathBuf,
    mesh: Mesh,
    nav: Option<NavMesh>,
    callouts: Vec<Callout>,
}

impl LoadedLevel {
    /// Load a level mesh from an explicit file
    pub fn open(name: impl Into<String>, path: &Path, filter: &SubMeshFilter) -> Result<Self> {
        let mesh = load_mesh(path, filter)?;
        Ok(Self {
            name: name.into(),
            source: path.to_path_buf(),
            mesh,
            nav: None,
            callouts: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the mesh was loaded from
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn nav(&self) -> Option<&NavMesh> {
        self.nav.as_ref()
    }

    pub fn callouts(&self) -> &[Callout] {
        &self.callouts
    }

    /// Attach a navigation mesh, naming its places from any seed callouts
    pub fn set_nav(&mut self, mut nav: NavMesh) {
        if !self.callouts.is_empty() {
            nav.assign_callout_seeds(&self.callouts);
        }
        self.nav = Some(nav);
    }

    /// Attach callouts, naming nav places from their seeds
    pub fn set_callouts(&mut self, callouts: Vec<Callout>) {
        if let Some(nav) = self.nav.as_mut() {
            nav.assign_callout_seeds(&callouts);
        }
        self.callouts = callouts;
    }

    /// Location name: callout regions first, nav places second
    pub fn callout(&self, pos: &Point3<f64>) -> Option<&str> {
        find_callout(pos, &self.callouts).or_else(|| self.nav.as_ref()?.place_name(pos))
    }

    /// Load the `.nav` and callout files stored next to the mesh.
    ///
    /// Both are optional; failures are logged and leave the level usable.
    fn attach_companions(&mut self, maps_dir: &Path) {
        let name = self.name.clone();

        let nav_path = maps_dir.join(&name).join(format!("{name}.nav"));
        if nav_path.is_file() {
            match NavMesh::load(&nav_path) {
                Ok(nav) => self.set_nav(nav),
                Err(e) => tracing::warn!(path = %nav_path.display(), error = %e, "Failed to load navigation mesh"),
            }
        } else {
            tracing::debug!(path = %nav_path.display(), "No navigation mesh");
        }

        let places = [
            maps_dir.join(&name).join(format!("{name}_places.json")),
            maps_dir.join(format!("{name}_places.json")),
        ];
        match places.iter().find(|p| p.is_file()) {
            Some(path) => match load_callouts(path) {
                Ok(callouts) => self.set_callouts(callouts),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to load callouts"),
            },
            None => tracing::debug!(level = %name, "No callout file"),
        }
    }
}

impl LineOfSight for LoadedLevel {
    #[inline]
    fn is_visible(&self, from: &Point3<f64>, to: &Point3<f64>) -> bool {
        !self.mesh.segment_blocked(from, to)
    }
}

#[derive(Debug, Default)]
enum Slot {
    #[default]
    Unloaded,
    Loaded(Arc<LoadedLevel>),
    Fallback(String),
}

/// Reduce a level reference to its bare name (`maps/de_dust2.bsp` -> `de_dust2`)
pub fn sanitize_level_name(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name)
        .to_string()
}

/// Owns the current level and answers visibility queries
#[derive(Debug)]
pub struct MapManager {
    maps_dir: PathBuf,
    filter: SubMeshFilter,
    slot: RwLock<Slot>,
}

impl MapManager {
    pub fn new(maps_dir: impl Into<PathBuf>) -> Self {
        Self {
            maps_dir: maps_dir.into(),
            filter: SubMeshFilter::default(),
            slot: RwLock::new(Slot::Unloaded),
        }
    }

    /// Override which glTF sub-meshes count as solid
    pub fn with_filter(mut self, filter: SubMeshFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn maps_dir(&self) -> &Path {
        &self.maps_dir
    }

    fn read(&self) -> RwLockReadGuard<'_, Slot> {
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn replace(&self, slot: Slot) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = slot;
    }

    /// Handle to the loaded level, if any
    pub fn level(&self) -> Option<Arc<LoadedLevel>> {
        match &*self.read() {
            Slot::Loaded(level) => Some(Arc::clone(level)),
            _ => None,
        }
    }

    pub fn state(&self) -> LevelState {
        match &*self.read() {
            Slot::Unloaded => LevelState::Unloaded,
            Slot::Loaded(_) => LevelState::Loaded,
            Slot::Fallback(_) => LevelState::Fallback,
        }
    }

    /// Name of the level last requested
    pub fn level_name(&self) -> Option<String> {
        match &*self.read() {
            Slot::Unloaded => None,
            Slot::Loaded(level) => Some(level.name.clone()),
            Slot::Fallback(name) => Some(name.clone()),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(&*self.read(), Slot::Loaded(_))
    }

    /// Mesh files tried for a level, in priority order
    pub fn mesh_candidates(&self, name: &str) -> Vec<PathBuf> {
        let nested = self.maps_dir.join(name);
        vec![
            nested.join(format!("{name}_physics.gltf")),
            nested.join(format!("{name}_physics.glb")),
            nested.join(format!("{name}.gltf")),
            nested.join(format!("{name}.glb")),
            self.maps_dir.join(format!("{name}.gltf")),
            self.maps_dir.join(format!("{name}.glb")),
            nested.join(format!("{name}.obj")),
            self.maps_dir.join(format!("{name}.obj")),
        ]
    }

    /// Switch to a level.
    ///
    /// Never fails: if no candidate mesh loads, the manager enters fallback
    /// mode. Requesting the level that is already loaded is a no-op.
    pub fn load_level(&self, name: &str) -> LevelStatus {
        let name = sanitize_level_name(name);

        if let Slot::Loaded(level) = &*self.read() {
            if level.name == name {
                return LevelStatus::Loaded {
                    triangles: level.mesh.triangle_count(),
                };
            }
        }

        match self.open_level(&name) {
            Ok(level) => {
                let triangles = level.mesh.triangle_count();
                tracing::info!(
                    level = %name,
                    path = %level.source.display(),
                    triangles,
                    nav = level.nav.is_some(),
                    callouts = level.callouts.len(),
                    "Level loaded"
                );
                self.replace(Slot::Loaded(Arc::new(level)));
                LevelStatus::Loaded { triangles }
            }
            Err(e) => {
                tracing::info!(level = %name, reason = %e, "Using heuristic visibility");
                self.replace(Slot::Fallback(name));
                LevelStatus::Fallback
            }
        }
    }

    /// Load a level or report why it could not be loaded
    pub fn require_level(&self, name: &str) -> Result<Arc<LoadedLevel>> {
        match self.load_level(name) {
            LevelStatus::Loaded { .. } => self
                .level()
                .ok_or_else(|| Error::LevelNotFound(sanitize_level_name(name))),
            LevelStatus::Fallback => Err(Error::LevelNotFound(sanitize_level_name(name))),
        }
    }

    fn open_level(&self, name: &str) -> Result<LoadedLevel> {
        for path in self.mesh_candidates(name) {
            if !path.is_file() {
                continue;
            }
            tracing::debug!(path = %path.display(), "Trying level mesh");
            match LoadedLevel::open(name, &path, &self.filter) {
                Ok(mut level) => {
                    level.attach_companions(&self.maps_dir);
                    return Ok(level);
                }
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to load level mesh"),
            }
        }
        Err(Error::LevelNotFound(name.to_string()))
    }

    /// Drop the current level
    pub fn unload(&self) {
        self.replace(Slot::Unloaded);
    }

    /// Nearest surface hit, `None` without a loaded level
    pub fn ray_cast(&self, origin: &Point3<f64>, dir: &Vector3<f64>, max_distance: f64) -> Option<RayHit> {
        self.level()?.mesh.ray_cast(origin, dir, max_distance)
    }

    /// Location name at `pos`
    pub fn callout(&self, pos: &Point3<f64>) -> Option<String> {
        self.level()?.callout(pos).map(str::to_string)
    }
}

impl LineOfSight for MapManager {
    /// Visible unless a loaded level's geometry blocks the segment
    fn is_visible(&self, from: &Point3<f64>, to: &Point3<f64>) -> bool {
        match self.level() {
            Some(level) => level.is_visible(from, to),
            None => true,
        }
    }
}
