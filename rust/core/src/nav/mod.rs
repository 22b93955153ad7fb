// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Navigation mesh parsing and place lookup.
//!
//! ```text
//! header (little-endian):
//!   magic      u32  0xFEEDFACE
//!   version    u32
//!   subversion u32
//!   bsp size   u32
//! body:
//!   version == 16  -> legacy layout  (axis-aligned areas, inline place table)
//!   version >= 31  -> polygon layout (shared corner/polygon pools)
//! ```
//!
//! The two bodies share no structure, so each has its own decoder and the
//! version picks one of them exactly once.

mod legacy;
mod polygon;

use crate::callout::{Callout, CalloutRegion};
use crate::error::{Error, Result};
use crate::reader::ByteReader;
use nalgebra::Point3;
use smallvec::SmallVec;
use std::path::Path;

/// File magic, read little-endian
pub const NAV_MAGIC: u32 = 0xFEED_FACE;

/// The only legacy version with a known layout
pub const LEGACY_VERSION: u32 = 16;

/// First version using the polygon layout
pub const POLYGON_MIN_VERSION: u32 = 31;

/// Areas whose mean height differs from the query by this much never match
pub const MAX_AREA_Z_DISTANCE: f64 = 10_000.0;

/// Fixed header preceding either layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavHeader {
    pub version: u32,
    pub subversion: u32,
    pub bsp_size: u32,
}

/// Which body layout the file used, with its layout-specific metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavLayout {
    Legacy {
        /// Whether the mesh went through the editor's analysis pass
        analyzed: bool,
    },
    Polygon {
        corner_count: usize,
        polygon_count: usize,
    },
}

/// Result of a body decoder
#[derive(Debug)]
pub(crate) struct NavBody {
    pub layout: NavLayout,
    pub places: Vec<String>,
    pub areas: Vec<NavArea>,
}

/// A walkable region with a polygonal footprint
#[derive(Debug, Clone, PartialEq)]
pub struct NavArea {
    pub id: u32,
    pub flags: u32,
    /// 1-based index into the place table, 0 for none
    pub place_id: u16,
    corners: SmallVec<[Point3<f64>; 4]>,
    min: Point3<f64>,
    max: Point3<f64>,
}

impl NavArea {
    pub fn new(id: u32, flags: u32, place_id: u16, corners: SmallVec<[Point3<f64>; 4]>) -> Self {
        let mut min = Point3::origin();
        let mut max = Point3::origin();
        if let Some(first) = corners.first() {
            min = *first;
            max = *first;
            for c in &corners[1..] {
                min = min.inf(c);
                max = max.sup(c);
            }
        }
        Self {
            id,
            flags,
            place_id,
            corners,
            min,
            max,
        }
    }

    /// Boundary corners in file order
    #[inline]
    pub fn corners(&self) -> &[Point3<f64>] {
        &self.corners
    }

    /// Axis-aligned bounds of the corners as `(min, max)`
    #[inline]
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        (self.min, self.max)
    }

    /// Mean of the corners
    pub fn center(&self) -> Point3<f64> {
        if self.corners.is_empty() {
            return Point3::origin();
        }
        let sum = self
            .corners
            .iter()
            .fold(nalgebra::Vector3::zeros(), |acc, c| acc + c.coords);
        Point3::from(sum / self.corners.len() as f64)
    }

    /// Even-odd point-in-polygon test on the XY plane
    pub fn contains_2d(&self, x: f64, y: f64) -> bool {
        if self.corners.len() < 3 || x < self.min.x || x > self.max.x || y < self.min.y || y > self.max.y {
            return false;
        }

        let mut inside = false;
        let mut j = self.corners.len() - 1;
        for i in 0..self.corners.len() {
            let (a, b) = (&self.corners[i], &self.corners[j]);
            if (a.y > y) != (b.y > y) && x < (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}

/// Parsed navigation mesh
#[derive(Debug, Clone)]
pub struct NavMesh {
    header: NavHeader,
    layout: NavLayout,
    places: Vec<String>,
    areas: Vec<NavArea>,
}

impl NavMesh {
    /// Read and parse a `.nav` file
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let mesh = Self::parse(&data)?;
        tracing::info!(
            path = %path.display(),
            version = mesh.header.version,
            areas = mesh.areas.len(),
            places = mesh.places.len(),
            "Loaded navigation mesh"
        );
        Ok(mesh)
    }

    /// Parse a navigation mesh from memory
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(data);

        let magic = r.u32("magic")?;
        if magic != NAV_MAGIC {
            return Err(Error::BadMagic { found: magic });
        }
        let header = NavHeader {
            version: r.u32("version")?,
            subversion: r.u32("subversion")?,
            bsp_size: r.u32("bsp size")?,
        };

        let body = match header.version {
            v if v >= POLYGON_MIN_VERSION => polygon::decode(&mut r, v)?,
            LEGACY_VERSION => legacy::decode(&mut r)?,
            v => return Err(Error::UnsupportedVersion(v)),
        };

        if r.remaining() > 0 {
            tracing::debug!(
                version = header.version,
                trailing = r.remaining(),
                "Ignoring trailing bytes after last area"
            );
        }

        Ok(Self {
            header,
            layout: body.layout,
            places: body.places,
            areas: body.areas,
        })
    }

    pub fn header(&self) -> &NavHeader {
        &self.header
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    pub fn layout(&self) -> NavLayout {
        self.layout
    }

    /// Place names, indexed by `place_id - 1`. Unnamed slots are empty.
    pub fn places(&self) -> &[String] {
        &self.places
    }

    pub fn areas(&self) -> &[NavArea] {
        &self.areas
    }

    /// Area whose footprint contains `pos` in 2D, closest in height
    pub fn nearest_area(&self, pos: &Point3<f64>) -> Option<&NavArea> {
        self.areas
            .iter()
            .filter(|area| area.contains_2d(pos.x, pos.y))
            .map(|area| (area, (pos.z - area.center().z).abs()))
            .filter(|(_, dz)| *dz < MAX_AREA_Z_DISTANCE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(area, _)| area)
    }

    /// Place name of an area, if it has a non-empty one
    pub fn place_of(&self, area: &NavArea) -> Option<&str> {
        let index = (area.place_id as usize).checked_sub(1)?;
        self.places
            .get(index)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    /// Place name at a world position
    pub fn place_name(&self, pos: &Point3<f64>) -> Option<&str> {
        self.place_of(self.nearest_area(pos)?)
    }

    /// Name places from point-seed callouts.
    ///
    /// The place table is grown to cover every place id referenced by an
    /// area, then each seed writes its name at the place of the area it
    /// falls in. Returns the number of seeds that landed on a place.
    pub fn assign_callout_seeds(&mut self, callouts: &[Callout]) -> usize {
        let max_place = self.areas.iter().map(|a| a.place_id).max().unwrap_or(0) as usize;
        if self.places.len() < max_place {
            self.places.resize(max_place, String::new());
        }

        let mut mapped = 0;
        for callout in callouts {
            let CalloutRegion::Seed(seed) = &callout.region else {
                continue;
            };
            let Some(place_id) = self.nearest_area(seed).map(|a| a.place_id) else {
                continue;
            };
            if let Some(slot) = (place_id as usize)
                .checked_sub(1)
                .and_then(|i| self.places.get_mut(i))
            {
                *slot = callout.name.clone();
                mapped += 1;
            }
        }

        tracing::debug!(mapped, seeds = callouts.len(), "Mapped callout seeds to places");
        mapped
    }
}
