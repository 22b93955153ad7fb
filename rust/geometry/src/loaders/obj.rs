// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wavefront OBJ loader
//!
//! Reads `v x y z` vertices and `f` faces. Face entries may carry
//! `/vt/vn` suffixes (ignored) and negative, end-relative indices.
//! Polygons are fan-triangulated from their first vertex.

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::primitives::Triangle;
use nalgebra::Point3;
use smallvec::SmallVec;
use std::path::Path;

/// Load an OBJ file and build its mesh
pub fn load_obj(path: &Path) -> Result<Mesh> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let triangles = parse_obj(&text)?;
    tracing::info!(
        path = %path.display(),
        triangles = triangles.len(),
        "Loaded OBJ mesh"
    );
    Ok(Mesh::from_triangles(triangles))
}

/// Parse OBJ text into a triangle list
pub fn parse_obj(text: &str) -> Result<Vec<Triangle>> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut triangles = Vec::new();

    for (line_index, raw) in text.lines().enumerate() {
        let line_no = line_index + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0f64; 3];
                for c in coords.iter_mut() {
                    let token = tokens
                        .next()
                        .ok_or_else(|| Error::obj(line_no, "vertex needs three coordinates"))?;
                    *c = token
                        .parse()
                        .map_err(|_| Error::obj(line_no, format!("invalid coordinate '{token}'")))?;
                }
                vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            }
            Some("f") => {
                let mut face: SmallVec<[usize; 8]> = SmallVec::new();
                let mut dangling = None;
                for token in tokens {
                    match resolve_index(token, vertices.len(), line_no)? {
                        Some(index) => face.push(index),
                        None => dangling = dangling.or(Some(token)),
                    }
                }
                if let Some(token) = dangling {
                    tracing::warn!(
                        line = line_no,
                        index = token,
                        vertices = vertices.len(),
                        "Skipping face with out-of-range vertex index"
                    );
                    continue;
                }
                if face.len() < 3 {
                    tracing::debug!(line = line_no, corners = face.len(), "Skipping degenerate face");
                    continue;
                }
                for i in 1..face.len() - 1 {
                    triangles.push(Triangle::new(
                        vertices[face[0]],
                        vertices[face[i]],
                        vertices[face[i + 1]],
                    ));
                }
            }
            // vt, vn, g, o, usemtl, s, ...
            _ => {}
        }
    }

    Ok(triangles)
}

/// Resolve a face token (`7`, `7/2`, `7//3`, `-1`) to a zero-based vertex index.
///
/// `None` when the index does not name a vertex defined so far.
fn resolve_index(token: &str, vertex_count: usize, line_no: usize) -> Result<Option<usize>> {
    let head = token.split('/').next().unwrap_or(token);
    let index: i64 = head
        .parse()
        .map_err(|_| Error::obj(line_no, format!("invalid face index '{token}'")))?;

    let resolved = match index {
        0 => None,
        i if i > 0 => Some(i as usize - 1),
        i => vertex_count.checked_sub(i.unsigned_abs() as usize),
    };
    Ok(resolved.filter(|&i| i < vertex_count))
}
