// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! glTF 2.0 physics-hull loader.
//!
//! Only what ray tests need is decoded: `POSITION` attributes stored as
//! little-endian `f32` triples (with optional interleaving stride) and
//! `u8` / `u16` / `u32` index buffers. Primitives that are not plain
//! triangle lists are skipped, as are sub-meshes outside the filter.
//!
//! GLB layout:
//! ```text
//!  0-3   magic "glTF"
//!  4-7   version (u32 LE, must be 2)
//!  8-11  total length (u32 LE)
//!  then chunks: length (u32 LE), type (u32 LE), payload
//!        first chunk is JSON, optional second chunk is BIN
//! ```

use super::SubMeshFilter;
use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::primitives::Triangle;
use base64::Engine as _;
use byteorder::{LittleEndian, ReadBytesExt};
use nalgebra::Point3;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::borrow::Cow;
use std::io;
use std::path::Path;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_HEADER_LEN: usize = 12;
const CHUNK_JSON: u32 = 0x4E4F_534A;
const CHUNK_BIN: u32 = 0x004E_4942;

const MODE_TRIANGLES: u32 = 4;

const COMPONENT_UNSIGNED_BYTE: u32 = 5121;
const COMPONENT_UNSIGNED_SHORT: u32 = 5123;
const COMPONENT_UNSIGNED_INT: u32 = 5125;
const COMPONENT_FLOAT: u32 = 5126;

/// Three `f32` components
const POSITION_SIZE: usize = 12;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    buffers: Vec<BufferDef>,
    #[serde(default)]
    buffer_views: Vec<BufferViewDef>,
    #[serde(default)]
    accessors: Vec<AccessorDef>,
    #[serde(default)]
    meshes: Vec<MeshDef>,
    #[serde(default)]
    materials: Vec<MaterialDef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferDef {
    uri: Option<String>,
    byte_length: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BufferViewDef {
    buffer: usize,
    #[serde(default)]
    byte_offset: usize,
    byte_length: usize,
    byte_stride: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessorDef {
    buffer_view: Option<usize>,
    #[serde(default)]
    byte_offset: usize,
    component_type: u32,
    count: usize,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct MeshDef {
    name: Option<String>,
    #[serde(default)]
    primitives: Vec<PrimitiveDef>,
}

#[derive(Debug, Deserialize)]
struct PrimitiveDef {
    #[serde(default)]
    attributes: FxHashMap<String, usize>,
    indices: Option<usize>,
    material: Option<usize>,
    #[serde(default = "default_mode")]
    mode: u32,
}

fn default_mode() -> u32 {
    MODE_TRIANGLES
}

#[derive(Debug, Deserialize)]
struct MaterialDef {
    name: Option<String>,
}

/// Load a `.gltf` or `.glb` file.
///
/// External buffers are resolved relative to the file's directory.
pub fn load_gltf(path: &Path, filter: &SubMeshFilter) -> Result<Mesh> {
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    let mesh = parse_gltf(&bytes, path.parent(), filter)?;
    tracing::info!(
        path = %path.display(),
        triangles = mesh.triangle_count(),
        "Loaded glTF mesh"
    );
    Ok(mesh)
}

/// Decode a glTF document (JSON or GLB container) and build its mesh.
pub fn parse_gltf(bytes: &[u8], base_dir: Option<&Path>, filter: &SubMeshFilter) -> Result<Mesh> {
    let (json, bin) = if bytes.starts_with(GLB_MAGIC) {
        split_glb(bytes)?
    } else {
        (bytes, None)
    };

    let doc: Document = serde_json::from_slice(json)?;
    let buffers = resolve_buffers(&doc, bin, base_dir)?;
    let triangles = extract_triangles(&doc, &buffers, filter)?;

    tracing::debug!(triangles = triangles.len(), "Building BVH");
    Ok(Mesh::from_triangles(triangles))
}

fn read_u32_le(bytes: &[u8], offset: usize) -> Option<u32> {
    let mut field = bytes.get(offset..)?;
    field.read_u32::<LittleEndian>().ok()
}

/// Split a GLB container into its JSON and optional BIN payloads
fn split_glb(bytes: &[u8]) -> Result<(&[u8], Option<&[u8]>)> {
    let version = read_u32_le(bytes, 4).ok_or(Error::InvalidGlb("truncated header"))?;
    if version != 2 {
        return Err(Error::InvalidGlb("unsupported container version"));
    }
    let total = read_u32_le(bytes, 8).ok_or(Error::InvalidGlb("truncated header"))? as usize;
    let bytes = bytes
        .get(..total)
        .ok_or(Error::InvalidGlb("declared length exceeds file size"))?;

    let mut offset = GLB_HEADER_LEN;
    let mut json = None;
    let mut bin = None;

    while offset < bytes.len() {
        let len = read_u32_le(bytes, offset).ok_or(Error::InvalidGlb("truncated chunk header"))? as usize;
        let kind = read_u32_le(bytes, offset + 4).ok_or(Error::InvalidGlb("truncated chunk header"))?;
        let start = offset + 8;
        let payload = start
            .checked_add(len)
            .and_then(|end| bytes.get(start..end))
            .ok_or(Error::InvalidGlb("chunk exceeds container"))?;

        match kind {
            CHUNK_JSON if json.is_none() => json = Some(payload),
            CHUNK_BIN if bin.is_none() => bin = Some(payload),
            _ => {} // unknown chunks are skipped
        }

        // Chunks are 4-byte aligned
        offset = start + payload.len().div_ceil(4) * 4;
    }

    let json = json.ok_or(Error::InvalidGlb("missing JSON chunk"))?;
    Ok((json, bin))
}

fn resolve_buffers<'a>(
    doc: &Document,
    bin: Option<&'a [u8]>,
    base_dir: Option<&Path>,
) -> Result<Vec<Cow<'a, [u8]>>> {
    doc.buffers
        .iter()
        .enumerate()
        .map(|(index, def)| {
            let data: Cow<'a, [u8]> = match def.uri.as_deref() {
                None => match bin {
                    Some(bin) => Cow::Borrowed(bin),
                    None => {
                        return Err(Error::UnresolvedBuffer {
                            index,
                            reason: "no uri and no GLB binary chunk".into(),
                        })
                    }
                },
                Some(uri) if uri.starts_with("data:") => {
                    let (_, payload) = uri.split_once(";base64,").ok_or_else(|| Error::UnresolvedBuffer {
                        index,
                        reason: "data uri is not base64 encoded".into(),
                    })?;
                    let decoded = base64::engine::general_purpose::STANDARD
                        .decode(payload)
                        .map_err(|source| Error::Base64 { index, source })?;
                    Cow::Owned(decoded)
                }
                Some(uri) => {
                    let path = match base_dir {
                        Some(dir) => dir.join(uri),
                        None => Path::new(uri).to_path_buf(),
                    };
                    Cow::Owned(std::fs::read(&path).map_err(|e| Error::io(path, e))?)
                }
            };

            if data.len() < def.byte_length {
                return Err(Error::OutOfBounds {
                    what: "buffer",
                    index,
                    reason: format!("declares {} bytes but holds {}", def.byte_length, data.len()),
                });
            }
            Ok(data)
        })
        .collect()
}

/// Byte range of a buffer view, plus its stride
fn view_bytes<'b>(
    doc: &Document,
    buffers: &'b [Cow<'_, [u8]>],
    view_index: usize,
) -> Result<(&'b [u8], Option<usize>)> {
    let view = doc.buffer_views.get(view_index).ok_or_else(|| Error::OutOfBounds {
        what: "buffer view",
        index: view_index,
        reason: format!("document has {}", doc.buffer_views.len()),
    })?;
    let buffer = buffers.get(view.buffer).ok_or_else(|| Error::OutOfBounds {
        what: "buffer",
        index: view.buffer,
        reason: format!("document has {}", buffers.len()),
    })?;
    let bytes = view
        .byte_offset
        .checked_add(view.byte_length)
        .and_then(|end| buffer.get(view.byte_offset..end))
        .ok_or_else(|| Error::OutOfBounds {
            what: "buffer view",
            index: view_index,
            reason: format!(
                "{} bytes at offset {} exceed buffer of {} bytes",
                view.byte_length,
                view.byte_offset,
                buffer.len()
            ),
        })?;
    Ok((bytes, view.byte_stride.filter(|&s| s != 0)))
}

fn accessor<'d>(doc: &'d Document, index: usize) -> Result<&'d AccessorDef> {
    doc.accessors.get(index).ok_or_else(|| Error::OutOfBounds {
        what: "accessor",
        index,
        reason: format!("document has {}", doc.accessors.len()),
    })
}

/// Bytes covered by `count` elements of `size` bytes laid out `stride` apart
fn element_span(count: usize, stride: usize, size: usize) -> Option<usize> {
    match count {
        0 => Some(0),
        n => (n - 1).checked_mul(stride)?.checked_add(size),
    }
}

/// The accessor's slice of its view, checked before anything is allocated
fn accessor_bytes<'b>(
    acc: &AccessorDef,
    index: usize,
    view: &'b [u8],
    stride: usize,
    size: usize,
) -> Result<&'b [u8]> {
    element_span(acc.count, stride, size)
        .and_then(|span| acc.byte_offset.checked_add(span))
        .and_then(|end| view.get(acc.byte_offset..end))
        .ok_or_else(|| Error::OutOfBounds {
            what: "accessor",
            index,
            reason: format!(
                "{} elements of {} bytes at offset {} exceed view of {} bytes",
                acc.count,
                size,
                acc.byte_offset,
                view.len()
            ),
        })
}

fn truncated_element(index: usize, source: io::Error) -> Error {
    Error::OutOfBounds {
        what: "accessor",
        index,
        reason: source.to_string(),
    }
}

/// Returns `None` when the accessor is not a float VEC3 stored in a buffer view
fn read_positions(
    doc: &Document,
    buffers: &[Cow<'_, [u8]>],
    index: usize,
) -> Result<Option<Vec<Point3<f64>>>> {
    let acc = accessor(doc, index)?;
    if acc.component_type != COMPONENT_FLOAT || acc.kind != "VEC3" {
        return Ok(None);
    }
    let Some(view_index) = acc.buffer_view else {
        return Ok(None);
    };

    let (view, stride) = view_bytes(doc, buffers, view_index)?;
    let stride = stride.unwrap_or(POSITION_SIZE);
    if stride < POSITION_SIZE {
        return Err(Error::OutOfBounds {
            what: "accessor",
            index,
            reason: format!("stride {stride} is shorter than a position"),
        });
    }
    let data = accessor_bytes(acc, index, view, stride, POSITION_SIZE)?;

    let positions = data
        .chunks(stride)
        .take(acc.count)
        .map(|mut element| -> io::Result<Point3<f64>> {
            let x = element.read_f32::<LittleEndian>()?;
            let y = element.read_f32::<LittleEndian>()?;
            let z = element.read_f32::<LittleEndian>()?;
            Ok(Point3::new(x as f64, y as f64, z as f64))
        })
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| truncated_element(index, e))?;

    Ok(Some(positions))
}

fn read_indices(doc: &Document, buffers: &[Cow<'_, [u8]>], index: usize) -> Result<Option<Vec<u32>>> {
    let acc = accessor(doc, index)?;
    let size = match acc.component_type {
        COMPONENT_UNSIGNED_BYTE => 1,
        COMPONENT_UNSIGNED_SHORT => 2,
        COMPONENT_UNSIGNED_INT => 4,
        _ => return Ok(None),
    };
    let Some(view_index) = acc.buffer_view else {
        return Ok(None);
    };

    let (view, _) = view_bytes(doc, buffers, view_index)?;
    let data = accessor_bytes(acc, index, view, size, size)?;

    let indices = data
        .chunks_exact(size)
        .map(|mut element| match size {
            1 => element.read_u8().map(u32::from),
            2 => element.read_u16::<LittleEndian>().map(u32::from),
            _ => element.read_u32::<LittleEndian>(),
        })
        .collect::<io::Result<Vec<_>>>()
        .map_err(|e| truncated_element(index, e))?;
    Ok(Some(indices))
}

fn extract_triangles(
    doc: &Document,
    buffers: &[Cow<'_, [u8]>],
    filter: &SubMeshFilter,
) -> Result<Vec<Triangle>> {
    let mut triangles = Vec::new();

    for (mesh_index, mesh) in doc.meshes.iter().enumerate() {
        for prim in &mesh.primitives {
            if prim.mode != MODE_TRIANGLES {
                tracing::debug!(mesh = mesh_index, mode = prim.mode, "Skipping non-triangle primitive");
                continue;
            }

            let material_name = prim
                .material
                .and_then(|m| doc.materials.get(m))
                .and_then(|m| m.name.as_deref());
            if !filter.includes(mesh.name.as_deref(), material_name) {
                continue;
            }

            let Some(&position_index) = prim.attributes.get("POSITION") else {
                continue;
            };
            let Some(vertices) = read_positions(doc, buffers, position_index)? else {
                tracing::debug!(mesh = mesh_index, "Skipping primitive with unsupported positions");
                continue;
            };

            let indices = match prim.indices {
                Some(index) => match read_indices(doc, buffers, index)? {
                    Some(indices) => indices,
                    None => {
                        tracing::debug!(mesh = mesh_index, "Skipping primitive with unsupported indices");
                        continue;
                    }
                },
                None => (0..vertices.len() as u32).collect(),
            };

            let before = triangles.len();
            for tri in indices.chunks_exact(3) {
                let (Some(&a), Some(&b), Some(&c)) = (
                    vertices.get(tri[0] as usize),
                    vertices.get(tri[1] as usize),
                    vertices.get(tri[2] as usize),
                ) else {
                    continue;
                };
                triangles.push(Triangle::new(a, b, c));
            }

            tracing::trace!(
                mesh = mesh_index,
                name = mesh.name.as_deref().unwrap_or(""),
                triangles = triangles.len() - before,
                "Included primitive"
            );
        }
    }

    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn positions_bytes(points: &[[f32; 3]]) -> Vec<u8> {
        points
            .iter()
            .flat_map(|p| p.iter().flat_map(|c| c.to_le_bytes()))
            .collect()
    }

    fn quad_json(mesh_name: &str, uri: &str, byte_length: usize, index_type: u32, index_offset: usize) -> String {
        format!(
            r#"{{
                "asset": {{"version": "2.0"}},
                "buffers": [{{"uri": "{uri}", "byteLength": {byte_length}}}],
                "bufferViews": [
                    {{"buffer": 0, "byteOffset": 0, "byteLength": 48}},
                    {{"buffer": 0, "byteOffset": {index_offset}, "byteLength": {}}}
                ],
                "accessors": [
                    {{"bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3"}},
                    {{"bufferView": 1, "componentType": {index_type}, "count": 6, "type": "SCALAR"}}
                ],
                "meshes": [{{"name": "{mesh_name}", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1}}]}}]
            }}"#,
            byte_length - index_offset
        )
    }

    fn quad_buffer(index_size: usize) -> Vec<u8> {
        let mut data = positions_bytes(&[
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [10.0, 10.0, 0.0],
            [0.0, 10.0, 0.0],
        ]);
        for i in [0u32, 1, 2, 0, 2, 3] {
            match index_size {
                1 => data.push(i as u8),
                2 => data.extend_from_slice(&(i as u16).to_le_bytes()),
                _ => data.extend_from_slice(&i.to_le_bytes()),
            }
        }
        data
    }

    fn data_uri(bytes: &[u8]) -> String {
        format!(
            "data:application/octet-stream;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    #[test]
    fn decodes_each_index_width() {
        for (size, component) in [(1, 5121), (2, 5123), (4, 5125)] {
            let buffer = quad_buffer(size);
            let json = quad_json("playerclip", &data_uri(&buffer), buffer.len(), component, 48);
            let mesh = parse_gltf(json.as_bytes(), None, &SubMeshFilter::default()).unwrap();
            assert_eq!(mesh.triangle_count(), 2, "index width {size}");

            let hit = mesh
                .ray_cast(&Point3::new(2.0, 7.0, 5.0), &Vector3::new(0.0, 0.0, -1.0), 10.0)
                .unwrap();
            assert_relative_eq!(hit.distance, 5.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn filter_excludes_unlisted_meshes() {
        let buffer = quad_buffer(2);
        let json = quad_json("detail_props", &data_uri(&buffer), buffer.len(), 5123, 48);
        let mesh = parse_gltf(json.as_bytes(), None, &SubMeshFilter::default()).unwrap();
        assert!(mesh.is_empty());

        let mesh = parse_gltf(json.as_bytes(), None, &SubMeshFilter::All).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn material_name_is_a_fallback_match() {
        let buffer = quad_buffer(2);
        let uri = data_uri(&buffer);
        let json = format!(
            r#"{{
                "buffers": [{{"uri": "{uri}", "byteLength": {}}}],
                "bufferViews": [
                    {{"buffer": 0, "byteLength": 48}},
                    {{"buffer": 0, "byteOffset": 48, "byteLength": 12}}
                ],
                "accessors": [
                    {{"bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3"}},
                    {{"bufferView": 1, "componentType": 5123, "count": 6, "type": "SCALAR"}}
                ],
                "materials": [{{"name": "tools/toolswindow"}}],
                "meshes": [
                    {{"name": "mesh_17", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1, "material": 0}}]}},
                    {{"name": "mesh_18", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1, "mode": 1}}]}}
                ]
            }}"#,
            buffer.len()
        );
        let mesh = parse_gltf(json.as_bytes(), None, &SubMeshFilter::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);

        // The line-mode primitive is skipped even when everything is included
        let mesh = parse_gltf(json.as_bytes(), None, &SubMeshFilter::All).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn honors_interleaved_stride() {
        // Position followed by a 4-byte padding attribute per vertex
        let mut data = Vec::new();
        for p in [[0.0f32, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 4.0, 0.0]] {
            data.extend(positions_bytes(&[p]));
            data.extend_from_slice(&[0xAB; 4]);
        }
        let uri = data_uri(&data);
        let json = format!(
            r#"{{
                "buffers": [{{"uri": "{uri}", "byteLength": 48}}],
                "bufferViews": [{{"buffer": 0, "byteLength": 48, "byteStride": 16}}],
                "accessors": [{{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}}],
                "meshes": [{{"name": "clip", "primitives": [{{"attributes": {{"POSITION": 0}}}}]}}]
            }}"#
        );
        let mesh = parse_gltf(json.as_bytes(), None, &SubMeshFilter::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        let tri = mesh.triangles()[0];
        assert_eq!(tri.v1, Point3::new(4.0, 0.0, 0.0));
        assert_eq!(tri.v2, Point3::new(0.0, 4.0, 0.0));
    }

    #[test]
    fn reads_glb_container() {
        let buffer = quad_buffer(4);
        let json = format!(
            r#"{{
                "buffers": [{{"byteLength": {}}}],
                "bufferViews": [
                    {{"buffer": 0, "byteLength": 48}},
                    {{"buffer": 0, "byteOffset": 48, "byteLength": 24}}
                ],
                "accessors": [
                    {{"bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3"}},
                    {{"bufferView": 1, "componentType": 5125, "count": 6, "type": "SCALAR"}}
                ],
                "meshes": [{{"name": "passbullets", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1}}]}}]
            }}"#,
            buffer.len()
        );
        let glb = build_glb(json.as_bytes(), &buffer);
        let mesh = parse_gltf(&glb, None, &SubMeshFilter::default()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn rejects_out_of_bounds_accessor() {
        let buffer = quad_buffer(2);
        let uri = data_uri(&buffer);
        let json = format!(
            r#"{{
                "buffers": [{{"uri": "{uri}", "byteLength": {}}}],
                "bufferViews": [{{"buffer": 0, "byteLength": 48}}],
                "accessors": [{{"bufferView": 0, "componentType": 5126, "count": 5, "type": "VEC3"}}],
                "meshes": [{{"name": "clip", "primitives": [{{"attributes": {{"POSITION": 0}}}}]}}]
            }}"#,
            buffer.len()
        );
        let err = parse_gltf(json.as_bytes(), None, &SubMeshFilter::All).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { what: "accessor", .. }));
    }

    #[test]
    fn truncated_glb_is_an_error() {
        let err = parse_gltf(b"glTF\x02\x00\x00\x00", None, &SubMeshFilter::All).unwrap_err();
        assert!(matches!(err, Error::InvalidGlb(_)));
    }

    /// Single position accessor over a 48-byte embedded buffer
    fn positions_json(view: &str, accessor: &str) -> String {
        let uri = data_uri(&quad_buffer(0)[..48]);
        format!(
            r#"{{
                "buffers": [{{"uri": "{uri}", "byteLength": 48}}],
                "bufferViews": [{view}],
                "accessors": [{accessor}],
                "meshes": [{{"name": "clip", "primitives": [{{"attributes": {{"POSITION": 0}}}}]}}]
            }}"#
        )
    }

    #[test]
    fn huge_accessor_count_is_rejected_without_allocating() {
        let json = positions_json(
            r#"{"buffer": 0, "byteLength": 48}"#,
            r#"{"bufferView": 0, "componentType": 5126, "count": 4611686018427387905, "type": "VEC3"}"#,
        );
        let err = parse_gltf(json.as_bytes(), None, &SubMeshFilter::all()).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { what: "accessor", index: 0, .. }));
    }

    #[test]
    fn offsets_near_the_address_limit_are_rejected() {
        let json = positions_json(
            r#"{"buffer": 0, "byteLength": 48}"#,
            r#"{"bufferView": 0, "byteOffset": 18446744073709551615, "componentType": 5126, "count": 1, "type": "VEC3"}"#,
        );
        let err = parse_gltf(json.as_bytes(), None, &SubMeshFilter::all()).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { what: "accessor", .. }));

        let json = positions_json(
            r#"{"buffer": 0, "byteOffset": 18446744073709551615, "byteLength": 48}"#,
            r#"{"bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3"}"#,
        );
        let err = parse_gltf(json.as_bytes(), None, &SubMeshFilter::all()).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { what: "buffer view", index: 0, .. }));
    }

    #[test]
    fn huge_index_count_is_rejected() {
        let buffer = quad_buffer(4);
        let uri = data_uri(&buffer);
        let json = format!(
            r#"{{
                "buffers": [{{"uri": "{uri}", "byteLength": {}}}],
                "bufferViews": [
                    {{"buffer": 0, "byteLength": 48}},
                    {{"buffer": 0, "byteOffset": 48, "byteLength": 24}}
                ],
                "accessors": [
                    {{"bufferView": 0, "componentType": 5126, "count": 4, "type": "VEC3"}},
                    {{"bufferView": 1, "componentType": 5125, "count": 4611686018427387905, "type": "SCALAR"}}
                ],
                "meshes": [{{"name": "clip", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1}}]}}]
            }}"#,
            buffer.len()
        );
        let err = parse_gltf(json.as_bytes(), None, &SubMeshFilter::all()).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { what: "accessor", index: 1, .. }));
    }

    #[test]
    fn stride_shorter_than_a_position_is_rejected() {
        let json = positions_json(
            r#"{"buffer": 0, "byteLength": 48, "byteStride": 4}"#,
            r#"{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3"}"#,
        );
        let err = parse_gltf(json.as_bytes(), None, &SubMeshFilter::all()).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { what: "accessor", .. }));
    }

    #[test]
    fn trailing_partial_chunk_header_is_an_error() {
        let json = r#"{"meshes": []}"#;
        let mut glb = build_glb(json.as_bytes(), &[]);
        glb.extend_from_slice(&[0u8; 4]);
        let total = glb.len() as u32;
        glb[8..12].copy_from_slice(&total.to_le_bytes());

        let err = parse_gltf(&glb, None, &SubMeshFilter::all()).unwrap_err();
        assert!(matches!(err, Error::InvalidGlb("truncated chunk header")));
    }

    #[test]
    fn chunk_longer_than_container_is_an_error() {
        let mut glb = build_glb(br#"{"meshes": []}"#, &[]);
        // JSON chunk length claims more than the file holds
        glb[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
        let err = parse_gltf(&glb, None, &SubMeshFilter::all()).unwrap_err();
        assert!(matches!(err, Error::InvalidGlb("chunk exceeds container")));
    }

    fn build_glb(json: &[u8], bin: &[u8]) -> Vec<u8> {
        let mut json = json.to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }
        let total = GLB_HEADER_LEN + 8 + json.len() + 8 + bin.len();

        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(GLB_MAGIC);
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        out.extend_from_slice(&json);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin);
        out
    }
}
