// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end tests: write level files to disk, load them, trace rays.

use sightline_geometry::{load_mesh, Error, Point3, SubMeshFilter, Vector3};
use std::fs;

/// Corners of an axis-aligned cube
fn cube_corners(min: [f32; 3], size: f32) -> Vec<[f32; 3]> {
    let [x, y, z] = min;
    let s = size;
    vec![
        [x, y, z],
        [x + s, y, z],
        [x + s, y + s, z],
        [x, y + s, z],
        [x, y, z + s],
        [x + s, y, z + s],
        [x + s, y + s, z + s],
        [x, y + s, z + s],
    ]
}

const CUBE_INDICES: [u16; 36] = [
    0, 2, 1, 0, 3, 2, // bottom
    4, 5, 6, 4, 6, 7, // top
    0, 1, 5, 0, 5, 4, // front
    2, 3, 7, 2, 7, 6, // back
    1, 2, 6, 1, 6, 5, // right
    3, 0, 4, 3, 4, 7, // left
];

/// Two unit-100 cubes at x = 0..100 and x = 200..300, as separate meshes
/// sharing one external buffer
fn write_two_cubes(dir: &std::path::Path, second_name: &str) -> std::path::PathBuf {
    let mut bin = Vec::new();
    for origin in [[0.0, 0.0, 0.0], [200.0, 0.0, 0.0]] {
        for p in cube_corners(origin, 100.0) {
            for c in p {
                bin.extend_from_slice(&c.to_le_bytes());
            }
        }
    }
    let index_offset = bin.len();
    for i in CUBE_INDICES {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    fs::write(dir.join("cubes.bin"), &bin).unwrap();

    let json = format!(
        r#"{{
            "asset": {{"version": "2.0"}},
            "buffers": [{{"uri": "cubes.bin", "byteLength": {total}}}],
            "bufferViews": [
                {{"buffer": 0, "byteOffset": 0, "byteLength": 96}},
                {{"buffer": 0, "byteOffset": 96, "byteLength": 96}},
                {{"buffer": 0, "byteOffset": {index_offset}, "byteLength": 72}}
            ],
            "accessors": [
                {{"bufferView": 0, "componentType": 5126, "count": 8, "type": "VEC3"}},
                {{"bufferView": 1, "componentType": 5126, "count": 8, "type": "VEC3"}},
                {{"bufferView": 2, "componentType": 5123, "count": 36, "type": "SCALAR"}}
            ],
            "meshes": [
                {{"name": "clip_a", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 2}}]}},
                {{"name": "{second_name}", "primitives": [{{"attributes": {{"POSITION": 1}}, "indices": 2}}]}}
            ]
        }}"#,
        total = bin.len(),
    );
    let path = dir.join("cubes.gltf");
    fs::write(&path, json).unwrap();
    path
}

#[test]
fn ray_between_cubes_is_blocked_and_gap_is_clear() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_two_cubes(dir.path(), "clip_b");
    let mesh = load_mesh(&path, &SubMeshFilter::default()).unwrap();
    assert_eq!(mesh.triangle_count(), 24);

    // From the center of the first cube to the center of the second
    assert!(mesh.segment_blocked(&Point3::new(50.0, 50.0, 50.0), &Point3::new(250.0, 50.0, 50.0)));

    // Entirely inside the gap
    assert!(!mesh.segment_blocked(&Point3::new(120.0, 50.0, 50.0), &Point3::new(180.0, 50.0, 50.0)));

    // Nearest hit from the gap toward the second cube lands on its face
    let hit = mesh
        .ray_cast(&Point3::new(150.0, 50.0, 50.0), &Vector3::new(1.0, 0.0, 0.0), 1000.0)
        .unwrap();
    approx::assert_relative_eq!(hit.distance, 50.0, epsilon = 1e-6);
    approx::assert_relative_eq!(hit.normal.x.abs(), 1.0, epsilon = 1e-9);
}

#[test]
fn filtered_out_mesh_does_not_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_two_cubes(dir.path(), "props_crate");
    let mesh = load_mesh(&path, &SubMeshFilter::default()).unwrap();
    assert_eq!(mesh.triangle_count(), 12);

    // Leaves the first cube, then nothing is in the way
    assert!(!mesh.segment_blocked(&Point3::new(120.0, 50.0, 50.0), &Point3::new(250.0, 50.0, 50.0)));
}

#[test]
fn missing_external_buffer_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_two_cubes(dir.path(), "clip_b");
    fs::remove_file(dir.path().join("cubes.bin")).unwrap();

    let err = load_mesh(&path, &SubMeshFilter::default()).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn obj_fallback_loads_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wall.obj");
    fs::write(
        &path,
        "o wall\nv 0 -50 0\nv 0 50 0\nv 0 50 100\nv 0 -50 100\nf 1 2 3 4\n",
    )
    .unwrap();

    let mesh = load_mesh(&path, &SubMeshFilter::default()).unwrap();
    assert_eq!(mesh.triangle_count(), 2);
    assert!(mesh.segment_blocked(&Point3::new(-10.0, 0.0, 50.0), &Point3::new(10.0, 0.0, 50.0)));
}

/// Cube positions (96 bytes) followed by its `u16` indices (72 bytes)
fn write_cube_bin(dir: &std::path::Path) -> usize {
    let mut bin = Vec::new();
    for p in cube_corners([0.0, 0.0, 0.0], 100.0) {
        for c in p {
            bin.extend_from_slice(&c.to_le_bytes());
        }
    }
    for i in CUBE_INDICES {
        bin.extend_from_slice(&i.to_le_bytes());
    }
    fs::write(dir.join("cube.bin"), &bin).unwrap();
    bin.len()
}

fn write_cube_gltf(
    dir: &std::path::Path,
    buffer_uri: &str,
    views: &str,
    position_count: usize,
) -> std::path::PathBuf {
    let json = format!(
        r#"{{
            "buffers": [{{"uri": "{buffer_uri}", "byteLength": 168}}],
            "bufferViews": [{views}],
            "accessors": [
                {{"bufferView": 0, "componentType": 5126, "count": {position_count}, "type": "VEC3"}},
                {{"bufferView": 1, "componentType": 5123, "count": 36, "type": "SCALAR"}}
            ],
            "meshes": [{{"name": "clip", "primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1}}]}}]
        }}"#
    );
    let path = dir.join("cube.gltf");
    fs::write(&path, json).unwrap();
    path
}

const CUBE_VIEWS: &str = r#"{"buffer": 0, "byteLength": 96}, {"buffer": 0, "byteOffset": 96, "byteLength": 72}"#;

#[test]
fn cube_file_loads_as_written() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(write_cube_bin(dir.path()), 168);
    let path = write_cube_gltf(dir.path(), "cube.bin", CUBE_VIEWS, 8);
    assert_eq!(load_mesh(&path, &SubMeshFilter::default()).unwrap().triangle_count(), 12);
}

#[test]
fn accessor_past_end_of_view_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_cube_bin(dir.path());
    let path = write_cube_gltf(dir.path(), "cube.bin", CUBE_VIEWS, 9);

    let err = load_mesh(&path, &SubMeshFilter::default()).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { what: "accessor", index: 0, .. }), "{err}");
}

#[test]
fn view_past_end_of_buffer_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_cube_bin(dir.path());
    let views = r#"{"buffer": 0, "byteLength": 96}, {"buffer": 0, "byteOffset": 120, "byteLength": 72}"#;
    let path = write_cube_gltf(dir.path(), "cube.bin", views, 8);

    let err = load_mesh(&path, &SubMeshFilter::default()).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { what: "buffer view", index: 1, .. }), "{err}");
}

#[test]
fn short_external_buffer_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_cube_bin(dir.path());
    let path = write_cube_gltf(dir.path(), "cube.bin", CUBE_VIEWS, 8);
    let bin = fs::read(dir.path().join("cube.bin")).unwrap();
    fs::write(dir.path().join("cube.bin"), &bin[..100]).unwrap();

    let err = load_mesh(&path, &SubMeshFilter::default()).unwrap_err();
    assert!(matches!(err, Error::OutOfBounds { what: "buffer", index: 0, .. }), "{err}");
}

#[test]
fn bad_data_uris_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_cube_gltf(dir.path(), "data:application/octet-stream;base64,@@not base64@@", CUBE_VIEWS, 8);
    let err = load_mesh(&path, &SubMeshFilter::default()).unwrap_err();
    assert!(matches!(err, Error::Base64 { index: 0, .. }), "{err}");

    let path = write_cube_gltf(dir.path(), "data:application/octet-stream,plain", CUBE_VIEWS, 8);
    let err = load_mesh(&path, &SubMeshFilter::default()).unwrap_err();
    assert!(matches!(err, Error::UnresolvedBuffer { index: 0, .. }), "{err}");
}

#[test]
fn truncated_glb_chunk_header_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level.glb");
    let mut glb = b"glTF".to_vec();
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&16u32.to_le_bytes());
    glb.extend_from_slice(&20u32.to_le_bytes());
    fs::write(&path, &glb).unwrap();

    let err = load_mesh(&path, &SubMeshFilter::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidGlb("truncated chunk header")), "{err}");
}

#[test]
fn glb_shorter_than_declared_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level.glb");
    let mut glb = b"glTF".to_vec();
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&4096u32.to_le_bytes());
    fs::write(&path, &glb).unwrap();

    let err = load_mesh(&path, &SubMeshFilter::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidGlb(_)), "{err}");
}

#[test]
fn obj_faces_past_the_vertex_list_are_dropped() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wall.obj");
    fs::write(
        &path,
        "v 0 -50 0\nv 0 50 0\nv 0 50 100\nv 0 -50 100\nf 1 2 3 4\nf 4 5 6\n",
    )
    .unwrap();

    let mesh = load_mesh(&path, &SubMeshFilter::default()).unwrap();
    assert_eq!(mesh.triangle_count(), 2);
}
