// SPDX-License-Identifier: GPL-3.0-only

//! GLTF mesh export
//!
//! Exports an assembled environment mesh as a GLB (binary glTF) file with
//! per-vertex normals. Origin is the headset position at capture time.

use crate::errors::{DepthCastError, DepthCastResult};
use crate::surface::SurfaceMesh;
use std::path::PathBuf;
use tracing::{debug, info};

/// Export a mesh as a GLB file
pub async fn export_mesh_glb(mesh: &SurfaceMesh, output_path: &PathBuf) -> DepthCastResult<()> {
    let positions: Vec<f32> = mesh
        .positions()
        .iter()
        .flat_map(|p| [p.x, p.y, p.z])
        .collect();
    let normals: Vec<f32> = mesh
        .normals()
        .iter()
        .flat_map(|n| [n.x, n.y, n.z])
        .collect();
    let indices = mesh.indices().to_vec();
    let output_path = output_path.clone();

    tokio::task::spawn_blocking(move || {
        export_glb_sync(&positions, &normals, &indices, &output_path)
    })
    .await
    .map_err(|e| DepthCastError::Export(format!("task join error: {}", e)))?
}

fn export_glb_sync(
    positions: &[f32],
    normals: &[f32],
    indices: &[u32],
    output_path: &PathBuf,
) -> DepthCastResult<()> {
    if positions.is_empty() || indices.is_empty() {
        return Err(DepthCastError::Export(
            "no mesh geometry to export".to_string(),
        ));
    }

    info!(
        vertex_count = positions.len() / 3,
        triangle_count = indices.len() / 3,
        path = %output_path.display(),
        "Exporting environment mesh"
    );

    build_glb_file(positions, normals, indices, output_path)
}

/// Build a GLB (binary glTF) file with positions and normals
fn build_glb_file(
    positions: &[f32],
    normals: &[f32],
    indices: &[u32],
    output_path: &PathBuf,
) -> DepthCastResult<()> {
    // Calculate buffer sizes
    let position_bytes: Vec<u8> = positions.iter().flat_map(|f| f.to_le_bytes()).collect();
    let normal_bytes: Vec<u8> = normals.iter().flat_map(|f| f.to_le_bytes()).collect();
    let index_bytes: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();

    // Buffer layout: positions | normals | indices
    let position_offset = 0usize;
    let position_len = position_bytes.len();
    let normal_offset = position_len;
    let normal_len = normal_bytes.len();
    let index_offset = normal_offset + normal_len;
    let index_len = index_bytes.len();
    let total_buffer_len = index_offset + index_len;

    // Pad to 4-byte alignment
    let padding = (4 - (total_buffer_len % 4)) % 4;
    let padded_buffer_len = total_buffer_len + padding;

    // Calculate min/max for the position accessor
    let mut min_pos = [f32::MAX; 3];
    let mut max_pos = [f32::MIN; 3];
    for chunk in positions.chunks(3) {
        min_pos[0] = min_pos[0].min(chunk[0]);
        min_pos[1] = min_pos[1].min(chunk[1]);
        min_pos[2] = min_pos[2].min(chunk[2]);
        max_pos[0] = max_pos[0].max(chunk[0]);
        max_pos[1] = max_pos[1].max(chunk[1]);
        max_pos[2] = max_pos[2].max(chunk[2]);
    }

    // Build glTF JSON
    let gltf_json = serde_json::json!({
        "asset": {
            "generator": "depthcast",
            "version": "2.0"
        },
        "scene": 0,
        "scenes": [{
            "nodes": [0]
        }],
        "nodes": [{
            "mesh": 0
        }],
        "meshes": [{
            "primitives": [{
                "attributes": {
                    "POSITION": 0,
                    "NORMAL": 1
                },
                "indices": 2,
                "material": 0,
                "mode": 4
            }]
        }],
        "materials": [{
            "pbrMetallicRoughness": {
                "baseColorFactor": [0.8, 0.8, 0.8, 1.0],
                "metallicFactor": 0.0,
                "roughnessFactor": 1.0
            },
            "doubleSided": true
        }],
        "accessors": [
            {
                "bufferView": 0,
                "byteOffset": 0,
                "componentType": 5126,  // FLOAT
                "count": positions.len() / 3,
                "type": "VEC3",
                "min": min_pos,
                "max": max_pos
            },
            {
                "bufferView": 1,
                "byteOffset": 0,
                "componentType": 5126,  // FLOAT
                "count": normals.len() / 3,
                "type": "VEC3"
            },
            {
                "bufferView": 2,
                "byteOffset": 0,
                "componentType": 5125,  // UNSIGNED_INT
                "count": indices.len(),
                "type": "SCALAR"
            }
        ],
        "bufferViews": [
            {
                "buffer": 0,
                "byteOffset": position_offset,
                "byteLength": position_len,
                "byteStride": 12,
                "target": 34962  // ARRAY_BUFFER
            },
            {
                "buffer": 0,
                "byteOffset": normal_offset,
                "byteLength": normal_len,
                "byteStride": 12,
                "target": 34962  // ARRAY_BUFFER
            },
            {
                "buffer": 0,
                "byteOffset": index_offset,
                "byteLength": index_len,
                "target": 34963  // ELEMENT_ARRAY_BUFFER
            }
        ],
        "buffers": [{
            "byteLength": padded_buffer_len
        }]
    });

    // Serialize JSON
    let json_string = serde_json::to_string(&gltf_json)
        .map_err(|e| DepthCastError::Export(format!("failed to serialize glTF: {}", e)))?;
    let json_bytes = json_string.as_bytes();

    // Pad JSON to 4-byte alignment
    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let padded_json_len = json_bytes.len() + json_padding;

    // Build GLB file
    let total_length = 12 + 8 + padded_json_len + 8 + padded_buffer_len;

    let mut glb_data: Vec<u8> = Vec::with_capacity(total_length);

    // GLB Header
    glb_data.extend_from_slice(b"glTF"); // Magic
    glb_data.extend_from_slice(&2u32.to_le_bytes()); // Version
    glb_data.extend_from_slice(&(total_length as u32).to_le_bytes()); // Length

    // JSON chunk
    glb_data.extend_from_slice(&(padded_json_len as u32).to_le_bytes()); // Chunk length
    glb_data.extend_from_slice(&0x4E4F534Au32.to_le_bytes()); // Chunk type "JSON"
    glb_data.extend_from_slice(json_bytes);
    glb_data.extend(std::iter::repeat_n(0x20u8, json_padding)); // Space padding

    // Binary chunk
    glb_data.extend_from_slice(&(padded_buffer_len as u32).to_le_bytes()); // Chunk length
    glb_data.extend_from_slice(&0x004E4942u32.to_le_bytes()); // Chunk type "BIN\0"
    glb_data.extend_from_slice(&position_bytes);
    glb_data.extend_from_slice(&normal_bytes);
    glb_data.extend_from_slice(&index_bytes);
    glb_data.extend(std::iter::repeat_n(0u8, padding)); // Null padding

    // Write GLB file
    std::fs::write(output_path, glb_data)
        .map_err(|e| DepthCastError::Export(format!("failed to write GLB file: {}", e)))?;

    debug!(path = %output_path.display(), "GLB export complete");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{SurfaceMesh, grid_triangle_indices};
    use glam::Vec3;

    fn test_mesh() -> SurfaceMesh {
        let mut positions = Vec::new();
        for z in 0..3 {
            for x in 0..3 {
                positions.push(Vec3::new(x as f32, 0.0, z as f32));
            }
        }
        let normals = vec![Vec3::Y; positions.len()];
        SurfaceMesh::from_parts(positions, normals, grid_triangle_indices(3, 3)).unwrap()
    }

    #[tokio::test]
    async fn test_glb_container_structure() {
        let dir = std::env::temp_dir().join("depthcast_glb_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("mesh.glb");

        export_mesh_glb(&test_mesh(), &path).await.unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(&data[0..4], b"glTF");
        assert_eq!(u32::from_le_bytes(data[4..8].try_into().unwrap()), 2);
        // Declared length matches the file
        let declared = u32::from_le_bytes(data[8..12].try_into().unwrap()) as usize;
        assert_eq!(declared, data.len());
        // First chunk is JSON and mentions both attributes
        assert_eq!(&data[16..20], b"JSON");
        let json_len = u32::from_le_bytes(data[12..16].try_into().unwrap()) as usize;
        let json = std::str::from_utf8(&data[20..20 + json_len]).unwrap();
        assert!(json.contains("POSITION"));
        assert!(json.contains("NORMAL"));

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_rejects_empty_mesh() {
        let mesh = SurfaceMesh::from_parts(vec![], vec![], vec![]).unwrap();
        let path = std::env::temp_dir().join("depthcast_empty.glb");
        assert!(export_mesh_glb(&mesh, &path).await.is_err());
    }
}
