// SPDX-License-Identifier: GPL-3.0-only

//! Scene export pipeline
//!
//! Persists scan results for use outside the session:
//! - Environment mesh as GLB (binary glTF with positions and normals)
//! - Bounded scans / point spawns as LAS point clouds

mod gltf_export;
mod las_export;

pub use gltf_export::export_mesh_glb;
pub use las_export::export_point_cloud_las;
