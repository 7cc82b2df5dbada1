// SPDX-License-Identifier: GPL-3.0-only

//! GPU mesh assembly
//!
//! Turns a grid of sampled world-space positions into a triangulated
//! environment mesh: per-vertex normals and the fixed grid-topology index
//! stream are computed in a compute pass, then read back and assembled
//! into a [`crate::surface::SurfaceMesh`].

mod processor;

pub use processor::{MeshProcessor, build_mesh, get_mesh_processor};

/// Mesh kernel entry point name
pub const MESH_ENTRY_POINT: &str = "mesh_main";

/// Mesh kernel source
pub fn mesh_shader() -> &'static str {
    include_str!("mesh_main.wgsl")
}
