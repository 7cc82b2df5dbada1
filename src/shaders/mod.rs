// SPDX-License-Identifier: GPL-3.0-only

//! Compute kernels and the math feeding them
//!
//! Two GPU passes live here: depth raycasting (view-space coordinates in,
//! world positions and normals out) and mesh assembly (position grid in,
//! vertices and triangle indices out). The pure-math modules (reprojection,
//! sample grid) are host-side and feed the kernels their inputs.

pub mod common;
mod gpu_processor;
pub mod mesh;
pub mod raycast;
pub mod reprojection;
pub mod sample_grid;

pub use gpu_processor::{CachedCount, compute_dispatch_size, read_buffer_async};

pub use mesh::{MeshProcessor, build_mesh, get_mesh_processor};
pub use raycast::{
    RaycastHit, RaycastProcessor, get_raycast_processor, raycast_view_space,
    raycast_view_space_one, upload_depth_frame,
};
pub use sample_grid::generate_grid;
