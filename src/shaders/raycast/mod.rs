// SPDX-License-Identifier: GPL-3.0-only

//! GPU depth raycasting
//!
//! Samples the environment depth texture at arbitrary view-space
//! coordinates and returns world-space positions and normals, correcting
//! for the field-of-view and orientation drift between depth capture and
//! the current frame.

mod processor;

pub use processor::{
    RaycastHit, RaycastProcessor, get_raycast_processor, raycast_view_space,
    raycast_view_space_one, upload_depth_frame,
};

/// Raycast kernel entry point name
pub const RAYCAST_ENTRY_POINT: &str = "raycast_main";

/// Raycast kernel source
pub fn raycast_shader() -> &'static str {
    include_str!("raycast_main.wgsl")
}
