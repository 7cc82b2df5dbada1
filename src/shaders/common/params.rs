// SPDX-License-Identifier: GPL-3.0-only

//! Uniform parameter structs for the raycast and mesh kernels
//!
//! Layouts must match the WGSL struct declarations field for field; all of
//! these cross the host/device boundary as plain bytes.

/// Depth linearization coefficients
///
/// Encodes the [0,1] non-linear z-buffer convention of the depth capture:
/// `linear_eye_depth(raw) = 1 / (raw * z + w)`. The x/y pair is carried for
/// the reciprocal form some shading paths use.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ZBufferParams {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl ZBufferParams {
    /// Derive the coefficients from the capture's clip planes
    pub fn from_clip_planes(near: f32, far: f32) -> Self {
        let x = 1.0 - far / near;
        let y = far / near;
        Self {
            x,
            y,
            z: x / far,
            w: y / far,
        }
    }

    /// View-space depth in meters for a raw [0,1] z-buffer value
    pub fn linear_eye_depth(&self, raw: f32) -> f32 {
        1.0 / (raw * self.z + self.w)
    }

    /// Raw [0,1] z-buffer value for a view-space depth in meters.
    /// Inverse of [`linear_eye_depth`](Self::linear_eye_depth); used when
    /// synthesizing depth frames.
    pub fn encode(&self, view_depth: f32) -> f32 {
        (1.0 / view_depth - self.w) / self.z
    }
}

/// Uniform block of the raycast kernel
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RaycastParams {
    /// Screen-to-depth reprojection matrix per eye (column-major)
    pub reprojection: [[[f32; 4]; 4]; 2],
    /// Inverse view-projection of the depth capture camera per eye
    pub depth_inv_view_proj: [[[f32; 4]; 4]; 2],
    /// Depth linearization coefficients
    pub z_buffer_params: ZBufferParams,
    /// Depth texture dimensions in texels
    pub depth_size: [f32; 2],
    /// Number of valid entries in the request buffer
    pub request_count: u32,
    /// Texture layer / matrix slot to sample
    pub eye: u32,
}

/// Uniform block of the mesh assembly kernel
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshBuildParams {
    /// Sample grid width (columns)
    pub grid_width: u32,
    /// Sample grid height (rows)
    pub grid_height: u32,
    /// Total vertex count (grid_width * grid_height)
    pub vertex_count: u32,
    pub _pad: u32,
}
