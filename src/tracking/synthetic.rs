// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic depth frames
//!
//! Software stand-in for the headset capture subsystem: renders simple
//! analytic scenes into the same z-buffer encoding the hardware delivers.
//! Used by the CLI demo and by GPU tests, where no real capture exists.

use super::{DepthFrame, DepthFrameDesc, FovTangents};
use crate::shaders::common::ZBufferParams;
use glam::Quat;

/// Analytic scene rendered into a synthetic depth frame
#[derive(Debug, Clone, Copy)]
pub enum SyntheticScene {
    /// A wall perpendicular to the view axis at the given distance (meters)
    Wall { distance: f32 },
    /// A room seen from its center: front wall, two side walls, floor and
    /// ceiling
    Room {
        depth: f32,
        half_width: f32,
        floor: f32,
        ceiling: f32,
    },
}

impl SyntheticScene {
    /// View-space depth along the ray through tangent coordinates (tx, ty)
    fn view_depth(&self, tx: f32, ty: f32, far: f32) -> f32 {
        match *self {
            SyntheticScene::Wall { distance } => distance,
            SyntheticScene::Room {
                depth,
                half_width,
                floor,
                ceiling,
            } => {
                let mut z = depth;
                if tx > 1e-6 {
                    z = z.min(half_width / tx);
                } else if tx < -1e-6 {
                    z = z.min(-half_width / tx);
                }
                if ty < -1e-6 {
                    z = z.min(floor / ty.abs());
                } else if ty > 1e-6 {
                    z = z.min(ceiling / ty);
                }
                z.min(far)
            }
        }
    }
}

/// Render a stereo depth frame of the scene.
///
/// Both eyes share the frustum and see the same image; the capture
/// orientation is identity. Depth values use the [0,1] z-buffer encoding
/// of [`ZBufferParams`].
pub fn render_depth_frame(
    scene: SyntheticScene,
    width: u32,
    height: u32,
    fov: FovTangents,
    near: f32,
    far: f32,
) -> DepthFrame {
    let params = ZBufferParams::from_clip_planes(near, far);
    let layer_len = (width * height) as usize;
    let mut layer = Vec::with_capacity(layer_len);

    for y in 0..height {
        for x in 0..width {
            // Texel center to tangent-space ray parameter
            let u = (x as f32 + 0.5) / width as f32;
            let v = (y as f32 + 0.5) / height as f32;
            let tx = u * fov.width() - fov.left;
            let ty = v * fov.height() - fov.down;

            let depth = scene
                .view_depth(tx, ty, far)
                .clamp(near, far * (1.0 - 1e-4));
            layer.push(params.encode(depth));
        }
    }

    let mut data = layer.clone();
    data.extend_from_slice(&layer);

    let desc = DepthFrameDesc {
        fov,
        capture_orientation: Quat::IDENTITY,
        near,
        far,
    };

    DepthFrame {
        width,
        height,
        eyes: [desc, desc],
        data,
    }
}
