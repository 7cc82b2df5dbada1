// SPDX-License-Identifier: GPL-3.0-only

//! Headset tracking and depth capture interfaces
//!
//! The depth pipeline never talks to headset hardware directly. It consumes
//! two read-only inputs, both refreshed per dispatch:
//!
//! - the per-eye depth frame (depth image + capture-time descriptor),
//!   produced by an external capture subsystem, and
//! - the current render camera's frustum and orientation, produced by an
//!   external tracking subsystem.
//!
//! [`FrameTracking`] is the seam for the second input. [`StaticTracking`]
//! is the bundled implementation used by the CLI and tests; a runtime
//! integration would implement the trait over its own pose source.

pub mod synthetic;

use glam::{Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Eye selector for stereo depth data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Eye {
    #[default]
    Left,
    Right,
}

impl Eye {
    /// Both eyes, in texture-layer order
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];

    /// Texture array layer / matrix array slot for this eye
    pub fn index(&self) -> usize {
        match self {
            Eye::Left => 0,
            Eye::Right => 1,
        }
    }
}

/// Tangents of the four half-angles describing an asymmetric frustum
///
/// Values are tangents (not angles): `left` is `tan(angle_left)` etc., all
/// positive for a frustum that extends to both sides of the view axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovTangents {
    pub left: f32,
    pub right: f32,
    pub up: f32,
    pub down: f32,
}

impl FovTangents {
    /// Symmetric frustum from a vertical field of view and aspect ratio
    pub fn symmetric(vertical_fov: f32, aspect: f32) -> Self {
        let half_v = (vertical_fov * 0.5).tan();
        let half_h = half_v * aspect;
        Self {
            left: half_h,
            right: half_h,
            up: half_v,
            down: half_v,
        }
    }

    /// Tangent-space frustum width at unit distance
    pub fn width(&self) -> f32 {
        self.left + self.right
    }

    /// Tangent-space frustum height at unit distance
    pub fn height(&self) -> f32 {
        self.up + self.down
    }

    /// Full vertical field of view in radians
    pub fn vertical_fov(&self) -> f32 {
        self.up.atan() + self.down.atan()
    }

    /// Aspect ratio of the frustum slice at unit distance
    pub fn aspect(&self) -> f32 {
        self.width() / self.height()
    }

    /// Off-axis perspective projection for this frustum, [0,1] depth range
    pub fn projection(&self, near: f32, far: f32) -> Mat4 {
        let l = -self.left * near;
        let r = self.right * near;
        let b = -self.down * near;
        let t = self.up * near;

        Mat4::from_cols_array_2d(&[
            [2.0 * near / (r - l), 0.0, 0.0, 0.0],
            [0.0, 2.0 * near / (t - b), 0.0, 0.0],
            [
                (r + l) / (r - l),
                (t + b) / (t - b),
                far / (near - far),
                -1.0,
            ],
            [0.0, 0.0, near * far / (near - far), 0.0],
        ])
    }
}

/// Per-eye descriptor of the depth capture
///
/// Captured by the external depth subsystem together with the depth image;
/// the capture camera's field of view and orientation generally differ from
/// the render camera's, which is exactly what the reprojection stage
/// corrects for.
#[derive(Debug, Clone, Copy)]
pub struct DepthFrameDesc {
    /// Frustum of the depth capture camera
    pub fov: FovTangents,
    /// Camera orientation at capture time, in the capture runtime's
    /// coordinate convention (x and y flipped relative to ours)
    pub capture_orientation: Quat,
    /// Near clip plane of the depth z-buffer (meters)
    pub near: f32,
    /// Far clip plane of the depth z-buffer (meters)
    pub far: f32,
}

impl DepthFrameDesc {
    /// Capture orientation converted into our coordinate convention.
    ///
    /// The capture runtime hands out quaternions with the opposite
    /// handedness on x and y; both the pose-correction stage and world
    /// reconstruction need the converted form.
    pub fn orientation(&self) -> Quat {
        Quat::from_xyzw(
            -self.capture_orientation.x,
            -self.capture_orientation.y,
            self.capture_orientation.z,
            self.capture_orientation.w,
        )
    }

    /// Inverse view-projection of the depth capture camera.
    ///
    /// Pose correction is rotational only, so the capture camera sits at
    /// the world origin: view = inverse(rotation).
    pub fn inverse_view_projection(&self) -> Mat4 {
        let view = Mat4::from_quat(self.orientation()).transpose();
        (self.fov.projection(self.near, self.far) * view).inverse()
    }
}

/// Per-eye frustum and orientation of the current render camera
#[derive(Debug, Clone, Copy)]
pub struct EyeFrustum {
    pub fov: FovTangents,
    /// Render-time camera orientation (world from view)
    pub orientation: Quat,
}

impl EyeFrustum {
    /// Project a world-space point into this camera's [0,1] viewport.
    ///
    /// Returns `None` for points at or behind the camera plane.
    pub fn world_to_viewport(&self, point: Vec3) -> Option<Vec2> {
        let view = self.orientation.conjugate() * point;
        let depth = -view.z;
        if depth <= f32::EPSILON {
            return None;
        }

        let tx = view.x / depth;
        let ty = view.y / depth;
        Some(Vec2::new(
            (tx + self.fov.left) / self.fov.width(),
            (ty + self.fov.down) / self.fov.height(),
        ))
    }
}

/// One stereo depth frame as delivered by the capture subsystem
///
/// `data` holds non-linear z-buffer values in [0,1], layer-major: the full
/// left-eye image followed by the full right-eye image, each row-major.
#[derive(Debug, Clone)]
pub struct DepthFrame {
    pub width: u32,
    pub height: u32,
    pub eyes: [DepthFrameDesc; 2],
    pub data: Vec<f32>,
}

impl DepthFrame {
    /// Number of texels per eye layer
    pub fn layer_len(&self) -> usize {
        (self.width * self.height) as usize
    }
}

/// Source of render-camera state, queried fresh before every dispatch
pub trait FrameTracking {
    /// Current frustum and orientation for one eye
    fn eye_frustum(&self, eye: Eye) -> EyeFrustum;
}

/// Fixed-pose tracking source
///
/// Holds a frustum and orientation set up front. Used by the CLI demo and
/// tests; also convenient for replaying recorded poses.
#[derive(Debug, Clone)]
pub struct StaticTracking {
    eyes: [EyeFrustum; 2],
}

impl StaticTracking {
    /// Identical symmetric frustum for both eyes, identity orientation
    pub fn with_symmetric_fov(vertical_fov: f32, aspect: f32) -> Self {
        let frustum = EyeFrustum {
            fov: FovTangents::symmetric(vertical_fov, aspect),
            orientation: Quat::IDENTITY,
        };
        Self {
            eyes: [frustum, frustum],
        }
    }

    /// Per-eye frustums with a shared orientation
    pub fn new(left: FovTangents, right: FovTangents, orientation: Quat) -> Self {
        Self {
            eyes: [
                EyeFrustum {
                    fov: left,
                    orientation,
                },
                EyeFrustum {
                    fov: right,
                    orientation,
                },
            ],
        }
    }

    /// Replace the orientation on both eyes (simulated head motion)
    pub fn set_orientation(&mut self, orientation: Quat) {
        for eye in &mut self.eyes {
            eye.orientation = orientation;
        }
    }
}

impl FrameTracking for StaticTracking {
    fn eye_frustum(&self, eye: Eye) -> EyeFrustum {
        self.eyes[eye.index()]
    }
}
