// SPDX-License-Identifier: GPL-3.0-only

//! Screen-to-depth reprojection math
//!
//! The depth texture is captured by a different camera than the one the
//! current frame renders with: the capture frustum is asymmetric and per-eye,
//! and the headset keeps rotating between capture and render. The matrix
//! built here maps a normalized screen coordinate in the current camera's
//! frustum to a normalized coordinate in the depth texture, composed of
//! three stages:
//!
//! 1. unprojection out of the current camera's frustum into tangent space,
//! 2. a pure-rotation correction for head motion since capture (3-DoF - no
//!    translation correction is attempted),
//! 3. projection into the depth capture camera's frustum.
//!
//! Matrices are only valid for the frame whose descriptors produced them
//! and must be rebuilt before every sampling dispatch.

use crate::tracking::{DepthFrameDesc, EyeFrustum, FovTangents};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec4, Vec4Swizzles};

/// Map a normalized screen coordinate to a tangent-space direction in the
/// camera's asymmetric frustum (the inverse of an off-axis projection).
pub fn unprojection_matrix(fov: &FovTangents) -> Mat4 {
    let mut m = Mat4::IDENTITY;

    // Scale
    m.x_axis.x = fov.width();
    m.y_axis.y = fov.height();

    // Offset
    m.w_axis.x = -fov.left;
    m.w_axis.y = -fov.down;
    m.w_axis.z = 1.0;

    m
}

/// Map a tangent-space direction into an asymmetric frustum's normalized
/// coordinate space.
pub fn projection_matrix(fov: &FovTangents) -> Mat4 {
    let mut m = Mat4::IDENTITY;

    // Scale
    m.x_axis.x = 1.0 / fov.width();
    m.y_axis.y = 1.0 / fov.height();

    // Offset
    m.w_axis.x = fov.left / fov.width();
    m.w_axis.y = fov.down / fov.height();
    m.w_axis.z = -1.0;

    m
}

/// Rotation-only correction for head motion between depth capture and the
/// current frame.
///
/// The relative rotation is decomposed to YXZ Euler angles and rebuilt with
/// the roll negated, reconciling the capture runtime's handedness with ours.
/// `capture` must already be convention-corrected
/// (see [`DepthFrameDesc::orientation`]).
pub fn pose_correction_matrix(render: Quat, capture: Quat) -> Mat4 {
    let relative = render.inverse() * capture;
    let (yaw, pitch, roll) = relative.to_euler(EulerRot::YXZ);

    Mat4::from_quat(Quat::from_euler(EulerRot::YXZ, yaw, pitch, -roll))
}

/// Full screen-to-depth matrix for one eye.
///
/// Identity when the capture and render cameras agree on both frustum and
/// orientation; any drift in either shows up as scale/offset/rotation of
/// the sampled coordinate.
pub fn reprojection_matrix(desc: &DepthFrameDesc, frustum: &EyeFrustum) -> Mat4 {
    let screen_to_tangent = unprojection_matrix(&frustum.fov);
    let tangent_to_depth = projection_matrix(&desc.fov);
    let pose_correction = pose_correction_matrix(frustum.orientation, desc.orientation());

    tangent_to_depth * pose_correction * screen_to_tangent
}

/// Host-side mirror of the kernel's coordinate transform: apply the
/// composed matrix to a normalized screen coordinate.
pub fn reproject_uv(matrix: &Mat4, uv: Vec2) -> Vec2 {
    (*matrix * Vec4::new(uv.x, uv.y, 0.0, 1.0)).xy()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn desc(fov: FovTangents, capture_orientation: Quat) -> DepthFrameDesc {
        DepthFrameDesc {
            fov,
            // Stored in the capture runtime's convention; orientation()
            // flips x and y back.
            capture_orientation: Quat::from_xyzw(
                -capture_orientation.x,
                -capture_orientation.y,
                capture_orientation.z,
                capture_orientation.w,
            ),
            near: 0.1,
            far: 10.0,
        }
    }

    fn frustum(fov: FovTangents, orientation: Quat) -> EyeFrustum {
        EyeFrustum { fov, orientation }
    }

    #[test]
    fn test_identity_when_cameras_agree() {
        let fov = FovTangents::symmetric(FRAC_PI_2, 1.0);
        let m = reprojection_matrix(
            &desc(fov, Quat::IDENTITY),
            &frustum(fov, Quat::IDENTITY),
        );

        assert!(
            m.abs_diff_eq(Mat4::IDENTITY, 1e-5),
            "expected identity, got {:?}",
            m
        );
    }

    #[test]
    fn test_identity_with_asymmetric_matching_fov() {
        let fov = FovTangents {
            left: 0.9,
            right: 1.1,
            up: 0.8,
            down: 1.0,
        };
        let m = reprojection_matrix(
            &desc(fov, Quat::IDENTITY),
            &frustum(fov, Quat::IDENTITY),
        );

        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }

    #[test]
    fn test_center_survives_fov_mismatch() {
        // Symmetric frustums of different widths share the view axis, so
        // the center coordinate is a fixed point of the remap.
        let render_fov = FovTangents::symmetric(FRAC_PI_2, 1.0);
        let depth_fov = FovTangents::symmetric(1.9, 1.0);
        let m = reprojection_matrix(
            &desc(depth_fov, Quat::IDENTITY),
            &frustum(render_fov, Quat::IDENTITY),
        );

        let center = reproject_uv(&m, Vec2::new(0.5, 0.5));
        assert!((center.x - 0.5).abs() < 1e-5);
        assert!((center.y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_wider_depth_fov_contracts_coordinates() {
        // A wider capture frustum sees everything the render frustum sees,
        // so render-frame corners land strictly inside the depth texture.
        let render_fov = FovTangents::symmetric(FRAC_PI_2, 1.0);
        let depth_fov = FovTangents::symmetric(2.0, 1.0);
        let m = reprojection_matrix(
            &desc(depth_fov, Quat::IDENTITY),
            &frustum(render_fov, Quat::IDENTITY),
        );

        for corner in [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
        ] {
            let uv = reproject_uv(&m, corner);
            assert!(uv.x > 0.0 && uv.x < 1.0, "corner escaped: {:?}", uv);
            assert!(uv.y > 0.0 && uv.y < 1.0, "corner escaped: {:?}", uv);
        }
    }

    #[test]
    fn test_yaw_shifts_horizontally() {
        // The camera turned right after capture: the scene content slides
        // left in screen space, so a screen coordinate must look further
        // right (larger x) in the captured depth texture.
        let fov = FovTangents::symmetric(FRAC_PI_2, 1.0);
        let render_orientation = Quat::from_rotation_y(-0.05);
        let m = reprojection_matrix(
            &desc(fov, Quat::IDENTITY),
            &frustum(fov, render_orientation),
        );

        let center = reproject_uv(&m, Vec2::new(0.5, 0.5));
        assert!(
            (center.x - 0.5).abs() > 1e-3,
            "yaw had no horizontal effect: {:?}",
            center
        );
        assert!((center.y - 0.5).abs() < 1e-3, "yaw leaked into y: {:?}", center);
    }
}
