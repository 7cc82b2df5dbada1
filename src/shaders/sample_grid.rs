// SPDX-License-Identifier: GPL-3.0-only

//! View-space sample grid generation
//!
//! Produces the row-major lattice of normalized view-space coordinates that
//! the raycast kernel consumes when scanning the environment. The grid
//! covers a configurable fraction of the current camera's field of view;
//! shrinking below the full frustum keeps every sample inside the depth
//! texture and avoids clamped lookups at the periphery.

use crate::errors::{DepthCastError, DepthCastResult};
use glam::Vec2;

/// Generate a `width x height` grid of view-space coordinates, row-major.
///
/// `vertical_fov` and `aspect` describe the current camera; `fov_margin`
/// in (0, 1] scales the covered field of view around the view axis. The
/// degenerate 1-sample axis places its single coordinate at the center.
pub fn generate_grid(
    width: u32,
    height: u32,
    fov_margin: f32,
    vertical_fov: f32,
    aspect: f32,
) -> DepthCastResult<Vec<Vec2>> {
    if width < 1 || height < 1 {
        return Err(DepthCastError::InvalidGridDimensions { width, height });
    }
    if !(fov_margin > 0.0 && fov_margin <= 1.0) {
        return Err(DepthCastError::InvalidGridDimensions { width, height });
    }

    // Scale both axes of the field of view, deriving the horizontal one
    // from the vertical and the aspect ratio.
    let fov_y = vertical_fov * fov_margin;
    let fov_x = vertical_to_horizontal_fov(vertical_fov, aspect) * fov_margin;

    // Frustum slice dimensions at unit distance
    let frustum_height = 2.0 * (fov_y * 0.5).tan();
    let frustum_width = 2.0 * (fov_x * 0.5).tan();

    // Margin scaling happens in angle space, so re-derive the covered
    // fraction of the full frustum from the two tangent extents.
    let full_height = 2.0 * (vertical_fov * 0.5).tan();
    let full_width = 2.0 * (vertical_to_horizontal_fov(vertical_fov, aspect) * 0.5).tan();

    let step_x = if width > 1 {
        frustum_width / (width - 1) as f32
    } else {
        0.0
    };
    let step_y = if height > 1 {
        frustum_height / (height - 1) as f32
    } else {
        0.0
    };

    let mut coords = Vec::with_capacity((width * height) as usize);
    for row in 0..height {
        for col in 0..width {
            // Offset within the scaled frustum, then NDC against the full
            // frustum, then remapped to [0,1]. Single-sample axes pin to
            // the center.
            let (ndc_x, ndc_y) = if width > 1 && height > 1 {
                (
                    (col as f32 * step_x - frustum_width * 0.5) / (full_width * 0.5),
                    (row as f32 * step_y - frustum_height * 0.5) / (full_height * 0.5),
                )
            } else if width > 1 {
                (
                    (col as f32 * step_x - frustum_width * 0.5) / (full_width * 0.5),
                    0.0,
                )
            } else if height > 1 {
                (
                    0.0,
                    (row as f32 * step_y - frustum_height * 0.5) / (full_height * 0.5),
                )
            } else {
                (0.0, 0.0)
            };

            coords.push(Vec2::new((ndc_x + 1.0) * 0.5, (ndc_y + 1.0) * 0.5));
        }
    }

    Ok(coords)
}

/// Horizontal field of view derived from a vertical one and an aspect ratio
pub fn vertical_to_horizontal_fov(vertical_fov: f32, aspect: f32) -> f32 {
    2.0 * ((vertical_fov * 0.5).tan() * aspect).atan()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const FOV: f32 = FRAC_PI_2;
    const ASPECT: f32 = 1.0;

    #[test]
    fn test_grid_count_and_containment() {
        let coords = generate_grid(7, 5, 0.8, FOV, ASPECT).unwrap();
        assert_eq!(coords.len(), 35);
        for c in &coords {
            assert!((0.0..=1.0).contains(&c.x), "x out of range: {:?}", c);
            assert!((0.0..=1.0).contains(&c.y), "y out of range: {:?}", c);
        }
    }

    #[test]
    fn test_full_margin_touches_extremes() {
        let coords = generate_grid(4, 4, 1.0, FOV, ASPECT).unwrap();
        let first = coords.first().unwrap();
        let last = coords.last().unwrap();
        assert!(first.x.abs() < 1e-5 && first.y.abs() < 1e-5);
        assert!((last.x - 1.0).abs() < 1e-5 && (last.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_half_margin_is_centered_shrink() {
        // Margin scales the angle; for 90 degrees the tangent extent of the
        // 45-degree grid is tan(22.5)/tan(45) = 0.414 of the frustum, so
        // every sample stays well inside [0.25, 0.75].
        let coords = generate_grid(6, 6, 0.5, FOV, ASPECT).unwrap();
        for c in &coords {
            assert!(c.x >= 0.25 && c.x <= 0.75, "x escaped shrink: {:?}", c);
            assert!(c.y >= 0.25 && c.y <= 0.75, "y escaped shrink: {:?}", c);
        }
        // And symmetrically around the center
        let first = coords.first().unwrap();
        let last = coords.last().unwrap();
        assert!((first.x + last.x - 1.0).abs() < 1e-5);
        assert!((first.y + last.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_single_sample() {
        let coords = generate_grid(1, 1, 0.9, FOV, ASPECT).unwrap();
        assert_eq!(coords.len(), 1);
        assert_eq!(coords[0], Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_single_row_and_column() {
        let row = generate_grid(5, 1, 1.0, FOV, ASPECT).unwrap();
        assert_eq!(row.len(), 5);
        assert!(row.iter().all(|c| (c.y - 0.5).abs() < 1e-6));

        let col = generate_grid(1, 5, 1.0, FOV, ASPECT).unwrap();
        assert_eq!(col.len(), 5);
        assert!(col.iter().all(|c| (c.x - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_row_major_ordering() {
        let coords = generate_grid(3, 2, 1.0, FOV, ASPECT).unwrap();
        // x varies fastest
        assert!(coords[0].x < coords[1].x && coords[1].x < coords[2].x);
        assert!((coords[0].y - coords[2].y).abs() < 1e-6);
        assert!(coords[3].y > coords[0].y);
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(matches!(
            generate_grid(0, 4, 0.9, FOV, ASPECT),
            Err(DepthCastError::InvalidGridDimensions { width: 0, height: 4 })
        ));
        assert!(generate_grid(4, 0, 0.9, FOV, ASPECT).is_err());
        assert!(generate_grid(4, 4, 0.0, FOV, ASPECT).is_err());
        assert!(generate_grid(4, 4, 1.5, FOV, ASPECT).is_err());
    }

    #[test]
    fn test_sixteen_sample_scan_scenario() {
        let coords = generate_grid(4, 4, 0.9, FOV, ASPECT).unwrap();
        assert_eq!(coords.len(), 16);

        // 0.9 margin on a 90-degree frustum: extent tan(40.5)/tan(45)
        let extent = (0.45 * FOV).tan() / (0.5 * FOV).tan();
        let expected_min = (1.0 - extent) * 0.5;
        let expected_max = (1.0 + extent) * 0.5;

        let first = coords.first().unwrap();
        let last = coords.last().unwrap();
        assert!((first.x - expected_min).abs() < 1e-4);
        assert!((first.y - expected_min).abs() < 1e-4);
        assert!((last.x - expected_max).abs() < 1e-4);
        assert!((last.y - expected_max).abs() < 1e-4);
    }
}
