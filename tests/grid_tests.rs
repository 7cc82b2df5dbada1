// SPDX-License-Identifier: MPL-2.0

//! Integration tests for sample grid generation

use depthcast::constants::MeshDensity;
use depthcast::errors::DepthCastError;
use depthcast::shaders::sample_grid::generate_grid;
use std::f32::consts::FRAC_PI_2;

#[test]
fn test_density_presets_produce_square_grids() {
    for density in MeshDensity::ALL {
        let size = density.sample_size();
        let coords = generate_grid(size, size, 0.9, FRAC_PI_2, 1.0).unwrap();
        assert_eq!(coords.len(), (size * size) as usize);
    }
}

#[test]
fn test_all_coordinates_normalized() {
    let coords = generate_grid(64, 64, 1.0, FRAC_PI_2, 16.0 / 9.0).unwrap();
    for c in coords {
        assert!((0.0..=1.0).contains(&c.x));
        assert!((0.0..=1.0).contains(&c.y));
    }
}

#[test]
fn test_margin_one_spans_frustum() {
    let coords = generate_grid(8, 8, 1.0, FRAC_PI_2, 1.0).unwrap();
    let first = coords.first().unwrap();
    let last = coords.last().unwrap();
    assert!(first.x.abs() < 1e-5 && first.y.abs() < 1e-5);
    assert!((last.x - 1.0).abs() < 1e-5 && (last.y - 1.0).abs() < 1e-5);
}

#[test]
fn test_margin_half_stays_in_center_band() {
    let coords = generate_grid(8, 8, 0.5, FRAC_PI_2, 1.0).unwrap();
    for c in coords {
        assert!((0.25..=0.75).contains(&c.x));
        assert!((0.25..=0.75).contains(&c.y));
    }
}

#[test]
fn test_degenerate_grid_is_centered() {
    let coords = generate_grid(1, 1, 0.5, FRAC_PI_2, 1.0).unwrap();
    assert_eq!(coords.len(), 1);
    assert_eq!(coords[0].x, 0.5);
    assert_eq!(coords[0].y, 0.5);
}

#[test]
fn test_four_by_four_scan_pattern() {
    // The standard smoke scenario: 16 coordinates, row-major, shrunk
    // symmetrically by the 0.9 margin.
    let coords = generate_grid(4, 4, 0.9, FRAC_PI_2, 1.0).unwrap();
    assert_eq!(coords.len(), 16);

    // Row-major: the first four share a y and increase in x
    for w in coords[..4].windows(2) {
        assert!(w[0].x < w[1].x);
        assert!((w[0].y - w[1].y).abs() < 1e-6);
    }

    let first = coords.first().unwrap();
    let last = coords.last().unwrap();
    assert!(first.x > 0.0 && first.x < 0.15);
    assert!(last.x < 1.0 && last.x > 0.85);
    // Symmetric about the center
    assert!((first.x + last.x - 1.0).abs() < 1e-5);
    assert!((first.y + last.y - 1.0).abs() < 1e-5);
}

#[test]
fn test_invalid_dimensions_rejected() {
    assert!(matches!(
        generate_grid(0, 8, 0.9, FRAC_PI_2, 1.0),
        Err(DepthCastError::InvalidGridDimensions { .. })
    ));
    assert!(matches!(
        generate_grid(8, 0, 0.9, FRAC_PI_2, 1.0),
        Err(DepthCastError::InvalidGridDimensions { .. })
    ));
}
