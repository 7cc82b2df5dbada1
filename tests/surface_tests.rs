// SPDX-License-Identifier: MPL-2.0

//! Integration tests for surface assembly and collision queries

use depthcast::surface::{BoundingRegion, SurfaceMesh, grid_triangle_indices};
use glam::{Quat, Vec3};

fn grid_positions(width: u32, height: u32) -> Vec<Vec3> {
    let mut positions = Vec::new();
    for z in 0..height {
        for x in 0..width {
            positions.push(Vec3::new(x as f32 * 0.1, 0.0, -(z as f32) * 0.1 - 1.0));
        }
    }
    positions
}

fn grid_mesh(width: u32, height: u32) -> SurfaceMesh {
    let positions = grid_positions(width, height);
    let normals = vec![Vec3::Y; positions.len()];
    SurfaceMesh::from_parts(positions, normals, grid_triangle_indices(width, height)).unwrap()
}

#[test]
fn test_grid_topology_counts() {
    // w*h vertices, (w-1)*(h-1)*2 triangles
    for (w, h) in [(2u32, 2u32), (4, 4), (5, 3), (64, 64)] {
        let mesh = grid_mesh(w, h);
        assert_eq!(mesh.vertex_count(), (w * h) as usize);
        assert_eq!(mesh.triangle_count(), ((w - 1) * (h - 1) * 2) as usize);
        assert!(mesh.indices().iter().all(|&i| (i as usize) < mesh.vertex_count()));
    }
}

#[test]
fn test_four_by_four_assembly_scenario() {
    let mesh = grid_mesh(4, 4);
    assert_eq!(mesh.vertex_count(), 16);
    assert_eq!(mesh.triangle_count(), 18);
    assert_eq!(mesh.indices().len(), 54);
}

#[test]
fn test_every_cell_gets_two_triangles() {
    let indices = grid_triangle_indices(3, 3);
    // Cell (0,0): first two triangles reference its four corner vertices
    assert_eq!(&indices[..6], &[0, 3, 1, 1, 3, 4]);
    // Last cell (1,1) touches the last vertex
    assert_eq!(indices[indices.len() - 1], 8);
}

#[test]
fn test_consistent_winding() {
    // All triangles of a planar grid face the same way: signed areas share
    // a sign.
    let mesh = grid_mesh(4, 4);
    let mut reference_sign = 0.0f32;
    for t in 0..mesh.triangle_count() {
        let base = t * 3;
        let a = mesh.positions()[mesh.indices()[base] as usize];
        let b = mesh.positions()[mesh.indices()[base + 1] as usize];
        let c = mesh.positions()[mesh.indices()[base + 2] as usize];
        let area = (b - a).cross(c - a).y;
        assert!(area.abs() > 1e-9, "degenerate triangle {}", t);
        if reference_sign == 0.0 {
            reference_sign = area.signum();
        }
        assert_eq!(area.signum(), reference_sign, "winding flipped at {}", t);
    }
}

#[test]
fn test_optimize_then_raycast() {
    let mut mesh = grid_mesh(8, 8);
    mesh.optimize();

    let hit = mesh
        .raycast(Vec3::new(0.35, 1.0, -1.35), Vec3::NEG_Y)
        .expect("downward ray should hit the sheet");
    assert!((hit.distance - 1.0).abs() < 1e-4);
}

#[test]
fn test_bounded_region_filters_points() {
    let positions = grid_positions(8, 8);
    let region = BoundingRegion::axis_aligned(Vec3::new(0.0, 0.0, -1.0), Vec3::splat(0.15));

    let kept: Vec<&Vec3> = positions.iter().filter(|p| region.contains(**p)).collect();
    assert!(!kept.is_empty());
    assert!(kept.len() < positions.len());
    for p in kept {
        assert!((p.x).abs() <= 0.15 + 1e-6);
        assert!((p.z + 1.0).abs() <= 0.15 + 1e-6);
    }
}

#[test]
fn test_rotated_region() {
    let region = BoundingRegion {
        center: Vec3::new(0.0, 0.0, -2.0),
        orientation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_4),
        half_extents: Vec3::new(1.0, 0.1, 0.1),
    };

    // Along the rotated local x axis
    let along = Vec3::new(0.6, 0.0, -2.0 - 0.6);
    assert!(region.contains(along));
    // Same offset in the unrotated direction falls outside
    assert!(!region.contains(Vec3::new(0.85, 0.0, -2.0)));
}
