// SPDX-License-Identifier: MPL-2.0

//! End-to-end scanner tests against a synthetic depth frame
//!
//! These run the real compute pipeline and are skipped gracefully on
//! machines without a GPU adapter.

use depthcast::config::Config;
use depthcast::constants::MeshDensity;
use depthcast::scan::Scanner;
use depthcast::tracking::synthetic::{SyntheticScene, render_depth_frame};
use depthcast::tracking::{FovTangents, StaticTracking};
use glam::Vec3;
use std::f32::consts::FRAC_PI_2;

async fn wall_scanner(distance: f32) -> Option<Scanner> {
    let config = Config {
        density: MeshDensity::Low,
        ..Default::default()
    };
    let tracking = StaticTracking::with_symmetric_fov(FRAC_PI_2, 1.0);

    let mut scanner = match Scanner::new(&config, Box::new(tracking)).await {
        Ok(s) => s,
        Err(e) => {
            println!("Skipping test (no GPU): {}", e);
            return None;
        }
    };

    let fov = FovTangents::symmetric(FRAC_PI_2, 1.0);
    let frame = render_depth_frame(
        SyntheticScene::Wall { distance },
        128,
        128,
        fov,
        config.near_plane,
        config.far_plane,
    );
    scanner.update_depth_frame(&frame).unwrap();
    Some(scanner)
}

#[tokio::test]
async fn test_sample_points_preserves_grid_size() {
    let Some(mut scanner) = wall_scanner(2.0).await else {
        return;
    };

    let cloud = scanner.sample_points().await.unwrap();
    let size = scanner.density().sample_size() as usize;
    assert_eq!(cloud.len(), size * size);
}

#[tokio::test]
async fn test_wall_samples_land_on_wall() {
    let Some(mut scanner) = wall_scanner(2.0).await else {
        return;
    };

    let cloud = scanner.sample_points().await.unwrap();
    // Every sample of a wall at z = -2 reconstructs to that plane
    for p in &cloud.positions {
        assert!(
            (p.z + 2.0).abs() < 0.05,
            "sample off the wall plane: {:?}",
            p
        );
    }
    // Normals face the viewer
    for n in &cloud.normals {
        assert!(n.z > 0.9, "unexpected wall normal: {:?}", n);
    }
}

#[tokio::test]
async fn test_generated_mesh_matches_grid_topology() {
    let Some(mut scanner) = wall_scanner(2.0).await else {
        return;
    };

    let size = scanner.density().sample_size() as usize;
    let mesh = scanner.generate_mesh().await.unwrap();
    assert_eq!(mesh.vertex_count(), size * size);
    assert_eq!(mesh.triangle_count(), (size - 1) * (size - 1) * 2);

    let bounds = mesh.bounds();
    assert!((bounds.min.z + 2.0).abs() < 0.05);
    assert!((bounds.max.z + 2.0).abs() < 0.05);
}

#[tokio::test]
async fn test_last_mesh_tracks_latest_success() {
    let Some(mut scanner) = wall_scanner(2.0).await else {
        return;
    };

    scanner.generate_mesh().await.unwrap();
    let before = scanner.last_mesh().unwrap().vertex_count();

    // Second generation succeeds and replaces; density change means a new
    // vertex count, proving the stored mesh tracks the latest success.
    scanner.step_density_up();
    scanner.generate_mesh().await.unwrap();
    let after = scanner.last_mesh().unwrap().vertex_count();
    assert_ne!(before, after);
}

#[tokio::test]
async fn test_controller_raycast_hits_wall() {
    let Some(mut scanner) = wall_scanner(2.0).await else {
        return;
    };

    let hit = scanner
        .raycast_controller(Vec3::new(0.0, 0.0, -0.1), Vec3::NEG_Z)
        .await
        .unwrap();
    assert!((hit.distance - 2.0).abs() < 0.05);
    assert!((hit.surface.position.z + 2.0).abs() < 0.05);
}

#[tokio::test]
async fn test_bounded_scan_filters() {
    let Some(mut scanner) = wall_scanner(2.0).await else {
        return;
    };

    // A region hugging the wall center keeps a strict subset
    let region = depthcast::surface::BoundingRegion::axis_aligned(
        Vec3::new(0.0, 0.0, -2.0),
        Vec3::new(0.5, 0.5, 0.2),
    );
    let bounded = scanner.generate_mesh_bounded(&region).await.unwrap();
    let full = scanner.sample_points().await.unwrap();

    assert!(!bounded.is_empty());
    assert!(bounded.len() < full.len());
    for p in &bounded.positions {
        assert!(region.contains(*p));
    }
}
