// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for headless scanning
//!
//! This module exercises the full pipeline without headset hardware: a
//! synthetic depth frame stands in for the capture subsystem and a fixed
//! pose for the tracking subsystem. Commands cover probing the compute
//! device, printing a sample grid, scanning a synthetic scene into a mesh
//! (GLB) or bounded point cloud (LAS), and a single view-space raycast.

use depthcast::config::Config;
use depthcast::constants::MeshDensity;
use depthcast::pipelines::scene::{export_mesh_glb, export_point_cloud_las};
use depthcast::scan::Scanner;
use depthcast::shaders::raycast::{raycast_view_space_one, upload_depth_frame};
use depthcast::shaders::sample_grid::generate_grid;
use depthcast::storage;
use depthcast::surface::BoundingRegion;
use depthcast::tracking::synthetic::{SyntheticScene, render_depth_frame};
use depthcast::tracking::{Eye, FovTangents, StaticTracking};
use glam::{Vec2, Vec3};
use std::f32::consts::FRAC_PI_2;
use std::path::PathBuf;

/// Resolution of the synthetic depth texture
const SYNTHETIC_DEPTH_SIZE: u32 = 256;

/// Probe the compute device and print adapter information
pub fn probe() -> Result<(), Box<dyn std::error::Error>> {
    let (_, _, info) = pollster::block_on(depthcast::gpu::create_compute_device("probe"))?;

    println!("Compute adapter: {}", info.adapter_name);
    println!("Backend:         {:?}", info.backend);
    Ok(())
}

/// Print the sample grid for a density preset
pub fn print_grid(density: MeshDensity, margin: f32) -> Result<(), Box<dyn std::error::Error>> {
    let size = density.sample_size();
    let coords = generate_grid(size, size, margin, FRAC_PI_2, 1.0)?;

    println!(
        "Grid {}x{} ({} preset), margin {:.2}: {} coordinates",
        size,
        size,
        density.display_name(),
        margin,
        coords.len()
    );
    if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
        println!("  first: ({:.4}, {:.4})", first.x, first.y);
        println!("  last:  ({:.4}, {:.4})", last.x, last.y);
    }
    Ok(())
}

fn synthetic_frame(config: &Config) -> depthcast::tracking::DepthFrame {
    let fov = FovTangents::symmetric(FRAC_PI_2, 1.0);
    let scene = SyntheticScene::Room {
        depth: 3.0,
        half_width: 2.0,
        floor: 1.5,
        ceiling: 1.5,
    };
    render_depth_frame(
        scene,
        SYNTHETIC_DEPTH_SIZE,
        SYNTHETIC_DEPTH_SIZE,
        fov,
        config.near_plane,
        config.far_plane,
    )
}

fn synthetic_scanner(config: &Config) -> Result<Scanner, Box<dyn std::error::Error>> {
    let tracking = StaticTracking::with_symmetric_fov(FRAC_PI_2, 1.0);
    let mut scanner = pollster::block_on(Scanner::new(config, Box::new(tracking)))?;
    scanner.update_depth_frame(&synthetic_frame(config))?;
    Ok(scanner)
}

/// Scan the synthetic scene into a mesh and export it as GLB
pub fn scan(
    density: Option<MeshDensity>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load();
    if let Some(density) = density {
        config.density = density;
    }

    let mut scanner = synthetic_scanner(&config)?;
    let runtime = tokio::runtime::Runtime::new()?;

    let path = output.unwrap_or_else(|| {
        let dir = storage::export_dir(&config);
        std::fs::create_dir_all(&dir).ok();
        storage::timestamped_path(&dir, "scan", "glb")
    });

    let mesh = pollster::block_on(scanner.generate_mesh())?;
    println!(
        "Generated mesh: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    let bounds = mesh.bounds();
    println!("Bounds: {:?} .. {:?}", bounds.min, bounds.max);

    runtime.block_on(export_mesh_glb(mesh, &path))?;
    println!("Exported to {}", path.display());
    Ok(())
}

/// Bounded scan: clip samples to a cuboid and export the points as LAS
pub fn scan_bounded(
    density: Option<MeshDensity>,
    extent: f32,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load();
    if let Some(density) = density {
        config.density = density;
    }

    let mut scanner = synthetic_scanner(&config)?;

    let region = BoundingRegion::axis_aligned(Vec3::new(0.0, 0.0, -2.0), Vec3::splat(extent));
    let cloud = pollster::block_on(scanner.generate_mesh_bounded(&region))?;
    println!("Bounded scan kept {} points", cloud.len());

    if cloud.is_empty() {
        println!("Nothing inside the region; no file written");
        return Ok(());
    }

    let path = output.unwrap_or_else(|| {
        let dir = storage::export_dir(&config);
        std::fs::create_dir_all(&dir).ok();
        storage::timestamped_path(&dir, "points", "las")
    });

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(export_point_cloud_las(&cloud, &path))?;
    println!("Exported to {}", path.display());
    Ok(())
}

/// Single raycast into the synthetic scene via the shared processor
pub fn raycast(x: f32, y: f32) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let tracking = StaticTracking::with_symmetric_fov(FRAC_PI_2, 1.0);

    let hit = pollster::block_on(async {
        upload_depth_frame(&synthetic_frame(&config)).await?;
        raycast_view_space_one(&tracking, Eye::Left, Vec2::new(x, y)).await
    })?;

    println!("Coordinate: ({:.3}, {:.3})", x, y);
    println!("Position:   {:?}", hit.position);
    println!("Normal:     {:?}", hit.normal);
    println!("Depth:      {:.3} m", hit.view_depth);
    Ok(())
}
