// SPDX-License-Identifier: GPL-3.0-only

//! Environment scanning orchestration
//!
//! [`Scanner`] wires the pieces together the way an interactive session
//! uses them: a sample grid over the current view, a raycast batch against
//! the depth texture, and either mesh assembly, point spawning, or a single
//! controller ray. It owns both GPU processors, the tracking source, and
//! the last successfully generated mesh.

use crate::config::Config;
use crate::constants::MeshDensity;
use crate::errors::{DepthCastError, DepthCastResult};
use crate::shaders::mesh::MeshProcessor;
use crate::shaders::raycast::{RaycastHit, RaycastProcessor};
use crate::shaders::sample_grid::generate_grid;
use crate::surface::{BoundingRegion, PointCloud, SurfaceMesh};
use crate::tracking::{DepthFrame, Eye, FrameTracking};
use glam::{Vec2, Vec3};
use tracing::{debug, info};

/// Outcome of a controller-aimed raycast
#[derive(Debug, Clone, Copy)]
pub struct ControllerHit {
    /// Point along the controller ray at the sampled surface distance
    pub intersection: Vec3,
    /// Distance from the controller to the intersection
    pub distance: f32,
    /// The underlying depth sample
    pub surface: RaycastHit,
}

/// Interactive environment scanner
pub struct Scanner {
    raycast: RaycastProcessor,
    mesh: MeshProcessor,
    tracking: Box<dyn FrameTracking>,
    density: MeshDensity,
    fov_margin: f32,
    eye: Eye,
    last_mesh: Option<SurfaceMesh>,
}

impl Scanner {
    /// Create a scanner with its own GPU processors
    pub async fn new(
        config: &Config,
        tracking: Box<dyn FrameTracking>,
    ) -> DepthCastResult<Self> {
        let raycast = RaycastProcessor::new().await?;
        let mesh = MeshProcessor::new().await?;

        info!(
            density = config.density.display_name(),
            fov_margin = config.fov_margin,
            "Scanner ready"
        );

        Ok(Self {
            raycast,
            mesh,
            tracking,
            density: config.density,
            fov_margin: config.fov_margin,
            eye: config.eye,
            last_mesh: None,
        })
    }

    /// Forward the latest depth frame to the sampling engine
    pub fn update_depth_frame(&mut self, frame: &DepthFrame) -> DepthCastResult<()> {
        self.raycast.update_depth_frame(frame)
    }

    /// Current density preset
    pub fn density(&self) -> MeshDensity {
        self.density
    }

    /// Step to the next density preset (wraps around)
    pub fn step_density_up(&mut self) -> MeshDensity {
        self.density = self.density.next();
        debug!(density = self.density.display_name(), "Density stepped up");
        self.density
    }

    /// Step to the previous density preset (wraps around)
    pub fn step_density_down(&mut self) -> MeshDensity {
        self.density = self.density.previous();
        debug!(density = self.density.display_name(), "Density stepped down");
        self.density
    }

    /// Last successfully generated mesh, if any
    pub fn last_mesh(&self) -> Option<&SurfaceMesh> {
        self.last_mesh.as_ref()
    }

    /// Sample grid over the current camera frustum at the active density
    fn view_grid(&self, size: u32) -> DepthCastResult<Vec<Vec2>> {
        let fov = self.tracking.eye_frustum(self.eye).fov;
        generate_grid(size, size, self.fov_margin, fov.vertical_fov(), fov.aspect())
    }

    /// Raycast the full sample grid and return the world-space points
    pub async fn sample_points(&mut self) -> DepthCastResult<PointCloud> {
        let size = self.density.sample_size();
        let coords = self.view_grid(size)?;
        let hits = self
            .raycast
            .sample_batch(self.tracking.as_ref(), self.eye, &coords)
            .await?;

        Ok(PointCloud {
            positions: hits.iter().map(|h| h.position).collect(),
            normals: hits.iter().map(|h| h.normal).collect(),
        })
    }

    /// Raycast the sample grid and keep only points inside the region
    pub async fn sample_points_bounded(
        &mut self,
        region: &BoundingRegion,
    ) -> DepthCastResult<PointCloud> {
        let full = self.sample_points().await?;

        let mut bounded = PointCloud::default();
        for (position, normal) in full.positions.iter().zip(full.normals.iter()) {
            if region.contains(*position) {
                bounded.positions.push(*position);
                bounded.normals.push(*normal);
            }
        }

        debug!(
            kept = bounded.len(),
            sampled = full.len(),
            "Bounded point filter"
        );
        Ok(bounded)
    }

    /// Scan the environment and assemble a triangulated mesh.
    ///
    /// On failure the previously generated mesh is left untouched; the
    /// stored mesh is only replaced once the new one is fully assembled.
    pub async fn generate_mesh(&mut self) -> DepthCastResult<&SurfaceMesh> {
        let size = self.density.sample_size();
        let coords = self.view_grid(size)?;
        let hits = self
            .raycast
            .sample_batch(self.tracking.as_ref(), self.eye, &coords)
            .await?;
        let positions: Vec<Vec3> = hits.iter().map(|h| h.position).collect();

        let mut mesh = self.mesh.build(size, size, &positions).await?;
        mesh.optimize();

        info!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "Environment mesh generated"
        );

        Ok(self.last_mesh.insert(mesh))
    }

    /// Bounded scan: points are clipped to the region before assembly.
    ///
    /// Filtering changes the vertex count per request, so the fixed grid
    /// topology no longer applies; the bounded path yields a point cloud
    /// rather than guessing a triangulation over the filtered set.
    pub async fn generate_mesh_bounded(
        &mut self,
        region: &BoundingRegion,
    ) -> DepthCastResult<PointCloud> {
        self.sample_points_bounded(region).await
    }

    /// Single depth raycast along a controller pose.
    ///
    /// The controller position is projected into the current viewport, the
    /// depth texture is sampled there, and the intersection point is placed
    /// along the controller's forward axis at the sampled view depth.
    pub async fn raycast_controller(
        &mut self,
        position: Vec3,
        forward: Vec3,
    ) -> DepthCastResult<ControllerHit> {
        let frustum = self.tracking.eye_frustum(self.eye);
        let coord = frustum
            .world_to_viewport(position)
            .ok_or(DepthCastError::ControllerOutOfView)?;

        let surface = self
            .raycast
            .sample_one(self.tracking.as_ref(), self.eye, coord)
            .await?;

        let distance = surface.view_depth;
        Ok(ControllerHit {
            intersection: position + forward.normalize_or_zero() * distance,
            distance,
            surface,
        })
    }

    /// Release all device memory held by the scanner
    pub fn release(&mut self) {
        self.raycast.release();
        self.mesh.release();
        self.last_mesh = None;
    }
}
