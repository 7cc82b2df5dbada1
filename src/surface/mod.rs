// SPDX-License-Identifier: GPL-3.0-only

//! Host-side surface geometry
//!
//! The GPU passes hand back raw vertex and index streams; this module owns
//! what happens to them afterwards: bounding volume recomputation, triangle
//! layout optimization, collision raycasts against the assembled mesh, and
//! the bounded point-cloud path.

use crate::errors::{DepthCastError, DepthCastResult};
use glam::{Quat, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Smallest box containing every point; empty input collapses to the
    /// origin.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        if points.is_empty() {
            min = Vec3::ZERO;
            max = Vec3::ZERO;
        }
        Self { min, max }
    }

    /// Slab test against a ray; returns false when the ray cannot touch
    /// the box.
    pub fn intersects_ray(&self, origin: Vec3, dir: Vec3) -> bool {
        let inv = dir.recip();
        let t0 = (self.min - origin) * inv;
        let t1 = (self.max - origin) * inv;
        let t_min = t0.min(t1).max_element();
        let t_max = t0.max(t1).min_element();
        t_max >= t_min.max(0.0)
    }
}

/// Result of a collision raycast against a [`SurfaceMesh`]
#[derive(Debug, Clone, Copy)]
pub struct MeshHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    pub triangle: usize,
}

/// Triangulated environment mesh, rebuilt in full per generation request
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: Aabb,
}

impl SurfaceMesh {
    /// Assemble a mesh from readback streams, recomputing the bounding
    /// volume. Rejects index streams that reference missing vertices.
    pub fn from_parts(
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> DepthCastResult<Self> {
        if normals.len() != positions.len() {
            return Err(DepthCastError::KernelDispatch(format!(
                "normal count {} does not match vertex count {}",
                normals.len(),
                positions.len()
            )));
        }
        if indices.len() % 3 != 0 {
            return Err(DepthCastError::KernelDispatch(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(DepthCastError::KernelDispatch(format!(
                "triangle index {} out of range for {} vertices",
                bad,
                positions.len()
            )));
        }

        let bounds = Aabb::from_points(&positions);
        Ok(Self {
            positions,
            normals,
            indices,
            bounds,
        })
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Reorder triangles so that ones referencing nearby vertices sit next
    /// to each other in the index stream. Keeps the triangle set and each
    /// triangle's winding intact; renderers with a post-transform vertex
    /// cache benefit from the locality.
    pub fn optimize(&mut self) {
        let mut order: Vec<usize> = (0..self.triangle_count()).collect();
        let key = |t: usize| -> u32 {
            let base = t * 3;
            self.indices[base]
                .min(self.indices[base + 1])
                .min(self.indices[base + 2])
        };
        order.sort_by_key(|&t| key(t));

        let mut reordered = Vec::with_capacity(self.indices.len());
        for t in order {
            let base = t * 3;
            reordered.extend_from_slice(&self.indices[base..base + 3]);
        }
        self.indices = reordered;
    }

    /// Nearest intersection of a ray with the mesh, if any.
    ///
    /// This is the collision-query path rebuilt after each generation: an
    /// AABB early-out followed by Moller-Trumbore over the triangles.
    pub fn raycast(&self, origin: Vec3, dir: Vec3) -> Option<MeshHit> {
        if !self.bounds.intersects_ray(origin, dir) {
            return None;
        }

        let mut nearest: Option<MeshHit> = None;
        for t in 0..self.triangle_count() {
            let base = t * 3;
            let a = self.positions[self.indices[base] as usize];
            let b = self.positions[self.indices[base + 1] as usize];
            let c = self.positions[self.indices[base + 2] as usize];

            if let Some(distance) = ray_triangle_intersection(origin, dir, a, b, c) {
                if nearest.map(|h| distance < h.distance).unwrap_or(true) {
                    let normal = (b - a).cross(c - a).normalize_or_zero();
                    nearest = Some(MeshHit {
                        point: origin + dir * distance,
                        normal,
                        distance,
                        triangle: t,
                    });
                }
            }
        }
        nearest
    }
}

/// Moller-Trumbore ray/triangle intersection; returns the hit distance
/// along `dir` for front or back faces.
fn ray_triangle_intersection(origin: Vec3, dir: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = b - a;
    let edge2 = c - a;
    let p = dir.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    if t > EPSILON { Some(t) } else { None }
}

/// Unstructured sampled points with normals (bounded scans, point spawning)
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Oriented cuboid region used to clip bounded scans
#[derive(Debug, Clone, Copy)]
pub struct BoundingRegion {
    pub center: Vec3,
    pub orientation: Quat,
    pub half_extents: Vec3,
}

impl BoundingRegion {
    /// Axis-aligned region
    pub fn axis_aligned(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            orientation: Quat::IDENTITY,
            half_extents,
        }
    }

    /// Containment test in the cuboid's local frame
    pub fn contains(&self, point: Vec3) -> bool {
        let local = self.orientation.conjugate() * (point - self.center);
        local.abs().cmple(self.half_extents).all()
    }
}

/// Reference implementation of the mesh kernel's index pattern: two
/// triangles per grid cell with consistent winding, row-major vertices.
pub fn grid_triangle_indices(width: u32, height: u32) -> Vec<u32> {
    if width < 2 || height < 2 {
        return Vec::new();
    }

    let mut indices = Vec::with_capacity(((width - 1) * (height - 1) * 6) as usize);
    for z in 0..height - 1 {
        for x in 0..width - 1 {
            let i = z * width + x;
            indices.extend_from_slice(&[
                i,
                i + width,
                i + 1,
                i + 1,
                i + width,
                i + width + 1,
            ]);
        }
    }
    indices
}
