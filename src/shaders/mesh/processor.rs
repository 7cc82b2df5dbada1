// SPDX-License-Identifier: GPL-3.0-only

//! GPU mesh processor
//!
//! Dispatches the mesh assembly kernel over a sampled position grid and
//! reads back vertices and triangle indices. Buffer lifecycle mirrors the
//! raycast processor: lazily resized on count changes, released on
//! teardown.

use crate::constants::gpu::MESH_WORKGROUP_SIZE;
use crate::errors::{DepthCastError, DepthCastResult};
use crate::gpu::{self, wgpu};
use crate::gpu_processor_singleton;
use crate::shaders::common::MeshBuildParams;
use crate::shaders::gpu_processor::{CachedCount, compute_dispatch_size, read_buffer_async};
use crate::surface::SurfaceMesh;
use glam::Vec3;
use std::sync::Arc;
use tracing::{debug, info};

/// GPU-side layout of one assembled vertex
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuVertexData {
    position: [f32; 4],
    normal: [f32; 4],
}

/// Position/vertex/triangle buffer pool, sized to the current grid
#[derive(Default)]
struct MeshBuffers {
    positions: Option<wgpu::Buffer>,
    vertices: Option<wgpu::Buffer>,
    triangles: Option<wgpu::Buffer>,
    staging_vertices: Option<wgpu::Buffer>,
    staging_triangles: Option<wgpu::Buffer>,
    cached: CachedCount,
}

impl MeshBuffers {
    /// Reallocate when the vertex count changed; no-op otherwise
    fn ensure(&mut self, device: &wgpu::Device, vertex_count: usize, index_count: usize) {
        if !self.cached.needs_update(vertex_count) && self.positions.is_some() {
            return;
        }

        debug!(vertex_count, index_count, "Allocating mesh buffers");
        self.release();

        // Degenerate 1-wide grids have no triangles; a zero-size buffer is
        // not bindable, so clamp to one index worth of storage.
        let triangle_bytes = (index_count.max(1) * std::mem::size_of::<u32>()) as u64;

        self.positions = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh_positions_buffer"),
            size: (vertex_count * std::mem::size_of::<[f32; 4]>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.vertices = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh_vertices_buffer"),
            size: (vertex_count * std::mem::size_of::<GpuVertexData>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        }));
        self.triangles = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh_triangles_buffer"),
            size: triangle_bytes,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        }));
        self.staging_vertices = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh_staging_vertices_buffer"),
            size: (vertex_count * std::mem::size_of::<GpuVertexData>()) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        }));
        self.staging_triangles = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh_staging_triangles_buffer"),
            size: triangle_bytes,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        }));
        self.cached.update(vertex_count);
    }

    /// Return device memory; safe to call repeatedly
    fn release(&mut self) {
        for buffer in [
            &self.positions,
            &self.vertices,
            &self.triangles,
            &self.staging_vertices,
            &self.staging_triangles,
        ]
        .into_iter()
        .flatten()
        {
            buffer.destroy();
        }
        self.positions = None;
        self.vertices = None;
        self.triangles = None;
        self.staging_vertices = None;
        self.staging_triangles = None;
        self.cached.clear();
    }
}

/// GPU mesh processor
pub struct MeshProcessor {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    buffers: MeshBuffers,
}

impl MeshProcessor {
    /// Create a new GPU mesh processor
    pub async fn new() -> DepthCastResult<Self> {
        info!("Initializing GPU mesh processor");

        let (device, queue, gpu_info) = gpu::create_compute_device("mesh_gpu").await?;

        info!(
            adapter_name = %gpu_info.adapter_name,
            adapter_backend = ?gpu_info.backend,
            "GPU device created for mesh assembly"
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh_shader"),
            source: wgpu::ShaderSource::Wgsl(super::mesh_shader().into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("mesh_bind_group_layout"),
                entries: &[
                    // Sampled position buffer
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: true },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // Vertex output buffer
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // Triangle index output buffer
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Storage { read_only: false },
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // Uniform parameters
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mesh_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("mesh_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some(super::MESH_ENTRY_POINT),
            compilation_options: Default::default(),
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mesh_uniform_buffer"),
            size: std::mem::size_of::<MeshBuildParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            buffers: MeshBuffers::default(),
        })
    }

    /// Assemble a `width x height` position grid into a triangulated mesh,
    /// blocking until readback.
    pub async fn build(
        &mut self,
        width: u32,
        height: u32,
        positions: &[Vec3],
    ) -> DepthCastResult<SurfaceMesh> {
        if width < 1 || height < 1 {
            return Err(DepthCastError::InvalidGridDimensions { width, height });
        }
        let vertex_count = (width * height) as usize;
        if positions.len() != vertex_count {
            return Err(DepthCastError::InvalidGridDimensions { width, height });
        }

        let triangle_count = ((width - 1) * (height - 1) * 2) as usize;
        let index_count = triangle_count * 3;

        self.buffers.ensure(&self.device, vertex_count, index_count);
        let position_buffer = self.buffers.positions.as_ref().ok_or_else(|| {
            DepthCastError::BufferAllocation("position buffer not allocated".into())
        })?;
        let vertex_buffer = self.buffers.vertices.as_ref().ok_or_else(|| {
            DepthCastError::BufferAllocation("vertex buffer not allocated".into())
        })?;
        let triangle_buffer = self.buffers.triangles.as_ref().ok_or_else(|| {
            DepthCastError::BufferAllocation("triangle buffer not allocated".into())
        })?;
        let staging_vertices = self.buffers.staging_vertices.as_ref().ok_or_else(|| {
            DepthCastError::BufferAllocation("vertex staging buffer not allocated".into())
        })?;
        let staging_triangles = self.buffers.staging_triangles.as_ref().ok_or_else(|| {
            DepthCastError::BufferAllocation("triangle staging buffer not allocated".into())
        })?;

        // Positions are padded to vec4 for the storage layout
        let padded: Vec<[f32; 4]> = positions.iter().map(|p| [p.x, p.y, p.z, 1.0]).collect();
        self.queue
            .write_buffer(position_buffer, 0, bytemuck::cast_slice(&padded));

        let params = MeshBuildParams {
            grid_width: width,
            grid_height: height,
            vertex_count: vertex_count as u32,
            _pad: 0,
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&params));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mesh_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: position_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: vertex_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: triangle_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("mesh_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("mesh_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, Some(&bind_group), &[]);
            pass.dispatch_workgroups(
                compute_dispatch_size(vertex_count as u32, MESH_WORKGROUP_SIZE),
                1,
                1,
            );
        }
        encoder.copy_buffer_to_buffer(
            vertex_buffer,
            0,
            staging_vertices,
            0,
            (vertex_count * std::mem::size_of::<GpuVertexData>()) as u64,
        );
        if index_count > 0 {
            encoder.copy_buffer_to_buffer(
                triangle_buffer,
                0,
                staging_triangles,
                0,
                (index_count * std::mem::size_of::<u32>()) as u64,
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        let vertex_data = read_buffer_async(&self.device, staging_vertices).await?;
        let gpu_vertices: &[GpuVertexData] = bytemuck::cast_slice(&vertex_data);

        let mut mesh_positions = Vec::with_capacity(vertex_count);
        let mut mesh_normals = Vec::with_capacity(vertex_count);
        for v in gpu_vertices {
            mesh_positions.push(Vec3::new(v.position[0], v.position[1], v.position[2]));
            mesh_normals.push(Vec3::new(v.normal[0], v.normal[1], v.normal[2]));
        }

        let indices = if index_count > 0 {
            let triangle_data = read_buffer_async(&self.device, staging_triangles).await?;
            bytemuck::cast_slice::<u8, u32>(&triangle_data)[..index_count].to_vec()
        } else {
            Vec::new()
        };

        debug!(
            vertex_count,
            triangle_count, "Mesh assembly readback complete"
        );

        SurfaceMesh::from_parts(mesh_positions, mesh_normals, indices)
    }

    /// Release all device memory held by this processor
    pub fn release(&mut self) {
        self.buffers.release();
    }
}

impl Drop for MeshProcessor {
    fn drop(&mut self) {
        self.release();
    }
}

// Use the shared singleton macro for GPU processor management
gpu_processor_singleton!(MeshProcessor, GPU_MESH_PROCESSOR, get_mesh_processor);

/// Assemble a mesh using the shared GPU processor
pub async fn build_mesh(
    width: u32,
    height: u32,
    positions: &[Vec3],
) -> DepthCastResult<SurfaceMesh> {
    let mut guard = get_mesh_processor().await?;
    let processor = guard
        .as_mut()
        .ok_or_else(|| DepthCastError::GpuInit("GPU mesh processor not initialized".into()))?;

    processor.build(width, height, positions).await
}
