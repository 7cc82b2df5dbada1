// SPDX-License-Identifier: GPL-3.0-only

//! GPU raycast processor
//!
//! Owns the depth texture and the request/result device buffers, and runs
//! the raycast kernel synchronously per batch: upload coordinates, dispatch
//! one workgroup per 32 requests, block on readback. Buffers are resized
//! only when the request count changes and released on teardown.

use crate::constants::gpu::RAYCAST_WORKGROUP_SIZE;
use crate::errors::{DepthCastError, DepthCastResult};
use crate::gpu::{self, wgpu};
use crate::gpu_processor_singleton;
use crate::shaders::common::{RaycastParams, ZBufferParams};
use crate::shaders::gpu_processor::{CachedCount, compute_dispatch_size, read_buffer_async};
use crate::shaders::reprojection::reprojection_matrix;
use crate::tracking::{DepthFrame, DepthFrameDesc, Eye, FrameTracking};
use glam::{Vec2, Vec3};
use std::sync::Arc;
use tracing::{debug, info};

/// One raycast outcome: where the depth capture saw a surface along the
/// requested view-space coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Surface position in world space
    pub position: Vec3,
    /// Unit surface normal
    pub normal: Vec3,
    /// Linear view-space depth of the sample in meters
    pub view_depth: f32,
}

/// GPU-side layout of one raycast result
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuRaycastHit {
    /// xyz = world position, w = linear view depth
    position: [f32; 4],
    /// xyz = unit normal
    normal: [f32; 4],
}

impl From<GpuRaycastHit> for RaycastHit {
    fn from(hit: GpuRaycastHit) -> Self {
        Self {
            position: Vec3::new(hit.position[0], hit.position[1], hit.position[2]),
            normal: Vec3::new(hit.normal[0], hit.normal[1], hit.normal[2]),
            view_depth: hit.position[3],
        }
    }
}

/// Request/result buffer pool, sized to the current batch
#[derive(Default)]
struct RaycastBuffers {
    requests: Option<wgpu::Buffer>,
    results: Option<wgpu::Buffer>,
    staging: Option<wgpu::Buffer>,
    cached: CachedCount,
}

impl RaycastBuffers {
    /// Reallocate when the request count changed; no-op otherwise
    fn ensure(&mut self, device: &wgpu::Device, count: usize) {
        if !self.cached.needs_update(count) && self.requests.is_some() {
            return;
        }

        debug!(count, "Allocating raycast buffers");
        self.release();

        self.requests = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("raycast_requests_buffer"),
            size: (count * std::mem::size_of::<[f32; 2]>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.results = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("raycast_results_buffer"),
            size: (count * std::mem::size_of::<GpuRaycastHit>()) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        }));
        self.staging = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("raycast_staging_buffer"),
            size: (count * std::mem::size_of::<GpuRaycastHit>()) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        }));
        self.cached.update(count);
    }

    /// Return device memory; safe to call repeatedly
    fn release(&mut self) {
        for buffer in [&self.requests, &self.results, &self.staging]
            .into_iter()
            .flatten()
        {
            buffer.destroy();
        }
        self.requests = None;
        self.results = None;
        self.staging = None;
        self.cached.clear();
    }
}

/// Uploaded depth frame state: the 2-layer depth texture plus the per-eye
/// capture descriptors it was produced with.
struct DepthTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    descs: [DepthFrameDesc; 2],
    width: u32,
    height: u32,
}

/// GPU raycast processor
pub struct RaycastProcessor {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    buffers: RaycastBuffers,
    depth: Option<DepthTarget>,
}

impl RaycastProcessor {
    /// Create a new GPU raycast processor
    pub async fn new() -> DepthCastResult<Self> {
        info!("Initializing GPU raycast processor");

        let (device, queue, gpu_info) = gpu::create_compute_device("raycast_gpu").await?;

        info!(
            adapter_name = %gpu_info.adapter_name,
            adapter_backend = ?gpu_info.backend,
            "GPU device created for depth raycasting"
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("raycast_shader"),
            source: wgpu::ShaderSource::Wgsl(super::raycast_shader().into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("raycast_bind_group_layout"),
                entries: &[
                    // Request buffer
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
                    // Result buffer
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
                    // Depth texture (one layer per eye)
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: false },
                            view_dimension: wgpu::TextureViewDimension::D2Array,
                            multisampled: false,
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
            label: Some("raycast_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("raycast_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some(super::RAYCAST_ENTRY_POINT),
            compilation_options: Default::default(),
            cache: None,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("raycast_uniform_buffer"),
            size: std::mem::size_of::<RaycastParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            uniform_buffer,
            buffers: RaycastBuffers::default(),
            depth: None,
        })
    }

    /// Upload the latest depth frame from the capture subsystem.
    ///
    /// The texture is reallocated only when the frame dimensions change;
    /// descriptors are replaced every call.
    pub fn update_depth_frame(&mut self, frame: &DepthFrame) -> DepthCastResult<()> {
        if frame.width == 0 || frame.height == 0 {
            return Err(DepthCastError::InvalidDepthFrame(format!(
                "degenerate depth resolution {}x{}",
                frame.width, frame.height
            )));
        }
        let expected = frame.layer_len() * 2;
        if frame.data.len() != expected {
            return Err(DepthCastError::InvalidDepthFrame(format!(
                "depth data length {} does not match 2 layers of {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }

        let needs_texture = match &self.depth {
            Some(target) => target.width != frame.width || target.height != frame.height,
            None => true,
        };

        if needs_texture {
            debug!(
                width = frame.width,
                height = frame.height,
                "Allocating depth texture"
            );

            if let Some(old) = self.depth.take() {
                old.texture.destroy();
            }

            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("environment_depth_texture"),
                size: wgpu::Extent3d {
                    width: frame.width,
                    height: frame.height,
                    depth_or_array_layers: 2,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::R32Float,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor {
                dimension: Some(wgpu::TextureViewDimension::D2Array),
                ..Default::default()
            });

            self.depth = Some(DepthTarget {
                texture,
                view,
                descs: frame.eyes,
                width: frame.width,
                height: frame.height,
            });
        }

        let Some(target) = self.depth.as_mut() else {
            return Err(DepthCastError::DepthUnavailable);
        };
        target.descs = frame.eyes;

        for (layer, chunk) in frame.data.chunks_exact(frame.layer_len()).enumerate() {
            self.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &target.texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                bytemuck::cast_slice(chunk),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(frame.width * 4),
                    rows_per_image: Some(frame.height),
                },
                wgpu::Extent3d {
                    width: frame.width,
                    height: frame.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        Ok(())
    }

    /// Raycast a batch of view-space coordinates, blocking until readback.
    ///
    /// Length- and order-preserving: `result[i]` corresponds to
    /// `coords[i]`. An empty batch returns immediately without touching
    /// the device.
    pub async fn sample_batch(
        &mut self,
        tracking: &dyn FrameTracking,
        eye: Eye,
        coords: &[Vec2],
    ) -> DepthCastResult<Vec<RaycastHit>> {
        if coords.is_empty() {
            return Ok(Vec::new());
        }

        let depth = self.depth.as_ref().ok_or(DepthCastError::DepthUnavailable)?;
        let count = coords.len();

        // Reprojection state is only valid for this frame: rebuild both
        // eyes from fresh descriptors before every dispatch.
        let mut reprojection = [[[0.0f32; 4]; 4]; 2];
        let mut depth_inv_view_proj = [[[0.0f32; 4]; 4]; 2];
        for e in Eye::BOTH {
            let frustum = tracking.eye_frustum(e);
            let desc = &depth.descs[e.index()];
            reprojection[e.index()] = reprojection_matrix(desc, &frustum).to_cols_array_2d();
            depth_inv_view_proj[e.index()] = desc.inverse_view_projection().to_cols_array_2d();
        }

        let desc = &depth.descs[eye.index()];
        let params = RaycastParams {
            reprojection,
            depth_inv_view_proj,
            z_buffer_params: ZBufferParams::from_clip_planes(desc.near, desc.far),
            depth_size: [depth.width as f32, depth.height as f32],
            request_count: count as u32,
            eye: eye.index() as u32,
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&params));

        self.buffers.ensure(&self.device, count);
        let requests = self.buffers.requests.as_ref().ok_or_else(|| {
            DepthCastError::BufferAllocation("request buffer not allocated".into())
        })?;
        let results = self.buffers.results.as_ref().ok_or_else(|| {
            DepthCastError::BufferAllocation("result buffer not allocated".into())
        })?;
        let staging = self.buffers.staging.as_ref().ok_or_else(|| {
            DepthCastError::BufferAllocation("staging buffer not allocated".into())
        })?;

        self.queue
            .write_buffer(requests, 0, bytemuck::cast_slice(coords));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("raycast_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: requests.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: results.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&depth.view),
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
                label: Some("raycast_encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("raycast_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, Some(&bind_group), &[]);
            pass.dispatch_workgroups(
                compute_dispatch_size(count as u32, RAYCAST_WORKGROUP_SIZE),
                1,
                1,
            );
        }
        encoder.copy_buffer_to_buffer(
            results,
            0,
            staging,
            0,
            (count * std::mem::size_of::<GpuRaycastHit>()) as u64,
        );

        self.queue.submit(std::iter::once(encoder.finish()));

        let data = read_buffer_async(&self.device, staging).await?;
        let hits: Vec<RaycastHit> = bytemuck::cast_slice::<u8, GpuRaycastHit>(&data)
            .iter()
            .map(|&h| h.into())
            .collect();

        debug!(count = hits.len(), "Raycast batch complete");
        Ok(hits)
    }

    /// Raycast a single view-space coordinate
    pub async fn sample_one(
        &mut self,
        tracking: &dyn FrameTracking,
        eye: Eye,
        coord: Vec2,
    ) -> DepthCastResult<RaycastHit> {
        let hits = self.sample_batch(tracking, eye, &[coord]).await?;
        hits.into_iter()
            .next()
            .ok_or_else(|| DepthCastError::KernelDispatch("empty result for single ray".into()))
    }

    /// Release all device memory held by this processor
    pub fn release(&mut self) {
        self.buffers.release();
        if let Some(target) = self.depth.take() {
            target.texture.destroy();
        }
    }
}

impl Drop for RaycastProcessor {
    fn drop(&mut self) {
        self.release();
    }
}

// Use the shared singleton macro for GPU processor management
gpu_processor_singleton!(RaycastProcessor, GPU_RAYCAST_PROCESSOR, get_raycast_processor);

/// Upload a depth frame to the shared GPU raycast processor
pub async fn upload_depth_frame(frame: &DepthFrame) -> DepthCastResult<()> {
    let mut guard = get_raycast_processor().await?;
    let processor = guard
        .as_mut()
        .ok_or_else(|| DepthCastError::GpuInit("GPU raycast processor not initialized".into()))?;

    processor.update_depth_frame(frame)
}

/// Raycast a batch of view-space coordinates using the shared GPU processor
pub async fn raycast_view_space(
    tracking: &dyn FrameTracking,
    eye: Eye,
    coords: &[Vec2],
) -> DepthCastResult<Vec<RaycastHit>> {
    let mut guard = get_raycast_processor().await?;
    let processor = guard
        .as_mut()
        .ok_or_else(|| DepthCastError::GpuInit("GPU raycast processor not initialized".into()))?;

    processor.sample_batch(tracking, eye, coords).await
}

/// Raycast a single view-space coordinate using the shared GPU processor
pub async fn raycast_view_space_one(
    tracking: &dyn FrameTracking,
    eye: Eye,
    coord: Vec2,
) -> DepthCastResult<RaycastHit> {
    let mut guard = get_raycast_processor().await?;
    let processor = guard
        .as_mut()
        .ok_or_else(|| DepthCastError::GpuInit("GPU raycast processor not initialized".into()))?;

    processor.sample_one(tracking, eye, coord).await
}
