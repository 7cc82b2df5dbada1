// SPDX-License-Identifier: MPL-2.0

//! depthcast - environment depth raycasting and mesh reconstruction
//!
//! This library reconstructs a 3D surface mesh of the physical environment
//! from the per-eye depth texture a mixed-reality headset captures, and
//! supports interactive raycasting against that depth data.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`shaders`]: the two GPU compute passes (depth raycast, mesh
//!   assembly) and the host-side math feeding them (reprojection, sample
//!   grid)
//! - [`tracking`]: depth frame and camera pose interfaces to the external
//!   capture/tracking subsystems
//! - [`surface`]: host-side mesh, point cloud, and collision queries
//! - [`scan`]: the interactive scanner tying grid, raycast, and assembly
//!   together
//! - [`pipelines`]: GLB / LAS export of scan results
//! - [`config`]: user configuration handling
//!
//! # Example
//!
//! ```ignore
//! let config = Config::load();
//! let tracking = StaticTracking::with_symmetric_fov(1.57, 1.0);
//! let mut scanner = Scanner::new(&config, Box::new(tracking)).await?;
//! scanner.update_depth_frame(&frame)?;
//! let mesh = scanner.generate_mesh().await?;
//! ```

pub mod config;
pub mod constants;
pub mod errors;
pub mod gpu;
pub mod pipelines;
pub mod scan;
pub mod shaders;
pub mod storage;
pub mod surface;
pub mod tracking;

// Re-export commonly used types
pub use config::Config;
pub use constants::MeshDensity;
pub use errors::{DepthCastError, DepthCastResult};
pub use scan::{ControllerHit, Scanner};
pub use shaders::{MeshProcessor, RaycastHit, RaycastProcessor};
pub use surface::{Aabb, BoundingRegion, MeshHit, PointCloud, SurfaceMesh};
pub use tracking::{DepthFrame, DepthFrameDesc, Eye, EyeFrustum, FrameTracking, StaticTracking};
