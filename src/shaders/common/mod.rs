// SPDX-License-Identifier: GPL-3.0-only

//! Shared kernel parameter definitions

pub mod params;

pub use params::{MeshBuildParams, RaycastParams, ZBufferParams};
