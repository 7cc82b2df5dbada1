// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// Mesh density presets
///
/// Each preset selects the square sample-grid resolution used when scanning
/// the environment. Users step through the presets cyclically from the
/// controller, trading reconstruction detail against dispatch cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MeshDensity {
    /// 32x32 samples - coarse preview
    Low,
    /// 64x64 samples - balanced detail and latency (default)
    #[default]
    Medium,
    /// 128x128 samples
    High,
    /// 256x256 samples
    VeryHigh,
    /// 512x512 samples - full detail, noticeably heavy readback
    Ultra,
}

impl MeshDensity {
    /// All presets in stepping order, for cyclic traversal and UI iteration
    pub const ALL: [MeshDensity; 5] = [
        MeshDensity::Low,
        MeshDensity::Medium,
        MeshDensity::High,
        MeshDensity::VeryHigh,
        MeshDensity::Ultra,
    ];

    /// Get display name for the preset
    pub fn display_name(&self) -> &'static str {
        match self {
            MeshDensity::Low => "Low",
            MeshDensity::Medium => "Medium",
            MeshDensity::High => "High",
            MeshDensity::VeryHigh => "Very High",
            MeshDensity::Ultra => "Ultra",
        }
    }

    /// Sample grid side length for this preset
    pub fn sample_size(&self) -> u32 {
        match self {
            MeshDensity::Low => 32,
            MeshDensity::Medium => 64,
            MeshDensity::High => 128,
            MeshDensity::VeryHigh => 256,
            MeshDensity::Ultra => 512,
        }
    }

    /// Parse a preset from its CLI/display spelling
    pub fn from_name(name: &str) -> Option<MeshDensity> {
        match name.to_ascii_lowercase().as_str() {
            "low" => Some(MeshDensity::Low),
            "medium" => Some(MeshDensity::Medium),
            "high" => Some(MeshDensity::High),
            "very-high" | "veryhigh" => Some(MeshDensity::VeryHigh),
            "ultra" => Some(MeshDensity::Ultra),
            _ => None,
        }
    }

    /// Position of this preset within [`MeshDensity::ALL`]
    fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|d| d == self)
            .expect("preset missing from ALL")
    }

    /// Next preset, wrapping from the last back to the first
    pub fn next(&self) -> MeshDensity {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Previous preset, wrapping from the first back to the last
    pub fn previous(&self) -> MeshDensity {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Depth sampling defaults
pub mod sampling {
    /// Fraction of the camera field of view covered by the sample grid.
    /// Staying inside the true frustum avoids clamped depth lookups at the
    /// periphery of the depth texture.
    pub const DEFAULT_FOV_MARGIN: f32 = 0.9;

    /// Near clip plane of the depth capture (meters)
    pub const DEFAULT_NEAR_PLANE: f32 = 0.1;

    /// Far clip plane of the depth capture (meters)
    pub const DEFAULT_FAR_PLANE: f32 = 10.0;
}

/// GPU dispatch constants
pub mod gpu {
    /// Workgroup size of the raycast kernel. Matches the warp/wavefront
    /// granularity assumed by the dispatch calculation (ceil(count / 32)).
    pub const RAYCAST_WORKGROUP_SIZE: u32 = 32;

    /// Workgroup size of the mesh assembly kernel (1-D over vertices)
    pub const MESH_WORKGROUP_SIZE: u32 = 64;
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_density_stepping_wraps() {
        assert_eq!(MeshDensity::Ultra.next(), MeshDensity::Low);
        assert_eq!(MeshDensity::Low.previous(), MeshDensity::Ultra);
        assert_eq!(MeshDensity::Medium.next(), MeshDensity::High);
        assert_eq!(MeshDensity::High.previous(), MeshDensity::Medium);
    }

    #[test]
    fn test_density_round_trip() {
        for density in MeshDensity::ALL {
            assert_eq!(density.next().previous(), density);
        }
    }

    #[test]
    fn test_sample_sizes_increase() {
        let mut prev = 0;
        for density in MeshDensity::ALL {
            assert!(density.sample_size() > prev);
            prev = density.sample_size();
        }
    }
}
