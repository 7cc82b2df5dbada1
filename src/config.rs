// SPDX-License-Identifier: GPL-3.0-only

//! User configuration handling
//!
//! Persisted as JSON under the platform config directory. Unreadable or
//! incompatible files fall back to defaults rather than failing startup.

use crate::constants::{MeshDensity, sampling};
use crate::errors::{DepthCastError, DepthCastResult};
use crate::tracking::Eye;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Bumped whenever a field changes incompatibly
pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Config schema version
    pub version: u32,
    /// Sample grid density preset
    pub density: MeshDensity,
    /// Fraction of the field of view covered by scans (0, 1]
    pub fov_margin: f32,
    /// Near clip plane of the depth capture (meters)
    pub near_plane: f32,
    /// Far clip plane of the depth capture (meters)
    pub far_plane: f32,
    /// Eye whose depth layer is sampled
    pub eye: Eye,
    /// Export directory override; platform data directory when unset
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            density: MeshDensity::default(),
            fov_margin: sampling::DEFAULT_FOV_MARGIN,
            near_plane: sampling::DEFAULT_NEAR_PLANE,
            far_plane: sampling::DEFAULT_FAR_PLANE,
            eye: Eye::default(),
            export_dir: None,
        }
    }
}

impl Config {
    /// Path of the persisted config file
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("depthcast").join("config.json"))
    }

    /// Load the config, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Config>(&contents) {
                Ok(config) if config.version == CONFIG_VERSION => config,
                Ok(config) => {
                    warn!(
                        found = config.version,
                        expected = CONFIG_VERSION,
                        "Config version mismatch, using defaults"
                    );
                    Self::default()
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist the config
    pub fn save(&self) -> DepthCastResult<()> {
        let path = Self::path()
            .ok_or_else(|| DepthCastError::Config("no config directory available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| DepthCastError::Config(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| DepthCastError::Config(e.to_string()))?;
        std::fs::write(&path, contents).map_err(|e| DepthCastError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_usable() {
        let config = Config::default();
        assert_eq!(config.version, CONFIG_VERSION);
        assert!(config.fov_margin > 0.0 && config.fov_margin <= 1.0);
        assert!(config.near_plane < config.far_plane);
    }

    #[test]
    fn test_serde_round_trip() {
        let config = Config {
            density: MeshDensity::High,
            fov_margin: 0.8,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
