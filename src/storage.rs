// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for exported scans

use crate::config::Config;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Directory scans are exported into.
///
/// The config override wins; otherwise the platform data directory is
/// used, with the current directory as a last resort.
pub fn export_dir(config: &Config) -> PathBuf {
    if let Some(dir) = &config.export_dir {
        return dir.clone();
    }
    dirs::data_local_dir()
        .map(|dir| dir.join("depthcast"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Timestamped output path, e.g. `scan_2026-08-04_14-03-22.glb`
pub fn timestamped_path(dir: &Path, prefix: &str, extension: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    dir.join(format!("{}_{}.{}", prefix, timestamp, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_path_shape() {
        let path = timestamped_path(Path::new("/tmp"), "scan", "glb");
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("scan_"));
        assert!(name.ends_with(".glb"));
    }

    #[test]
    fn test_export_dir_override() {
        let config = Config {
            export_dir: Some(PathBuf::from("/tmp/scans")),
            ..Default::default()
        };
        assert_eq!(export_dir(&config), PathBuf::from("/tmp/scans"));
    }
}
