// SPDX-License-Identifier: GPL-3.0-only

//! LAS point cloud export
//!
//! Exports sampled environment points as an uncompressed LAS file.
//! Coordinates are meters in world space, centered per-axis for precision.

use crate::errors::{DepthCastError, DepthCastResult};
use crate::surface::PointCloud;
use las::{Builder, Point, Writer};
use std::path::PathBuf;
use tracing::{debug, info};

/// Export a point cloud as a LAS file
pub async fn export_point_cloud_las(
    cloud: &PointCloud,
    output_path: &PathBuf,
) -> DepthCastResult<()> {
    let points: Vec<(f64, f64, f64)> = cloud
        .positions
        .iter()
        .map(|p| (p.x as f64, p.y as f64, p.z as f64))
        .collect();
    let output_path = output_path.clone();

    tokio::task::spawn_blocking(move || export_las_sync(&points, &output_path))
        .await
        .map_err(|e| DepthCastError::Export(format!("task join error: {}", e)))?
}

fn export_las_sync(points: &[(f64, f64, f64)], output_path: &PathBuf) -> DepthCastResult<()> {
    if points.is_empty() {
        return Err(DepthCastError::Export(
            "no points to export".to_string(),
        ));
    }

    info!(
        point_count = points.len(),
        path = %output_path.display(),
        "Exporting point cloud"
    );

    // Calculate bounds for LAS header transforms
    let (min_x, max_x) = points
        .iter()
        .map(|p| p.0)
        .fold((f64::MAX, f64::MIN), |(min, max), x| {
            (min.min(x), max.max(x))
        });
    let (min_y, max_y) = points
        .iter()
        .map(|p| p.1)
        .fold((f64::MAX, f64::MIN), |(min, max), y| {
            (min.min(y), max.max(y))
        });
    let (min_z, max_z) = points
        .iter()
        .map(|p| p.2)
        .fold((f64::MAX, f64::MIN), |(min, max), z| {
            (min.min(z), max.max(z))
        });

    // Build LAS header
    let mut builder = Builder::from((1, 4)); // LAS 1.4
    builder.point_format.is_compressed = false;

    // 1mm precision, centered per axis
    let scale = 0.001;
    builder.transforms = las::Vector {
        x: las::Transform {
            scale,
            offset: (min_x + max_x) / 2.0,
        },
        y: las::Transform {
            scale,
            offset: (min_y + max_y) / 2.0,
        },
        z: las::Transform {
            scale,
            offset: (min_z + max_z) / 2.0,
        },
    };

    let header = builder
        .into_header()
        .map_err(|e| DepthCastError::Export(format!("failed to build LAS header: {}", e)))?;

    let mut writer = Writer::from_path(output_path, header)
        .map_err(|e| DepthCastError::Export(format!("failed to create LAS writer: {}", e)))?;

    for &(px, py, pz) in points {
        let point = Point {
            x: px,
            y: py,
            z: pz,
            ..Default::default()
        };

        writer
            .write_point(point)
            .map_err(|e| DepthCastError::Export(format!("failed to write point: {}", e)))?;
    }

    writer
        .close()
        .map_err(|e| DepthCastError::Export(format!("failed to close LAS file: {}", e)))?;

    debug!(
        path = %output_path.display(),
        "LAS export complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[tokio::test]
    async fn test_las_round_trip() {
        let cloud = PointCloud {
            positions: vec![
                Vec3::new(0.0, 0.0, -2.0),
                Vec3::new(0.5, 0.25, -2.5),
                Vec3::new(-0.5, -0.25, -1.5),
            ],
            normals: vec![Vec3::Z; 3],
        };

        let dir = std::env::temp_dir().join("depthcast_las_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("points.las");

        export_point_cloud_las(&cloud, &path).await.unwrap();

        let mut reader = las::Reader::from_path(&path).unwrap();
        let points: Vec<las::Point> = reader.points().map(|p| p.unwrap()).collect();
        assert_eq!(points.len(), 3);
        assert!((points[0].z - (-2.0)).abs() < 0.002);

        std::fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_rejects_empty_cloud() {
        let path = std::env::temp_dir().join("depthcast_empty.las");
        assert!(
            export_point_cloud_las(&PointCloud::default(), &path)
                .await
                .is_err()
        );
    }
}
