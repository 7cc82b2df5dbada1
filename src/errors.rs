// SPDX-License-Identifier: MPL-2.0

//! Error types for the depthcast pipeline

use std::fmt;

/// Result type alias using DepthCastError
pub type DepthCastResult<T> = Result<T, DepthCastError>;

/// Main pipeline error type
#[derive(Debug, Clone)]
pub enum DepthCastError {
    /// GPU adapter/device acquisition failed
    GpuInit(String),
    /// Device buffer or texture allocation failed
    BufferAllocation(String),
    /// No depth frame has been supplied by the capture subsystem yet
    DepthUnavailable,
    /// Supplied depth frame data does not match its descriptor
    InvalidDepthFrame(String),
    /// Sample grid dimensions are unusable
    InvalidGridDimensions { width: u32, height: u32 },
    /// Compute pipeline creation, dispatch, or readback failed
    KernelDispatch(String),
    /// Controller pose projects outside the current view frustum
    ControllerOutOfView,
    /// Scene export (GLB / LAS) failed
    Export(String),
    /// Configuration load/save errors
    Config(String),
}

impl fmt::Display for DepthCastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DepthCastError::GpuInit(msg) => write!(f, "GPU initialization failed: {}", msg),
            DepthCastError::BufferAllocation(msg) => {
                write!(f, "Device buffer allocation failed: {}", msg)
            }
            DepthCastError::DepthUnavailable => {
                write!(f, "No environment depth frame is available yet")
            }
            DepthCastError::InvalidDepthFrame(msg) => {
                write!(f, "Invalid depth frame: {}", msg)
            }
            DepthCastError::InvalidGridDimensions { width, height } => {
                write!(f, "Invalid sample grid dimensions: {}x{}", width, height)
            }
            DepthCastError::KernelDispatch(msg) => write!(f, "Kernel dispatch failed: {}", msg),
            DepthCastError::ControllerOutOfView => {
                write!(f, "Controller pose is outside the view frustum")
            }
            DepthCastError::Export(msg) => write!(f, "Export failed: {}", msg),
            DepthCastError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for DepthCastError {}

// Conversions for I/O errors (config persistence, export file writes)
impl From<std::io::Error> for DepthCastError {
    fn from(err: std::io::Error) -> Self {
        DepthCastError::Export(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = DepthCastError::InvalidGridDimensions {
            width: 0,
            height: 4,
        };
        assert!(err.to_string().contains("0x4"));

        let err = DepthCastError::DepthUnavailable;
        assert!(err.to_string().contains("depth frame"));
    }
}
