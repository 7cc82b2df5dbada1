// SPDX-License-Identifier: GPL-3.0-only

//! Shared GPU processor infrastructure
//!
//! Provides common functionality for the raycast and mesh processors:
//! - Singleton management (OnceLock<Mutex<Option<T>>>)
//! - Element-count caching for lazily resized buffers
//! - Async buffer readback utilities
//! - Dispatch size calculation

use crate::errors::{DepthCastError, DepthCastResult};
use crate::gpu::wgpu;

/// Cached buffer element count - avoids reallocation when the count matches
///
/// Used by processors to decide whether device buffers need to be recreated
/// when the requested element count changes between dispatches.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub struct CachedCount {
    count: usize,
}

impl CachedCount {
    /// Check if the count has changed and buffers need recreation
    pub fn needs_update(&self, count: usize) -> bool {
        self.count != count
    }

    /// Update the cached count
    pub fn update(&mut self, count: usize) {
        self.count = count;
    }

    /// Current cached count
    pub fn get(&self) -> usize {
        self.count
    }

    /// Reset to the uninitialized state (after buffer release)
    pub fn clear(&mut self) {
        self.count = 0;
    }
}

/// Helper for async buffer readback (map, poll, read, unmap)
///
/// This is the common pattern used by all GPU processors to read data back
/// from GPU buffers to CPU memory.
///
/// # Arguments
/// * `device` - The wgpu device for polling
/// * `buffer` - The buffer to read from (must be MAP_READ)
///
/// # Returns
/// The buffer contents as a Vec<u8>
pub async fn read_buffer_async(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
) -> DepthCastResult<Vec<u8>> {
    let slice = buffer.slice(..);
    let (sender, receiver) = futures::channel::oneshot::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    let _ = device.poll(wgpu::PollType::wait_indefinitely());

    receiver
        .await
        .map_err(|_| DepthCastError::KernelDispatch("failed to receive buffer mapping".into()))?
        .map_err(|e| DepthCastError::KernelDispatch(format!("failed to map buffer: {:?}", e)))?;

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();

    Ok(data)
}

/// Calculate compute shader dispatch size (workgroups needed)
///
/// Given an element count and workgroup size, returns the number of
/// workgroups needed to cover every element.
#[inline]
pub fn compute_dispatch_size(count: u32, workgroup_size: u32) -> u32 {
    count.div_ceil(workgroup_size)
}

/// Macro for generating singleton accessor functions
///
/// Each shared processor needs:
/// - A static OnceLock<Mutex<Option<Processor>>>
/// - A get_processor() function that lazily initializes
///
/// # Example
/// ```ignore
/// gpu_processor_singleton!(RaycastProcessor, GPU_RAYCAST_PROCESSOR, get_raycast_processor);
/// ```
#[macro_export]
macro_rules! gpu_processor_singleton {
    ($processor:ty, $static_name:ident, $get_fn:ident) => {
        /// Cached GPU processor instance
        static $static_name: std::sync::OnceLock<
            tokio::sync::Mutex<Option<$processor>>,
        > = std::sync::OnceLock::new();

        /// Get or create the shared GPU processor instance
        pub async fn $get_fn() -> $crate::errors::DepthCastResult<
            tokio::sync::MutexGuard<'static, Option<$processor>>,
        > {
            let lock = $static_name.get_or_init(|| tokio::sync::Mutex::new(None));
            let mut guard = lock.lock().await;

            if guard.is_none() {
                match <$processor>::new().await {
                    Ok(processor) => {
                        *guard = Some(processor);
                    }
                    Err(e) => {
                        tracing::warn!(
                            concat!("Failed to initialize GPU ", stringify!($processor), ": {}"),
                            e
                        );
                        return Err(e);
                    }
                }
            }

            Ok(guard)
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_count() {
        let mut cached = CachedCount::default();
        assert!(cached.needs_update(256));

        cached.update(256);
        assert!(!cached.needs_update(256));
        assert!(cached.needs_update(1024));
        assert_eq!(cached.get(), 256);

        cached.clear();
        assert!(cached.needs_update(256));
    }

    #[test]
    fn test_compute_dispatch_size() {
        assert_eq!(compute_dispatch_size(64, 32), 2);
        assert_eq!(compute_dispatch_size(65, 32), 3);
        assert_eq!(compute_dispatch_size(32, 32), 1);
        assert_eq!(compute_dispatch_size(1, 32), 1);
    }
}
