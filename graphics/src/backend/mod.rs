//! GPU backend abstraction layer.
//!
//! # Available Backends
//!
//! - `dummy` (always available): CPU-memory backend for testing and
//!   headless development; records every write for inspection
//! - `wgpu-backend`: cross-platform backend using wgpu
//!
//! Each backend implements the [`GpuBackend`] trait, covering exactly
//! the buffer concern this crate owns: creation, byte-range writes,
//! blocking readback, and destruction.

pub mod dummy;

#[cfg(feature = "wgpu-backend")]
pub mod wgpu_impl;

use std::sync::Arc;

use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

/// Handle to a GPU buffer resource.
///
/// Cheap to clone; this is the opaque handle the attribute cache hands
/// back for binding.
pub enum GpuBuffer {
    /// Dummy backend buffer (id into the backend's CPU storage)
    Dummy(u64),
    /// wgpu backend buffer
    #[cfg(feature = "wgpu-backend")]
    Wgpu(Arc<wgpu::Buffer>),
}

impl std::fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dummy(id) => f.debug_tuple("GpuBuffer::Dummy").field(id).finish(),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => f.debug_tuple("GpuBuffer::Wgpu").field(buffer).finish(),
        }
    }
}

impl Clone for GpuBuffer {
    fn clone(&self) -> Self {
        match self {
            Self::Dummy(id) => Self::Dummy(*id),
            #[cfg(feature = "wgpu-backend")]
            Self::Wgpu(buffer) => Self::Wgpu(buffer.clone()),
        }
    }
}

static_assertions::assert_impl_all!(GpuBuffer: Send, Sync);

/// GPU backend trait for abstracting different GPU APIs.
pub trait GpuBackend: Send + Sync + 'static {
    /// Get the backend name.
    fn name(&self) -> &'static str;

    /// Create a buffer resource.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError>;

    /// Write data into a buffer at a byte offset.
    fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError>;

    /// Read data from a buffer.
    ///
    /// This is a blocking operation that waits for the GPU to finish.
    fn read_buffer(&self, buffer: &GpuBuffer, offset: u64, size: u64)
        -> Result<Vec<u8>, GraphicsError>;

    /// Release a buffer resource.
    fn destroy_buffer(&self, buffer: &GpuBuffer);
}

/// Selects and creates the appropriate backend based on available features.
pub fn create_backend() -> Result<Arc<dyn GpuBackend>, GraphicsError> {
    // Try wgpu backend if available
    #[cfg(feature = "wgpu-backend")]
    {
        match wgpu_impl::WgpuBackend::new() {
            Ok(backend) => {
                log::info!("Using wgpu backend");
                return Ok(Arc::new(backend));
            }
            Err(e) => {
                log::warn!("Failed to create wgpu backend: {}", e);
            }
        }
    }

    // Fall back to dummy backend
    log::info!("Using dummy backend");
    Ok(Arc::new(dummy::DummyBackend::new()))
}

/// Check if a real GPU backend is compiled in.
pub fn has_gpu_backend() -> bool {
    cfg!(feature = "wgpu-backend")
}
