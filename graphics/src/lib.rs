//! # Amaranth Graphics
//!
//! GPU-side half of the attribute synchronization layer.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`AttributeBuffers`] - Identity-keyed cache reconciling GPU buffers
//!   with versioned CPU attribute stores
//! - [`GpuBackend`] - Trait for graphics backend implementations, with a
//!   dummy backend always available and wgpu behind `wgpu-backend`
//! - [`types`] - Buffer descriptors, usage flags, and binding targets
//!
//! ## Example
//!
//! ```
//! use amaranth_graphics::{AttributeBuffers, BufferTarget, DummyBackend};
//! use amaranth_graphics::attribute::BufferAttribute;
//! use std::sync::Arc;
//!
//! let mut cache = AttributeBuffers::new(Arc::new(DummyBackend::new()));
//! let mut positions = BufferAttribute::new(vec![0.0f32; 9], 3).unwrap();
//! let handle = cache
//!     .ensure_synchronized(&mut positions, BufferTarget::Vertex)
//!     .unwrap();
//! # let _ = handle;
//! ```

pub mod attributes;
pub mod backend;
pub mod error;
pub mod types;

// CPU-side attribute types, re-exported for convenience.
pub use amaranth_core::attribute;

pub use attributes::{AttributeBuffers, BufferEntry};
pub use backend::dummy::{BufferWrite, DummyBackend};
pub use backend::{create_backend, has_gpu_backend, GpuBackend, GpuBuffer};
pub use error::GraphicsError;
pub use types::{BufferDescriptor, BufferTarget, BufferUsage};

#[cfg(feature = "wgpu-backend")]
pub use backend::wgpu_impl::WgpuBackend;

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the graphics subsystem.
pub fn init() {
    log::info!("Amaranth Graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_dummy_backend_name() {
        let backend = DummyBackend::new();
        assert_eq!(backend.name(), "Dummy Backend");
    }
}
