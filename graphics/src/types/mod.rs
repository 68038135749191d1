//! Common graphics types.

mod buffer;

pub use buffer::{BufferDescriptor, BufferTarget, BufferUsage};
