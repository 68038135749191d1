//! Dummy GPU backend for testing and headless development.
//!
//! Buffers are plain byte vectors. Every write is recorded as a
//! [`BufferWrite`], so tests can assert exactly which byte ranges a
//! synchronization pass touched and how often.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::GraphicsError;
use crate::types::BufferDescriptor;

use super::{GpuBackend, GpuBuffer};

/// One recorded `write_buffer` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferWrite {
    /// Dummy buffer id written to.
    pub buffer: u64,
    /// Byte offset of the write.
    pub offset: u64,
    /// Byte length of the write.
    pub len: u64,
}

#[derive(Debug)]
struct DummyStorage {
    data: Vec<u8>,
    label: Option<String>,
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u64,
    buffers: HashMap<u64, DummyStorage>,
    writes: Vec<BufferWrite>,
}

/// Dummy GPU backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    state: Mutex<DummyState>,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, DummyState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn buffer_id(buffer: &GpuBuffer) -> Result<u64, GraphicsError> {
        match buffer {
            GpuBuffer::Dummy(id) => Ok(*id),
            #[cfg(feature = "wgpu-backend")]
            _ => Err(GraphicsError::InvalidParameter(
                "buffer does not belong to the dummy backend".to_string(),
            )),
        }
    }

    /// All writes recorded so far.
    pub fn writes(&self) -> Vec<BufferWrite> {
        self.state().writes.clone()
    }

    /// Drain and return the recorded writes.
    pub fn take_writes(&self) -> Vec<BufferWrite> {
        std::mem::take(&mut self.state().writes)
    }

    /// Number of writes recorded so far.
    pub fn write_count(&self) -> usize {
        self.state().writes.len()
    }

    /// Number of live buffers.
    pub fn buffer_count(&self) -> usize {
        self.state().buffers.len()
    }

    /// Full contents of a buffer's backing storage.
    pub fn buffer_contents(&self, buffer: &GpuBuffer) -> Result<Vec<u8>, GraphicsError> {
        let id = Self::buffer_id(buffer)?;
        let state = self.state();
        let storage = state
            .buffers
            .get(&id)
            .ok_or_else(|| GraphicsError::InvalidParameter(format!("unknown buffer {id}")))?;
        Ok(storage.data.clone())
    }
}

impl GpuBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy Backend"
    }

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<GpuBuffer, GraphicsError> {
        let mut state = self.state();
        let id = state.next_id;
        state.next_id += 1;
        state.buffers.insert(
            id,
            DummyStorage {
                data: vec![0u8; descriptor.size as usize],
                label: descriptor.label.clone(),
            },
        );
        log::trace!(
            "DummyBackend: created buffer {} {:?} (size: {}, hint: {:?})",
            id,
            descriptor.label,
            descriptor.size,
            descriptor.hint
        );
        Ok(GpuBuffer::Dummy(id))
    }

    fn write_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        data: &[u8],
    ) -> Result<(), GraphicsError> {
        let id = Self::buffer_id(buffer)?;
        let mut state = self.state();
        let size = state
            .buffers
            .get(&id)
            .map(|s| s.data.len() as u64)
            .ok_or_else(|| GraphicsError::InvalidParameter(format!("unknown buffer {id}")))?;
        let len = data.len() as u64;
        if offset + len > size {
            return Err(GraphicsError::OutOfRange { offset, len, size });
        }
        if let Some(storage) = state.buffers.get_mut(&id) {
            storage.data[offset as usize..(offset + len) as usize].copy_from_slice(data);
        }
        state.writes.push(BufferWrite {
            buffer: id,
            offset,
            len,
        });
        log::trace!("DummyBackend: write_buffer {} offset={} len={}", id, offset, len);
        Ok(())
    }

    fn read_buffer(
        &self,
        buffer: &GpuBuffer,
        offset: u64,
        size: u64,
    ) -> Result<Vec<u8>, GraphicsError> {
        let id = Self::buffer_id(buffer)?;
        let state = self.state();
        let storage = state
            .buffers
            .get(&id)
            .ok_or_else(|| GraphicsError::InvalidParameter(format!("unknown buffer {id}")))?;
        let total = storage.data.len() as u64;
        if offset + size > total {
            return Err(GraphicsError::OutOfRange {
                offset,
                len: size,
                size: total,
            });
        }
        Ok(storage.data[offset as usize..(offset + size) as usize].to_vec())
    }

    fn destroy_buffer(&self, buffer: &GpuBuffer) {
        if let Ok(id) = Self::buffer_id(buffer) {
            let mut state = self.state();
            if let Some(storage) = state.buffers.remove(&id) {
                log::trace!(
                    "DummyBackend: destroyed buffer {} {:?} ({} bytes)",
                    id,
                    storage.label,
                    storage.data.len()
                );
            }
        }
    }
}
