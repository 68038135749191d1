//! GPU buffer cache for vertex/index attributes.
//!
//! [`AttributeBuffers`] maps attribute identity to a lazily created GPU
//! buffer plus the version last reflected on the GPU. A renderer calls
//! [`AttributeBuffers::ensure_synchronized`] for every attribute it is
//! about to bind; the cache then does the minimal necessary work:
//!
//! - first use: allocate and upload the full contents
//! - same version: nothing (the common per-frame case)
//! - stale version, bounded dirty range: upload exactly that byte range
//! - stale version, full/unknown extent: re-upload the whole range into
//!   the existing buffer (no reallocation)
//!
//! The cache owns the GPU side outright. Attributes hold no GPU state,
//! so the CPU store stays usable headless; the geometry owner must call
//! [`AttributeBuffers::evict`] when it drops an attribute or the buffer
//! lives for the rest of the process.

use std::collections::HashMap;
use std::sync::Arc;

use amaranth_core::attribute::{
    AttributeId, AttributeScalar, BufferAttribute, ScalarKind, UpdateExtent, UsageHint,
};

use crate::backend::{GpuBackend, GpuBuffer};
use crate::error::GraphicsError;
use crate::types::{BufferDescriptor, BufferTarget, BufferUsage};

/// Cache entry for one synchronized attribute.
#[derive(Debug, Clone)]
pub struct BufferEntry {
    /// The GPU buffer handle.
    pub handle: GpuBuffer,
    /// Element kind recorded at creation; validated on every upload.
    pub kind: ScalarKind,
    /// Byte width of one element, as recorded at creation.
    pub bytes_per_element: usize,
    /// Attribute version last fully reflected on the GPU.
    pub synced_version: u64,
    /// Binding target recorded at creation.
    pub target: BufferTarget,
    /// Usage hint the buffer was allocated with. A one-time decision;
    /// later hint changes on the attribute are not revisited.
    pub hint: UsageHint,
}

/// Identity-keyed cache of GPU buffers for attribute stores.
pub struct AttributeBuffers {
    backend: Arc<dyn GpuBackend>,
    buffers: HashMap<AttributeId, BufferEntry>,
}

impl std::fmt::Debug for AttributeBuffers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeBuffers")
            .field("backend", &self.backend.name())
            .field("entries", &self.buffers.len())
            .finish()
    }
}

impl AttributeBuffers {
    /// Create an empty cache over the given backend.
    pub fn new(backend: Arc<dyn GpuBackend>) -> Self {
        Self {
            backend,
            buffers: HashMap::new(),
        }
    }

    /// Number of cached buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Metadata for a cached attribute, if present.
    pub fn entry(&self, id: AttributeId) -> Option<&BufferEntry> {
        self.buffers.get(&id)
    }

    /// The cached handle for an attribute, without synchronizing.
    pub fn lookup(&self, id: AttributeId) -> Result<GpuBuffer, GraphicsError> {
        self.buffers
            .get(&id)
            .map(|entry| entry.handle.clone())
            .ok_or(GraphicsError::NotFound(id))
    }

    /// Bring the GPU buffer for `attribute` up to date and return its
    /// handle.
    ///
    /// On success `entry.synced_version == attribute.version()` and the
    /// attribute's pending update extent is cleared. On failure neither
    /// is touched, so a later call retries the upload.
    pub fn ensure_synchronized<T: AttributeScalar>(
        &mut self,
        attribute: &mut BufferAttribute<T>,
        target: BufferTarget,
    ) -> Result<GpuBuffer, GraphicsError> {
        let id = attribute.id();
        let backend = Arc::clone(&self.backend);

        let Some(entry) = self.buffers.get_mut(&id) else {
            return self.create_entry(attribute, target);
        };

        if entry.kind != T::KIND {
            return Err(GraphicsError::TypeMismatch {
                expected: entry.kind,
                found: T::KIND,
            });
        }
        if entry.target != target {
            return Err(GraphicsError::TargetMismatch {
                expected: entry.target,
                found: target,
            });
        }

        // Per-frame fast path: nothing changed since the last sync.
        if entry.synced_version == attribute.version() {
            return Ok(entry.handle.clone());
        }

        match attribute.update_extent() {
            Some(UpdateExtent::Items(range)) => {
                let stride = attribute.item_size() * entry.bytes_per_element;
                let byte_offset = range.start * stride;
                let byte_len = range.count * stride;
                let total = attribute.byte_len();
                if byte_offset + byte_len > total {
                    return Err(GraphicsError::OutOfRange {
                        offset: byte_offset as u64,
                        len: byte_len as u64,
                        size: total as u64,
                    });
                }
                let data = &attribute.bytes()[byte_offset..byte_offset + byte_len];
                backend.write_buffer(&entry.handle, byte_offset as u64, data)?;
                log::trace!(
                    "attribute {}: partial upload of {} bytes at offset {}",
                    id,
                    byte_len,
                    byte_offset
                );
            }
            // No range information: assume everything changed.
            None | Some(UpdateExtent::Full) => {
                backend.write_buffer(&entry.handle, 0, attribute.bytes())?;
                log::trace!(
                    "attribute {}: full upload of {} bytes",
                    id,
                    attribute.byte_len()
                );
            }
        }

        if entry.hint != attribute.usage() {
            log::debug!(
                "attribute {}: usage hint changed ({:?} -> {:?}) after buffer creation; keeping original storage class",
                id,
                entry.hint,
                attribute.usage()
            );
        }

        entry.synced_version = attribute.version();
        attribute.clear_update_extent();
        Ok(entry.handle.clone())
    }

    /// Allocate and fully upload a brand-new buffer for `attribute`.
    fn create_entry<T: AttributeScalar>(
        &mut self,
        attribute: &mut BufferAttribute<T>,
        target: BufferTarget,
    ) -> Result<GpuBuffer, GraphicsError> {
        let id = attribute.id();
        let size = attribute.byte_len() as u64;
        if size == 0 {
            return Err(GraphicsError::InvalidParameter(format!(
                "cannot synchronize zero-length attribute {id}"
            )));
        }

        let mut descriptor = BufferDescriptor::new(size, target.usage_flags() | BufferUsage::COPY_DST)
            .with_hint(attribute.usage());
        if let Some(label) = attribute.label() {
            descriptor = descriptor.with_label(label);
        }

        let handle = self.backend.create_buffer(&descriptor)?;
        if let Err(e) = self.backend.write_buffer(&handle, 0, attribute.bytes()) {
            // Don't leak the fresh buffer when the initial upload fails.
            self.backend.destroy_buffer(&handle);
            return Err(e);
        }

        log::trace!(
            "attribute {}: created {:?} buffer ({} bytes, {:?})",
            id,
            target,
            size,
            attribute.usage()
        );

        self.buffers.insert(
            id,
            BufferEntry {
                handle: handle.clone(),
                kind: T::KIND,
                bytes_per_element: T::KIND.bytes_per_element(),
                synced_version: attribute.version(),
                target,
                hint: attribute.usage(),
            },
        );
        attribute.clear_update_extent();
        Ok(handle)
    }

    /// Release the GPU buffer for an attribute and drop the entry.
    ///
    /// Returns `false` (no-op) when the attribute was never cached.
    pub fn evict(&mut self, id: AttributeId) -> bool {
        match self.buffers.remove(&id) {
            Some(entry) => {
                self.backend.destroy_buffer(&entry.handle);
                log::trace!("attribute {}: evicted", id);
                true
            }
            None => false,
        }
    }

    /// Evict every cached buffer (renderer teardown).
    pub fn clear(&mut self) {
        for (id, entry) in self.buffers.drain() {
            self.backend.destroy_buffer(&entry.handle);
            log::trace!("attribute {}: evicted", id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::dummy::DummyBackend;
    use amaranth_core::attribute::ItemRange;

    fn cache() -> (Arc<DummyBackend>, AttributeBuffers) {
        let backend = Arc::new(DummyBackend::new());
        let cache = AttributeBuffers::new(backend.clone());
        (backend, cache)
    }

    #[test]
    fn first_sync_creates_and_uploads_full() {
        let (backend, mut cache) = cache();
        let mut a = BufferAttribute::new(vec![1.0f32; 12], 3).unwrap();
        cache.ensure_synchronized(&mut a, BufferTarget::Vertex).unwrap();

        let writes = backend.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].offset, 0);
        assert_eq!(writes[0].len, 48);
        assert_eq!(cache.len(), 1);

        let entry = cache.entry(a.id()).unwrap();
        assert_eq!(entry.synced_version, a.version());
        assert_eq!(entry.kind, ScalarKind::F32);
        assert_eq!(entry.bytes_per_element, 4);
        assert_eq!(entry.target, BufferTarget::Vertex);
    }

    #[test]
    fn sync_is_idempotent() {
        let (backend, mut cache) = cache();
        let mut a = BufferAttribute::new(vec![0.0f32; 6], 3).unwrap();
        cache.ensure_synchronized(&mut a, BufferTarget::Vertex).unwrap();
        cache.ensure_synchronized(&mut a, BufferTarget::Vertex).unwrap();
        cache.ensure_synchronized(&mut a, BufferTarget::Vertex).unwrap();
        assert_eq!(backend.write_count(), 1);
    }

    #[test]
    fn zero_length_attribute_is_rejected() {
        let (_backend, mut cache) = cache();
        let mut a = BufferAttribute::new(Vec::<f32>::new(), 3).unwrap();
        let err = cache
            .ensure_synchronized(&mut a, BufferTarget::Vertex)
            .unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));
        assert!(cache.is_empty());
    }

    #[test]
    fn lookup_without_sync_is_not_found() {
        let (_backend, mut cache) = cache();
        let a = BufferAttribute::new(vec![0.0f32; 3], 3).unwrap();
        assert_eq!(cache.lookup(a.id()).unwrap_err(), GraphicsError::NotFound(a.id()));

        let mut b = BufferAttribute::new(vec![0.0f32; 3], 3).unwrap();
        cache.ensure_synchronized(&mut b, BufferTarget::Vertex).unwrap();
        assert!(cache.lookup(b.id()).is_ok());
    }

    #[test]
    fn evict_then_resync_recreates() {
        let (backend, mut cache) = cache();
        let mut a = BufferAttribute::new(vec![0.0f32; 6], 3).unwrap();
        cache.ensure_synchronized(&mut a, BufferTarget::Vertex).unwrap();

        assert!(cache.evict(a.id()));
        assert!(!cache.evict(a.id()));
        assert_eq!(backend.buffer_count(), 0);
        assert!(matches!(
            cache.lookup(a.id()),
            Err(GraphicsError::NotFound(_))
        ));

        // A bounded pending range must not survive into the new resource:
        // recreation always uploads the full contents.
        a.mark_changed_range(ItemRange::new(0, 1)).unwrap();
        backend.take_writes();
        cache.ensure_synchronized(&mut a, BufferTarget::Vertex).unwrap();
        let writes = backend.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].offset, 0);
        assert_eq!(writes[0].len, 24);
    }

    #[test]
    fn clear_evicts_everything() {
        let (backend, mut cache) = cache();
        let mut a = BufferAttribute::new(vec![0.0f32; 3], 3).unwrap();
        let mut b = BufferAttribute::new(vec![0u16; 6], 1).unwrap();
        cache.ensure_synchronized(&mut a, BufferTarget::Vertex).unwrap();
        cache.ensure_synchronized(&mut b, BufferTarget::Index).unwrap();
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(backend.buffer_count(), 0);
    }

    #[test]
    fn kind_mismatch_is_rejected_not_cast() {
        // An entry can only disagree with its attribute's kind through
        // cache misuse; simulate it by editing the recorded kind.
        let (_backend, mut cache) = cache();
        let mut a = BufferAttribute::new(vec![0.0f32; 6], 3).unwrap();
        cache.ensure_synchronized(&mut a, BufferTarget::Vertex).unwrap();

        if let Some(entry) = cache.buffers.get_mut(&a.id()) {
            entry.kind = ScalarKind::U32;
        }
        a.mark_changed();
        let err = cache
            .ensure_synchronized(&mut a, BufferTarget::Vertex)
            .unwrap_err();
        assert_eq!(
            err,
            GraphicsError::TypeMismatch {
                expected: ScalarKind::U32,
                found: ScalarKind::F32,
            }
        );
    }

    #[test]
    fn kind_mismatch_is_caught_without_intervening_mutation() {
        // Validation runs before the equal-version fast path, so a bad
        // entry surfaces even when no upload is due.
        let (_backend, mut cache) = cache();
        let mut a = BufferAttribute::new(vec![0.0f32; 6], 3).unwrap();
        cache.ensure_synchronized(&mut a, BufferTarget::Vertex).unwrap();

        if let Some(entry) = cache.buffers.get_mut(&a.id()) {
            entry.kind = ScalarKind::I32;
        }
        let err = cache
            .ensure_synchronized(&mut a, BufferTarget::Vertex)
            .unwrap_err();
        assert_eq!(
            err,
            GraphicsError::TypeMismatch {
                expected: ScalarKind::I32,
                found: ScalarKind::F32,
            }
        );
    }

    #[test]
    fn failed_upload_leaves_state_retryable() {
        // Force write failures by evicting the backing storage behind
        // the cache's back.
        let (backend, mut cache) = cache();
        let mut a = BufferAttribute::new(vec![0.0f32; 6], 3).unwrap();
        let handle = cache.ensure_synchronized(&mut a, BufferTarget::Vertex).unwrap();
        backend.destroy_buffer(&handle);

        a.mark_changed_range(ItemRange::new(0, 1)).unwrap();
        let version_before = a.version();
        let err = cache
            .ensure_synchronized(&mut a, BufferTarget::Vertex)
            .unwrap_err();
        assert!(matches!(err, GraphicsError::InvalidParameter(_)));

        // Pending state untouched, so a retry would re-upload.
        assert_eq!(a.version(), version_before);
        assert!(a.update_extent().is_some());
        assert_eq!(cache.entry(a.id()).unwrap().synced_version, 0);
    }
}
