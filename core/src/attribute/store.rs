//! The versioned attribute store.

use std::sync::atomic::{AtomicU64, Ordering};

use super::{ItemRange, UpdateExtent};

/// Element kind of an attribute, fixed at construction.
///
/// The GPU cache records this at resource creation and validates it on
/// every later upload, so a store can never be reinterpreted under a
/// different element type by accident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// 32-bit float.
    F32,
    /// 32-bit signed integer.
    I32,
    /// 32-bit unsigned integer.
    U32,
    /// 16-bit unsigned integer (compact index buffers).
    U16,
}

impl ScalarKind {
    /// Size of one element in bytes.
    pub fn bytes_per_element(&self) -> usize {
        match self {
            Self::F32 | Self::I32 | Self::U32 => 4,
            Self::U16 => 2,
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::F32 => write!(f, "f32"),
            Self::I32 => write!(f, "i32"),
            Self::U32 => write!(f, "u32"),
            Self::U16 => write!(f, "u16"),
        }
    }
}

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for i32 {}
    impl Sealed for u32 {}
    impl Sealed for u16 {}
}

/// Scalar types an attribute may store.
///
/// Sealed: the GPU upload dispatch is a closed switch over
/// [`ScalarKind`], so the set of element types is closed too.
pub trait AttributeScalar: sealed::Sealed + bytemuck::Pod {
    /// Kind tag matching this type.
    const KIND: ScalarKind;
}

impl AttributeScalar for f32 {
    const KIND: ScalarKind = ScalarKind::F32;
}

impl AttributeScalar for i32 {
    const KIND: ScalarKind = ScalarKind::I32;
}

impl AttributeScalar for u32 {
    const KIND: ScalarKind = ScalarKind::U32;
}

impl AttributeScalar for u16 {
    const KIND: ScalarKind = ScalarKind::U16;
}

/// Advisory usage hint, consumed once when the GPU resource is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UsageHint {
    /// Written once, drawn many times.
    #[default]
    Static,
    /// Rewritten occasionally.
    Dynamic,
    /// Rewritten every frame.
    Stream,
}

/// Stable identity token for an attribute.
///
/// Issued from a process-global counter at construction, so it stays
/// meaningful when the attribute moves in memory. The GPU cache keys on
/// this, never on an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttributeId(u64);

impl AttributeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for AttributeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors from attribute construction and access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    /// Item size must be at least 1.
    ZeroItemSize,
    /// Element count is not a multiple of the item size.
    UnevenLength {
        /// Number of elements supplied.
        len: usize,
        /// Declared item size.
        item_size: usize,
    },
    /// Item index outside `[0, item_count)`.
    ItemOutOfRange {
        /// Requested item index.
        item: usize,
        /// Number of items in the store.
        item_count: usize,
    },
    /// Component index outside `[0, item_size)`.
    ComponentOutOfRange {
        /// Requested component index.
        component: usize,
        /// Declared item size.
        item_size: usize,
    },
    /// Item range extends past the end of the store.
    RangeOutOfRange {
        /// Offending range.
        range: ItemRange,
        /// Number of items in the store.
        item_count: usize,
    },
    /// Two stores disagree on item size.
    ItemSizeMismatch {
        /// Item size of the destination.
        expected: usize,
        /// Item size of the source.
        found: usize,
    },
    /// A bulk copy supplied the wrong number of elements or items.
    CountMismatch {
        /// Count the store requires.
        expected: usize,
        /// Count supplied.
        found: usize,
    },
}

impl std::fmt::Display for AttributeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroItemSize => write!(f, "item size must be at least 1"),
            Self::UnevenLength { len, item_size } => write!(
                f,
                "element count {len} is not a multiple of item size {item_size}"
            ),
            Self::ItemOutOfRange { item, item_count } => {
                write!(f, "item index {item} out of range (item count {item_count})")
            }
            Self::ComponentOutOfRange {
                component,
                item_size,
            } => write!(
                f,
                "component index {component} out of range (item size {item_size})"
            ),
            Self::RangeOutOfRange { range, item_count } => write!(
                f,
                "item range [{}, {}) out of range (item count {item_count})",
                range.start,
                range.end()
            ),
            Self::ItemSizeMismatch { expected, found } => {
                write!(f, "item size mismatch: expected {expected}, found {found}")
            }
            Self::CountMismatch { expected, found } => {
                write!(f, "count mismatch: expected {expected}, found {found}")
            }
        }
    }
}

impl std::error::Error for AttributeError {}

/// An owned, contiguous, typed array of scalars grouped into fixed-size
/// items, with a version counter and dirty-range tracking.
///
/// Invariants:
/// - `item_size >= 1` and `len() % item_size == 0` (checked at
///   construction and on every bulk copy)
/// - the version is strictly non-decreasing
/// - a pending update extent, once consumed by a synchronization pass,
///   is cleared so repeated syncs without mutation are no-ops
///
/// # Example
///
/// ```
/// use amaranth_core::attribute::{BufferAttribute, ItemRange};
///
/// let mut positions = BufferAttribute::new(vec![0.0f32; 12], 3).unwrap();
/// positions.set(1, 0, 5.0).unwrap();
/// positions.mark_changed_range(ItemRange::new(1, 1)).unwrap();
/// assert_eq!(positions.version(), 1);
/// ```
#[derive(Debug)]
pub struct BufferAttribute<T: AttributeScalar> {
    id: AttributeId,
    elements: Vec<T>,
    item_size: usize,
    usage: UsageHint,
    label: Option<String>,
    version: u64,
    extent: Option<UpdateExtent>,
}

impl<T: AttributeScalar> BufferAttribute<T> {
    /// Create a new attribute from a flat element array.
    ///
    /// Fails when `item_size` is zero or the element count is not a
    /// multiple of `item_size`.
    pub fn new(elements: Vec<T>, item_size: usize) -> Result<Self, AttributeError> {
        if item_size == 0 {
            return Err(AttributeError::ZeroItemSize);
        }
        if elements.len() % item_size != 0 {
            return Err(AttributeError::UnevenLength {
                len: elements.len(),
                item_size,
            });
        }
        Ok(Self {
            id: AttributeId::next(),
            elements,
            item_size,
            usage: UsageHint::default(),
            label: None,
            version: 0,
            extent: None,
        })
    }

    /// Construct from a flat array whose invariants hold by construction
    /// (used by the typed `from_vec*` constructors).
    pub(crate) fn from_elements_unchecked(elements: Vec<T>, item_size: usize) -> Self {
        debug_assert!(item_size >= 1);
        debug_assert_eq!(elements.len() % item_size, 0);
        Self {
            id: AttributeId::next(),
            elements,
            item_size,
            usage: UsageHint::default(),
            label: None,
            version: 0,
            extent: None,
        }
    }

    pub(crate) fn elements_mut(&mut self) -> &mut [T] {
        &mut self.elements
    }

    /// Set a debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the usage hint.
    pub fn with_usage(mut self, usage: UsageHint) -> Self {
        self.usage = usage;
        self
    }

    /// Stable identity token of this attribute.
    pub fn id(&self) -> AttributeId {
        self.id
    }

    /// Element kind tag.
    pub fn kind(&self) -> ScalarKind {
        T::KIND
    }

    /// Number of scalar components per logical item.
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Number of logical items.
    pub fn item_count(&self) -> usize {
        self.elements.len() / self.item_size
    }

    /// Total number of scalar elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the store holds no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Total byte length of the backing storage.
    pub fn byte_len(&self) -> usize {
        self.elements.len() * T::KIND.bytes_per_element()
    }

    /// Current usage hint.
    pub fn usage(&self) -> UsageHint {
        self.usage
    }

    /// Change the usage hint.
    ///
    /// Advisory only. A GPU resource that already exists keeps the
    /// storage class it was created with.
    pub fn set_usage(&mut self, usage: UsageHint) {
        self.usage = usage;
    }

    /// Debug label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Current version. Starts at 0, advances only on `mark_changed*`
    /// and bulk operations.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Flat view of all elements.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// Byte view of the backing storage.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.elements)
    }

    /// Pending update extent, if any.
    pub fn update_extent(&self) -> Option<UpdateExtent> {
        self.extent
    }

    /// Clear the pending update extent.
    ///
    /// Called by a synchronization pass after it consumed the extent.
    pub fn clear_update_extent(&mut self) {
        self.extent = None;
    }

    fn check_item(&self, item: usize) -> Result<(), AttributeError> {
        if item >= self.item_count() {
            return Err(AttributeError::ItemOutOfRange {
                item,
                item_count: self.item_count(),
            });
        }
        Ok(())
    }

    fn check_component(&self, component: usize) -> Result<(), AttributeError> {
        if component >= self.item_size {
            return Err(AttributeError::ComponentOutOfRange {
                component,
                item_size: self.item_size,
            });
        }
        Ok(())
    }

    /// Read one scalar component of an item.
    pub fn get(&self, item: usize, component: usize) -> Result<T, AttributeError> {
        self.check_item(item)?;
        self.check_component(component)?;
        Ok(self.elements[item * self.item_size + component])
    }

    /// Write one scalar component of an item.
    ///
    /// Does not advance the version; batch writes and call
    /// [`mark_changed_range`](Self::mark_changed_range) once.
    pub fn set(&mut self, item: usize, component: usize, value: T) -> Result<(), AttributeError> {
        self.check_item(item)?;
        self.check_component(component)?;
        self.elements[item * self.item_size + component] = value;
        Ok(())
    }

    /// Borrow one logical item as a slice of `item_size` scalars.
    pub fn item(&self, item: usize) -> Result<&[T], AttributeError> {
        self.check_item(item)?;
        let offset = item * self.item_size;
        Ok(&self.elements[offset..offset + self.item_size])
    }

    /// Mutably borrow one logical item.
    ///
    /// Does not advance the version.
    pub fn item_mut(&mut self, item: usize) -> Result<&mut [T], AttributeError> {
        self.check_item(item)?;
        let offset = item * self.item_size;
        Ok(&mut self.elements[offset..offset + self.item_size])
    }

    /// Overwrite one logical item from a slice of `item_size` scalars.
    ///
    /// Does not advance the version.
    pub fn set_item(&mut self, item: usize, values: &[T]) -> Result<(), AttributeError> {
        if values.len() != self.item_size {
            return Err(AttributeError::CountMismatch {
                expected: self.item_size,
                found: values.len(),
            });
        }
        self.item_mut(item)?.copy_from_slice(values);
        Ok(())
    }

    /// Record that the whole attribute changed: advances the version and
    /// degrades the pending extent to full.
    pub fn mark_changed(&mut self) {
        self.version += 1;
        self.extent = Some(UpdateExtent::Full);
    }

    /// Record that only `range` changed: advances the version and merges
    /// the range into the pending extent (covering hull).
    pub fn mark_changed_range(&mut self, range: ItemRange) -> Result<(), AttributeError> {
        if range.end() > self.item_count() {
            return Err(AttributeError::RangeOutOfRange {
                range,
                item_count: self.item_count(),
            });
        }
        self.version += 1;
        let incoming = UpdateExtent::Items(range);
        self.extent = Some(match self.extent.take() {
            Some(pending) => pending.merge(incoming),
            None => incoming,
        });
        Ok(())
    }

    /// Overwrite the entire backing storage from a flat element slice.
    ///
    /// Requires exactly `len()` elements; growing an attribute means
    /// creating a new one. Always a full-extent change.
    pub fn copy_array(&mut self, elements: &[T]) -> Result<(), AttributeError> {
        if elements.len() != self.elements.len() {
            return Err(AttributeError::CountMismatch {
                expected: self.elements.len(),
                found: elements.len(),
            });
        }
        self.elements.copy_from_slice(elements);
        self.mark_changed();
        Ok(())
    }

    /// Apply `f` to every item in place, one item slice at a time.
    ///
    /// Single pass over the storage, no temporary array. Always a
    /// full-extent change.
    pub fn apply_transform<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut [T]),
    {
        for item in self.elements.chunks_exact_mut(self.item_size) {
            f(item);
        }
        self.mark_changed();
    }

    /// Copy one logical item from another store of the same item size.
    ///
    /// Does not advance the version; callers batch copies and mark once.
    pub fn copy_item_from(
        &mut self,
        dst: usize,
        source: &BufferAttribute<T>,
        src: usize,
    ) -> Result<(), AttributeError> {
        if source.item_size != self.item_size {
            return Err(AttributeError::ItemSizeMismatch {
                expected: self.item_size,
                found: source.item_size,
            });
        }
        let src_item = source.item(src)?;
        self.item_mut(dst)?.copy_from_slice(src_item);
        Ok(())
    }

    /// Copy one logical item to another slot within this store.
    ///
    /// Does not advance the version.
    pub fn copy_item_within(&mut self, dst: usize, src: usize) -> Result<(), AttributeError> {
        self.check_item(dst)?;
        self.check_item(src)?;
        let src_offset = src * self.item_size;
        let dst_offset = dst * self.item_size;
        self.elements
            .copy_within(src_offset..src_offset + self.item_size, dst_offset);
        Ok(())
    }
}

impl<T: AttributeScalar> Clone for BufferAttribute<T> {
    /// A clone is a distinct entity: it receives a fresh identity and
    /// starts unsynchronized (version 0, no pending extent).
    fn clone(&self) -> Self {
        Self {
            id: AttributeId::next(),
            elements: self.elements.clone(),
            item_size: self.item_size,
            usage: self.usage,
            label: self.label.clone(),
            version: 0,
            extent: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_validates_item_size() {
        assert_eq!(
            BufferAttribute::new(vec![0.0f32; 4], 0).unwrap_err(),
            AttributeError::ZeroItemSize
        );
        assert_eq!(
            BufferAttribute::new(vec![0.0f32; 5], 3).unwrap_err(),
            AttributeError::UnevenLength {
                len: 5,
                item_size: 3
            }
        );
    }

    #[test]
    fn derived_counts() {
        let a = BufferAttribute::new(vec![0.0f32; 12], 3).unwrap();
        assert_eq!(a.item_count(), 4);
        assert_eq!(a.len(), 12);
        assert_eq!(a.byte_len(), 48);
        assert_eq!(a.kind(), ScalarKind::F32);
        assert_eq!(a.version(), 0);
        assert!(a.update_extent().is_none());
    }

    #[test]
    fn u16_byte_width() {
        let a = BufferAttribute::new(vec![0u16; 6], 1).unwrap();
        assert_eq!(a.byte_len(), 12);
        assert_eq!(ScalarKind::U16.bytes_per_element(), 2);
    }

    #[test]
    fn get_set_range_checked() {
        let mut a = BufferAttribute::new(vec![0.0f32; 6], 3).unwrap();
        a.set(1, 2, 7.0).unwrap();
        assert_eq!(a.get(1, 2).unwrap(), 7.0);
        assert!(matches!(
            a.get(2, 0),
            Err(AttributeError::ItemOutOfRange { item: 2, .. })
        ));
        assert!(matches!(
            a.set(0, 3, 1.0),
            Err(AttributeError::ComponentOutOfRange { component: 3, .. })
        ));
    }

    #[test]
    fn set_does_not_bump_version() {
        let mut a = BufferAttribute::new(vec![0.0f32; 6], 3).unwrap();
        a.set(0, 0, 1.0).unwrap();
        a.set_item(1, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(a.version(), 0);
        assert!(a.update_extent().is_none());
    }

    #[test]
    fn version_is_strictly_monotonic() {
        let mut a = BufferAttribute::new(vec![0.0f32; 9], 3).unwrap();
        let mut last = a.version();
        a.mark_changed();
        assert!(a.version() > last);
        last = a.version();
        a.mark_changed_range(ItemRange::new(0, 2)).unwrap();
        assert!(a.version() > last);
        last = a.version();
        a.copy_array(&[1.0; 9]).unwrap();
        assert!(a.version() > last);
        last = a.version();
        a.apply_transform(|_| {});
        assert!(a.version() > last);
    }

    #[test]
    fn ranges_accumulate_to_covering_hull() {
        let mut a = BufferAttribute::new(vec![0.0f32; 30], 3).unwrap();
        a.mark_changed_range(ItemRange::new(2, 3)).unwrap();
        a.mark_changed_range(ItemRange::new(6, 2)).unwrap();
        assert_eq!(
            a.update_extent(),
            Some(UpdateExtent::Items(ItemRange::new(2, 6)))
        );
    }

    #[test]
    fn full_mark_wins_over_ranges() {
        let mut a = BufferAttribute::new(vec![0.0f32; 30], 3).unwrap();
        a.mark_changed_range(ItemRange::new(2, 3)).unwrap();
        a.mark_changed();
        a.mark_changed_range(ItemRange::new(6, 2)).unwrap();
        assert_eq!(a.update_extent(), Some(UpdateExtent::Full));
    }

    #[test]
    fn mark_range_validates_bounds() {
        let mut a = BufferAttribute::new(vec![0.0f32; 9], 3).unwrap();
        let err = a.mark_changed_range(ItemRange::new(2, 2)).unwrap_err();
        assert!(matches!(err, AttributeError::RangeOutOfRange { .. }));
        // A failed mark must not advance the version.
        assert_eq!(a.version(), 0);
    }

    #[test]
    fn mark_range_rejects_wrapping_extents() {
        // start + count past usize::MAX must fail the bounds check,
        // not wrap around it.
        let mut a = BufferAttribute::new(vec![0.0f32; 9], 3).unwrap();
        let err = a
            .mark_changed_range(ItemRange::new(usize::MAX, 1))
            .unwrap_err();
        assert!(matches!(err, AttributeError::RangeOutOfRange { .. }));
        let err = a
            .mark_changed_range(ItemRange::new(usize::MAX - 1, 4))
            .unwrap_err();
        assert!(matches!(err, AttributeError::RangeOutOfRange { .. }));
        assert_eq!(a.version(), 0);
        assert!(a.update_extent().is_none());
    }

    #[test]
    fn copy_array_roundtrip() {
        let mut a = BufferAttribute::new(vec![0.0f32; 6], 2).unwrap();
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        a.copy_array(&data).unwrap();
        for (item, pair) in data.chunks(2).enumerate() {
            assert_eq!(a.get(item, 0).unwrap(), pair[0]);
            assert_eq!(a.get(item, 1).unwrap(), pair[1]);
        }
        assert_eq!(a.update_extent(), Some(UpdateExtent::Full));
    }

    #[test]
    fn copy_array_requires_exact_count() {
        let mut a = BufferAttribute::new(vec![0.0f32; 6], 2).unwrap();
        assert!(matches!(
            a.copy_array(&[1.0; 4]),
            Err(AttributeError::CountMismatch {
                expected: 6,
                found: 4
            })
        ));
        assert_eq!(a.version(), 0);
    }

    #[test]
    fn apply_transform_visits_every_item() {
        let mut a = BufferAttribute::new(vec![1.0f32; 8], 2).unwrap();
        a.apply_transform(|item| {
            for v in item.iter_mut() {
                *v *= 2.0;
            }
        });
        assert!(a.elements().iter().all(|v| *v == 2.0));
        assert_eq!(a.update_extent(), Some(UpdateExtent::Full));
    }

    #[test]
    fn copy_item_between_stores() {
        let src = BufferAttribute::new(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], 3).unwrap();
        let mut dst = BufferAttribute::new(vec![0.0f32; 6], 3).unwrap();
        dst.copy_item_from(0, &src, 1).unwrap();
        assert_eq!(dst.item(0).unwrap(), &[4.0, 5.0, 6.0]);
        // No implicit version bump.
        assert_eq!(dst.version(), 0);

        let narrow = BufferAttribute::new(vec![0.0f32; 4], 2).unwrap();
        assert!(matches!(
            dst.copy_item_from(0, &narrow, 0),
            Err(AttributeError::ItemSizeMismatch {
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn copy_item_within_store() {
        let mut a = BufferAttribute::new(vec![1.0f32, 2.0, 3.0, 4.0], 2).unwrap();
        a.copy_item_within(0, 1).unwrap();
        assert_eq!(a.elements(), &[3.0, 4.0, 3.0, 4.0]);
    }

    #[test]
    fn ids_are_unique_and_stable() {
        let a = BufferAttribute::new(vec![0.0f32; 3], 3).unwrap();
        let b = BufferAttribute::new(vec![0.0f32; 3], 3).unwrap();
        assert_ne!(a.id(), b.id());
        let id = a.id();
        let moved = a;
        assert_eq!(moved.id(), id);
    }

    #[test]
    fn clone_gets_fresh_identity() {
        let mut a = BufferAttribute::new(vec![0.0f32; 3], 3).unwrap();
        a.mark_changed();
        let b = a.clone();
        assert_ne!(a.id(), b.id());
        assert_eq!(b.version(), 0);
        assert!(b.update_extent().is_none());
        assert_eq!(b.elements(), a.elements());
    }

    #[test]
    fn extent_clear_resets_pending_state() {
        let mut a = BufferAttribute::new(vec![0.0f32; 6], 3).unwrap();
        a.mark_changed_range(ItemRange::new(0, 1)).unwrap();
        a.clear_update_extent();
        assert!(a.update_extent().is_none());
        // Version stays where it was; clearing is not a change.
        assert_eq!(a.version(), 1);
    }

    #[test]
    fn error_display() {
        let err = AttributeError::ItemOutOfRange {
            item: 7,
            item_count: 4,
        };
        assert_eq!(err.to_string(), "item index 7 out of range (item count 4)");
        let err = AttributeError::UnevenLength { len: 5, item_size: 3 };
        assert_eq!(
            err.to_string(),
            "element count 5 is not a multiple of item size 3"
        );
    }
}
