//! Dirty-range bookkeeping for attribute synchronization.

/// A half-open interval of logical items, `[start, start + count)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemRange {
    /// First item covered by the range.
    pub start: usize,
    /// Number of items covered.
    pub count: usize,
}

impl ItemRange {
    /// Create a new item range.
    pub fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    /// One past the last item covered.
    ///
    /// Saturates at `usize::MAX`, so a degenerate range compares as
    /// out of bounds instead of wrapping past a validation check.
    pub fn end(&self) -> usize {
        self.start.saturating_add(self.count)
    }

    /// The covering hull of two ranges.
    ///
    /// The result spans from the smaller start to the larger end, so it
    /// may include items neither input covered. That is intentional: a
    /// covering upload is always correct, merely less precise.
    pub fn union(&self, other: &ItemRange) -> ItemRange {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        ItemRange::new(start, end - start)
    }
}

/// How much of an attribute changed since the last synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateExtent {
    /// The whole buffer must be assumed changed.
    Full,
    /// Only the given item range changed.
    Items(ItemRange),
}

impl UpdateExtent {
    /// Merge another extent into this one.
    ///
    /// `Full` absorbs everything; two bounded ranges merge to their
    /// covering hull.
    pub fn merge(self, other: UpdateExtent) -> UpdateExtent {
        match (self, other) {
            (UpdateExtent::Items(a), UpdateExtent::Items(b)) => UpdateExtent::Items(a.union(&b)),
            _ => UpdateExtent::Full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_end() {
        assert_eq!(ItemRange::new(2, 3).end(), 5);
        assert_eq!(ItemRange::new(0, 0).end(), 0);
    }

    #[test]
    fn range_end_saturates_instead_of_wrapping() {
        assert_eq!(ItemRange::new(usize::MAX, 1).end(), usize::MAX);
        assert_eq!(ItemRange::new(usize::MAX - 2, 8).end(), usize::MAX);
    }

    #[test]
    fn union_is_covering_hull() {
        let a = ItemRange::new(2, 3);
        let b = ItemRange::new(6, 2);
        let u = a.union(&b);
        assert_eq!(u, ItemRange::new(2, 6));
        // Union covers both inputs, including the gap between them.
        assert!(u.start <= a.start && u.end() >= a.end());
        assert!(u.start <= b.start && u.end() >= b.end());
    }

    #[test]
    fn union_of_overlapping_ranges() {
        let a = ItemRange::new(0, 4);
        let b = ItemRange::new(2, 4);
        assert_eq!(a.union(&b), ItemRange::new(0, 6));
    }

    #[test]
    fn full_absorbs_everything() {
        let items = UpdateExtent::Items(ItemRange::new(1, 1));
        assert_eq!(UpdateExtent::Full.merge(items), UpdateExtent::Full);
        assert_eq!(items.merge(UpdateExtent::Full), UpdateExtent::Full);
        assert_eq!(
            UpdateExtent::Full.merge(UpdateExtent::Full),
            UpdateExtent::Full
        );
    }

    #[test]
    fn items_merge_to_hull() {
        let a = UpdateExtent::Items(ItemRange::new(2, 3));
        let b = UpdateExtent::Items(ItemRange::new(6, 2));
        assert_eq!(a.merge(b), UpdateExtent::Items(ItemRange::new(2, 6)));
    }
}
