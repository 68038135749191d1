//! Versioned per-vertex attribute storage.
//!
//! This module provides:
//! - [`BufferAttribute`] - A typed, item-structured array of scalars
//!   (positions, normals, colors, indices) with explicit change tracking
//! - [`ItemRange`] / [`UpdateExtent`] - Dirty sub-range bookkeeping used to
//!   minimize GPU uploads
//! - [`AttributeId`] - A stable identity token the GPU cache keys on
//!
//! An attribute knows nothing about the GPU. The graphics crate looks
//! attributes up by [`AttributeId`] and reconciles its own buffer objects
//! against [`BufferAttribute::version`]; the dependency is strictly
//! one-directional.
//!
//! # Change tracking
//!
//! Element writes (`set`, `set_item`, `item_mut`) never advance the
//! version on their own. Callers batch logically related writes and then
//! call [`BufferAttribute::mark_changed`] or
//! [`BufferAttribute::mark_changed_range`] once. Bulk operations
//! (`copy_array`, the `copy_vec*` family, the transform family) declare
//! their own full-extent change because they always rewrite everything.

mod float;
mod range;
mod store;

pub use range::{ItemRange, UpdateExtent};
pub use store::{
    AttributeError, AttributeId, AttributeScalar, BufferAttribute, ScalarKind, UsageHint,
};
