//! Graphics error types.

use std::fmt;

use amaranth_core::attribute::{AttributeId, ScalarKind};

use crate::types::BufferTarget;

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// GPU buffer creation or upload failed at the device level.
    AllocationFailed(String),
    /// An attribute's element kind disagrees with the kind recorded on
    /// its cached resource. Indicates cache misuse; never silently cast.
    TypeMismatch {
        /// Kind recorded at resource creation.
        expected: ScalarKind,
        /// Kind of the attribute presented now.
        found: ScalarKind,
    },
    /// An attribute was synchronized under a different binding target
    /// than its cached resource was created for.
    TargetMismatch {
        /// Target recorded at resource creation.
        expected: BufferTarget,
        /// Target requested now.
        found: BufferTarget,
    },
    /// Lookup of an identity that was never synchronized.
    NotFound(AttributeId),
    /// A byte range falls outside a buffer.
    OutOfRange {
        /// Byte offset of the access.
        offset: u64,
        /// Byte length of the access.
        len: u64,
        /// Byte size of the buffer.
        size: u64,
    },
    /// An invalid parameter was provided.
    InvalidParameter(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed(msg) => write!(f, "allocation failed: {msg}"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "element kind mismatch: expected {expected}, found {found}")
            }
            Self::TargetMismatch { expected, found } => write!(
                f,
                "buffer target mismatch: expected {expected:?}, found {found:?}"
            ),
            Self::NotFound(id) => write!(f, "no buffer cached for attribute {id}"),
            Self::OutOfRange { offset, len, size } => write!(
                f,
                "byte range [{offset}, {}) out of range for buffer of {size} bytes",
                offset + len
            ),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}
