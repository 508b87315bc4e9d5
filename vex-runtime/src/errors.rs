// Runtime errors raised by the mutation entry points (SPEC_FULL §4.2, §4.3,
// §7). Hand-rolled, matching the teacher's `borrow_checker::errors
// ::BorrowError` style (plain enum, manual `Display`) rather than a
// `thiserror` derive — the teacher's own compiler errors are hand-rolled
// too, `thiserror` sits in its workspace deps unused by that module.

use std::fmt;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// `field_write` target key absent from the container's shape. Field
    /// addition is out of scope.
    UnknownField { key: String },

    /// `index_write`/`specialized_read_with_fallback` index outside the
    /// container's current length.
    IndexOutOfBounds { index: usize, length: usize },

    /// A buffer-size or offset computation overflowed before ever asking
    /// the allocator for memory. True allocator exhaustion is handled by
    /// Rust's global allocator, which aborts the process; this variant
    /// only covers the recoverable arithmetic case (SPEC_FULL §4.2
    /// "Errors").
    AllocationFailure { reason: String },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::UnknownField { key } => {
                write!(f, "no field `{}` in this container's shape", key)
            }
            RuntimeError::IndexOutOfBounds { index, length } => {
                write!(f, "index {} out of bounds for container of length {}", index, length)
            }
            RuntimeError::AllocationFailure { reason } => {
                write!(f, "allocation failure: {}", reason)
            }
        }
    }
}

impl std::error::Error for RuntimeError {}
