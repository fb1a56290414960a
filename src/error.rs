//! Unified error handling for splitforge
//!
//! A single crate-wide error type in the style of the rest of the engine:
//! every failure a split invocation can produce lands here, categorized so
//! the graph executor can tell invalid-argument failures (reject the
//! request, never retry) from internal/backend failures (the invocation is
//! dead; output buffers must not be trusted).

use std::fmt;

use crate::tensor::DType;

/// Unified error type for split invocations.
#[derive(Debug, thiserror::Error)]
pub enum SplitForgeError {
    // ========== Invalid-argument errors ==========
    /// Split axis outside `[0, rank)`.
    #[error("split axis must satisfy 0 <= axis < {rank}, but got {axis}")]
    InvalidSplitAxis { axis: i64, rank: usize },

    /// Non-positive split count.
    #[error("number of ways to split must be > 0, but got {0}")]
    InvalidNumSplit(usize),

    /// Axis size not evenly divisible by the split count.
    #[error(
        "number of ways to split should evenly divide the split dimension, \
         but got axis {axis} (size = {axis_size}) and num_split {num_split}"
    )]
    UnevenSplit {
        axis: i64,
        axis_size: usize,
        num_split: usize,
    },

    /// Typed access to a tensor of a different element type.
    #[error("dtype mismatch: expected {expected}, got {actual}")]
    DTypeMismatch { expected: DType, actual: DType },

    /// Tensor construction with inconsistent shape/data sizes.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// No kernel registered for the requested (processing unit, dtype) pair.
    #[error("no split kernel registered for {0}")]
    KernelNotRegistered(String),

    // ========== Internal errors ==========
    /// Host or device memory allocation failed.
    #[error("allocation failed: {0}")]
    AllocationFailed(String),

    /// Device stream reported an error state after a launch was enqueued.
    #[error("kernel launch failed: {0}")]
    LaunchFailed(String),

    /// Internal error (indicates a bug).
    #[error("internal error: {0}")]
    InternalError(String),

    /// Lock poisoned (indicates a bug or concurrent access issue).
    #[error("internal lock poisoned: {0}")]
    LockPoisoned(String),

    // ========== Backend errors ==========
    /// HIP runtime error surfaced by the backend wrappers.
    #[cfg(feature = "rocm")]
    #[error("HIP error: {0}")]
    Backend(#[from] crate::backend::hip_backend::HipError),
}

impl SplitForgeError {
    /// Categorize the error for handling decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SplitForgeError::InvalidSplitAxis { .. }
            | SplitForgeError::InvalidNumSplit(_)
            | SplitForgeError::UnevenSplit { .. }
            | SplitForgeError::DTypeMismatch { .. }
            | SplitForgeError::ShapeMismatch(_)
            | SplitForgeError::KernelNotRegistered(_) => ErrorCategory::InvalidArgument,

            SplitForgeError::AllocationFailed(_)
            | SplitForgeError::LaunchFailed(_)
            | SplitForgeError::InternalError(_)
            | SplitForgeError::LockPoisoned(_) => ErrorCategory::Internal,

            #[cfg(feature = "rocm")]
            SplitForgeError::Backend(_) => ErrorCategory::Backend,
        }
    }

    /// Invalid-argument errors are rejected before any side effect and are
    /// never worth retrying with the same inputs.
    pub fn is_invalid_argument(&self) -> bool {
        self.category() == ErrorCategory::InvalidArgument
    }

    /// Internal and backend errors are terminal for the invocation; output
    /// buffers may already exist with undefined contents.
    pub fn is_internal(&self) -> bool {
        !self.is_invalid_argument()
    }
}

impl<T> From<std::sync::PoisonError<T>> for SplitForgeError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        SplitForgeError::LockPoisoned(err.to_string())
    }
}

/// Error category for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller passed bad parameters; detected before any allocation.
    InvalidArgument,
    /// Bug or unrecoverable runtime failure inside the kernel.
    Internal,
    /// GPU/HIP runtime failure.
    Backend,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::InvalidArgument => write!(f, "InvalidArgument"),
            ErrorCategory::Internal => write!(f, "Internal"),
            ErrorCategory::Backend => write!(f, "Backend"),
        }
    }
}

/// Result alias used throughout the crate.
pub type ForgeResult<T> = std::result::Result<T, SplitForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            SplitForgeError::InvalidSplitAxis { axis: -1, rank: 2 }.category(),
            ErrorCategory::InvalidArgument
        );
        assert_eq!(
            SplitForgeError::InvalidNumSplit(0).category(),
            ErrorCategory::InvalidArgument
        );
        assert_eq!(
            SplitForgeError::UnevenSplit {
                axis: 0,
                axis_size: 5,
                num_split: 2
            }
            .category(),
            ErrorCategory::InvalidArgument
        );
        assert_eq!(
            SplitForgeError::LaunchFailed("stream error".to_string()).category(),
            ErrorCategory::Internal
        );
        assert_eq!(
            SplitForgeError::AllocationFailed("out of memory".to_string()).category(),
            ErrorCategory::Internal
        );
    }

    #[test]
    fn test_invalid_argument_predicate() {
        assert!(SplitForgeError::InvalidNumSplit(0).is_invalid_argument());
        assert!(!SplitForgeError::InvalidNumSplit(0).is_internal());
        assert!(SplitForgeError::InternalError("bug".to_string()).is_internal());
        assert!(!SplitForgeError::InternalError("bug".to_string()).is_invalid_argument());
    }

    #[test]
    fn test_error_display_carries_offending_values() {
        let err = SplitForgeError::InvalidSplitAxis { axis: 3, rank: 3 };
        assert_eq!(
            err.to_string(),
            "split axis must satisfy 0 <= axis < 3, but got 3"
        );

        let err = SplitForgeError::UnevenSplit {
            axis: 1,
            axis_size: 5,
            num_split: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("axis 1"));
        assert!(msg.contains("size = 5"));
        assert!(msg.contains("num_split 2"));
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::InvalidArgument.to_string(), "InvalidArgument");
        assert_eq!(ErrorCategory::Internal.to_string(), "Internal");
        assert_eq!(ErrorCategory::Backend.to_string(), "Backend");
    }
}
