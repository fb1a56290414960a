//! Split parameter validation
//!
//! Runs to completion (or fails) before any buffer is allocated or copied.
//! All failures are invalid-argument errors carrying the offending values.

use crate::error::{ForgeResult, SplitForgeError};
use crate::tensor::TensorShape;

/// Validate a split request against the source shape.
///
/// Checks, in order: axis in `[0, rank)`, `num_split > 0`, and
/// `shape[axis] % num_split == 0`. No side effects.
pub fn validate_split(axis: i64, num_split: usize, shape: &TensorShape) -> ForgeResult<()> {
    let rank = shape.rank();

    if axis < 0 || axis as usize >= rank {
        return Err(SplitForgeError::InvalidSplitAxis { axis, rank });
    }

    if num_split == 0 {
        return Err(SplitForgeError::InvalidNumSplit(num_split));
    }

    let axis_size = shape.dim(axis as usize);
    if axis_size % num_split != 0 {
        return Err(SplitForgeError::UnevenSplit {
            axis,
            axis_size,
            num_split,
        });
    }

    Ok(())
}
