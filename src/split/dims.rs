//! Dimension decomposition for the split copy
//!
//! Any N-dimensional split reduces to a 3D problem: the product of the
//! dimensions before the axis, the axis itself, and the product of the
//! dimensions after it. The copy executors only ever see these three sizes.

use crate::tensor::TensorShape;

/// The `(prefix, axis_size, suffix)` decomposition of a shape around an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitDims {
    /// Product of dimensions before the split axis.
    pub prefix: usize,
    /// Size of the split axis itself.
    pub axis_size: usize,
    /// Product of dimensions after the split axis.
    pub suffix: usize,
}

impl SplitDims {
    /// Total element count of the decomposed tensor.
    pub fn total_elements(&self) -> usize {
        self.prefix * self.axis_size * self.suffix
    }
}

/// Decompose `shape` around `axis`. Pure; `axis` must already be validated
/// to lie in `[0, rank)`.
pub fn decompose(shape: &TensorShape, axis: usize) -> SplitDims {
    let dims = shape.dims();

    let prefix = dims[..axis].iter().product::<usize>();
    let axis_size = dims[axis];
    let suffix = dims[axis + 1..].iter().product::<usize>();

    SplitDims {
        prefix,
        axis_size,
        suffix,
    }
}
