//! Execution strategy selection
//!
//! Two shortcuts are recognized before any data moves: a split into one is
//! the source itself, and a leading-axis split of an aligned source is a
//! set of views into the source's storage. Everything else takes the
//! strided-copy executors.

use crate::split::dims::{decompose, SplitDims};
use crate::tensor::{Alignment, TensorShape};

/// How a validated split request will be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPlan {
    /// `num_split == 1`: the single output shares the source.
    Identity,
    /// `axis == 0` on an aligned source: each output is a zero-copy view
    /// covering `slab_bytes` of the source, slab `i` at `i * slab_bytes`.
    AliasLeadingAxis { delta: usize, slab_bytes: usize },
    /// Generic case: allocate outputs and copy slabs.
    StridedCopy { dims: SplitDims, delta: usize },
}

/// Select the execution strategy for a validated request.
///
/// Aliasing the source is always semantically correct; restricting it to
/// aligned sources is a policy that keeps every aliased output usable by
/// alignment-sensitive vectorized consumers. Unaligned sources fall
/// through to a real copy into fresh aligned storage.
pub fn select_plan(
    shape: &TensorShape,
    axis: usize,
    num_split: usize,
    elem_size: usize,
    alignment: Alignment,
) -> SplitPlan {
    if num_split == 1 {
        tracing::trace!("select_plan: identity split");
        return SplitPlan::Identity;
    }

    let dims = decompose(shape, axis);
    let delta = dims.axis_size / num_split;

    if axis == 0 && alignment == Alignment::Aligned {
        let slab_bytes = delta * dims.suffix * elem_size;
        tracing::trace!(
            "select_plan: leading-axis alias, delta={}, slab_bytes={}",
            delta,
            slab_bytes
        );
        return SplitPlan::AliasLeadingAxis { delta, slab_bytes };
    }

    SplitPlan::StridedCopy { dims, delta }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_wins_over_everything() {
        let shape = TensorShape::from_dims(&[8, 3]);
        let plan = select_plan(&shape, 0, 1, 4, Alignment::Unaligned);
        assert_eq!(plan, SplitPlan::Identity);
    }

    #[test]
    fn test_leading_axis_aliases_when_aligned() {
        let shape = TensorShape::from_dims(&[8, 3]);
        let plan = select_plan(&shape, 0, 4, 4, Alignment::Aligned);
        assert_eq!(
            plan,
            SplitPlan::AliasLeadingAxis {
                delta: 2,
                slab_bytes: 24
            }
        );
    }

    #[test]
    fn test_unaligned_source_falls_through_to_copy() {
        let shape = TensorShape::from_dims(&[8, 3]);
        let plan = select_plan(&shape, 0, 4, 4, Alignment::Unaligned);
        assert!(matches!(plan, SplitPlan::StridedCopy { .. }));
    }

    #[test]
    fn test_inner_axis_always_copies() {
        let shape = TensorShape::from_dims(&[2, 4, 3]);
        let plan = select_plan(&shape, 1, 2, 4, Alignment::Aligned);
        assert_eq!(
            plan,
            SplitPlan::StridedCopy {
                dims: SplitDims {
                    prefix: 2,
                    axis_size: 4,
                    suffix: 3
                },
                delta: 2
            }
        );
    }
}
