//! Host executor: generic split via a parallel strided copy
//!
//! The source is treated as a 3D `(prefix, axis_size, suffix)` array. For
//! output `i`, the slab at axis offset `i * delta` is one contiguous run of
//! `delta * suffix` elements per prefix step, so the copy is a gather of
//! `prefix` contiguous runs. Runs are copied in parallel with rayon;
//! outputs write disjoint freshly-allocated destinations, so iteration
//! order carries no meaning.

use rayon::prelude::*;

use crate::error::ForgeResult;
#[cfg(feature = "rocm")]
use crate::error::SplitForgeError;
use crate::split::dims::SplitDims;
use crate::split::plan::{select_plan, SplitPlan};
use crate::split::registry::SplitKernel;
use crate::split::{SplitOutputs, SplitRequest, SplitSource};
use crate::tensor::{AlignedVec, HostTensor};

/// Registry strategy for host splits. One instance serves every dtype; the
/// copy is byte-level, parameterized only by the element size.
pub struct HostSplitKernel;

impl SplitKernel for HostSplitKernel {
    fn execute(
        &self,
        request: &SplitRequest,
        source: &SplitSource<'_>,
    ) -> ForgeResult<SplitOutputs> {
        let tensor = match source {
            SplitSource::Host(t) => *t,
            #[cfg(feature = "rocm")]
            SplitSource::Device { .. } => {
                return Err(SplitForgeError::InternalError(
                    "host split kernel invoked with a device tensor".to_string(),
                ))
            }
        };
        let outputs = split_host_tensor(tensor, request.axis as usize, request.num_split)?;
        Ok(SplitOutputs::Host(outputs))
    }
}

/// Execute a validated split of a host tensor.
///
/// The caller returns from this function only after every copy completed;
/// fast-path outputs alias the source instead of copying.
pub fn split_host_tensor(
    source: &HostTensor,
    axis: usize,
    num_split: usize,
) -> ForgeResult<Vec<HostTensor>> {
    let plan = select_plan(
        source.shape(),
        axis,
        num_split,
        source.dtype().size_of(),
        source.alignment(),
    );

    match plan {
        SplitPlan::Identity => {
            tracing::debug!("split_host_tensor: identity split, sharing source");
            Ok(vec![source.share()])
        }
        SplitPlan::AliasLeadingAxis { delta, slab_bytes } => {
            tracing::debug!(
                "split_host_tensor: aliasing dim 0 into {} views of {} bytes",
                num_split,
                slab_bytes
            );
            let out_shape = source.shape().with_dim(0, delta);
            (0..num_split)
                .map(|i| source.view(i * slab_bytes, out_shape.clone()))
                .collect()
        }
        SplitPlan::StridedCopy { dims, delta } => strided_copy(source, axis, num_split, dims, delta),
    }
}

fn strided_copy(
    source: &HostTensor,
    axis: usize,
    num_split: usize,
    dims: SplitDims,
    delta: usize,
) -> ForgeResult<Vec<HostTensor>> {
    let elem_size = source.dtype().size_of();
    let out_shape = source.shape().with_dim(axis, delta);
    let out_bytes = out_shape.total_elements() * elem_size;

    // Contiguous run per prefix step in the destination, and the stride
    // between consecutive prefix steps in the source.
    let run_bytes = delta * dims.suffix * elem_size;
    let src_stride_bytes = dims.axis_size * dims.suffix * elem_size;
    let src_bytes = source.as_bytes();

    tracing::debug!(
        "split_host_tensor: strided copy {:?} axis {} into {} outputs of {} bytes",
        source.shape().dims(),
        axis,
        num_split,
        out_bytes
    );

    let mut outputs = Vec::with_capacity(num_split);
    for i in 0..num_split {
        let mut storage = AlignedVec::zeroed(out_bytes)?;
        if out_bytes > 0 {
            let slab_base = i * run_bytes;
            storage
                .as_mut_slice()
                .par_chunks_mut(run_bytes)
                .enumerate()
                .for_each(|(p, dst_run)| {
                    let start = p * src_stride_bytes + slab_base;
                    dst_run.copy_from_slice(&src_bytes[start..start + run_bytes]);
                });
        }
        outputs.push(HostTensor::from_storage(
            storage,
            source.dtype(),
            out_shape.clone(),
        )?);
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::dims::decompose;

    #[test]
    fn test_strided_copy_middle_axis() {
        // (2, 4, 3) split along axis 1 into halves.
        let data: Vec<f32> = (0..24).map(|v| v as f32).collect();
        let source = HostTensor::from_slice(&data, &[2, 4, 3]).unwrap();
        let dims = decompose(source.shape(), 1);

        let outputs = strided_copy(&source, 1, 2, dims, 2).unwrap();
        assert_eq!(outputs.len(), 2);
        for out in &outputs {
            assert_eq!(out.shape().dims(), &[2, 2, 3]);
            assert!(!out.shares_storage(&source));
        }

        // First half keeps rows 0..2 of the axis, second half rows 2..4.
        let first = outputs[0].as_slice::<f32>().unwrap();
        let second = outputs[1].as_slice::<f32>().unwrap();
        assert_eq!(first, &[0., 1., 2., 3., 4., 5., 12., 13., 14., 15., 16., 17.]);
        assert_eq!(
            second,
            &[6., 7., 8., 9., 10., 11., 18., 19., 20., 21., 22., 23.]
        );
    }

    #[test]
    fn test_degenerate_allocates_empty_outputs() {
        let source = HostTensor::zeroed(
            crate::tensor::DType::F32,
            crate::tensor::TensorShape::from_dims(&[2, 0, 3]),
        )
        .unwrap();
        let dims = decompose(source.shape(), 1);

        let outputs = strided_copy(&source, 1, 4, dims, 0).unwrap();
        assert_eq!(outputs.len(), 4);
        for out in &outputs {
            assert_eq!(out.shape().dims(), &[2, 0, 3]);
            assert!(out.is_empty());
        }
    }
}
