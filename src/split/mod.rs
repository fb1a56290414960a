//! Axis-split kernel: validation, planning, and execution
//!
//! A split partitions a tensor into `num_split` equal slabs along one axis
//! and produces them as independent, densely-packed outputs. The request is
//! validated before any buffer is touched, decomposed into a 3D copy
//! problem, and routed through a fast-path selector that avoids data
//! movement for the identity and leading-axis cases. The generic case runs
//! as a parallel strided copy on the host or as an asynchronous
//! pointer-table launch on the GPU.

pub mod dims;
pub mod host;
pub mod plan;
pub mod registry;
pub mod staging;
pub mod validate;

#[cfg(feature = "rocm")]
pub mod gpu;

pub use dims::{decompose, SplitDims};
pub use host::{split_host_tensor, HostSplitKernel};
pub use plan::{select_plan, SplitPlan};
pub use registry::{KernelRegistry, ProcessingUnit, SplitKernel};
pub use staging::{AddressTable, CompletionToken};
pub use validate::validate_split;

#[cfg(feature = "rocm")]
pub use gpu::{split_device, GpuSplitKernel};

use crate::error::ForgeResult;
use crate::tensor::{DType, HostTensor, TensorShape};

#[cfg(feature = "rocm")]
use crate::backend::hip_backend::{DeviceTensor, HipBackend};

/// One split invocation's parameters.
///
/// The axis arrives as a signed host-resident scalar so out-of-range values
/// (including negatives) survive to the validator instead of being
/// unrepresentable; `num_split` is fixed at graph-construction time.
#[derive(Debug, Clone, Copy)]
pub struct SplitRequest {
    pub axis: i64,
    pub num_split: usize,
}

/// Source tensor of a split, tagged with its processing unit.
pub enum SplitSource<'a> {
    Host(&'a HostTensor),
    #[cfg(feature = "rocm")]
    Device {
        tensor: &'a DeviceTensor,
        backend: &'a HipBackend,
    },
}

impl SplitSource<'_> {
    pub fn unit(&self) -> ProcessingUnit {
        match self {
            SplitSource::Host(_) => ProcessingUnit::Host,
            #[cfg(feature = "rocm")]
            SplitSource::Device { .. } => ProcessingUnit::Device,
        }
    }

    pub fn dtype(&self) -> DType {
        match self {
            SplitSource::Host(t) => t.dtype(),
            #[cfg(feature = "rocm")]
            SplitSource::Device { tensor, .. } => tensor.dtype(),
        }
    }

    pub fn shape(&self) -> &TensorShape {
        match self {
            SplitSource::Host(t) => t.shape(),
            #[cfg(feature = "rocm")]
            SplitSource::Device { tensor, .. } => tensor.shape(),
        }
    }
}

/// Outputs of a split, in slab order.
#[derive(Debug)]
pub enum SplitOutputs {
    Host(Vec<HostTensor>),
    #[cfg(feature = "rocm")]
    Device(Vec<DeviceTensor>),
}

/// Split `source` into `request.num_split` slabs along `request.axis`.
///
/// Dispatches through the kernel registry by `(processing unit, dtype)`.
/// Validation failures surface before any allocation; fast paths return
/// aliases of the source instead of copies.
pub fn split(request: &SplitRequest, source: &SplitSource<'_>) -> ForgeResult<SplitOutputs> {
    let kernel = KernelRegistry::global().lookup(source.unit(), source.dtype())?;
    kernel.validate(request.axis, request.num_split, source.shape())?;
    kernel.execute(request, source)
}

/// Convenience wrapper for host tensors.
pub fn split_host(
    source: &HostTensor,
    axis: i64,
    num_split: usize,
) -> ForgeResult<Vec<HostTensor>> {
    match split(&SplitRequest { axis, num_split }, &SplitSource::Host(source))? {
        SplitOutputs::Host(outputs) => Ok(outputs),
        #[cfg(feature = "rocm")]
        SplitOutputs::Device(_) => Err(crate::error::SplitForgeError::InternalError(
            "host split produced device outputs".to_string(),
        )),
    }
}
