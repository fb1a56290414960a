//! splitforge - axis-split tensor kernel
//!
//! Splits a multi-dimensional tensor into a fixed number of equal slabs
//! along one axis, for use inside a computation-graph execution engine.
//! The host path runs a rayon-parallel strided copy; the AMD GPU path
//! (feature `rocm`) stages destination addresses through a pointer table
//! and runs an asynchronous copy/launch sequence on a HIP stream, with
//! deferred release of the staging resources.

#![allow(clippy::too_many_arguments)] // Kernel launches and copy loops need many args
#![allow(clippy::needless_range_loop)] // Clearer for slab/offset arithmetic

pub mod error;
pub mod logging;
pub mod split;
pub mod tensor;

#[cfg(feature = "rocm")]
pub mod backend;

pub use error::{ErrorCategory, ForgeResult, SplitForgeError};
pub use split::{
    split, split_host, KernelRegistry, ProcessingUnit, SplitOutputs, SplitRequest, SplitSource,
};
pub use tensor::{Alignment, DType, Element, HostTensor, TensorShape};

#[cfg(feature = "rocm")]
pub use backend::hip_backend::{DeviceTensor, HipBackend};
#[cfg(feature = "rocm")]
pub use split::gpu::split_device;
