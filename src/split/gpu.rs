//! Accelerator executor: asynchronous pointer-table split on the GPU
//!
//! The generic device split allocates the outputs, stages their base
//! addresses in a host [`AddressTable`], mirrors the table into device
//! memory with an asynchronous copy, and launches the device split-copy
//! primitive on the same stream. The issuing thread never blocks: staging
//! resources are handed to the stream as reference-counted tokens whose
//! final release happens in host callbacks the device fires once it has
//! consumed them.
//!
//! Outputs are therefore NOT safe to read until the stream's completion is
//! observed — consume them on the same stream, or synchronize explicitly
//! (for example through [`DeviceTensor::to_host_vec`]). Reading without
//! that ordering is undefined.

use std::ffi::c_void;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::backend::hip_backend::{
    ceil_div_u64, DeviceTensor, HipBackend, HipBuffer, HipKernel, HipModule,
};
use crate::error::{ForgeResult, SplitForgeError};
use crate::split::dims::SplitDims;
use crate::split::plan::{select_plan, SplitPlan};
use crate::split::registry::SplitKernel;
use crate::split::staging::{AddressTable, CompletionToken};
use crate::split::{SplitOutputs, SplitRequest, SplitSource};
use crate::tensor::Alignment;

/// Entry point compiled into kernels/split.hip.
const KERNEL_NAME: &str = "split_copy_kernel";

const BLOCK_SIZE: u32 = 256;

// The device kernel uses a grid-stride loop, so the grid only needs to
// saturate the device, not cover every byte.
const MAX_GRID_BLOCKS: u64 = 65535;

/// Stream callback releasing the staged address table.
extern "C" fn release_completion_token(user_data: *mut c_void) {
    // SAFETY: user_data comes from exactly one CompletionToken::into_raw in
    // strided_copy, and the stream invokes each callback once.
    unsafe { CompletionToken::release(user_data) };
    tracing::trace!("release_completion_token: staging table released");
}

/// Stream callback releasing the device mirror of the address table, after
/// the split-copy kernel has consumed it.
extern "C" fn release_mirror_buffer(user_data: *mut c_void) {
    // SAFETY: user_data comes from exactly one Arc::into_raw in
    // strided_copy, and the stream invokes each callback once.
    unsafe { drop(Arc::from_raw(user_data as *const HipBuffer)) };
    tracing::trace!("release_mirror_buffer: device pointer table released");
}

/// Registry strategy for device splits.
///
/// One instance serves every supported dtype; the copy is byte-level. The
/// compiled split-copy primitive is loaded lazily from the path build.rs
/// records in `SPLIT_HSACO`.
pub struct GpuSplitKernel {
    primitive: OnceCell<(HipModule, HipKernel)>,
}

impl GpuSplitKernel {
    pub fn new() -> Self {
        GpuSplitKernel {
            primitive: OnceCell::new(),
        }
    }

    fn primitive(&self, backend: &HipBackend) -> ForgeResult<&(HipModule, HipKernel)> {
        self.primitive.get_or_try_init(|| {
            let path = std::env::var("SPLIT_HSACO")
                .ok()
                .or_else(|| option_env!("SPLIT_HSACO").map(str::to_string))
                .ok_or_else(|| {
                    SplitForgeError::InternalError(
                        "SPLIT_HSACO not set; the device split kernel was not compiled"
                            .to_string(),
                    )
                })?;
            let module = backend.load_module(&path)?;
            let kernel = backend.get_kernel_function(&module, KERNEL_NAME)?;
            tracing::debug!("GpuSplitKernel: loaded '{}' from {}", KERNEL_NAME, path);
            Ok((module, kernel))
        })
    }

    fn strided_copy(
        &self,
        backend: &HipBackend,
        tensor: &DeviceTensor,
        axis: usize,
        num_split: usize,
        dims: SplitDims,
        delta: usize,
    ) -> ForgeResult<SplitOutputs> {
        let dtype = tensor.dtype();
        let elem_size = dtype.size_of();
        let out_shape = tensor.shape().with_dim(axis, delta);

        // Allocate every output up front and record the base addresses in
        // slab order.
        let mut outputs = Vec::with_capacity(num_split);
        let mut table = AddressTable::with_capacity(num_split);
        for _ in 0..num_split {
            let out = DeviceTensor::empty(backend, dtype, out_shape.clone())?;
            table.push(out.buffer().as_ptr());
            outputs.push(out);
        }

        // Degenerate case: nothing to move, no transfer or launch is issued.
        if dims.prefix * delta * dims.suffix == 0 {
            tracing::debug!("GpuSplitKernel: zero-size outputs, skipping transfer and launch");
            return Ok(SplitOutputs::Device(outputs));
        }

        // Mirror the table into device memory with an async copy on the work
        // stream; the issuing thread does not block.
        let table = Arc::new(table);
        let mirror = Arc::new(backend.allocate_buffer(table.byte_size())?);
        mirror.copy_from_host_async(table.as_bytes(), backend.stream())?;

        // The host table must stay valid until the device has consumed the
        // copy. Hand the stream a counted reference; its callback performs
        // the final release.
        let token_raw = CompletionToken::new(Arc::clone(&table)).into_raw();
        if let Err(e) = backend
            .stream()
            .enqueue_host_callback(release_completion_token, token_raw)
        {
            // The stream never took the reference; reclaim it here.
            unsafe { CompletionToken::release(token_raw) };
            return Err(e.into());
        }

        // Launch the split-copy primitive behind the table copy on the same
        // stream.
        let (_module, kernel) = self.primitive(backend)?;

        let total_bytes = (dims.total_elements() * elem_size) as u64;
        let grid_x = ceil_div_u64(total_bytes, BLOCK_SIZE as u64).min(MAX_GRID_BLOCKS) as u32;

        let mut src_ptr = tensor.buffer().as_ptr();
        let mut dst_table = mirror.as_ptr();
        let mut prefix = dims.prefix as u64;
        let mut axis_size = dims.axis_size as u64;
        let mut suffix_bytes = (dims.suffix * elem_size) as u64;
        let mut num_split_arg = num_split as u64;
        let args = [
            &mut src_ptr as *mut _ as *mut c_void,
            &mut dst_table as *mut _ as *mut c_void,
            &mut prefix as *mut _ as *mut c_void,
            &mut axis_size as *mut _ as *mut c_void,
            &mut suffix_bytes as *mut _ as *mut c_void,
            &mut num_split_arg as *mut _ as *mut c_void,
        ];
        backend.launch_kernel_on_stream(kernel, (grid_x, 1, 1), (BLOCK_SIZE, 1, 1), &args)?;

        // The mirror is read during kernel execution; defer its release
        // until the stream passes the launch.
        let mirror_raw = Arc::into_raw(Arc::clone(&mirror)) as *mut c_void;
        if let Err(e) = backend
            .stream()
            .enqueue_host_callback(release_mirror_buffer, mirror_raw)
        {
            // SAFETY: reclaim the reference the stream never took.
            unsafe { drop(Arc::from_raw(mirror_raw as *const HipBuffer)) };
            return Err(e.into());
        }

        // Post-launch stream health; an error state is terminal for this
        // invocation and the outputs hold undefined contents.
        if !backend.stream().is_healthy() {
            return Err(SplitForgeError::LaunchFailed(format!(
                "gpu split kernel '{}' left the stream in an error state",
                KERNEL_NAME
            )));
        }

        Ok(SplitOutputs::Device(outputs))
    }
}

impl Default for GpuSplitKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitKernel for GpuSplitKernel {
    fn execute(
        &self,
        request: &SplitRequest,
        source: &SplitSource<'_>,
    ) -> ForgeResult<SplitOutputs> {
        let (tensor, backend) = match source {
            SplitSource::Device { tensor, backend } => (*tensor, *backend),
            SplitSource::Host(_) => {
                return Err(SplitForgeError::InternalError(
                    "device split kernel invoked with a host tensor".to_string(),
                ))
            }
        };

        let axis = request.axis as usize;
        let num_split = request.num_split;
        // hipMalloc allocations are comfortably over-aligned, so base
        // tensors classify Aligned; views inherit their actual address.
        let alignment = Alignment::classify(tensor.buffer().as_ptr() as usize);
        let plan = select_plan(
            tensor.shape(),
            axis,
            num_split,
            tensor.dtype().size_of(),
            alignment,
        );

        match plan {
            SplitPlan::Identity => {
                tracing::debug!("GpuSplitKernel: identity split, sharing source");
                Ok(SplitOutputs::Device(vec![tensor.share()]))
            }
            SplitPlan::AliasLeadingAxis { delta, slab_bytes } => {
                tracing::debug!(
                    "GpuSplitKernel: aliasing dim 0 into {} views of {} bytes",
                    num_split,
                    slab_bytes
                );
                let out_shape = tensor.shape().with_dim(0, delta);
                let outputs = (0..num_split)
                    .map(|i| tensor.slice_view(i * slab_bytes, out_shape.clone()))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(SplitOutputs::Device(outputs))
            }
            SplitPlan::StridedCopy { dims, delta } => {
                self.strided_copy(backend, tensor, axis, num_split, dims, delta)
            }
        }
    }
}

/// Convenience wrapper for device tensors.
///
/// Asynchronous: the call returns once the copy/launch sequence is
/// enqueued. Outputs become valid when the backend stream completes;
/// consume them on the same stream or synchronize first.
pub fn split_device(
    backend: &HipBackend,
    source: &DeviceTensor,
    axis: i64,
    num_split: usize,
) -> ForgeResult<Vec<DeviceTensor>> {
    match crate::split::split(
        &SplitRequest { axis, num_split },
        &SplitSource::Device {
            tensor: source,
            backend,
        },
    )? {
        SplitOutputs::Device(outputs) => Ok(outputs),
        SplitOutputs::Host(_) => Err(SplitForgeError::InternalError(
            "device split produced host outputs".to_string(),
        )),
    }
}
