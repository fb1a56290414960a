//! HIP backend main implementation

use std::sync::{Arc, Once};

use once_cell::sync::OnceCell;

use crate::backend::hip_backend::device::{get_error_string, HipDevice};
use crate::backend::hip_backend::error::{HipError, HipResult};
use crate::backend::hip_backend::ffi;
use crate::backend::hip_backend::memory::HipBuffer;
use crate::backend::hip_backend::module::{HipKernel, HipModule};
use crate::backend::hip_backend::stream::HipStream;

/// Safe ceiling division using u64 arithmetic
///
/// Computes ceil(numerator / denominator) without overflow.
/// Uses u64 arithmetic to handle large tensor dimensions (>4B elements).
#[inline]
pub(crate) fn ceil_div_u64(numerator: u64, denominator: u64) -> u64 {
    assert!(denominator > 0, "Division by zero in ceil_div_u64");
    (numerator + denominator - 1) / denominator
}

/// HIP backend: device context plus the work stream every split invocation
/// enqueues onto.
///
/// The backend is a process-wide singleton because the HIP runtime itself
/// is process-wide; executors still receive it explicitly rather than
/// reaching for a global.
#[derive(Debug)]
pub struct HipBackend {
    device: HipDevice,
    stream: Arc<HipStream>,
}

static GLOBAL_BACKEND: OnceCell<Arc<HipBackend>> = OnceCell::new();

impl HipBackend {
    /// Check if a GPU is available WITHOUT initializing the full backend.
    ///
    /// Safe to call from anywhere - it won't crash if no GPU is present.
    pub fn gpu_available() -> bool {
        use std::sync::atomic::{AtomicBool, Ordering};

        static AVAILABLE: AtomicBool = AtomicBool::new(false);
        static INIT: Once = Once::new();

        INIT.call_once(|| {
            let result = std::panic::catch_unwind(|| unsafe {
                let init_result = ffi::hipInit(0);
                if init_result != ffi::HIP_SUCCESS {
                    tracing::debug!(
                        "HIP not available: hipInit failed with code {}",
                        init_result
                    );
                    return false;
                }

                let mut count: i32 = 0;
                let count_result = ffi::hipGetDeviceCount(&mut count);
                if count_result != ffi::HIP_SUCCESS {
                    tracing::debug!(
                        "HIP not available: hipGetDeviceCount failed with code {}",
                        count_result
                    );
                    return false;
                }

                tracing::debug!("GPU available: {} device(s)", count);
                count > 0
            })
            .unwrap_or(false);

            AVAILABLE.store(result, Ordering::Release);
        });

        AVAILABLE.load(Ordering::Acquire)
    }

    /// Create (or fetch) the backend singleton.
    pub fn new() -> HipResult<Arc<Self>> {
        GLOBAL_BACKEND
            .get_or_try_init(Self::initialize)
            .map(Arc::clone)
    }

    /// Create the backend only if a GPU is available, with a clear error
    /// instead of a crash otherwise.
    pub fn new_checked() -> HipResult<Arc<Self>> {
        if !Self::gpu_available() {
            return Err(HipError::DeviceNotFound);
        }
        Self::new()
    }

    fn initialize() -> HipResult<Arc<Self>> {
        let result = unsafe { ffi::hipInit(0) };
        if result != ffi::HIP_SUCCESS {
            return Err(HipError::InitializationFailed(format!(
                "hipInit failed with code {}",
                result
            )));
        }

        let mut count: i32 = 0;
        let result = unsafe { ffi::hipGetDeviceCount(&mut count) };
        if result != ffi::HIP_SUCCESS || count == 0 {
            return Err(HipError::DeviceNotFound);
        }

        let device_id = 0;
        let result = unsafe { ffi::hipSetDevice(device_id) };
        if result != ffi::HIP_SUCCESS {
            return Err(HipError::DeviceError(format!(
                "Failed to set device {}: hipSetDevice returned {}",
                device_id, result
            )));
        }

        let mut free: usize = 0;
        let mut total: usize = 0;
        let result = unsafe { ffi::hipMemGetInfo(&mut free, &mut total) };
        if result != ffi::HIP_SUCCESS {
            return Err(HipError::DeviceError(format!(
                "hipMemGetInfo failed with code {}",
                result
            )));
        }

        let stream = Arc::new(HipStream::new()?);

        tracing::info!(
            "HipBackend initialized: device {}, {} MB total, {} MB free",
            device_id,
            total / (1024 * 1024),
            free / (1024 * 1024)
        );

        Ok(Arc::new(HipBackend {
            device: HipDevice {
                device_id,
                total_memory: total,
            },
            stream,
        }))
    }

    pub fn device(&self) -> &HipDevice {
        &self.device
    }

    /// The backend's work stream. All copies and launches of one
    /// invocation are serialized on it.
    pub fn stream(&self) -> &HipStream {
        &self.stream
    }

    /// Allocate a device buffer.
    pub fn allocate_buffer(&self, size: usize) -> HipResult<HipBuffer> {
        HipBuffer::new(size)
    }

    /// Block the host until the work stream drains.
    pub fn synchronize(&self) -> HipResult<()> {
        self.stream.synchronize()
    }

    /// Load a compiled HSACO module.
    pub fn load_module(&self, path: &str) -> HipResult<HipModule> {
        HipModule::load_from_path(path)
    }

    /// Get kernel function from module
    pub fn get_kernel_function(
        &self,
        module: &HipModule,
        kernel_name: &str,
    ) -> HipResult<HipKernel> {
        HipKernel::from_module(module, kernel_name)
    }

    /// Enqueue a kernel launch on the backend stream.
    ///
    /// Asynchronous: returns once the launch is enqueued, not when it
    /// completes.
    pub fn launch_kernel_on_stream(
        &self,
        kernel: &HipKernel,
        grid_dim: (u32, u32, u32),
        block_dim: (u32, u32, u32),
        args: &[*mut std::ffi::c_void],
    ) -> HipResult<()> {
        tracing::trace!(
            "launch_kernel_on_stream: kernel='{}', grid={:?}, block={:?}, args_len={}",
            kernel.name(),
            grid_dim,
            block_dim,
            args.len()
        );

        if grid_dim.0 == 0 || grid_dim.1 == 0 || grid_dim.2 == 0 {
            return Err(HipError::KernelLaunchFailed(
                "Grid dimensions cannot be zero".to_string(),
            ));
        }
        if block_dim.0 == 0 || block_dim.1 == 0 || block_dim.2 == 0 {
            return Err(HipError::KernelLaunchFailed(
                "Block dimensions cannot be zero".to_string(),
            ));
        }

        let result = unsafe {
            ffi::hipModuleLaunchKernel(
                kernel.as_ptr(),
                grid_dim.0,
                grid_dim.1,
                grid_dim.2,
                block_dim.0,
                block_dim.1,
                block_dim.2,
                0,
                self.stream.as_ptr(),
                args.as_ptr() as *mut *mut std::ffi::c_void,
                std::ptr::null_mut(),
            )
        };

        if result != ffi::HIP_SUCCESS {
            let error_msg = get_error_string(result);
            tracing::error!(
                "launch_kernel_on_stream: kernel '{}' launch failed: code={}, msg={}",
                kernel.name(),
                result,
                error_msg
            );
            return Err(HipError::KernelLaunchFailed(format!(
                "Kernel '{}' launch failed: {} (grid={:?}, block={:?})",
                kernel.name(),
                error_msg,
                grid_dim,
                block_dim
            )));
        }

        // hipGetLastError clears pending async error state; log but do not
        // fail here since the launch itself was accepted.
        let async_error = unsafe { ffi::hipGetLastError() };
        if async_error != ffi::HIP_SUCCESS {
            tracing::warn!(
                "Async HIP error detected after kernel launch: code={}, msg={}",
                async_error,
                get_error_string(async_error)
            );
        }

        Ok(())
    }
}
