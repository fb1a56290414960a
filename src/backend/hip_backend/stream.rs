//! HIP stream wrapper

use std::ptr;

use crate::backend::hip_backend::error::HipResult;
use crate::backend::hip_backend::ffi;
use crate::backend::hip_backend::HipError;

// SAFETY: HipStream is Send+Sync because it only contains a raw pointer
// and we ensure thread-safe access through proper synchronization
// NOTE: HipStream does NOT implement Clone because cloning raw pointers
// would cause double-free when both instances are dropped.
unsafe impl Send for HipStream {}
unsafe impl Sync for HipStream {}

/// HIP stream wrapper
#[derive(Debug)]
pub struct HipStream {
    stream: *mut std::ffi::c_void,
}

impl HipStream {
    /// Create a new HIP stream
    pub fn new() -> HipResult<Self> {
        let mut stream: *mut std::ffi::c_void = ptr::null_mut();

        let result = unsafe { ffi::hipStreamCreate(&mut stream) };
        tracing::debug!(
            "HipStream::new: hipStreamCreate returned result={}, stream={:?}",
            result,
            stream
        );

        if result != ffi::HIP_SUCCESS {
            return Err(HipError::DeviceError(format!(
                "Failed to create HIP stream: {}",
                result
            )));
        }

        if stream.is_null() {
            return Err(HipError::DeviceError(
                "hipStreamCreate returned null pointer".to_string(),
            ));
        }

        Ok(HipStream { stream })
    }

    /// Synchronize the stream: block the host until every enqueued
    /// operation has completed.
    pub fn synchronize(&self) -> HipResult<()> {
        let result = unsafe { ffi::hipStreamSynchronize(self.stream) };
        if result != ffi::HIP_SUCCESS {
            Err(HipError::DeviceError(format!(
                "Stream synchronization failed: {}",
                result
            )))
        } else {
            Ok(())
        }
    }

    /// Non-blocking health check.
    ///
    /// A stream with work still in flight is healthy; only a real error
    /// state reported by the runtime counts as unhealthy.
    pub fn is_healthy(&self) -> bool {
        let result = unsafe { ffi::hipStreamQuery(self.stream) };
        result == ffi::HIP_SUCCESS || result == ffi::HIP_ERROR_NOT_READY
    }

    /// Enqueue a host callback behind everything currently in the stream.
    ///
    /// The callback runs once the device has consumed all prior work; this
    /// is the deferred-release hook for staging resources.
    pub fn enqueue_host_callback(
        &self,
        func: ffi::HipHostFn,
        user_data: *mut std::ffi::c_void,
    ) -> HipResult<()> {
        let result = unsafe { ffi::hipLaunchHostFunc(self.stream, func, user_data) };
        if result != ffi::HIP_SUCCESS {
            return Err(HipError::DeviceError(format!(
                "hipLaunchHostFunc failed with code {}",
                result
            )));
        }
        Ok(())
    }

    /// Get raw stream pointer (for FFI calls)
    pub fn as_ptr(&self) -> *mut std::ffi::c_void {
        self.stream
    }
}

impl Drop for HipStream {
    fn drop(&mut self) {
        if !self.stream.is_null() {
            unsafe {
                ffi::hipStreamDestroy(self.stream);
            }
        }
    }
}
