//! HIP event wrapper for stream synchronization

use std::ptr;

use crate::backend::hip_backend::error::HipResult;
use crate::backend::hip_backend::ffi;
use crate::backend::hip_backend::HipError;

// SAFETY: HipEvent is Send+Sync because it only contains a raw pointer
// and we ensure thread-safe access through proper synchronization
// NOTE: HipEvent does NOT implement Clone because cloning raw pointers
// would cause double-free when both instances are dropped.
unsafe impl Send for HipEvent {}
unsafe impl Sync for HipEvent {}

/// HIP event wrapper
///
/// Events capture a point in a stream's work queue; synchronizing on a
/// recorded event blocks the host until everything enqueued before the
/// record call has completed.
#[derive(Debug)]
pub struct HipEvent {
    event: *mut std::ffi::c_void,
}

impl HipEvent {
    /// Create a new HIP event
    pub fn new() -> HipResult<Self> {
        let mut event: *mut std::ffi::c_void = ptr::null_mut();

        let result = unsafe { ffi::hipEventCreate(&mut event) };
        if result != ffi::HIP_SUCCESS {
            return Err(HipError::DeviceError(format!(
                "Failed to create HIP event: {}",
                result
            )));
        }

        if event.is_null() {
            return Err(HipError::DeviceError(
                "hipEventCreate returned null pointer".to_string(),
            ));
        }

        Ok(HipEvent { event })
    }

    /// Record this event in the given stream
    pub fn record(&self, stream: &super::stream::HipStream) -> HipResult<()> {
        let result = unsafe { ffi::hipEventRecord(self.event, stream.as_ptr()) };

        if result != ffi::HIP_SUCCESS {
            Err(HipError::DeviceError(format!(
                "Event record failed: {}",
                result
            )))
        } else {
            Ok(())
        }
    }

    /// Block the host until all operations captured by this event complete.
    pub fn synchronize(&self) -> HipResult<()> {
        let result = unsafe { ffi::hipEventSynchronize(self.event) };

        if result != ffi::HIP_SUCCESS {
            Err(HipError::DeviceError(format!(
                "Event synchronization failed: {}",
                result
            )))
        } else {
            Ok(())
        }
    }
}

impl Drop for HipEvent {
    fn drop(&mut self) {
        if !self.event.is_null() {
            unsafe {
                ffi::hipEventDestroy(self.event);
            }
        }
    }
}
