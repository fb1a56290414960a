//! HIP device info

use std::ffi::CStr;

/// HIP device information
#[derive(Debug, Clone)]
pub struct HipDevice {
    pub device_id: i32,
    /// Total device memory in bytes, queried at backend init.
    pub total_memory: usize,
}

/// Get HIP error string from error code
pub fn get_error_string(error: i32) -> String {
    unsafe {
        let error_ptr = super::ffi::hipGetErrorString(error);
        if error_ptr.is_null() {
            "Unknown error".to_string()
        } else {
            CStr::from_ptr(error_ptr).to_string_lossy().into_owned()
        }
    }
}
