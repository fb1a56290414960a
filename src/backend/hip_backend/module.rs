//! HIP module and kernel wrapper

use std::ffi::CString;
use std::ptr;

use crate::backend::hip_backend::device::get_error_string;
use crate::backend::hip_backend::error::HipResult;
use crate::backend::hip_backend::ffi;
use crate::backend::hip_backend::HipError;

// SAFETY: HipModule is Send+Sync because it only contains a raw pointer
// and we ensure thread-safe access through proper synchronization
unsafe impl Send for HipModule {}
unsafe impl Sync for HipModule {}

/// HIP module wrapper
#[derive(Debug)]
pub struct HipModule {
    module: *mut std::ffi::c_void,
}

impl HipModule {
    /// Get raw module pointer
    pub fn as_ptr(&self) -> *mut std::ffi::c_void {
        self.module
    }

    /// Load HIP module from a compiled HSACO file
    pub fn load_from_path(path: &str) -> HipResult<Self> {
        let path_cstr = CString::new(path)
            .map_err(|e| HipError::KernelLoadFailed(format!("Invalid path string: {}", e)))?;

        let mut module: *mut std::ffi::c_void = ptr::null_mut();
        let result = unsafe { ffi::hipModuleLoad(&mut module, path_cstr.as_ptr()) };

        if result != ffi::HIP_SUCCESS {
            let error_msg = get_error_string(result);
            return Err(HipError::KernelLoadFailed(format!(
                "Failed to load module '{}': {}",
                path, error_msg
            )));
        }

        Ok(HipModule { module })
    }
}

impl Drop for HipModule {
    fn drop(&mut self) {
        if !self.module.is_null() {
            unsafe {
                ffi::hipModuleUnload(self.module);
            }
        }
    }
}

// SAFETY: HipKernel is Send+Sync because it only contains a raw pointer
// and we ensure thread-safe access through proper synchronization
unsafe impl Send for HipKernel {}
unsafe impl Sync for HipKernel {}

/// HIP kernel function wrapper
#[derive(Debug)]
pub struct HipKernel {
    func: *mut std::ffi::c_void,
    name: String,
}

impl HipKernel {
    /// Get raw kernel function pointer
    pub fn as_ptr(&self) -> *mut std::ffi::c_void {
        self.func
    }

    /// Kernel function name (for diagnostics)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get kernel function from module
    pub fn from_module(module: &HipModule, kernel_name: &str) -> HipResult<Self> {
        let kernel_name_cstr = CString::new(kernel_name)
            .map_err(|e| HipError::KernelLoadFailed(format!("Invalid kernel name: {}", e)))?;

        let mut func: *mut std::ffi::c_void = ptr::null_mut();
        let result = unsafe {
            ffi::hipModuleGetFunction(&mut func, module.as_ptr(), kernel_name_cstr.as_ptr())
        };

        if result != ffi::HIP_SUCCESS {
            let error_msg = get_error_string(result);
            return Err(HipError::KernelLoadFailed(format!(
                "Failed to get kernel '{}': {}",
                kernel_name, error_msg
            )));
        }

        Ok(HipKernel {
            func,
            name: kernel_name.to_string(),
        })
    }
}
