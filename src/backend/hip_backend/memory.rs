//! HIP buffer wrapper for GPU memory allocation

use std::ptr;
use std::sync::Arc;

use crate::backend::hip_backend::error::HipResult;
use crate::backend::hip_backend::ffi;
use crate::backend::hip_backend::HipError;

// SAFETY: the inner allocation only contains a raw device pointer; access
// is through HIP runtime calls which are thread-safe, and the Arc ensures
// hipFree runs exactly once.
unsafe impl Send for HipBufferInner {}
unsafe impl Sync for HipBufferInner {}

/// The owning device allocation. Freed when the last handle drops.
#[derive(Debug)]
struct HipBufferInner {
    ptr: *mut std::ffi::c_void,
}

impl Drop for HipBufferInner {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                ffi::hipFree(self.ptr);
            }
        }
    }
}

/// Handle to a GPU buffer or a byte-range view into one.
///
/// Cloning is cheap (Arc); the underlying allocation is freed once when the
/// last handle (owner or view) drops.
#[derive(Debug, Clone)]
pub struct HipBuffer {
    inner: Arc<HipBufferInner>,
    /// Byte offset of this handle into the allocation (0 for owners).
    offset: usize,
    /// Size of the range this handle exposes.
    size: usize,
}

impl HipBuffer {
    /// Allocate a new GPU buffer of `size` bytes.
    ///
    /// A zero-size request performs no device allocation and yields a null
    /// buffer usable only as an empty-tensor placeholder.
    pub fn new(size: usize) -> HipResult<Self> {
        if size == 0 {
            return Ok(HipBuffer {
                inner: Arc::new(HipBufferInner {
                    ptr: ptr::null_mut(),
                }),
                offset: 0,
                size: 0,
            });
        }

        let mut raw: *mut std::ffi::c_void = ptr::null_mut();
        let result = unsafe { ffi::hipMalloc(&mut raw, size) };

        if result != ffi::HIP_SUCCESS {
            tracing::error!(
                "HipBuffer::new: hipMalloc failed with code {} for {} bytes",
                result,
                size
            );
            return Err(HipError::MemoryAllocationFailed(format!(
                "hipMalloc failed with code {} for {} bytes",
                result, size
            )));
        }

        if raw.is_null() {
            return Err(HipError::MemoryAllocationFailed(format!(
                "hipMalloc returned null pointer for {} bytes",
                size
            )));
        }

        tracing::trace!("HipBuffer::new: allocated {} bytes at {:?}", size, raw);
        Ok(HipBuffer {
            inner: Arc::new(HipBufferInner { ptr: raw }),
            offset: 0,
            size,
        })
    }

    /// Get buffer size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    fn ptr(&self) -> *mut std::ffi::c_void {
        if self.offset > 0 {
            // Offsets were bounds-checked at view construction.
            (self.inner.ptr as usize + self.offset) as *mut std::ffi::c_void
        } else {
            self.inner.ptr
        }
    }

    /// Create a view into this buffer at a specific byte offset.
    /// No new GPU memory is allocated; the parent allocation stays alive
    /// until every view is dropped.
    pub fn sub_buffer_view(&self, offset: usize, size: usize) -> HipResult<Self> {
        if offset + size > self.size {
            return Err(HipError::MemoryAllocationFailed(format!(
                "GPU memory sub-allocation failed: offset={} size={} > buffer_size={}",
                offset, size, self.size
            )));
        }

        Ok(HipBuffer {
            inner: Arc::clone(&self.inner),
            offset: self.offset + offset,
            size,
        })
    }

    /// Copy data from host to device (synchronous).
    pub fn copy_from_host<T>(&self, data: &[T]) -> HipResult<()> {
        let byte_size = std::mem::size_of_val(data);
        if byte_size > self.size {
            return Err(HipError::MemoryCopyFailed(format!(
                "Source data too large: {} > {}",
                byte_size, self.size
            )));
        }

        let result = unsafe {
            ffi::hipMemcpy(
                self.ptr(),
                data.as_ptr() as *const std::ffi::c_void,
                byte_size,
                ffi::HIP_MEMCPY_HOST_TO_DEVICE,
            )
        };

        if result != ffi::HIP_SUCCESS {
            return Err(HipError::MemoryCopyFailed(format!(
                "hipMemcpy H2D failed with code {} (ptr={:?}, size={}, offset={})",
                result,
                self.ptr(),
                byte_size,
                self.offset
            )));
        }

        Ok(())
    }

    /// Copy data from host to device, queued on the specified stream.
    ///
    /// Returns as soon as the copy is enqueued; the host memory behind
    /// `data` must stay valid until the stream confirms consumption.
    pub fn copy_from_host_async<T>(
        &self,
        data: &[T],
        stream: &super::stream::HipStream,
    ) -> HipResult<()> {
        let byte_size = std::mem::size_of_val(data);
        if byte_size > self.size {
            return Err(HipError::MemoryCopyFailed(format!(
                "Source data too large: {} > {}",
                byte_size, self.size
            )));
        }

        let result = unsafe {
            ffi::hipMemcpyAsync(
                self.ptr(),
                data.as_ptr() as *const std::ffi::c_void,
                byte_size,
                ffi::HIP_MEMCPY_HOST_TO_DEVICE,
                stream.as_ptr(),
            )
        };

        if result != ffi::HIP_SUCCESS {
            return Err(HipError::MemoryCopyFailed(format!(
                "hipMemcpyAsync H2D failed with code {} (ptr={:?}, size={}, offset={})",
                result,
                self.ptr(),
                byte_size,
                self.offset
            )));
        }

        Ok(())
    }

    /// Copy data from device to host, queued on the specified stream.
    ///
    /// Does NOT synchronize; the caller must wait on the stream (or an
    /// event recorded after this copy) before reading `data`.
    pub fn copy_to_host_async<T>(
        &self,
        data: &mut [T],
        stream: &super::stream::HipStream,
    ) -> HipResult<()> {
        let byte_size = std::mem::size_of_val(data);
        if byte_size > self.size {
            return Err(HipError::MemoryCopyFailed(format!(
                "Destination buffer too small: {} > {}",
                byte_size, self.size
            )));
        }

        let result = unsafe {
            ffi::hipMemcpyAsync(
                data.as_mut_ptr() as *mut std::ffi::c_void,
                self.ptr(),
                byte_size,
                ffi::HIP_MEMCPY_DEVICE_TO_HOST,
                stream.as_ptr(),
            )
        };

        if result != ffi::HIP_SUCCESS {
            return Err(HipError::MemoryCopyFailed(format!(
                "hipMemcpyAsync D2H failed with code {}",
                result
            )));
        }

        Ok(())
    }

    /// Get raw buffer pointer
    pub fn as_ptr(&self) -> *mut std::ffi::c_void {
        self.ptr()
    }

    /// Whether two handles are backed by the same device allocation.
    pub fn shares_allocation(&self, other: &HipBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
