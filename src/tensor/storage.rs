//! Aligned host storage for tensor data
//!
//! Host buffers are allocated at a fixed 64-byte alignment so the base of
//! every owned tensor satisfies the vectorized-consumer alignment the
//! fast-path selector relies on. Views into a buffer may land at smaller
//! alignments; their classification is computed from their actual address.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

use crate::error::{ForgeResult, SplitForgeError};

/// Alignment of every owned host allocation, in bytes.
pub const STORAGE_ALIGN: usize = 64;

/// Heap buffer aligned to [`STORAGE_ALIGN`], zero-initialized.
///
/// Access mirrors the device buffer wrapper: raw pointers are handed out
/// through `&self`, and writers are responsible for disjointness. The split
/// executors only ever write freshly-allocated buffers or disjoint output
/// regions, so no internal synchronization is needed.
#[derive(Debug)]
pub struct AlignedVec {
    ptr: NonNull<u8>,
    len: usize,
}

// SAFETY: AlignedVec exclusively owns its heap block; the raw pointer is
// never shared outside Arc-managed tensors, and drop runs exactly once.
unsafe impl Send for AlignedVec {}
unsafe impl Sync for AlignedVec {}

impl AlignedVec {
    /// Allocate a zeroed buffer of `len` bytes.
    ///
    /// Zero-length buffers perform no allocation and use a well-aligned
    /// dangling pointer.
    pub fn zeroed(len: usize) -> ForgeResult<Self> {
        if len == 0 {
            // Dangling but aligned; never dereferenced for len == 0.
            let ptr = NonNull::new(STORAGE_ALIGN as *mut u8)
                .expect("STORAGE_ALIGN is nonzero");
            return Ok(AlignedVec { ptr, len: 0 });
        }

        let layout = Layout::from_size_align(len, STORAGE_ALIGN).map_err(|e| {
            SplitForgeError::AllocationFailed(format!(
                "invalid layout for {} bytes: {}",
                len, e
            ))
        })?;

        // SAFETY: layout has nonzero size, checked above.
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw).ok_or_else(|| {
            SplitForgeError::AllocationFailed(format!(
                "host allocation of {} bytes failed",
                len
            ))
        })?;

        tracing::trace!("AlignedVec::zeroed: allocated {} bytes at {:p}", len, raw);
        Ok(AlignedVec { ptr, len })
    }

    /// Buffer length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Raw base pointer.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Raw mutable base pointer.
    ///
    /// Handed out through `&self` like the device buffer wrapper; callers
    /// must only write regions no other reader currently borrows.
    pub fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Read-only byte view of the whole buffer.
    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: ptr/len describe an owned allocation (or len == 0).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Mutable byte view of the whole buffer.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: exclusive borrow of self guarantees unique access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedVec {
    fn drop(&mut self) {
        if self.len > 0 {
            // SAFETY: allocated in zeroed() with this exact layout.
            unsafe {
                let layout = Layout::from_size_align_unchecked(self.len, STORAGE_ALIGN);
                dealloc(self.ptr.as_ptr(), layout);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_is_aligned_and_zeroed() {
        let buf = AlignedVec::zeroed(100).unwrap();
        assert_eq!(buf.len(), 100);
        assert_eq!(buf.as_ptr() as usize % STORAGE_ALIGN, 0);
        assert!(buf.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_zero_length_buffer() {
        let buf = AlignedVec::zeroed(0).unwrap();
        assert!(buf.is_empty());
        assert_eq!(buf.as_slice(), &[] as &[u8]);
        assert_eq!(buf.as_ptr() as usize % STORAGE_ALIGN, 0);
    }

    #[test]
    fn test_writes_visible_through_slice() {
        let mut buf = AlignedVec::zeroed(8).unwrap();
        buf.as_mut_slice().copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(buf.as_slice(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
