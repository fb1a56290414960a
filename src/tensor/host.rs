//! Host tensors: dtype-tagged views over aligned, reference-counted storage
//!
//! A `HostTensor` is either an owned allocation (offset 0) or a view that
//! shares its parent's storage at a byte offset. Sharing is what makes the
//! identity and leading-axis fast paths zero-copy: an output can alias the
//! source without any byte moving.

use std::ptr;
use std::sync::Arc;

use crate::error::{ForgeResult, SplitForgeError};
use crate::tensor::dtype::{DType, Element};
use crate::tensor::shape::TensorShape;
use crate::tensor::storage::AlignedVec;

/// Alignment assumed by vectorized consumers, in bytes.
///
/// The zero-copy fast path only aliases sources classified `Aligned`;
/// anything else falls through to a real copy so downstream SIMD reads
/// never see a misaligned base.
pub const VECTOR_ALIGN: usize = 16;

/// Alignment classification of a tensor's base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Aligned,
    Unaligned,
}

impl Alignment {
    /// Classify a base address. Pure; the whole aliasing policy hangs off
    /// this one predicate.
    pub fn classify(addr: usize) -> Alignment {
        if addr % VECTOR_ALIGN == 0 {
            Alignment::Aligned
        } else {
            Alignment::Unaligned
        }
    }
}

/// Host-resident tensor.
#[derive(Debug, Clone)]
pub struct HostTensor {
    storage: Arc<AlignedVec>,
    byte_offset: usize,
    dtype: DType,
    shape: TensorShape,
}

impl HostTensor {
    /// Wrap freshly-built storage as an owned tensor.
    ///
    /// The storage length must match the shape's byte size exactly.
    pub fn from_storage(
        storage: AlignedVec,
        dtype: DType,
        shape: TensorShape,
    ) -> ForgeResult<Self> {
        let expected = shape.total_elements() * dtype.size_of();
        if storage.len() != expected {
            return Err(SplitForgeError::ShapeMismatch(format!(
                "storage holds {} bytes but shape {:?} of {} needs {}",
                storage.len(),
                shape.dims(),
                dtype,
                expected
            )));
        }
        Ok(HostTensor {
            storage: Arc::new(storage),
            byte_offset: 0,
            dtype,
            shape,
        })
    }

    /// Allocate a zero-initialized tensor.
    pub fn zeroed(dtype: DType, shape: TensorShape) -> ForgeResult<Self> {
        let bytes = shape.total_elements() * dtype.size_of();
        let storage = AlignedVec::zeroed(bytes)?;
        Self::from_storage(storage, dtype, shape)
    }

    /// Build an owned tensor from a typed slice.
    pub fn from_slice<T: Element>(data: &[T], dims: &[usize]) -> ForgeResult<Self> {
        let shape = TensorShape::from_dims(dims);
        if data.len() != shape.total_elements() {
            return Err(SplitForgeError::ShapeMismatch(format!(
                "{} elements provided for shape {:?} ({} elements)",
                data.len(),
                dims,
                shape.total_elements()
            )));
        }
        let tensor = Self::zeroed(T::DTYPE, shape)?;
        tensor.copy_from_slice(data)?;
        Ok(tensor)
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape.total_elements()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Payload size in bytes.
    pub fn byte_len(&self) -> usize {
        self.len() * self.dtype.size_of()
    }

    /// Byte offset of this tensor within its storage (0 for owned tensors).
    pub fn byte_offset(&self) -> usize {
        self.byte_offset
    }

    /// Base address of this tensor's first element.
    pub fn as_ptr(&self) -> *const u8 {
        // SAFETY: byte_offset was bounds-checked at view construction.
        unsafe { self.storage.as_ptr().add(self.byte_offset) }
    }

    /// Alignment classification of the base address.
    pub fn alignment(&self) -> Alignment {
        Alignment::classify(self.as_ptr() as usize)
    }

    pub fn is_aligned(&self) -> bool {
        self.alignment() == Alignment::Aligned
    }

    /// Read-only byte view of the payload.
    pub fn as_bytes(&self) -> &[u8] {
        &self.storage.as_slice()[self.byte_offset..self.byte_offset + self.byte_len()]
    }

    /// Typed read-only view. Fails if `T` does not match the tensor dtype.
    pub fn as_slice<T: Element>(&self) -> ForgeResult<&[T]> {
        if T::DTYPE != self.dtype {
            return Err(SplitForgeError::DTypeMismatch {
                expected: self.dtype,
                actual: T::DTYPE,
            });
        }
        let addr = self.as_ptr() as usize;
        if addr % std::mem::align_of::<T>() != 0 {
            return Err(SplitForgeError::InternalError(format!(
                "tensor base {:#x} misaligned for {}",
                addr,
                self.dtype
            )));
        }
        // SAFETY: dtype and alignment checked; length derives from the shape
        // validated at construction.
        Ok(unsafe { std::slice::from_raw_parts(self.as_ptr() as *const T, self.len()) })
    }

    /// Overwrite the payload from a typed slice.
    ///
    /// Writes go through the shared storage, so views over the same bytes
    /// observe the new contents. Ordering against concurrent readers is the
    /// graph executor's obligation, exactly as for device buffers.
    pub fn copy_from_slice<T: Element>(&self, data: &[T]) -> ForgeResult<()> {
        if T::DTYPE != self.dtype {
            return Err(SplitForgeError::DTypeMismatch {
                expected: self.dtype,
                actual: T::DTYPE,
            });
        }
        let byte_size = std::mem::size_of_val(data);
        if byte_size != self.byte_len() {
            return Err(SplitForgeError::ShapeMismatch(format!(
                "source data is {} bytes but tensor holds {}",
                byte_size,
                self.byte_len()
            )));
        }
        // SAFETY: destination range is in bounds (offset + byte_len checked
        // at construction) and the source slice cannot overlap freshly
        // tensor-owned storage.
        unsafe {
            ptr::copy_nonoverlapping(
                data.as_ptr() as *const u8,
                self.storage.as_mut_ptr().add(self.byte_offset),
                byte_size,
            );
        }
        Ok(())
    }

    /// View into this tensor's storage at a byte offset, with a new shape.
    /// No bytes are copied; the view shares storage with `self`.
    pub fn view(&self, byte_offset: usize, shape: TensorShape) -> ForgeResult<Self> {
        let view_bytes = shape.total_elements() * self.dtype.size_of();
        if byte_offset + view_bytes > self.byte_len() {
            return Err(SplitForgeError::ShapeMismatch(format!(
                "view range {}..{} exceeds tensor of {} bytes",
                byte_offset,
                byte_offset + view_bytes,
                self.byte_len()
            )));
        }
        Ok(HostTensor {
            storage: Arc::clone(&self.storage),
            byte_offset: self.byte_offset + byte_offset,
            dtype: self.dtype,
            shape,
        })
    }

    /// Share the identical tensor: same storage, offset, and shape.
    pub fn share(&self) -> Self {
        self.clone()
    }

    /// Whether two tensors are backed by the same allocation.
    pub fn shares_storage(&self, other: &HostTensor) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_round_trip() {
        let t = HostTensor::from_slice(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.shape().dims(), &[2, 3]);
        assert_eq!(t.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_from_slice_length_mismatch() {
        let err = HostTensor::from_slice(&[1.0f32, 2.0], &[2, 3]).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_typed_access_checks_dtype() {
        let t = HostTensor::from_slice(&[1i32, 2, 3], &[3]).unwrap();
        let err = t.as_slice::<f32>().unwrap_err();
        assert!(matches!(err, SplitForgeError::DTypeMismatch { .. }));
    }

    #[test]
    fn test_owned_tensor_is_aligned() {
        let t = HostTensor::zeroed(DType::F32, TensorShape::from_dims(&[7])).unwrap();
        assert_eq!(t.alignment(), Alignment::Aligned);
    }

    #[test]
    fn test_view_shares_storage_and_sees_writes() {
        let t = HostTensor::from_slice(&[0u8; 32], &[32]).unwrap();
        let v = t.view(16, TensorShape::from_dims(&[16])).unwrap();
        assert!(v.shares_storage(&t));
        assert_eq!(v.byte_offset(), 16);

        let mut updated = [0u8; 32];
        updated[16] = 42;
        t.copy_from_slice(&updated).unwrap();
        assert_eq!(v.as_slice::<u8>().unwrap()[0], 42);
    }

    #[test]
    fn test_view_bounds_checked() {
        let t = HostTensor::zeroed(DType::F32, TensorShape::from_dims(&[4])).unwrap();
        assert!(t.view(8, TensorShape::from_dims(&[4])).is_err());
        assert!(t.view(8, TensorShape::from_dims(&[2])).is_ok());
    }

    #[test]
    fn test_alignment_classification_is_pure() {
        assert_eq!(Alignment::classify(0), Alignment::Aligned);
        assert_eq!(Alignment::classify(64), Alignment::Aligned);
        assert_eq!(Alignment::classify(24), Alignment::Unaligned);
        assert_eq!(Alignment::classify(8), Alignment::Unaligned);
    }

    #[test]
    fn test_share_is_reference_identical() {
        let t = HostTensor::from_slice(&[1.0f64, 2.0], &[2]).unwrap();
        let s = t.share();
        assert!(s.shares_storage(&t));
        assert_eq!(s.byte_offset(), t.byte_offset());
        assert_eq!(s.shape(), t.shape());
    }
}
