//! Device-resident tensors

use crate::backend::hip_backend::backend::HipBackend;
use crate::backend::hip_backend::error::{HipError, HipResult};
use crate::backend::hip_backend::event::HipEvent;
use crate::backend::hip_backend::memory::HipBuffer;
use crate::tensor::{DType, Element, TensorShape};

/// Tensor stored in GPU memory.
///
/// Like its host counterpart, a device tensor is either an owned
/// allocation or a view sharing a parent allocation (see
/// [`DeviceTensor::slice_view`]).
#[derive(Debug, Clone)]
pub struct DeviceTensor {
    buffer: HipBuffer,
    dtype: DType,
    shape: TensorShape,
}

impl DeviceTensor {
    /// Allocate an uninitialized device tensor.
    pub fn empty(backend: &HipBackend, dtype: DType, shape: TensorShape) -> HipResult<Self> {
        let byte_len = shape.total_elements() * dtype.size_of();
        let buffer = backend.allocate_buffer(byte_len)?;
        Ok(DeviceTensor {
            buffer,
            dtype,
            shape,
        })
    }

    /// Upload a typed host slice into a new device tensor.
    pub fn from_host_slice<T: Element>(
        backend: &HipBackend,
        data: &[T],
        dims: &[usize],
    ) -> HipResult<Self> {
        let shape = TensorShape::from_dims(dims);
        if data.len() != shape.total_elements() {
            return Err(HipError::DeviceError(format!(
                "{} elements provided for shape {:?} ({} elements)",
                data.len(),
                dims,
                shape.total_elements()
            )));
        }
        let tensor = Self::empty(backend, T::DTYPE, shape)?;
        if !data.is_empty() {
            tensor.buffer.copy_from_host(data)?;
        }
        Ok(tensor)
    }

    /// Download the tensor contents to a host vector.
    ///
    /// Enqueues the copy on the backend stream and waits for an event
    /// recorded behind it, so the returned data reflects every operation
    /// previously enqueued on the same stream. This is the only safe way
    /// to read outputs of an asynchronous split; reading device memory
    /// without this ordering is undefined.
    pub fn to_host_vec<T: Element>(&self, backend: &HipBackend) -> HipResult<Vec<T>> {
        if T::DTYPE != self.dtype {
            return Err(HipError::DeviceError(format!(
                "dtype mismatch: tensor is {}, requested {}",
                self.dtype,
                T::DTYPE
            )));
        }
        let mut host = vec![T::default(); self.len()];
        if !host.is_empty() {
            self.buffer.copy_to_host_async(&mut host, backend.stream())?;
            let done = HipEvent::new()?;
            done.record(backend.stream())?;
            done.synchronize()?;
        }
        Ok(host)
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

    pub fn buffer(&self) -> &HipBuffer {
        &self.buffer
    }

    /// Zero-copy view into this tensor's allocation at a byte offset.
    pub fn slice_view(&self, byte_offset: usize, shape: TensorShape) -> HipResult<Self> {
        let view_bytes = shape.total_elements() * self.dtype.size_of();
        let buffer = self.buffer.sub_buffer_view(byte_offset, view_bytes)?;
        Ok(DeviceTensor {
            buffer,
            dtype: self.dtype,
            shape,
        })
    }

    /// Share the identical tensor: same allocation, offset, and shape.
    pub fn share(&self) -> Self {
        self.clone()
    }

    /// Whether two tensors are backed by the same device allocation.
    pub fn shares_allocation(&self, other: &DeviceTensor) -> bool {
        self.buffer.shares_allocation(other.buffer())
    }
}
