//! ROCm/HIP backend for the accelerator split path
//!
//! Thin safe wrappers over the HIP runtime: device init, the work stream,
//! Arc-owned device buffers, events, and HSACO module loading. The split
//! executor consumes these through a narrow surface: enqueue async copy,
//! enqueue host callback (deferred release), launch on stream, and query
//! stream health.

mod backend;
mod device;
mod device_tensor;
mod error;
mod event;
pub(crate) mod ffi;
mod memory;
mod module;
mod stream;

pub use backend::HipBackend;
pub use device::{get_error_string, HipDevice};
pub use ffi::HipHostFn;
pub use device_tensor::DeviceTensor;
pub use error::{HipError, HipResult};
pub use event::HipEvent;
pub use memory::HipBuffer;
pub use module::{HipKernel, HipModule};
pub use stream::HipStream;

pub(crate) use backend::ceil_div_u64;
