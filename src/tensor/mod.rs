//! Host tensor types: shapes, dtypes, and aligned storage

pub mod dtype;
pub mod host;
pub mod shape;
pub mod storage;

pub use dtype::{DType, Element};
pub use host::{Alignment, HostTensor, VECTOR_ALIGN};
pub use shape::TensorShape;
pub use storage::{AlignedVec, STORAGE_ALIGN};
