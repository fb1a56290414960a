//! Accelerator backend (feature `rocm`)

pub mod hip_backend;

pub use hip_backend::*;
