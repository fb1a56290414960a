//! Kernel registry: dynamic dispatch by processing unit and element type
//!
//! Every `(ProcessingUnit, DType)` pair maps to a strategy implementing
//! [`SplitKernel`], populated at startup and extensible at runtime. The
//! host kernel covers every dtype; the accelerator kernel is registered
//! only for the numeric subset it supports.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::error::{ForgeResult, SplitForgeError};
use crate::split::dims::{decompose, SplitDims};
use crate::split::host::HostSplitKernel;
use crate::split::validate::validate_split;
use crate::split::{SplitOutputs, SplitRequest, SplitSource};
use crate::tensor::{DType, TensorShape};

/// Which processor executes a split invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingUnit {
    /// General-purpose host processor.
    Host,
    /// Attached accelerator (AMD GPU via HIP).
    Device,
}

impl fmt::Display for ProcessingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingUnit::Host => write!(f, "host"),
            ProcessingUnit::Device => write!(f, "device"),
        }
    }
}

/// Capability interface of a split implementation.
///
/// `validate` and `decompose` share default implementations; `execute`
/// carries the per-unit strategy.
pub trait SplitKernel: Send + Sync {
    /// Check request parameters against the source shape before any buffer
    /// is touched.
    fn validate(&self, axis: i64, num_split: usize, shape: &TensorShape) -> ForgeResult<()> {
        validate_split(axis, num_split, shape)
    }

    /// Reduce the N-dimensional shape to the 3D copy problem.
    fn decompose(&self, shape: &TensorShape, axis: usize) -> SplitDims {
        decompose(shape, axis)
    }

    /// Execute a validated request.
    fn execute(&self, request: &SplitRequest, source: &SplitSource<'_>)
        -> ForgeResult<SplitOutputs>;
}

impl fmt::Debug for dyn SplitKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SplitKernel")
    }
}

/// Registry mapping `(ProcessingUnit, DType)` to kernel implementations.
pub struct KernelRegistry {
    kernels: RwLock<HashMap<(ProcessingUnit, DType), Arc<dyn SplitKernel>>>,
}

static REGISTRY: Lazy<KernelRegistry> = Lazy::new(KernelRegistry::with_defaults);

impl KernelRegistry {
    /// The process-wide registry, populated with the built-in kernels on
    /// first use.
    pub fn global() -> &'static KernelRegistry {
        &REGISTRY
    }

    fn with_defaults() -> Self {
        let mut kernels: HashMap<(ProcessingUnit, DType), Arc<dyn SplitKernel>> = HashMap::new();

        let host: Arc<dyn SplitKernel> = Arc::new(HostSplitKernel);
        for dtype in DType::ALL {
            kernels.insert((ProcessingUnit::Host, dtype), Arc::clone(&host));
        }

        #[cfg(feature = "rocm")]
        {
            let gpu: Arc<dyn SplitKernel> = Arc::new(crate::split::gpu::GpuSplitKernel::new());
            for dtype in DType::ALL {
                if dtype.device_compatible() {
                    kernels.insert((ProcessingUnit::Device, dtype), Arc::clone(&gpu));
                }
            }
        }

        tracing::debug!(
            "KernelRegistry::with_defaults: registered {} split kernels",
            kernels.len()
        );
        KernelRegistry {
            kernels: RwLock::new(kernels),
        }
    }

    /// Register (or replace) the kernel for one `(unit, dtype)` pair.
    pub fn register(
        &self,
        unit: ProcessingUnit,
        dtype: DType,
        kernel: Arc<dyn SplitKernel>,
    ) -> ForgeResult<()> {
        let mut kernels = self.kernels.write()?;
        kernels.insert((unit, dtype), kernel);
        Ok(())
    }

    /// Find the kernel for a `(unit, dtype)` pair.
    pub fn lookup(&self, unit: ProcessingUnit, dtype: DType) -> ForgeResult<Arc<dyn SplitKernel>> {
        let kernels = self.kernels.read()?;
        kernels.get(&(unit, dtype)).cloned().ok_or_else(|| {
            SplitForgeError::KernelNotRegistered(format!("{} {}", unit, dtype))
        })
    }
}
