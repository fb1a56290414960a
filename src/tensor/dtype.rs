//! Element types supported by the split kernel

use std::fmt;

use half::f16;

/// Fixed-size element types.
///
/// The host executor handles every variant; the accelerator path is
/// restricted to the numeric subset reported by [`DType::device_compatible`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F16,
    F32,
    F64,
    I8,
    I32,
    I64,
    U8,
    U32,
    Bool,
}

impl DType {
    /// Every supported dtype, in a stable order. Used to seed the kernel
    /// registry.
    pub const ALL: [DType; 9] = [
        DType::F16,
        DType::F32,
        DType::F64,
        DType::I8,
        DType::I32,
        DType::I64,
        DType::U8,
        DType::U32,
        DType::Bool,
    ];

    /// Element size in bytes.
    pub fn size_of(&self) -> usize {
        match self {
            DType::I8 | DType::U8 | DType::Bool => 1,
            DType::F16 => 2,
            DType::F32 | DType::I32 | DType::U32 => 4,
            DType::F64 | DType::I64 => 8,
        }
    }

    /// Whether the accelerator executor accepts this dtype.
    pub fn device_compatible(&self) -> bool {
        matches!(
            self,
            DType::F16 | DType::F32 | DType::F64 | DType::I32 | DType::I64
        )
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F16 => "f16",
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::I8 => "i8",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::U8 => "u8",
            DType::U32 => "u32",
            DType::Bool => "bool",
        };
        write!(f, "{}", name)
    }
}

/// Rust scalar types usable through the typed tensor views.
///
/// Implementations cover exactly the [`DType`] variants; the `Copy` bound
/// is what keeps the byte-level copy executor valid for every element.
pub trait Element: Copy + Default + Send + Sync + 'static {
    const DTYPE: DType;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(impl Element for $ty {
            const DTYPE: DType = $dtype;
        })*
    };
}

impl_element! {
    f16 => DType::F16,
    f32 => DType::F32,
    f64 => DType::F64,
    i8 => DType::I8,
    i32 => DType::I32,
    i64 => DType::I64,
    u8 => DType::U8,
    u32 => DType::U32,
    bool => DType::Bool,
}
