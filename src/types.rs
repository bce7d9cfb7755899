//! Element representations and the per-call mode flags shared by all kernels.

use half::slice::HalfFloatSliceExt;
use half::{bf16, f16};
use serde::{Deserialize, Serialize};

/// Float type identifier for const-time kernel selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatType {
    F32,
    F16,
    BF16,
}

impl FloatType {
    /// Storage width of one element in bytes.
    #[inline(always)]
    pub const fn byte_width(self) -> usize {
        match self {
            FloatType::F32 => 4,
            FloatType::F16 | FloatType::BF16 => 2,
        }
    }

    /// Whether the math kernels have a code path for this representation.
    #[inline(always)]
    pub const fn is_kernel_supported(self) -> bool {
        matches!(self, FloatType::F32 | FloatType::F16)
    }
}

/// Trait for kernel-compatible floating point types.
///
/// `to_f32` widens without loss; `from_f32` narrows with round-to-nearest-even.
/// Implemented for f32, half::f16 and half::bf16. Only the first two have math
/// kernel paths; bf16 is accepted by the transfer engine and rejected by the
/// math kernels with [`KernelError::UnsupportedElement`](crate::KernelError).
pub trait KernelFloat: Copy + Default + PartialEq + Send + Sync + bytemuck::Pod + 'static {
    /// Compile-time type identifier for zero-cost kernel selection.
    const TYPE_ID: FloatType;

    fn to_f32(self) -> f32;
    fn from_f32(v: f32) -> Self;
}

impl KernelFloat for f32 {
    const TYPE_ID: FloatType = FloatType::F32;

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self
    }
    #[inline(always)]
    fn from_f32(v: f32) -> Self {
        v
    }
}

impl KernelFloat for f16 {
    const TYPE_ID: FloatType = FloatType::F16;

    #[inline(always)]
    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }
    #[inline(always)]
    fn from_f32(v: f32) -> Self {
        f16::from_f32(v)
    }
}

impl KernelFloat for bf16 {
    const TYPE_ID: FloatType = FloatType::BF16;

    #[inline(always)]
    fn to_f32(self) -> f32 {
        bf16::to_f32(self)
    }
    #[inline(always)]
    fn from_f32(v: f32) -> Self {
        bf16::from_f32(v)
    }
}

/// Precision mode for compact-element kernels.
///
/// Ignored for full-precision elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    /// Promote intermediates to f32 before computing.
    #[default]
    High,
    /// Use the reduced-precision hardware approximation directly.
    Fast,
}

impl Precision {
    #[inline(always)]
    pub const fn is_high(self) -> bool {
        matches!(self, Precision::High)
    }
}

/// Which side of the memory hierarchy a region lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryTier {
    /// Large, high-latency storage holding full tensors.
    Bulk,
    /// Small, low-latency workspace next to the compute unit.
    Scratch,
}

#[inline(always)]
pub fn is_full_precision<T: KernelFloat>() -> bool {
    T::TYPE_ID == FloatType::F32
}

#[inline(always)]
pub fn is_compact<T: KernelFloat>() -> bool {
    T::TYPE_ID == FloatType::F16
}

#[inline(always)]
pub fn min<T: PartialOrd>(a: T, b: T) -> T {
    if a < b { a } else { b }
}

#[inline(always)]
pub fn max<T: PartialOrd>(a: T, b: T) -> T {
    if a > b { a } else { b }
}

/// Widen `src.len()` compact elements into the front of `dst`.
///
/// Panics if `dst` is shorter than `src`; kernels validate before calling.
#[inline]
pub fn widen(dst: &mut [f32], src: &[f16]) {
    src.convert_to_f32_slice(&mut dst[..src.len()]);
}

/// Narrow `src.len()` f32 elements into the front of `dst`, rounding to nearest even.
#[inline]
pub fn narrow(dst: &mut [f16], src: &[f32]) {
    dst[..src.len()].convert_from_f32_slice(src);
}
