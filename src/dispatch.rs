//! Type-erased entry point for callers holding raw scratch bytes.
//!
//! The element representation arrives as a runtime [`FloatType`] tag instead
//! of a type parameter; anything outside the two precision tiers is reported
//! rather than silently skipped.

use half::{bf16, f16};

use crate::error::{KernelError, KernelResult};
use crate::math::MathKernels;
use crate::types::{FloatType, KernelFloat, Precision};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementwiseOp {
    Recip,
    Exp,
    Log,
    Sigmoid,
}

impl ElementwiseOp {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Recip => "recip",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Sigmoid => "sigmoid",
        }
    }
}

/// Apply `op` in place over a byte buffer holding elements of `dtype`, at the
/// precision the kernels were configured with.
pub fn elementwise_raw(
    kernels: &MathKernels,
    op: ElementwiseOp,
    dtype: FloatType,
    bytes: &mut [u8],
    aux: Option<&mut [f32]>,
) -> KernelResult<()> {
    let precision = kernels.precision();
    match dtype {
        FloatType::F32 => apply_typed::<f32>(kernels, op, bytes, aux, precision),
        FloatType::F16 => apply_typed::<f16>(kernels, op, bytes, aux, precision),
        FloatType::BF16 => {
            log::debug!("{} rejected for {:?} buffer of {} bytes", op.name(), dtype, bytes.len());
            // Still run the typed path so the rejection is the kernel's own.
            apply_typed::<bf16>(kernels, op, bytes, aux, precision)
        }
    }
}

fn apply_typed<T: KernelFloat>(
    kernels: &MathKernels,
    op: ElementwiseOp,
    bytes: &mut [u8],
    aux: Option<&mut [f32]>,
    precision: Precision,
) -> KernelResult<()> {
    if !T::TYPE_ID.is_kernel_supported() {
        return Err(KernelError::UnsupportedElement(T::TYPE_ID));
    }
    if bytes.len() % T::TYPE_ID.byte_width() != 0 {
        return Err(KernelError::RawCast(format!(
            "{} bytes is not a whole number of {:?} elements",
            bytes.len(),
            T::TYPE_ID
        )));
    }
    let buf: &mut [T] = bytemuck::try_cast_slice_mut(bytes)?;
    match op {
        ElementwiseOp::Recip => kernels.recip_inplace(buf, aux, precision),
        ElementwiseOp::Exp => kernels.exp_inplace(buf, aux, precision),
        ElementwiseOp::Log => kernels.log_inplace(buf, aux, precision),
        ElementwiseOp::Sigmoid => kernels.sigmoid_inplace(buf, aux, precision),
    }
}
