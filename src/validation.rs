//! Zero-cost validation utilities for primitive parameters.
//!
//! # Design
//!
//! - All functions return `Result<T, String>` for flexible error conversion
//! - Each caller maps String errors to its own [`KernelError`](crate::KernelError) variant
//! - Overflow checks use `checked_mul` for safety
//! - const MAX values defined once, used everywhere

use crate::types::{FloatType, KernelFloat};

/// Transfers whose bulk-side stride fits in this many bytes are batched into
/// one contiguous transfer plus a local restripe.
pub const STAGING_THRESHOLD_BYTES: usize = 512;

/// Valid reciprocal input range for f32 on approximate-reciprocal tiers.
pub const RECIP_DOMAIN_F32: (f32, f32) = (0.00391, 2.0e6);

/// Valid reciprocal input range for f16 on approximate-reciprocal tiers.
pub const RECIP_DOMAIN_F16: (f32, f32) = (0.00391, 65504.0);

/// Elements seeded before the first fuse doubling step.
pub const FUSE_ALIGN: usize = 128;

/// Validate one level of a strided layout.
#[inline]
pub fn validate_strided_dims(size: usize, stride: usize, segments: usize) -> Result<(), String> {
    if size == 0 || segments == 0 {
        return Err("size and segments must be > 0".into());
    }
    if stride < size {
        return Err(format!("stride {} is smaller than run size {}", stride, size));
    }
    Ok(())
}

/// Number of elements spanned by `segments` runs of `size` spaced by `stride`.
#[inline]
pub fn strided_footprint(size: usize, stride: usize, segments: usize) -> Result<usize, String> {
    stride
        .checked_mul(segments.saturating_sub(1))
        .and_then(|v| v.checked_add(size))
        .ok_or_else(|| format!("footprint overflow: {} x {} + {}", stride, segments, size))
}

/// Validate that a buffer covers `needed` elements.
#[inline]
pub fn validate_capacity(what: &str, needed: usize, available: usize) -> Result<(), String> {
    if available < needed {
        return Err(format!(
            "{} needs {} elements but only {} are available",
            what, needed, available
        ));
    }
    Ok(())
}

/// Validate a sum-pool window capacity.
#[inline]
pub fn validate_kernel_limit(kernel_limit: usize) -> Result<(), String> {
    if kernel_limit < 2 {
        return Err(format!("kernel_limit must be >= 2, got {}", kernel_limit));
    }
    Ok(())
}

/// Reciprocal domain for an element type on approximate tiers.
#[inline]
pub fn recip_domain(ty: FloatType) -> Option<(f32, f32)> {
    match ty {
        FloatType::F32 => Some(RECIP_DOMAIN_F32),
        FloatType::F16 => Some(RECIP_DOMAIN_F16),
        FloatType::BF16 => None,
    }
}

/// Check every element lies in the approximate-reciprocal domain.
///
/// The kernels never call this; it is offered to callers who want to guard
/// inputs before running on an approximate tier.
pub fn validate_recip_domain<T: KernelFloat>(src: &[T]) -> Result<(), String> {
    let (lo, hi) = recip_domain(T::TYPE_ID)
        .ok_or_else(|| format!("no reciprocal domain for {:?}", T::TYPE_ID))?;
    if let Some((idx, v)) = src
        .iter()
        .map(|v| v.to_f32())
        .enumerate()
        .find(|(_, v)| !(*v >= lo && *v <= hi))
    {
        return Err(format!(
            "element {} = {} outside reciprocal domain [{}, {}]",
            idx, v, lo, hi
        ));
    }
    Ok(())
}
