//! Recursive tree reduction over a scratch buffer.
//!
//! A buffer of `high_dim` rows of `low_dim` elements is folded in place into
//! row 0. Each pass pools at most `kernel_limit` rows per window, so the pass
//! count is `O(log_{kernel_limit}(high_dim))`.

use crate::capability::CapabilityTier;
use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::types::KernelFloat;
use crate::validation::{validate_capacity, validate_kernel_limit};

/// Sum `windows` consecutive windows of `window` rows, starting at
/// `src_row`, into consecutive rows starting at `dst_row`.
///
/// `dst_row` must not be ahead of `src_row`; window `k` lands on row
/// `dst_row + k` only after it has been fully read.
pub fn sum_pool<T: KernelFloat>(
    buf: &mut [T],
    low_dim: usize,
    dst_row: usize,
    src_row: usize,
    window: usize,
    windows: usize,
) {
    debug_assert!(dst_row <= src_row);
    for k in 0..windows {
        let first = src_row + k * window;
        let out = (dst_row + k) * low_dim;
        for c in 0..low_dim {
            let acc = (first..first + window)
                .fold(0.0f32, |acc, r| acc + buf[r * low_dim + c].to_f32());
            buf[out + c] = T::from_f32(acc);
        }
    }
}

/// Reduce `high_dim` rows of `low_dim` elements into row 0 of `buf`.
///
/// Returns the number of pooling passes. Rows past 0 are left with
/// intermediate sums.
pub fn recursive_sum_pool<T: KernelFloat>(
    buf: &mut [T],
    low_dim: usize,
    high_dim: usize,
    kernel_limit: usize,
) -> KernelResult<usize> {
    if !T::TYPE_ID.is_kernel_supported() {
        return Err(KernelError::UnsupportedElement(T::TYPE_ID));
    }
    validate_kernel_limit(kernel_limit).map_err(KernelError::InvalidConfig)?;
    let needed = low_dim
        .checked_mul(high_dim)
        .ok_or_else(|| KernelError::InvalidView(format!("{low_dim} x {high_dim} overflows")))?;
    validate_capacity("reduction", needed, buf.len()).map_err(|_| KernelError::BufferTooSmall {
        what: "reduction",
        needed,
        available: buf.len(),
    })?;

    let mut high = high_dim;
    let mut passes = 0;
    while high > 1 {
        let repeat = high / kernel_limit;
        let remain = high % kernel_limit;
        if remain > 0 {
            sum_pool(buf, low_dim, 0, 0, remain, 1);
        }
        if repeat > 0 {
            let dst_row = usize::from(remain > 0);
            sum_pool(buf, low_dim, dst_row, remain, kernel_limit, repeat);
        }
        high = repeat + usize::from(remain > 0);
        passes += 1;
    }
    log::debug!(
        "recursive_sum_pool: {} rows x {} folded in {} passes (limit {})",
        high_dim, low_dim, passes, kernel_limit
    );
    Ok(passes)
}

/// [`recursive_sum_pool`] with the tier's pooling capacity.
pub fn recursive_sum_pool_default<T: KernelFloat>(
    tier: CapabilityTier,
    buf: &mut [T],
    low_dim: usize,
    high_dim: usize,
) -> KernelResult<usize> {
    recursive_sum_pool(buf, low_dim, high_dim, tier.capabilities().pool_kernel_limit)
}

/// [`recursive_sum_pool`] with the configured pooling capacity: the config's
/// override if set, otherwise the capacity of its resolved tier.
pub fn recursive_sum_pool_with<T: KernelFloat>(
    config: &KernelConfig,
    buf: &mut [T],
    low_dim: usize,
    high_dim: usize,
) -> KernelResult<usize> {
    recursive_sum_pool(buf, low_dim, high_dim, config.resolved_pool_kernel_limit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::{bf16, f16};

    fn naive(buf: &[f32], low: usize, high: usize) -> Vec<f32> {
        (0..low).map(|c| (0..high).map(|r| buf[r * low + c]).sum()).collect()
    }

    #[test]
    fn thousand_rows_match_naive_sum() {
        let (low, high) = (4, 1000);
        let data: Vec<f32> = (0..low * high).map(|i| (i % 7) as f32 - 3.0).collect();
        let expected = naive(&data, low, high);
        let mut buf = data.clone();
        let passes = recursive_sum_pool(&mut buf, low, high, 64).unwrap();
        // 1000 -> 16 -> 1
        assert_eq!(passes, 2);
        assert_eq!(&buf[..low], expected.as_slice());
    }

    #[test]
    fn exact_multiple_of_limit() {
        let (low, high) = (3, 64);
        let data: Vec<f32> = (0..low * high).map(|i| i as f32).collect();
        let expected = naive(&data, low, high);
        let mut buf = data;
        assert_eq!(recursive_sum_pool(&mut buf, low, high, 8).unwrap(), 2);
        assert_eq!(&buf[..low], expected.as_slice());
    }

    #[test]
    fn single_row_is_untouched() {
        let mut buf = vec![1.0f32, 2.0, 3.0];
        assert_eq!(recursive_sum_pool(&mut buf, 3, 1, 2).unwrap(), 0);
        assert_eq!(buf, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn minimal_window_still_terminates() {
        let mut buf: Vec<f32> = (0..37).map(|i| i as f32).collect();
        recursive_sum_pool(&mut buf, 1, 37, 2).unwrap();
        assert_eq!(buf[0], (0..37).sum::<i32>() as f32);
    }

    #[test]
    fn tier_default_limit() {
        for tier in CapabilityTier::ALL {
            let mut buf = vec![1.0f32; 2 * 300];
            recursive_sum_pool_default(tier, &mut buf, 2, 300).unwrap();
            assert_eq!(&buf[..2], &[300.0, 300.0], "{tier}");
        }
    }

    #[test]
    fn config_limit_override() {
        let config = KernelConfig {
            pool_kernel_limit: Some(4),
            ..KernelConfig::with_tier(CapabilityTier::Advanced)
        };
        let mut buf = vec![1.0f32; 64];
        // 64 -> 16 -> 4 -> 1 with windows of 4; the tier's 128 would take one pass.
        assert_eq!(recursive_sum_pool_with(&config, &mut buf, 1, 64).unwrap(), 3);
        assert_eq!(buf[0], 64.0);

        let mut buf = vec![1.0f32; 64];
        let tier_only = KernelConfig::with_tier(CapabilityTier::Advanced);
        assert_eq!(recursive_sum_pool_with(&tier_only, &mut buf, 1, 64).unwrap(), 1);

        let degenerate = KernelConfig {
            pool_kernel_limit: Some(1),
            ..tier_only
        };
        assert!(matches!(
            recursive_sum_pool_with(&degenerate, &mut buf, 1, 64),
            Err(KernelError::InvalidConfig(_))
        ));
    }

    #[test]
    fn compact_elements() {
        let mut buf = vec![f16::from_f32(0.5); 4 * 100];
        recursive_sum_pool(&mut buf, 4, 100, 16).unwrap();
        assert!(buf[..4].iter().all(|v| v.to_f32() == 50.0));
    }

    #[test]
    fn rejects_bad_parameters() {
        let mut buf = vec![0.0f32; 8];
        for limit in [0, 1] {
            assert!(matches!(
                recursive_sum_pool(&mut buf, 2, 4, limit),
                Err(KernelError::InvalidConfig(_))
            ));
        }
        assert_eq!(
            recursive_sum_pool(&mut buf, 3, 4, 4),
            Err(KernelError::BufferTooSmall { what: "reduction", needed: 12, available: 8 })
        );
        let mut wide = vec![bf16::ONE; 8];
        assert_eq!(
            recursive_sum_pool(&mut wide, 2, 4, 4),
            Err(KernelError::UnsupportedElement(crate::types::FloatType::BF16))
        );
    }
}
