//! Precision-adaptive elementwise math over scratch buffers.
//!
//! Each kernel exists as `op(dst, src, ..)` and `op_inplace(buf, ..)`; the
//! in-place form is the homologous-operand variant. Compact (`f16`) inputs
//! need an auxiliary f32 scratch buffer of at least `n` elements on every
//! widened path; full-precision inputs ignore it.
//!
//! | kernel  | f32                      | f16                                           |
//! |---------|--------------------------|-----------------------------------------------|
//! | div     | native, or recip + mul   | native, or widened recip / approx recip + mul |
//! | recip   | native recip             | widen → recip → narrow                        |
//! | exp     | `pow2(x * log2e)`        | widen → exp → narrow                          |
//! | log     | `log2(x) * ln2`          | widen → log2 → narrow → `* ln2` in f16         |
//! | sigmoid | `recip(1 + exp(-x))`     | widen once, narrow once                       |

use half::f16;

use crate::capability::CapabilityTier;
use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::lane::{apply_binary, apply_unary, BinaryOp, UnaryOp};
use crate::types::{narrow, widen, FloatType, KernelFloat, Precision};

/// Bit pattern of the `log2(e)` multiplier applied before `pow2`.
pub const LOG2E_BITS: u32 = 0x3fb8_aa3b;
/// Bit pattern of the `ln(2)` multiplier applied after `log2`.
pub const LN2_BITS: u32 = 0x3f31_7217;

#[inline(always)]
fn log2e() -> f32 {
    f32::from_bits(LOG2E_BITS)
}

#[inline(always)]
fn ln2() -> f32 {
    f32::from_bits(LN2_BITS)
}

/// Elementwise transcendental kernels bound to one capability tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MathKernels {
    tier: CapabilityTier,
    precision: Precision,
}

impl MathKernels {
    pub fn new(tier: CapabilityTier) -> Self {
        Self { tier, precision: Precision::default() }
    }

    /// Kernels for the configured tier, defaulting to the configured precision.
    pub fn from_config(config: &KernelConfig) -> Self {
        Self::new(config.resolved_tier()).with_precision(config.precision)
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn tier(&self) -> CapabilityTier {
        self.tier
    }

    /// Precision used by entry points that do not take one per call.
    pub fn precision(&self) -> Precision {
        self.precision
    }

    // ----------------------------------------------------------------------
    // Division
    // ----------------------------------------------------------------------

    /// `dst = src0 / src1`
    ///
    /// On tiers without native divide, the fast compact path goes through the
    /// approximate reciprocal, which requires `src1 > 0`.
    pub fn div<T: KernelFloat>(
        &self,
        dst: &mut [T],
        src0: &[T],
        src1: &[T],
        aux: Option<&mut [f32]>,
        precision: Precision,
    ) -> KernelResult<()> {
        ensure_supported::<T>()?;
        let n = src0.len();
        check_operands(n, src1.len())?;
        check_dst(dst.len(), n)?;
        let aux = self.div_aux::<T>(aux, n, precision)?;
        let dst = &mut dst[..n];
        dst.copy_from_slice(src0);
        self.div_assign(dst, src1, aux, precision)
    }

    /// `buf = buf / rhs`
    pub fn div_inplace<T: KernelFloat>(
        &self,
        buf: &mut [T],
        rhs: &[T],
        aux: Option<&mut [f32]>,
        precision: Precision,
    ) -> KernelResult<()> {
        ensure_supported::<T>()?;
        check_operands(buf.len(), rhs.len())?;
        let aux = self.div_aux::<T>(aux, buf.len(), precision)?;
        self.div_assign(buf, rhs, aux, precision)
    }

    /// Compact division takes the approximate reciprocal instead of dividing.
    fn uses_approx_recip(&self, precision: Precision) -> bool {
        let caps = self.tier.capabilities();
        !caps.native_divide && caps.approx_reciprocal && !precision.is_high()
    }

    /// Auxiliary buffer for the widened compact reciprocal, `None` on every other path.
    fn div_aux<'a, T: KernelFloat>(
        &self,
        aux: Option<&'a mut [f32]>,
        n: usize,
        precision: Precision,
    ) -> KernelResult<Option<&'a mut [f32]>> {
        let widened = T::TYPE_ID == FloatType::F16
            && !self.tier.capabilities().native_divide
            && !self.uses_approx_recip(precision);
        if widened {
            Ok(Some(require_aux(aux, n)?))
        } else {
            Ok(None)
        }
    }

    fn div_assign<T: KernelFloat>(
        &self,
        buf: &mut [T],
        rhs: &[T],
        aux: Option<&mut [f32]>,
        precision: Precision,
    ) -> KernelResult<()> {
        match T::TYPE_ID {
            FloatType::F32 => {
                let op = if self.tier.capabilities().native_divide {
                    BinaryOp::Div
                } else {
                    BinaryOp::MulRecip
                };
                apply_binary(self.tier, op, cast_mut(buf)?, cast(rhs)?);
            }
            FloatType::F16 => self.div_assign_f16(cast_mut(buf)?, cast(rhs)?, aux, precision),
            other => return Err(KernelError::UnsupportedElement(other)),
        }
        Ok(())
    }

    fn div_assign_f16(
        &self,
        buf: &mut [f16],
        rhs: &[f16],
        aux: Option<&mut [f32]>,
        precision: Precision,
    ) {
        if self.tier.capabilities().native_divide {
            for (a, b) in buf.iter_mut().zip(rhs) {
                *a = f16::from_f32(a.to_f32() / b.to_f32());
            }
            return;
        }
        // div_aux hands out the auxiliary buffer only for the widened path.
        match aux {
            Some(aux) if !self.uses_approx_recip(precision) => {
                let aux = &mut aux[..rhs.len()];
                widen(aux, rhs);
                apply_unary(self.tier, UnaryOp::Recip, aux);
                for (a, r) in buf.iter_mut().zip(aux.iter()) {
                    *a = mul_f16(*a, f16::from_f32(*r));
                }
            }
            _ => {
                for (a, b) in buf.iter_mut().zip(rhs) {
                    *a = mul_f16(*a, approx_recip_f16(*b));
                }
            }
        }
    }

    // ----------------------------------------------------------------------
    // Reciprocal
    // ----------------------------------------------------------------------

    /// `dst = 1 / src`
    ///
    /// The precision flag is accepted for symmetry; compact inputs always take
    /// the widened path.
    pub fn recip<T: KernelFloat>(
        &self,
        dst: &mut [T],
        src: &[T],
        aux: Option<&mut [f32]>,
        precision: Precision,
    ) -> KernelResult<()> {
        ensure_supported::<T>()?;
        check_dst(dst.len(), src.len())?;
        let buf = &mut dst[..src.len()];
        buf.copy_from_slice(src);
        self.recip_inplace(buf, aux, precision)
    }

    pub fn recip_inplace<T: KernelFloat>(
        &self,
        buf: &mut [T],
        aux: Option<&mut [f32]>,
        _precision: Precision,
    ) -> KernelResult<()> {
        match T::TYPE_ID {
            FloatType::F32 => apply_unary(self.tier, UnaryOp::Recip, cast_mut(buf)?),
            FloatType::F16 => {
                let aux = require_aux(aux, buf.len())?;
                self.widened_f16(cast_mut(buf)?, aux, |tier, wide| {
                    apply_unary(tier, UnaryOp::Recip, wide)
                });
            }
            other => return Err(KernelError::UnsupportedElement(other)),
        }
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Exponential
    // ----------------------------------------------------------------------

    /// `dst = e^src`, computed as `2^(src * log2(e))`.
    pub fn exp<T: KernelFloat>(
        &self,
        dst: &mut [T],
        src: &[T],
        aux: Option<&mut [f32]>,
        precision: Precision,
    ) -> KernelResult<()> {
        ensure_supported::<T>()?;
        check_dst(dst.len(), src.len())?;
        let buf = &mut dst[..src.len()];
        buf.copy_from_slice(src);
        self.exp_inplace(buf, aux, precision)
    }

    pub fn exp_inplace<T: KernelFloat>(
        &self,
        buf: &mut [T],
        aux: Option<&mut [f32]>,
        _precision: Precision,
    ) -> KernelResult<()> {
        match T::TYPE_ID {
            FloatType::F32 => exp_f32(self.tier, cast_mut(buf)?),
            FloatType::F16 => {
                let aux = require_aux(aux, buf.len())?;
                self.widened_f16(cast_mut(buf)?, aux, exp_f32);
            }
            other => return Err(KernelError::UnsupportedElement(other)),
        }
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Logarithm
    // ----------------------------------------------------------------------

    /// `dst = ln(src)`, computed as `log2(src) * ln(2)`.
    ///
    /// Compact inputs are narrowed after `log2` and multiplied by `ln(2)` in
    /// compact precision.
    pub fn log<T: KernelFloat>(
        &self,
        dst: &mut [T],
        src: &[T],
        aux: Option<&mut [f32]>,
        precision: Precision,
    ) -> KernelResult<()> {
        ensure_supported::<T>()?;
        check_dst(dst.len(), src.len())?;
        let buf = &mut dst[..src.len()];
        buf.copy_from_slice(src);
        self.log_inplace(buf, aux, precision)
    }

    pub fn log_inplace<T: KernelFloat>(
        &self,
        buf: &mut [T],
        aux: Option<&mut [f32]>,
        _precision: Precision,
    ) -> KernelResult<()> {
        match T::TYPE_ID {
            FloatType::F32 => {
                let buf = cast_mut::<T, f32>(buf)?;
                apply_unary(self.tier, UnaryOp::Log2, buf);
                apply_unary(self.tier, UnaryOp::MulScalar(ln2()), buf);
            }
            FloatType::F16 => {
                let aux = require_aux(aux, buf.len())?;
                let buf = cast_mut::<T, f16>(buf)?;
                self.widened_f16(buf, aux, |tier, wide| apply_unary(tier, UnaryOp::Log2, wide));
                mul_scalar_f16(buf, f16::from_f32(ln2()));
            }
            other => return Err(KernelError::UnsupportedElement(other)),
        }
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Sigmoid
    // ----------------------------------------------------------------------

    /// `dst = 1 / (1 + e^-src)`
    pub fn sigmoid<T: KernelFloat>(
        &self,
        dst: &mut [T],
        src: &[T],
        aux: Option<&mut [f32]>,
        precision: Precision,
    ) -> KernelResult<()> {
        ensure_supported::<T>()?;
        check_dst(dst.len(), src.len())?;
        let buf = &mut dst[..src.len()];
        buf.copy_from_slice(src);
        self.sigmoid_inplace(buf, aux, precision)
    }

    pub fn sigmoid_inplace<T: KernelFloat>(
        &self,
        buf: &mut [T],
        aux: Option<&mut [f32]>,
        _precision: Precision,
    ) -> KernelResult<()> {
        match T::TYPE_ID {
            FloatType::F32 => sigmoid_f32(self.tier, cast_mut(buf)?),
            FloatType::F16 => {
                let aux = require_aux(aux, buf.len())?;
                self.widened_f16(cast_mut(buf)?, aux, sigmoid_f32);
            }
            other => return Err(KernelError::UnsupportedElement(other)),
        }
        Ok(())
    }

    /// Widen `buf` into `aux`, run `f` in full precision, narrow back.
    fn widened_f16(
        &self,
        buf: &mut [f16],
        aux: &mut [f32],
        f: impl FnOnce(CapabilityTier, &mut [f32]),
    ) {
        let wide = &mut aux[..buf.len()];
        widen(wide, buf);
        f(self.tier, wide);
        narrow(buf, wide);
    }
}

fn exp_f32(tier: CapabilityTier, buf: &mut [f32]) {
    apply_unary(tier, UnaryOp::MulScalar(log2e()), buf);
    apply_unary(tier, UnaryOp::Pow2, buf);
}

fn sigmoid_f32(tier: CapabilityTier, buf: &mut [f32]) {
    apply_unary(tier, UnaryOp::MulScalar(-1.0), buf);
    exp_f32(tier, buf);
    apply_unary(tier, UnaryOp::AddScalar(1.0), buf);
    apply_unary(tier, UnaryOp::Recip, buf);
}

/// Compact-precision multiply: the product is rounded once to f16.
#[inline]
fn mul_f16(a: f16, b: f16) -> f16 {
    f16::from_f32(a.to_f32() * b.to_f32())
}

fn mul_scalar_f16(buf: &mut [f16], s: f16) {
    let s = s.to_f32();
    for v in buf.iter_mut() {
        *v = f16::from_f32(v.to_f32() * s);
    }
}

/// Approximate reciprocal as issued by tiers without native divide.
///
/// Bit-trick seed refined by two Newton-Raphson steps, rounded to f16.
/// Only defined for positive inputs.
#[inline]
pub fn approx_recip_f16(x: f16) -> f16 {
    let x = x.to_f32();
    debug_assert!(x > 0.0, "approximate reciprocal requires a positive input, got {x}");
    let mut y = f32::from_bits(0x7ef3_11c3u32.wrapping_sub(x.to_bits()));
    y *= 2.0 - x * y;
    y *= 2.0 - x * y;
    f16::from_f32(y)
}

#[inline]
fn ensure_supported<T: KernelFloat>() -> KernelResult<()> {
    if T::TYPE_ID.is_kernel_supported() {
        Ok(())
    } else {
        Err(KernelError::UnsupportedElement(T::TYPE_ID))
    }
}

#[inline]
fn check_operands(lhs: usize, rhs: usize) -> KernelResult<()> {
    if lhs != rhs {
        return Err(KernelError::LengthMismatch(format!(
            "div operands have {lhs} and {rhs} elements"
        )));
    }
    Ok(())
}

#[inline]
fn check_dst(available: usize, needed: usize) -> KernelResult<()> {
    if available < needed {
        return Err(KernelError::BufferTooSmall { what: "destination", needed, available });
    }
    Ok(())
}

fn require_aux(aux: Option<&mut [f32]>, n: usize) -> KernelResult<&mut [f32]> {
    let aux = aux.ok_or(KernelError::MissingAuxiliary)?;
    if aux.len() < n {
        return Err(KernelError::BufferTooSmall {
            what: "auxiliary",
            needed: n,
            available: aux.len(),
        });
    }
    Ok(aux)
}

#[inline]
fn cast<A: KernelFloat, B: bytemuck::Pod>(s: &[A]) -> KernelResult<&[B]> {
    Ok(bytemuck::try_cast_slice(s)?)
}

#[inline]
fn cast_mut<A: KernelFloat, B: bytemuck::Pod>(s: &mut [A]) -> KernelResult<&mut [B]> {
    Ok(bytemuck::try_cast_slice_mut(s)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use half::bf16;

    fn h(v: &[f32]) -> Vec<f16> {
        v.iter().map(|&x| f16::from_f32(x)).collect()
    }

    #[test]
    fn constants_match_bit_patterns() {
        assert_eq!(log2e(), std::f32::consts::LOG2_E);
        // One ulp below the correctly rounded ln(2).
        assert_eq!(ln2().to_bits() + 1, std::f32::consts::LN_2.to_bits());
    }

    #[test]
    fn div_f32_all_tiers() {
        let a = [1.0f32, 6.0, -9.0, 0.5, 100.0];
        let b = [2.0f32, 3.0, 3.0, 0.25, 8.0];
        for tier in CapabilityTier::ALL {
            let k = MathKernels::new(tier);
            let mut out = [0.0f32; 5];
            k.div(&mut out, &a, &b, None, Precision::High).unwrap();
            for i in 0..5 {
                assert!((out[i] - a[i] / b[i]).abs() <= 1e-6 * (a[i] / b[i]).abs(), "{tier} {i}");
            }
        }
    }

    #[test]
    fn div_f16_paths_agree_with_reference() {
        let a = h(&[1.0, 6.0, -9.0, 0.5, 100.0, 3.0]);
        let b = h(&[2.0, 3.0, 3.0, 0.25, 8.0, 7.0]);
        for tier in CapabilityTier::ALL {
            for precision in [Precision::High, Precision::Fast] {
                let k = MathKernels::new(tier);
                let mut aux = vec![0.0f32; 6];
                let mut out = vec![f16::ZERO; 6];
                k.div(&mut out, &a, &b, Some(&mut aux[..]), precision).unwrap();
                for i in 0..6 {
                    let expected = a[i].to_f32() / b[i].to_f32();
                    let got = out[i].to_f32();
                    assert!(
                        (got - expected).abs() <= 2e-3 * expected.abs(),
                        "{tier} {precision:?} {i}: {got} vs {expected}"
                    );
                }
            }
        }
    }

    #[test]
    fn div_does_not_touch_denominator() {
        let k = MathKernels::new(CapabilityTier::Legacy);
        let a = h(&[1.0, 2.0]);
        let b = h(&[3.0, 5.0]);
        let b_before = b.clone();
        let mut aux = vec![0.0f32; 2];
        let mut out = vec![f16::ZERO; 2];
        k.div(&mut out, &a, &b, Some(&mut aux[..]), Precision::High).unwrap();
        assert_eq!(b, b_before);
    }

    #[test]
    fn div_high_precision_requires_aux_only_without_native_divide() {
        let a = h(&[1.0]);
        let b = h(&[2.0]);
        let mut out = vec![f16::ZERO; 1];
        let legacy = MathKernels::new(CapabilityTier::Legacy);
        assert_eq!(
            legacy.div(&mut out, &a, &b, None, Precision::High),
            Err(KernelError::MissingAuxiliary)
        );
        assert!(legacy.div(&mut out, &a, &b, None, Precision::Fast).is_ok());
        let standard = MathKernels::new(CapabilityTier::Standard);
        assert!(standard.div(&mut out, &a, &b, None, Precision::High).is_ok());
        assert_eq!(out[0].to_f32(), 0.5);
    }

    #[test]
    fn div_inplace_matches_out_of_place() {
        let k = MathKernels::new(CapabilityTier::Transitional);
        let a = [3.0f32, 9.0, 27.0];
        let b = [3.0f32, 3.0, 3.0];
        let mut out = [0.0f32; 3];
        k.div(&mut out, &a, &b, None, Precision::High).unwrap();
        let mut buf = a;
        k.div_inplace(&mut buf, &b, None, Precision::High).unwrap();
        assert_eq!(buf, out);
    }

    #[test]
    fn div_length_mismatch() {
        let k = MathKernels::new(CapabilityTier::Standard);
        let mut out = [0.0f32; 3];
        let err = k.div(&mut out, &[1.0, 2.0, 3.0], &[1.0, 2.0], None, Precision::High);
        assert!(matches!(err, Err(KernelError::LengthMismatch(_))));
    }

    #[test]
    fn div_inplace_f16_matches_out_of_place() {
        let a = h(&[1.0, 6.0, -9.0, 0.5, 100.0, 3.0]);
        let b = h(&[2.0, 3.0, 3.0, 0.25, 8.0, 7.0]);
        for tier in CapabilityTier::ALL {
            for precision in [Precision::High, Precision::Fast] {
                let k = MathKernels::new(tier);
                let mut aux = vec![0.0f32; 6];
                let mut out = vec![f16::ZERO; 6];
                k.div(&mut out, &a, &b, Some(&mut aux[..]), precision).unwrap();
                let mut buf = a.clone();
                k.div_inplace(&mut buf, &b, Some(&mut aux[..]), precision).unwrap();
                assert_eq!(buf, out, "{tier} {precision:?}");
            }
        }
    }

    #[test]
    fn div_inplace_length_mismatch_leaves_buffer() {
        let k = MathKernels::new(CapabilityTier::Legacy);
        let mut buf = [4.0f32, 8.0, 16.0];
        let err = k.div_inplace(&mut buf, &[2.0, 2.0], None, Precision::High);
        assert!(matches!(err, Err(KernelError::LengthMismatch(_))));
        assert_eq!(buf, [4.0, 8.0, 16.0]);
    }

    #[test]
    fn fast_compact_div_uses_approx_reciprocal_where_available() {
        let a = h(&[1.0, 5.0, -3.0]);
        let b = h(&[3.0, 7.0, 11.0]);
        for tier in CapabilityTier::ALL {
            let caps = tier.capabilities();
            let k = MathKernels::new(tier);
            let mut buf = a.clone();
            // Every tier either divides natively or has the approximate reciprocal.
            k.div_inplace(&mut buf, &b, None, Precision::Fast).unwrap();
            if !caps.native_divide {
                for i in 0..3 {
                    let expected = f16::from_f32(a[i].to_f32() * approx_recip_f16(b[i]).to_f32());
                    assert_eq!(buf[i], expected, "{tier} {i}");
                }
            }
        }
    }

    #[test]
    fn precision_comes_from_config() {
        let config = KernelConfig {
            precision: Precision::Fast,
            ..KernelConfig::with_tier(CapabilityTier::Legacy)
        };
        let k = MathKernels::from_config(&config);
        assert_eq!(k.tier(), CapabilityTier::Legacy);
        assert_eq!(k.precision(), Precision::Fast);
        assert_eq!(MathKernels::new(CapabilityTier::Legacy).precision(), Precision::High);
        assert_eq!(
            MathKernels::new(CapabilityTier::Legacy)
                .with_precision(Precision::Fast)
                .precision(),
            Precision::Fast
        );
    }

    #[test]
    fn recip_roundtrip_f16() {
        let k = MathKernels::new(CapabilityTier::Legacy);
        let src = h(&[0.004, 0.5, 1.0, 3.0, 1000.0, 60000.0]);
        let mut aux = vec![0.0f32; src.len()];
        let mut once = vec![f16::ZERO; src.len()];
        k.recip(&mut once, &src, Some(&mut aux[..]), Precision::Fast).unwrap();
        k.recip_inplace(&mut once, Some(&mut aux[..]), Precision::Fast).unwrap();
        for (a, b) in src.iter().zip(&once) {
            let rel = (a.to_f32() - b.to_f32()).abs() / a.to_f32();
            assert!(rel < 5e-3, "{a} -> {b}");
        }
    }

    #[test]
    fn recip_f16_needs_aux() {
        let k = MathKernels::new(CapabilityTier::Advanced);
        let mut buf = h(&[2.0, 4.0]);
        assert_eq!(
            k.recip_inplace(&mut buf, None, Precision::High),
            Err(KernelError::MissingAuxiliary)
        );
        let mut short = vec![0.0f32; 1];
        assert!(matches!(
            k.recip_inplace(&mut buf, Some(&mut short[..]), Precision::High),
            Err(KernelError::BufferTooSmall { what: "auxiliary", needed: 2, available: 1 })
        ));
    }

    #[test]
    fn exp_and_log_f32() {
        let k = MathKernels::new(CapabilityTier::Standard);
        let src = [-3.0f32, -0.5, 0.0, 1.0, 2.5, 10.0];
        let mut e = [0.0f32; 6];
        k.exp(&mut e, &src, None, Precision::High).unwrap();
        for (x, y) in src.iter().zip(&e) {
            assert!((y - x.exp()).abs() <= 1e-5 * x.exp(), "exp({x}) = {y}");
        }
        let mut back = [0.0f32; 6];
        k.log(&mut back, &e, None, Precision::High).unwrap();
        for (x, y) in src.iter().zip(&back) {
            assert!((x - y).abs() < 1e-4, "log(exp({x})) = {y}");
        }
    }

    #[test]
    fn log_f16_multiplies_after_narrowing() {
        let k = MathKernels::new(CapabilityTier::Legacy);
        let src = h(&[0.1, 2.0, 10.0, 1234.0]);
        let mut aux = vec![0.0f32; 4];
        let mut out = vec![f16::ZERO; 4];
        k.log(&mut out, &src, Some(&mut aux[..]), Precision::High).unwrap();
        let ln2_h = f16::from_f32(ln2());
        for (x, y) in src.iter().zip(&out) {
            let log2_h = f16::from_f32(x.to_f32().log2());
            let expected = f16::from_f32(log2_h.to_f32() * ln2_h.to_f32());
            assert_eq!(*y, expected);
        }
    }

    #[test]
    fn sigmoid_zero_is_half() {
        for tier in CapabilityTier::ALL {
            let k = MathKernels::new(tier);
            let mut out = [1.0f32];
            k.sigmoid(&mut out, &[0.0], None, Precision::High).unwrap();
            assert_eq!(out[0], 0.5);
            let mut aux = [0.0f32; 1];
            let mut out_h = [f16::ZERO];
            k.sigmoid(&mut out_h, &[f16::ZERO], Some(&mut aux[..]), Precision::High).unwrap();
            assert_eq!(out_h[0].to_f32(), 0.5);
        }
    }

    #[test]
    fn sigmoid_inplace_f16_matches_f32() {
        let k = MathKernels::new(CapabilityTier::Advanced);
        let xs: Vec<f32> = (-20..=20).map(|i| i as f32 * 0.5).collect();
        let mut full = vec![0.0f32; xs.len()];
        k.sigmoid(&mut full, &xs, None, Precision::High).unwrap();
        let mut compact = h(&xs);
        let mut aux = vec![0.0f32; xs.len()];
        k.sigmoid_inplace(&mut compact, Some(&mut aux[..]), Precision::High).unwrap();
        for (a, b) in full.iter().zip(&compact) {
            assert_eq!(f16::from_f32(*a), *b);
        }
    }

    #[test]
    fn bf16_is_rejected_without_writing() {
        let k = MathKernels::new(CapabilityTier::Standard);
        let src = [bf16::ONE; 3];
        let mut dst = [bf16::ZERO; 3];
        let mut aux = [0.0f32; 3];
        assert_eq!(
            k.exp(&mut dst, &src, Some(&mut aux[..]), Precision::High),
            Err(KernelError::UnsupportedElement(FloatType::BF16))
        );
        assert_eq!(dst, [bf16::ZERO; 3]);
        assert!(k.div(&mut dst, &src, &src, None, Precision::Fast).is_err());
        assert!(k.log_inplace(&mut dst, None, Precision::High).is_err());
        assert!(k.sigmoid_inplace(&mut dst, None, Precision::High).is_err());
        assert!(k.recip_inplace(&mut dst, None, Precision::High).is_err());
        assert_eq!(dst, [bf16::ZERO; 3]);
    }

    #[test]
    fn approx_recip_within_one_ulp_band() {
        for &x in &[0.00391f32, 0.1, 1.0, 1.5, 7.0, 333.0, 65504.0] {
            let got = approx_recip_f16(f16::from_f32(x)).to_f32();
            let expected = 1.0 / f16::from_f32(x).to_f32();
            assert!((got - expected).abs() <= 2e-3 * expected, "{x}: {got} vs {expected}");
        }
    }
}
