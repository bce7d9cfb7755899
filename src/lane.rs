//! Lane-vector abstraction.
//!
//! Maps the vector operations the primitives need (broadcast, iota, add, mul,
//! pow2, log2, reciprocal, load/store) onto a portable fixed-width register.
//! The lane count comes from the capability tier; [`dispatch_lanes!`] turns
//! that runtime width into a monomorphized `Lanes<N>` instantiation.

use crate::capability::CapabilityTier;

/// One vector register worth of f32 lanes.
pub trait LaneVector: Copy {
    const LANES: usize;

    fn splat(v: f32) -> Self;
    /// `[base, base + 1, ..., base + LANES - 1]`
    fn iota(base: f32) -> Self;
    /// Loads the first `LANES` elements of `src`.
    fn load(src: &[f32]) -> Self;
    /// Stores into the first `LANES` elements of `dst`.
    fn store(self, dst: &mut [f32]);

    fn add(self, other: Self) -> Self;
    fn mul(self, other: Self) -> Self;
    fn div(self, other: Self) -> Self;
    fn pow2(self) -> Self;
    fn log2(self) -> Self;
    fn recip(self) -> Self;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lanes<const N: usize>(pub [f32; N]);

impl<const N: usize> Lanes<N> {
    #[inline(always)]
    fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Lanes(self.0.map(f))
    }

    #[inline(always)]
    fn zip(self, other: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        Lanes(std::array::from_fn(|i| f(self.0[i], other.0[i])))
    }
}

impl<const N: usize> LaneVector for Lanes<N> {
    const LANES: usize = N;

    #[inline(always)]
    fn splat(v: f32) -> Self {
        Lanes([v; N])
    }
    #[inline(always)]
    fn iota(base: f32) -> Self {
        Lanes(std::array::from_fn(|i| base + i as f32))
    }
    #[inline(always)]
    fn load(src: &[f32]) -> Self {
        Lanes(std::array::from_fn(|i| src[i]))
    }
    #[inline(always)]
    fn store(self, dst: &mut [f32]) {
        dst[..N].copy_from_slice(&self.0)
    }

    #[inline(always)]
    fn add(self, other: Self) -> Self {
        self.zip(other, |a, b| a + b)
    }
    #[inline(always)]
    fn mul(self, other: Self) -> Self {
        self.zip(other, |a, b| a * b)
    }
    #[inline(always)]
    fn div(self, other: Self) -> Self {
        self.zip(other, |a, b| a / b)
    }
    #[inline(always)]
    fn pow2(self) -> Self {
        self.map(f32::exp2)
    }
    #[inline(always)]
    fn log2(self) -> Self {
        self.map(f32::log2)
    }
    #[inline(always)]
    fn recip(self) -> Self {
        self.map(|v| 1.0 / v)
    }
}

/// Instantiate `$func::<N>($args)` for the lane count of `$tier`.
#[macro_export]
macro_rules! dispatch_lanes {
    ($tier:expr, $func:ident ( $($arg:expr),* $(,)? )) => {
        match $tier.f32_lanes() {
            4 => $func::<4>($($arg),*),
            8 => $func::<8>($($arg),*),
            16 => $func::<16>($($arg),*),
            _ => $func::<1>($($arg),*),
        }
    };
}

/// Full-precision vector operation applied lane-wise over a scratch buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum UnaryOp {
    Pow2,
    Log2,
    Recip,
    MulScalar(f32),
    AddScalar(f32),
}

impl UnaryOp {
    #[inline(always)]
    fn apply<V: LaneVector>(self, v: V) -> V {
        match self {
            UnaryOp::Pow2 => v.pow2(),
            UnaryOp::Log2 => v.log2(),
            UnaryOp::Recip => v.recip(),
            UnaryOp::MulScalar(s) => v.mul(V::splat(s)),
            UnaryOp::AddScalar(s) => v.add(V::splat(s)),
        }
    }
}

/// `dst[i] = dst[i] op rhs[i]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Mul,
    Div,
    /// `a * (1 / b)`, division on tiers without a native divide.
    MulRecip,
}

impl BinaryOp {
    #[inline(always)]
    fn apply<V: LaneVector>(self, a: V, b: V) -> V {
        match self {
            BinaryOp::Mul => a.mul(b),
            BinaryOp::Div => a.div(b),
            BinaryOp::MulRecip => a.mul(b.recip()),
        }
    }
}

fn unary_lanes<const N: usize>(op: UnaryOp, buf: &mut [f32]) {
    let mut chunks = buf.chunks_exact_mut(N);
    for chunk in &mut chunks {
        op.apply(Lanes::<N>::load(chunk)).store(chunk);
    }
    for v in chunks.into_remainder() {
        let mut tail = [*v];
        op.apply(Lanes::<1>::load(&tail)).store(&mut tail);
        *v = tail[0];
    }
}

fn binary_lanes<const N: usize>(op: BinaryOp, dst: &mut [f32], rhs: &[f32]) {
    let rhs = &rhs[..dst.len()];
    let mut chunks = dst.chunks_exact_mut(N);
    let mut rhs_chunks = rhs.chunks_exact(N);
    for (d, r) in (&mut chunks).zip(&mut rhs_chunks) {
        op.apply(Lanes::<N>::load(d), Lanes::<N>::load(r)).store(d);
    }
    for (d, r) in chunks.into_remainder().iter_mut().zip(rhs_chunks.remainder()) {
        *d = op.apply(Lanes::<1>([*d]), Lanes::<1>([*r])).0[0];
    }
}

/// Apply `op` in place over `buf` using the tier's vector width.
pub(crate) fn apply_unary(tier: CapabilityTier, op: UnaryOp, buf: &mut [f32]) {
    crate::dispatch_lanes!(tier, unary_lanes(op, buf))
}

/// `dst = dst op rhs` over `dst.len()` elements using the tier's vector width.
pub(crate) fn apply_binary(tier: CapabilityTier, op: BinaryOp, dst: &mut [f32], rhs: &[f32]) {
    debug_assert!(rhs.len() >= dst.len());
    crate::dispatch_lanes!(tier, binary_lanes(op, dst, rhs))
}
