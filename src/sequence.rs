//! Arithmetic sequence generation: `start, start + 1, ..., start + len - 1`.
//!
//! Two strategies produce identical values:
//!
//! - lane broadcast: store one iota vector, add the lane count, repeat. The
//!   last store may run up to one vector past `len`, so the destination must
//!   hold [`padded_len`] elements.
//! - fuse doubling (tiers with the sequence-fuse instruction): seed
//!   [`FUSE_ALIGN`] entries, then repeatedly copy the populated prefix forward
//!   with an added offset. Writes exactly `len` elements.

use crate::capability::CapabilityTier;
use crate::error::{KernelError, KernelResult};
use crate::lane::{apply_unary, LaneVector, Lanes, UnaryOp};
use crate::validation::FUSE_ALIGN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStrategy {
    LaneBroadcast,
    Fuse,
}

/// `len` rounded up to a whole number of vectors for `tier`.
#[inline]
pub fn padded_len(tier: CapabilityTier, len: usize) -> usize {
    len.div_ceil(tier.f32_lanes()) * tier.f32_lanes()
}

fn broadcast_lanes<const N: usize>(dst: &mut [f32], start: f32, len: usize) {
    let step = Lanes::<N>::splat(N as f32);
    let mut v = Lanes::<N>::iota(start);
    for chunk in dst.chunks_exact_mut(N).take(len.div_ceil(N)) {
        v.store(chunk);
        v = v.add(step);
    }
}

/// Lane-broadcast strategy. `dst` must hold `padded_len(tier, len)` elements.
pub fn lane_broadcast(
    tier: CapabilityTier,
    dst: &mut [f32],
    start: f32,
    len: usize,
) -> KernelResult<()> {
    if len == 0 {
        return Ok(());
    }
    let needed = padded_len(tier, len);
    if dst.len() < needed {
        return Err(KernelError::BufferTooSmall {
            what: "sequence",
            needed,
            available: dst.len(),
        });
    }
    crate::dispatch_lanes!(tier, broadcast_lanes(dst, start, len));
    Ok(())
}

/// Copy `dst[..count]` to `dst[at..at + count]` adding `offset`.
fn fuse_add(tier: CapabilityTier, dst: &mut [f32], at: usize, count: usize, offset: usize) {
    debug_assert!(count <= at);
    let (head, tail) = dst.split_at_mut(at);
    let out = &mut tail[..count];
    out.copy_from_slice(&head[..count]);
    apply_unary(tier, UnaryOp::AddScalar(offset as f32), out);
}

/// Fuse-doubling strategy. Needs the sequence-fuse instruction and
/// `len >= FUSE_ALIGN`.
pub fn fuse_doubling(
    tier: CapabilityTier,
    dst: &mut [f32],
    start: f32,
    len: usize,
) -> KernelResult<()> {
    if !tier.capabilities().sequence_fuse {
        return Err(KernelError::MissingCapability {
            capability: "sequence_fuse",
            tier: tier.name(),
        });
    }
    if len < FUSE_ALIGN {
        return Err(KernelError::InvalidView(format!(
            "fuse sequence needs at least {FUSE_ALIGN} elements, got {len}"
        )));
    }
    if dst.len() < len {
        return Err(KernelError::BufferTooSmall {
            what: "sequence",
            needed: len,
            available: dst.len(),
        });
    }

    let blocks = len / FUSE_ALIGN;
    let repeat = blocks.ilog2();
    let remain = blocks - (1usize << repeat);
    let tail = len % FUSE_ALIGN;

    for (i, v) in dst[..FUSE_ALIGN].iter_mut().enumerate() {
        *v = start + i as f32;
    }
    let mut count = 1usize;
    for _ in 0..repeat {
        let filled = count * FUSE_ALIGN;
        fuse_add(tier, dst, filled, filled, filled);
        count *= 2;
    }
    let filled = count * FUSE_ALIGN;
    if remain > 0 {
        fuse_add(tier, dst, filled, remain * FUSE_ALIGN, filled);
    }
    let filled = filled + remain * FUSE_ALIGN;
    if tail > 0 {
        fuse_add(tier, dst, filled, tail, filled);
    }
    log::trace!("fuse_doubling: len {} in {} doublings", len, repeat);
    Ok(())
}

/// Generate the sequence with the best strategy the tier supports.
///
/// Uses fuse doubling when available and `len >= FUSE_ALIGN`; otherwise lane
/// broadcast, which needs `padded_len(tier, len)` elements of room.
pub fn generate(
    tier: CapabilityTier,
    dst: &mut [f32],
    start: f32,
    len: usize,
) -> KernelResult<SequenceStrategy> {
    if tier.capabilities().sequence_fuse && len >= FUSE_ALIGN {
        fuse_doubling(tier, dst, start, len)?;
        return Ok(SequenceStrategy::Fuse);
    }
    lane_broadcast(tier, dst, start, len)?;
    Ok(SequenceStrategy::LaneBroadcast)
}
