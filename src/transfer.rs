//! Strided transfers between bulk storage and the scratch workspace.
//!
//! Every 2D transfer moves `segments` runs of `size` contiguous elements. The
//! engine picks one of three strategies from the stride layout:
//!
//! - [`TransferStrategy::Contiguous`]: both sides dense, one flat transfer.
//! - [`TransferStrategy::Staged`]: the bulk-side stride fits in
//!   [`STAGING_THRESHOLD_BYTES`]; one flat bulk transfer plus a cheap
//!   scratch-local restripe replaces many small bulk transfers.
//! - [`TransferStrategy::Strided`]: one strided transfer with `segments - 1`
//!   repeats.
//!
//! A 3D transfer reports the strategy its outer segments shared, or
//! [`TransferStrategy::Mixed`] when the choice differed between them.
//!
//! Loads may clobber the gap between `size` and the scratch stride in every
//! segment. [`store_2d`] restripes its scratch source in place; use
//! [`store_2d_preserving`] when the source is still needed.

use std::mem::size_of;

use crate::error::{KernelError, KernelResult};
use crate::types::MemoryTier;
use crate::validation::{
    strided_footprint, validate_capacity, validate_strided_dims, STAGING_THRESHOLD_BYTES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStrategy {
    Contiguous,
    Staged,
    Strided,
    /// Outer segments of a 3D transfer took different strategies.
    Mixed,
}

impl TransferStrategy {
    fn merge(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            TransferStrategy::Mixed
        }
    }
}

/// Source and destination tiers of a single primitive copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    BulkToScratch,
    ScratchToBulk,
    ScratchToScratch,
}

impl Direction {
    pub fn tiers(self) -> (MemoryTier, MemoryTier) {
        match self {
            Direction::BulkToScratch => (MemoryTier::Bulk, MemoryTier::Scratch),
            Direction::ScratchToBulk => (MemoryTier::Scratch, MemoryTier::Bulk),
            Direction::ScratchToScratch => (MemoryTier::Scratch, MemoryTier::Scratch),
        }
    }
}

/// One level of a strided layout: `segments` runs of `size`, `stride` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StridedView {
    pub size: usize,
    pub stride: usize,
    pub segments: usize,
}

impl StridedView {
    pub fn new(size: usize, stride: usize, segments: usize) -> Self {
        Self { size, stride, segments }
    }

    pub fn validate(&self) -> KernelResult<()> {
        validate_strided_dims(self.size, self.stride, self.segments)
            .map_err(KernelError::InvalidView)
    }

    /// Elements from the first to one past the last touched element.
    pub fn footprint(&self) -> KernelResult<usize> {
        strided_footprint(self.size, self.stride, self.segments)
            .map_err(KernelError::InvalidView)
    }

    #[inline]
    pub fn is_dense(&self) -> bool {
        self.stride == self.size
    }
}

/// Shape of a 2D transfer. Strides are in elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout2d {
    pub size: usize,
    pub segments: usize,
    pub dst_stride: usize,
    pub src_stride: usize,
}

impl Layout2d {
    pub fn new(size: usize, segments: usize, dst_stride: usize, src_stride: usize) -> Self {
        Self { size, segments, dst_stride, src_stride }
    }

    pub fn dense(size: usize, segments: usize) -> Self {
        Self::new(size, segments, size, size)
    }

    pub fn dst_view(&self) -> StridedView {
        StridedView::new(self.size, self.dst_stride, self.segments)
    }

    pub fn src_view(&self) -> StridedView {
        StridedView::new(self.size, self.src_stride, self.segments)
    }

    /// The layout a store needs to undo a load of this shape.
    pub fn reversed(&self) -> Self {
        Self::new(self.size, self.segments, self.src_stride, self.dst_stride)
    }

    fn validate(&self, dst_len: usize, src_len: usize) -> KernelResult<()> {
        let dst = self.dst_view();
        let src = self.src_view();
        dst.validate()?;
        src.validate()?;
        check_len("destination", dst.footprint()?, dst_len)?;
        check_len("source", src.footprint()?, src_len)
    }
}

/// Shape of a 3D transfer: an inner 2D layout repeated `segments_out` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout3d {
    pub inner: Layout2d,
    pub segments_out: usize,
    pub dst_stride_out: usize,
    pub src_stride_out: usize,
}

impl Layout3d {
    pub fn new(
        inner: Layout2d,
        segments_out: usize,
        dst_stride_out: usize,
        src_stride_out: usize,
    ) -> Self {
        Self { inner, segments_out, dst_stride_out, src_stride_out }
    }

    pub fn reversed(&self) -> Self {
        Self::new(
            self.inner.reversed(),
            self.segments_out,
            self.src_stride_out,
            self.dst_stride_out,
        )
    }

    fn validate(&self, dst_len: usize, src_len: usize) -> KernelResult<()> {
        if self.segments_out == 0 {
            return Err(KernelError::InvalidView("segments_out must be > 0".into()));
        }
        let last_out = self.segments_out - 1;
        let dst_needed = outer_footprint(self.dst_stride_out, last_out, self.inner.dst_view())?;
        let src_needed = outer_footprint(self.src_stride_out, last_out, self.inner.src_view())?;
        check_len("destination", dst_needed, dst_len)?;
        check_len("source", src_needed, src_len)
    }
}

fn outer_footprint(stride_out: usize, last_out: usize, inner: StridedView) -> KernelResult<usize> {
    inner.validate()?;
    stride_out
        .checked_mul(last_out)
        .and_then(|v| v.checked_add(inner.footprint().ok()?))
        .ok_or_else(|| KernelError::InvalidView("3D footprint overflow".into()))
}

#[inline]
fn check_len(what: &'static str, needed: usize, available: usize) -> KernelResult<()> {
    validate_capacity(what, needed, available)
        .map_err(|_| KernelError::BufferTooSmall { what, needed, available })
}

#[inline]
fn fits_staging<T>(stride: usize) -> bool {
    stride
        .checked_mul(size_of::<T>())
        .is_some_and(|bytes| bytes <= STAGING_THRESHOLD_BYTES)
}

/// Run `transfer` on each outer segment's (dst, src) offsets and merge the
/// strategies. `segments_out` is at least one once the layout validated.
fn each_outer(
    layout: &Layout3d,
    mut transfer: impl FnMut(usize, usize) -> TransferStrategy,
) -> TransferStrategy {
    let mut merged: Option<TransferStrategy> = None;
    for i in 0..layout.segments_out {
        let strategy = transfer(i * layout.dst_stride_out, i * layout.src_stride_out);
        merged = Some(merged.map_or(strategy, |m| m.merge(strategy)));
    }
    merged.unwrap_or(TransferStrategy::Contiguous)
}

// ============================================================================
// Primitive copies
// ============================================================================

/// Copy `repeat + 1` runs of `size` elements from `src` to `dst`.
fn copy_strided<T: Copy>(
    dir: Direction,
    dst: &mut [T],
    src: &[T],
    size: usize,
    dst_stride: usize,
    src_stride: usize,
    repeat: usize,
) {
    log::trace!(
        "{:?}: {} x {} elems, dst stride {}, src stride {}",
        dir, repeat + 1, size, dst_stride, src_stride
    );
    for seg in 0..=repeat {
        let d = seg * dst_stride;
        let s = seg * src_stride;
        dst[d..d + size].copy_from_slice(&src[s..s + size]);
    }
}

/// Scratch-local strided copy inside one buffer, front to back.
///
/// Each run is moved with memmove semantics, so forward-compacting layouts
/// (destination never ahead of unread source) are safe.
fn copy_strided_within<T: Copy>(
    buf: &mut [T],
    dst_off: usize,
    src_off: usize,
    size: usize,
    dst_stride: usize,
    src_stride: usize,
    repeat: usize,
) {
    log::trace!(
        "{:?}: {} x {} elems, {} -> {}",
        Direction::ScratchToScratch, repeat + 1, size, src_off, dst_off
    );
    for seg in 0..=repeat {
        let s = src_off + seg * src_stride;
        buf.copy_within(s..s + size, dst_off + seg * dst_stride);
    }
}

fn copy_flat<T: Copy>(dir: Direction, dst: &mut [T], src: &[T], len: usize) {
    log::trace!("{:?}: flat {} elems", dir, len);
    dst[..len].copy_from_slice(&src[..len]);
}

// ============================================================================
// Loads
// ============================================================================

/// Bulk → scratch 2D load. `layout.src_stride` is the bulk stride.
pub fn load_2d<T: Copy>(
    dst: &mut [T],
    src: &[T],
    layout: Layout2d,
) -> KernelResult<TransferStrategy> {
    layout.validate(dst.len(), src.len())?;
    Ok(load_2d_unchecked(dst, src, layout))
}

fn load_2d_unchecked<T: Copy>(dst: &mut [T], src: &[T], layout: Layout2d) -> TransferStrategy {
    let Layout2d { size, segments, dst_stride, src_stride } = layout;
    let dir = Direction::BulkToScratch;

    if segments == 1 || (dst_stride == src_stride && size == src_stride) {
        copy_flat(dir, dst, src, size * segments);
        return TransferStrategy::Contiguous;
    }

    if (size == src_stride || src_stride <= dst_stride) && fits_staging::<T>(src_stride) {
        // dst_stride >= size == src_stride in the first arm, so this never underflows.
        let staging = (dst_stride - src_stride) * segments;
        let src_len = src_stride * (segments - 1) + size;
        if staging + src_len <= dst.len() {
            copy_flat(dir, &mut dst[staging..], src, src_len);
            copy_strided_within(dst, 0, staging, size, dst_stride, src_stride, segments - 1);
            return TransferStrategy::Staged;
        }
        log::debug!(
            "load_2d: scratch too short for staging ({} < {}), using strided transfer",
            dst.len(),
            staging + src_len
        );
    }

    copy_strided(dir, dst, src, size, dst_stride, src_stride, segments - 1);
    TransferStrategy::Strided
}

/// Bulk → scratch 3D load: one 2D load per outer segment.
///
/// The staging room check runs per segment, so the last segments of a tight
/// destination can fall back to strided and the result is then `Mixed`.
pub fn load_3d<T: Copy>(
    dst: &mut [T],
    src: &[T],
    layout: Layout3d,
) -> KernelResult<TransferStrategy> {
    layout.validate(dst.len(), src.len())?;
    let strategy = each_outer(&layout, |d, s| {
        load_2d_unchecked(&mut dst[d..], &src[s..], layout.inner)
    });
    log::debug!("load_3d: {} outer segments via {:?}", layout.segments_out, strategy);
    Ok(strategy)
}

// ============================================================================
// Stores
// ============================================================================

/// Scratch → bulk 2D store. `layout.dst_stride` is the bulk stride.
///
/// May restripe `src` in place; the scratch contents are unspecified afterwards.
pub fn store_2d<T: Copy>(
    dst: &mut [T],
    src: &mut [T],
    layout: Layout2d,
) -> KernelResult<TransferStrategy> {
    layout.validate(dst.len(), src.len())?;
    Ok(store_2d_unchecked(dst, src, layout))
}

fn store_2d_unchecked<T: Copy>(
    dst: &mut [T],
    src: &mut [T],
    layout: Layout2d,
) -> TransferStrategy {
    let Layout2d { size, segments, dst_stride, src_stride } = layout;
    let dir = Direction::ScratchToBulk;

    if segments == 1 {
        copy_flat(dir, dst, src, size);
        return TransferStrategy::Contiguous;
    }

    if size == dst_stride && dst_stride <= src_stride && fits_staging::<T>(dst_stride) {
        if dst_stride != src_stride {
            copy_strided_within(src, 0, 0, size, dst_stride, src_stride, segments - 1);
        }
        copy_flat(dir, dst, src, size * segments);
        return if dst_stride == src_stride {
            TransferStrategy::Contiguous
        } else {
            TransferStrategy::Staged
        };
    }

    copy_strided(dir, dst, src, size, dst_stride, src_stride, segments - 1);
    TransferStrategy::Strided
}

/// Scratch → bulk 3D store: one 2D store per outer segment.
///
/// May restripe `src` in place.
pub fn store_3d<T: Copy>(
    dst: &mut [T],
    src: &mut [T],
    layout: Layout3d,
) -> KernelResult<TransferStrategy> {
    layout.validate(dst.len(), src.len())?;
    let strategy = each_outer(&layout, |d, s| {
        store_2d_unchecked(&mut dst[d..], &mut src[s..], layout.inner)
    });
    log::debug!("store_3d: {} outer segments via {:?}", layout.segments_out, strategy);
    Ok(strategy)
}

/// Scratch → bulk 2D store that leaves `src` untouched.
pub fn store_2d_preserving<T: Copy>(
    dst: &mut [T],
    src: &[T],
    layout: Layout2d,
) -> KernelResult<TransferStrategy> {
    layout.validate(dst.len(), src.len())?;
    Ok(store_2d_preserving_unchecked(dst, src, layout))
}

fn store_2d_preserving_unchecked<T: Copy>(
    dst: &mut [T],
    src: &[T],
    layout: Layout2d,
) -> TransferStrategy {
    let Layout2d { size, segments, dst_stride, src_stride } = layout;
    let dir = Direction::ScratchToBulk;
    if segments == 1 || (size == dst_stride && dst_stride == src_stride) {
        copy_flat(dir, dst, src, size * segments);
        return TransferStrategy::Contiguous;
    }
    copy_strided(dir, dst, src, size, dst_stride, src_stride, segments - 1);
    TransferStrategy::Strided
}

/// Scratch → bulk 3D store that leaves `src` untouched.
pub fn store_3d_preserving<T: Copy>(
    dst: &mut [T],
    src: &[T],
    layout: Layout3d,
) -> KernelResult<TransferStrategy> {
    layout.validate(dst.len(), src.len())?;
    Ok(each_outer(&layout, |d, s| {
        store_2d_preserving_unchecked(&mut dst[d..], &src[s..], layout.inner)
    }))
}
