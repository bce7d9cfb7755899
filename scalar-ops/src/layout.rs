//! Data-movement and reduction references.

/// Strided copy: `segments` runs of `size` elements.
///
/// Run `s` goes from `src[s * src_stride..]` to `dst[s * dst_stride..]`.
#[no_mangle]
#[inline(never)]
pub extern "C" fn scalar_strided_copy(
    src: *const f32,
    dst: *mut f32,
    size: usize,
    dst_stride: usize,
    src_stride: usize,
    segments: usize,
) {
    unsafe {
        for s in 0..segments {
            for i in 0..size {
                *dst.add(s * dst_stride + i) = *src.add(s * src_stride + i);
            }
        }
    }
}

/// Column sum over a `[high, low]` row-major matrix: `out[c] = sum_r x[r][c]`
#[no_mangle]
#[inline(never)]
pub extern "C" fn scalar_column_sum(x: *const f32, out: *mut f32, low: usize, high: usize) {
    unsafe {
        for c in 0..low {
            let mut acc = 0.0_f32;
            for r in 0..high {
                acc += *x.add(r * low + c);
            }
            *out.add(c) = acc;
        }
    }
}

/// Arithmetic sequence: `out[i] = start + i`
#[no_mangle]
#[inline(never)]
pub extern "C" fn scalar_iota(out: *mut f32, start: f32, len: usize) {
    for i in 0..len {
        unsafe {
            *out.add(i) = start + i as f32;
        }
    }
}
