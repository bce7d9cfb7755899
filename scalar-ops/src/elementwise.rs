//! Element-wise math references.

/// Division: `out[i] = a[i] / b[i]`
#[no_mangle]
#[inline(never)]
pub extern "C" fn scalar_div(a: *const f32, b: *const f32, out: *mut f32, n: usize) {
    for i in 0..n {
        unsafe {
            *out.add(i) = *a.add(i) / *b.add(i);
        }
    }
}

/// Reciprocal: `out[i] = 1 / x[i]`
#[no_mangle]
#[inline(never)]
pub extern "C" fn scalar_recip(x: *const f32, out: *mut f32, n: usize) {
    for i in 0..n {
        unsafe {
            *out.add(i) = 1.0 / *x.add(i);
        }
    }
}

/// Exp: `out[i] = exp(x[i])`
#[no_mangle]
#[inline(never)]
pub extern "C" fn scalar_exp(x: *const f32, out: *mut f32, n: usize) {
    for i in 0..n {
        unsafe {
            *out.add(i) = (*x.add(i)).exp();
        }
    }
}

/// Natural log: `out[i] = ln(x[i])`
#[no_mangle]
#[inline(never)]
pub extern "C" fn scalar_log(x: *const f32, out: *mut f32, n: usize) {
    for i in 0..n {
        unsafe {
            *out.add(i) = (*x.add(i)).ln();
        }
    }
}

/// Sigmoid: `out[i] = 1 / (1 + exp(-x[i]))`
#[no_mangle]
#[inline(never)]
pub extern "C" fn scalar_sigmoid(x: *const f32, out: *mut f32, n: usize) {
    for i in 0..n {
        unsafe {
            let v = *x.add(i);
            *out.add(i) = 1.0 / (1.0 + (-v).exp());
        }
    }
}
