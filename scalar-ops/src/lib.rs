//! Scalar reference implementations, `extern "C"` pure scalar functions.
//!
//! These are the golden values the vectorized primitives in `scratch-kernels`
//! are checked against. Every function is `#[no_mangle] pub extern "C"` with
//! plain loops over raw pointers, compiled at `opt-level = 1` (configured in
//! the workspace root Cargo.toml) so the loop structure stays as written.

pub mod elementwise;
pub mod layout;
