//! scratch-kernels: scratch-memory numeric primitives for accelerator-style kernels.
//!
//! This crate provides the building blocks a kernel runs inside its fast
//! scratch workspace:
//! - **Math Kernels**: division, reciprocal, exp, log and sigmoid for `f32`
//!   and `half::f16`, with a precision/speed switch for compact elements
//! - **Strided Transfers**: 2D/3D bulk ↔ scratch copies that batch small
//!   strides into one flat transfer plus a local restripe
//! - **Recursive Reduction**: capacity-bounded tree sum pooling
//! - **Sequence Generation**: lane-broadcast iota and fuse doubling
//!
//! Instruction availability comes from a [`CapabilityTier`]. The
//! `SCRATCH_KERNELS_TIER` environment variable wins over a [`KernelConfig`]
//! file, which wins over host ISA detection.
//!
//! # Quick Start
//!
//! ```ignore
//! use scratch_kernels::{CapabilityTier, MathKernels, Precision};
//!
//! let kernels = MathKernels::new(CapabilityTier::Standard);
//! kernels.exp(&mut dst, &src, None, Precision::High)?;
//! ```

pub mod capability;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lane;
pub mod math;
pub mod reduce;
pub mod sequence;
pub mod transfer;
pub mod types;
pub mod validation;

pub use capability::{current_tier, init, Capabilities, CapabilityTier, TIER_ENV_VAR};
pub use config::KernelConfig;
pub use dispatch::{elementwise_raw, ElementwiseOp};
pub use error::{KernelError, KernelResult};
pub use lane::{LaneVector, Lanes};
pub use math::{approx_recip_f16, MathKernels};
pub use reduce::{
    recursive_sum_pool, recursive_sum_pool_default, recursive_sum_pool_with, sum_pool,
};
pub use sequence::{fuse_doubling, generate, lane_broadcast, padded_len, SequenceStrategy};
pub use transfer::{
    load_2d, load_3d, store_2d, store_2d_preserving, store_3d, store_3d_preserving, Direction,
    Layout2d, Layout3d, StridedView, TransferStrategy,
};
pub use types::{
    is_compact, is_full_precision, narrow, widen, FloatType, KernelFloat, MemoryTier, Precision,
};

pub use half::{bf16, f16};
