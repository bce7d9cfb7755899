//! Capability tier selection.
//!
//! The tier is a property of the execution target, not of the data: it decides
//! which fused instructions the kernels may use (native divide, approximate
//! reciprocal, sequence fuse) and fixes the tier constants (lane width, pooling
//! capacity). It is resolved once per process:
//!
//! 1. an explicit [`init`] call (usually fed from [`KernelConfig`](crate::KernelConfig)),
//! 2. the `SCRATCH_KERNELS_TIER` environment variable,
//! 3. host ISA detection.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, KernelResult};

/// Environment variable overriding host detection.
pub const TIER_ENV_VAR: &str = "SCRATCH_KERNELS_TIER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTier {
    /// No native divide; reciprocal only through the approximate instruction.
    Legacy,
    /// No native divide, but the sequence-fuse instruction is present.
    Transitional,
    /// Native divide for both precisions.
    Standard,
    /// Native divide plus sequence fuse, widest lanes.
    Advanced,
}

/// Instruction availability and tier constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub native_divide: bool,
    /// Reciprocal goes through the approximate instruction, which restricts
    /// its valid input domain.
    pub approx_reciprocal: bool,
    pub sequence_fuse: bool,
    /// Vector register width in bytes.
    pub lane_bytes: usize,
    /// Maximum window (group count) a single sum-pool call accepts.
    pub pool_kernel_limit: usize,
}

impl CapabilityTier {
    pub const ALL: [CapabilityTier; 4] = [
        CapabilityTier::Legacy,
        CapabilityTier::Transitional,
        CapabilityTier::Standard,
        CapabilityTier::Advanced,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Legacy => "legacy",
            Self::Transitional => "transitional",
            Self::Standard => "standard",
            Self::Advanced => "advanced",
        }
    }

    pub const fn capabilities(self) -> Capabilities {
        match self {
            Self::Legacy => Capabilities {
                native_divide: false,
                approx_reciprocal: true,
                sequence_fuse: false,
                lane_bytes: 16,
                pool_kernel_limit: 32,
            },
            Self::Transitional => Capabilities {
                native_divide: false,
                approx_reciprocal: true,
                sequence_fuse: true,
                lane_bytes: 32,
                pool_kernel_limit: 64,
            },
            Self::Standard => Capabilities {
                native_divide: true,
                approx_reciprocal: false,
                sequence_fuse: false,
                lane_bytes: 32,
                pool_kernel_limit: 64,
            },
            Self::Advanced => Capabilities {
                native_divide: true,
                approx_reciprocal: false,
                sequence_fuse: true,
                lane_bytes: 64,
                pool_kernel_limit: 128,
            },
        }
    }

    /// Number of f32 lanes in one vector register.
    #[inline(always)]
    pub const fn f32_lanes(self) -> usize {
        self.capabilities().lane_bytes / std::mem::size_of::<f32>()
    }
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CapabilityTier {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        CapabilityTier::ALL
            .into_iter()
            .find(|tier| value.eq_ignore_ascii_case(tier.name()))
            .ok_or_else(|| KernelError::InvalidConfig(format!("unknown capability tier '{value}'")))
    }
}

static TIER: OnceLock<CapabilityTier> = OnceLock::new();

/// Pin the process-wide tier. Fails if a different tier was already resolved.
pub fn init(tier: CapabilityTier) -> KernelResult<()> {
    let resolved = *TIER.get_or_init(|| tier);
    if resolved != tier {
        log::warn!("Capability tier already resolved to {resolved}, ignoring request for {tier}");
        return Err(KernelError::InvalidConfig(format!(
            "capability tier already resolved to {resolved}"
        )));
    }
    log::info!("Capability tier pinned: {tier}");
    Ok(())
}

/// The process-wide tier, resolving it on first use.
pub fn current_tier() -> CapabilityTier {
    *TIER.get_or_init(resolve_tier)
}

fn resolve_tier() -> CapabilityTier {
    if let Ok(value) = std::env::var(TIER_ENV_VAR) {
        match value.parse::<CapabilityTier>() {
            Ok(tier) => {
                log::info!("Capability tier from {TIER_ENV_VAR}: {tier}");
                return tier;
            }
            Err(e) => log::warn!("Ignoring {TIER_ENV_VAR}: {e}"),
        }
    }
    let tier = detect_host_tier();
    log::info!("Detected capability tier: {tier}");
    tier
}

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub fn detect_host_tier() -> CapabilityTier {
    if is_x86_feature_detected!("avx512f") {
        CapabilityTier::Advanced
    } else if is_x86_feature_detected!("avx2") {
        CapabilityTier::Standard
    } else {
        CapabilityTier::Legacy
    }
}

#[cfg(target_arch = "aarch64")]
pub fn detect_host_tier() -> CapabilityTier {
    CapabilityTier::Standard
}

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
pub fn detect_host_tier() -> CapabilityTier {
    CapabilityTier::Legacy
}
