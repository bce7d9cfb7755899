//! Kernel configuration: tier, default precision and pooling capacity.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::capability::{self, CapabilityTier, TIER_ENV_VAR};
use crate::error::{KernelError, KernelResult};
use crate::types::Precision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// `None` defers to the environment override, then host detection.
    pub tier: Option<CapabilityTier>,
    pub precision: Precision,
    /// Overrides the tier's sum-pool window capacity.
    pub pool_kernel_limit: Option<usize>,
}

impl KernelConfig {
    pub fn with_tier(tier: CapabilityTier) -> Self {
        Self { tier: Some(tier), ..Self::default() }
    }

    /// Parse a JSON config. A tier named in the environment takes priority
    /// over the one in the JSON.
    pub fn from_json_str(content: &str) -> KernelResult<Self> {
        let config: KernelConfig = serde_json::from_str(content)?;
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> KernelResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        log::debug!("Loading kernel config from {:?}", path);
        Self::from_json_str(&content)
    }

    pub fn to_json(&self) -> KernelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> KernelResult<()> {
        if let Some(limit) = self.pool_kernel_limit {
            if limit < 2 {
                return Err(KernelError::InvalidConfig(format!(
                    "pool_kernel_limit must be >= 2, got {limit}"
                )));
            }
        }
        Ok(())
    }

    /// Apply the environment override on top of this config.
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(TIER_ENV_VAR) {
            Ok(value) => self.with_tier_override(&value),
            Err(_) => self,
        }
    }

    /// Replace the tier with `value` if it names one; keep it otherwise.
    fn with_tier_override(mut self, value: &str) -> Self {
        match value.parse::<CapabilityTier>() {
            Ok(tier) => {
                if self.tier.is_some_and(|t| t != tier) {
                    log::debug!("{TIER_ENV_VAR}={value} overrides configured tier");
                }
                self.tier = Some(tier);
            }
            Err(e) => log::warn!("Ignoring {TIER_ENV_VAR}: {e}"),
        }
        self
    }

    /// Tier to run with; explicit config wins, then the process-wide tier.
    pub fn resolved_tier(&self) -> CapabilityTier {
        self.tier.unwrap_or_else(capability::current_tier)
    }

    pub fn resolved_pool_kernel_limit(&self) -> usize {
        self.pool_kernel_limit
            .unwrap_or_else(|| self.resolved_tier().capabilities().pool_kernel_limit)
    }

    /// Pin the configured tier process-wide.
    pub fn install(&self) -> KernelResult<CapabilityTier> {
        let tier = self.resolved_tier();
        capability::init(tier)?;
        Ok(tier)
    }
}
