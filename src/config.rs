// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Offline Payments Lab ("PayLab") - Configuration

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Longest token lifetime a config may ask for.
pub const MAX_EXPIRY_DAYS: f64 = 3650.0;
/// Largest pool a scenario may mint.
pub const MAX_POOL_SIZE: usize = 1_000_000;
/// Largest run history the lab keeps.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Errors raised while loading or validating a [`LabConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("token pool size must be at least 1")]
    EmptyPool,

    #[error("token pool size {0} exceeds {max}", max = MAX_POOL_SIZE)]
    OversizedPool(usize),

    #[error("cumulative limit must be non-negative, got {0}")]
    NegativeLimit(Decimal),

    #[error("trial amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    #[error("token expiry window is empty: [{min_days}, {max_days}) days")]
    EmptyExpiryWindow { min_days: f64, max_days: f64 },

    #[error("token expiry of {0} days exceeds {max}", max = MAX_EXPIRY_DAYS)]
    ExpiryTooLong(f64),

    #[error("history capacity must be at least 1")]
    ZeroHistoryCapacity,

    #[error("history capacity {0} exceeds {max}", max = MAX_HISTORY_CAPACITY)]
    OversizedHistory(usize),
}

// ---------------------------------------------------------------------------
// RiskConfig
// ---------------------------------------------------------------------------

/// Offline token pool parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Tokens minted when a scenario's pool is first touched.
    pub pool_size: usize,
    /// Aggregate spend allowed per pool before external validation.
    pub cumulative_limit: Decimal,
    /// Amount each simulated trial spends.
    pub trial_amount: Decimal,
    /// Token expiry is drawn uniformly from `[min, max)` days after minting.
    pub expiry_min_days: f64,
    pub expiry_max_days: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            pool_size: 100,
            cumulative_limit: dec!(100),
            trial_amount: dec!(1),
            expiry_min_days: 3.0,
            expiry_max_days: 4.0,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::EmptyPool);
        }
        if self.pool_size > MAX_POOL_SIZE {
            return Err(ConfigError::OversizedPool(self.pool_size));
        }
        if self.cumulative_limit.is_sign_negative() {
            return Err(ConfigError::NegativeLimit(self.cumulative_limit));
        }
        if self.trial_amount <= Decimal::ZERO {
            return Err(ConfigError::NonPositiveAmount(self.trial_amount));
        }
        if !(self.expiry_min_days >= 0.0 && self.expiry_min_days < self.expiry_max_days) {
            return Err(ConfigError::EmptyExpiryWindow {
                min_days: self.expiry_min_days,
                max_days: self.expiry_max_days,
            });
        }
        // NaN and infinity fail this comparison too.
        if !(self.expiry_max_days <= MAX_EXPIRY_DAYS) {
            return Err(ConfigError::ExpiryTooLong(self.expiry_max_days));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// PoolPolicy
// ---------------------------------------------------------------------------

/// Whether repeated runs of one scenario id draw on the same token pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PoolPolicy {
    /// Pools persist across runs and deplete (shared offline budget).
    #[default]
    Shared,
    /// The scenario's pool is dropped before each run.
    FreshPerRun,
}

// ---------------------------------------------------------------------------
// LabConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    pub risk: RiskConfig,
    pub pool_policy: PoolPolicy,
    /// Most recent runs kept in history.
    pub history_capacity: usize,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            risk: RiskConfig::default(),
            pool_policy: PoolPolicy::Shared,
            history_capacity: 20,
        }
    }
}

impl LabConfig {
    /// Parse and validate. Missing keys take their defaults.
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.risk.validate()?;
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        if self.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(ConfigError::OversizedHistory(self.history_capacity));
        }
        Ok(())
    }
}
