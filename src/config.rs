//! Engine configuration.
//!
//! Defaults reproduce the reference behaviour; a JSON file can override any
//! subset of fields.

use crate::core::category::SpendCategory;
use crate::core::currency::CurrencyCode;
use crate::optimization::allocator::StrategyKind;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Currency every transaction is normalised into.
    pub home_currency: CurrencyCode,
    /// Which allocation strategy to run.
    pub strategy: StrategyKind,
    /// Below this amount the heuristic strategy avoids splitting.
    pub split_threshold: Decimal,
    /// Capacities at or below this are treated as zero.
    pub capacity_epsilon: Decimal,
    /// Category consulted when a card has no rate for the requested one.
    pub fallback_category: SpendCategory,
    /// Days per month used to pro-rate the grace period.
    pub grace_basis_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            home_currency: CurrencyCode::new("GBP"),
            strategy: StrategyKind::Exact,
            split_threshold: dec!(50),
            capacity_epsilon: dec!(0.01),
            fallback_category: SpendCategory::Other,
            grace_basis_days: 30,
        }
    }
}

impl EngineConfig {
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.split_threshold < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "split_threshold must be non-negative, got {}",
                self.split_threshold
            )));
        }
        if self.capacity_epsilon < Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "capacity_epsilon must be non-negative, got {}",
                self.capacity_epsilon
            )));
        }
        if self.grace_basis_days == 0 {
            return Err(ConfigError::Invalid("grace_basis_days must be positive".into()));
        }
        Ok(())
    }
}
