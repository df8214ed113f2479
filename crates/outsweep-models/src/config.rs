use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::outbound::TradeType;

/// Top-level configuration shared by the CLI and the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutsweepConfig {
    pub store: StoreConfig,
    #[serde(default)]
    pub expiration: ExpirationPolicy,
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Gain ratios keyed by trade type.
    pub trading: BTreeMap<TradeType, GainPolicy>,
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("no trade types configured under [trading]")]
    NoTradeTypes,

    #[error("trade type {trade_type}: {field} must not be negative (got {value})")]
    NegativeRatio {
        trade_type: String,
        field: &'static str,
        value: Decimal,
    },

    #[error("expiration.max_age_hours must be positive (got {0})")]
    InvalidMaxAge(f64),
}

impl OutsweepConfig {
    pub fn gain_policy(&self, trade_type: &str) -> Option<&GainPolicy> {
        self.trading.get(trade_type)
    }

    /// Reject configurations the poller cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trading.is_empty() {
            return Err(ConfigError::NoTradeTypes);
        }
        for (trade_type, policy) in &self.trading {
            if policy.min_value_gain.is_sign_negative() {
                return Err(ConfigError::NegativeRatio {
                    trade_type: trade_type.clone(),
                    field: "min_value_gain",
                    value: policy.min_value_gain,
                });
            }
            if policy.min_rap_gain.is_sign_negative() {
                return Err(ConfigError::NegativeRatio {
                    trade_type: trade_type.clone(),
                    field: "min_rap_gain",
                    value: policy.min_rap_gain,
                });
            }
        }
        let max_age = self.expiration.max_age_hours;
        if !(max_age.is_finite() && max_age > 0.0) {
            return Err(ConfigError::InvalidMaxAge(max_age));
        }
        Ok(())
    }
}

/// Configuration for the SQLite store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite database holding outbounds, items and cooldowns.
    pub sqlite_path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "data/outsweep.db".to_string(),
        }
    }
}

/// Minimum gain an outbound must keep to stay open.
///
/// Both thresholds are multiplied by the offered *value*.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GainPolicy {
    pub min_value_gain: Decimal,
    pub min_rap_gain: Decimal,
}

/// Age limit for outbounds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpirationPolicy {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: f64,
}

impl ExpirationPolicy {
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::milliseconds((self.max_age_hours * 3_600_000.0) as i64)
    }
}

impl Default for ExpirationPolicy {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_age_hours: default_max_age_hours(),
        }
    }
}

/// Caching of the item catalog between poll cycles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogConfig {
    /// How long a loaded catalog snapshot is reused. 0 reloads every cycle.
    #[serde(default = "default_catalog_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: default_catalog_cache_ttl(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_max_age_hours() -> f64 {
    24.0
}
fn default_catalog_cache_ttl() -> u64 {
    30
}
