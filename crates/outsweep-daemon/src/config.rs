use outsweep_models::config::OutsweepConfig;
use serde::{Deserialize, Serialize};

use crate::error::DaemonError;

/// Daemon configuration: the shared sections plus polling and platform access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(flatten)]
    pub core: OutsweepConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    pub platform: PlatformConfig,
}

impl DaemonConfig {
    pub fn from_toml(raw: &str) -> Result<Self, DaemonError> {
        toml::from_str(raw).map_err(|e| DaemonError::Config(e.to_string()))
    }

    /// Check the shared sections plus the daemon-only settings.
    pub fn validate(&self) -> Result<(), DaemonError> {
        self.core.validate()?;
        if self.poller.interval_seconds == 0 {
            return Err(DaemonError::Config(
                "poller.interval_seconds must be positive".to_string(),
            ));
        }
        if self.poller.cooldown_cleanup_seconds == 0 {
            return Err(DaemonError::Config(
                "poller.cooldown_cleanup_seconds must be positive".to_string(),
            ));
        }
        if self.platform.page_size == 0 {
            return Err(DaemonError::Config(
                "platform.page_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PollerConfig {
    /// Pause between the end of one cycle and the start of the next.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Interval between sweeps of elapsed cooldown rows.
    #[serde(default = "default_cleanup_interval")]
    pub cooldown_cleanup_seconds: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_interval(),
            cooldown_cleanup_seconds: default_cleanup_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformConfig {
    /// Account whose inventory is checked.
    pub user_id: u64,
    #[serde(default = "default_inventory_url")]
    pub inventory_url: String,
    #[serde(default = "default_trades_url")]
    pub trades_url: String,
    /// Environment variable holding the session cookie value.
    #[serde(default = "default_session_env")]
    pub session_cookie_env: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Inventory page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_interval() -> u64 {
    5
}
fn default_cleanup_interval() -> u64 {
    300
}
fn default_inventory_url() -> String {
    "https://inventory.roblox.com".to_string()
}
fn default_trades_url() -> String {
    "https://trades.roblox.com".to_string()
}
fn default_session_env() -> String {
    "OUTSWEEP_SESSION".to_string()
}
fn default_cookie_name() -> String {
    ".ROBLOSECURITY".to_string()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_page_size() -> u32 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn deserialize_example_config() {
        let toml_str = r#"
[store]
sqlite_path = "data/outsweep.db"

[poller]
interval_seconds = 10

[expiration]
enabled = true
max_age_hours = 48

[catalog]
cache_ttl_seconds = 120

[trading.upgrade]
min_value_gain = "1.05"
min_rap_gain = "0.8"

[platform]
user_id = 123456
request_timeout_seconds = 15
"#;
        let config: DaemonConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.core.store.sqlite_path, "data/outsweep.db");
        assert_eq!(config.poller.interval_seconds, 10);
        assert_eq!(config.poller.cooldown_cleanup_seconds, 300);
        assert_eq!(config.core.expiration.max_age_hours, 48.0);
        assert_eq!(config.core.catalog.cache_ttl_seconds, 120);
        assert_eq!(
            config.core.gain_policy("upgrade").unwrap().min_value_gain,
            dec!(1.05)
        );
        assert_eq!(config.platform.user_id, 123456);
        assert_eq!(config.platform.request_timeout_seconds, 15);
        assert_eq!(config.platform.trades_url, "https://trades.roblox.com");
        assert!(config.core.validate().is_ok());
    }

    #[test]
    fn deserialize_minimal_config() {
        let toml_str = r#"
[store]
sqlite_path = "data/outsweep.db"

[trading.upgrade]
min_value_gain = "1"
min_rap_gain = "0"

[platform]
user_id = 1
"#;
        let config: DaemonConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.poller, PollerConfig::default());
        assert_eq!(config.poller.interval_seconds, 5);
        assert_eq!(config.platform.session_cookie_env, "OUTSWEEP_SESSION");
        assert_eq!(config.platform.page_size, 100);
        assert!(config.core.expiration.enabled);
    }

    #[test]
    fn missing_platform_section_is_rejected() {
        let toml_str = r#"
[store]
sqlite_path = "data/outsweep.db"

[trading.upgrade]
min_value_gain = "1"
min_rap_gain = "0"
"#;
        assert!(toml::from_str::<DaemonConfig>(toml_str).is_err());
    }

    #[test]
    fn zero_interval_fails_validation() {
        let toml_str = r#"
[store]
sqlite_path = "data/outsweep.db"

[poller]
interval_seconds = 0

[trading.upgrade]
min_value_gain = "1"
min_rap_gain = "0"

[platform]
user_id = 1
"#;
        let config = DaemonConfig::from_toml(toml_str).unwrap();
        assert!(matches!(config.validate(), Err(DaemonError::Config(_))));
    }

    #[test]
    fn zero_cleanup_interval_fails_validation() {
        let toml_str = r#"
[store]
sqlite_path = "data/outsweep.db"

[poller]
cooldown_cleanup_seconds = 0

[trading.upgrade]
min_value_gain = "1"
min_rap_gain = "0"

[platform]
user_id = 1
"#;
        let config = DaemonConfig::from_toml(toml_str).unwrap();
        match config.validate() {
            Err(DaemonError::Config(msg)) => assert!(msg.contains("cooldown_cleanup_seconds")),
            other => panic!("expected cleanup interval error, got {other:?}"),
        }
    }

    #[test]
    fn leftover_cooldown_ttl_is_ignored() {
        // Cooldown expiry belongs to the sender; an old TTL knob must not be
        // converted or rejected, whatever its size.
        let toml_str = r#"
[store]
sqlite_path = "data/outsweep.db"

[cooldowns]
ttl_seconds = 18446744073709551615

[trading.upgrade]
min_value_gain = "1"
min_rap_gain = "0"

[platform]
user_id = 1
"#;
        let config = DaemonConfig::from_toml(toml_str).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn negative_ratio_fails_validation() {
        let toml_str = r#"
[store]
sqlite_path = "data/outsweep.db"

[trading.upgrade]
min_value_gain = "-0.5"
min_rap_gain = "0"

[platform]
user_id = 1
"#;
        let config = DaemonConfig::from_toml(toml_str).unwrap();
        assert!(matches!(
            config.validate(),
            Err(DaemonError::InvalidConfig(_))
        ));
    }
}
