use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Store error: {0}")]
    Store(#[from] outsweep_store::StoreError),

    #[error("Platform error: {0}")]
    Platform(#[from] outsweep_policy::PlatformError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] outsweep_models::ConfigError),

    #[error("Pending outbounds use trade types with no gain policy: {0:?}")]
    UnconfiguredTradeTypes(Vec<String>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}
