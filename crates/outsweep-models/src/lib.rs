pub mod catalog;
pub mod config;
pub mod outbound;
pub mod store_schema;
pub mod verdict;

pub use catalog::{CatalogEntry, Eligibility};
pub use config::{
    CatalogConfig, ConfigError, ExpirationPolicy, GainPolicy, OutsweepConfig, StoreConfig,
};
pub use outbound::{ItemInstance, OutboundOffer, TradeType};
pub use verdict::{DeclineReason, OfferSide, OfferTotals, Verdict};
