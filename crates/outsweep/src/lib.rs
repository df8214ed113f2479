//! outsweep - outbound trade sweeper
//!
//! Decides whether pending outbound trades still meet the account's policy and
//! declines the ones that do not. The daemon lives in `outsweep-daemon`; this
//! crate re-exports the building blocks and backs the one-shot CLI.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use outsweep::models::{OutboundOffer, OutsweepConfig, Verdict};
//! use outsweep::policy::{evaluate, ActionExecutor, Inventory};
//! use outsweep::store::{CatalogSnapshot, SqliteRepository, SqliteStore};
//! ```

pub use outsweep_models as models;
pub use outsweep_policy as policy;
pub use outsweep_store as store;

use chrono::{DateTime, Utc};
use outsweep_models::catalog::CatalogEntry;
use outsweep_models::config::OutsweepConfig;
use outsweep_models::outbound::OutboundOffer;
use outsweep_policy::{evaluate_detailed, Evaluation, Inventory, PolicyError};
use outsweep_store::{CatalogSnapshot, SqliteStore, StoreError};

/// Evaluate one offer against a catalog snapshot and a list of owned uaids,
/// using the gain policy configured for the offer's trade type.
pub fn evaluate_offer(
    config: &OutsweepConfig,
    catalog: &CatalogSnapshot,
    offer: &OutboundOffer,
    owned_uaids: Vec<u64>,
    now: DateTime<Utc>,
) -> Result<Evaluation, PolicyError> {
    let gain = config
        .gain_policy(&offer.trade_type)
        .ok_or_else(|| PolicyError::UnknownTradeType(offer.trade_type.clone()))?;
    let inventory = Inventory::new(owned_uaids, now);
    evaluate_detailed(offer, &inventory, catalog, gain, &config.expiration, now)
}

/// Upsert catalog entries into the store. Returns the number written.
pub fn import_catalog(store: &mut SqliteStore, entries: &[CatalogEntry]) -> Result<usize, StoreError> {
    let written = store.upsert_items(entries)?;
    tracing::info!(count = written, "Imported catalog entries");
    Ok(written)
}
