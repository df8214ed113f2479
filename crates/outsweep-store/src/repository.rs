use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use outsweep_models::outbound::OutboundOffer;

use crate::catalog::CatalogSnapshot;
use crate::error::StoreError;
use crate::sqlite::SqliteStore;

/// Source of pending outbounds.
#[async_trait]
pub trait OutboundRepository: Send + Sync {
    /// Every pending outbound, in a stable order.
    async fn list_pending(&self) -> Result<Vec<OutboundOffer>, StoreError>;

    /// Forget an outbound. Removing an unknown id is not an error.
    async fn remove(&self, offer_id: u64) -> Result<(), StoreError>;
}

/// Per-partner rate limiting state.
///
/// Cooldowns are set by whatever sends outbounds, in the shared store. The
/// sweeper only lifts them when it declines an offer to that partner.
#[async_trait]
pub trait CooldownStore: Send + Sync {
    /// Lift the partner's cooldown. Clearing a partner with none is not an error.
    async fn clear_cooldown(&self, partner_id: u64) -> Result<(), StoreError>;
}

/// Produces a fresh catalog snapshot for each cycle.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn snapshot(&self) -> Result<CatalogSnapshot, StoreError>;
}

/// Shareable handle over `SqliteStore` implementing the collaborator traits.
///
/// SQLite access is synchronized via `Mutex` since `rusqlite::Connection` is not `Sync`.
pub struct SqliteRepository {
    store: Mutex<SqliteStore>,
}

impl SqliteRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    /// Direct access to the underlying store, e.g. for seeding or imports.
    pub fn lock(&self) -> Result<MutexGuard<'_, SqliteStore>, StoreError> {
        self.store
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("SQLite mutex poisoned: {e}")))
    }
}

#[async_trait]
impl OutboundRepository for SqliteRepository {
    async fn list_pending(&self) -> Result<Vec<OutboundOffer>, StoreError> {
        self.lock()?.list_pending()
    }

    async fn remove(&self, offer_id: u64) -> Result<(), StoreError> {
        let removed = self.lock()?.remove_outbound(offer_id)?;
        if !removed {
            tracing::debug!(offer_id, "Outbound was already gone");
        }
        Ok(())
    }
}

#[async_trait]
impl CooldownStore for SqliteRepository {
    async fn clear_cooldown(&self, partner_id: u64) -> Result<(), StoreError> {
        self.lock()?.clear_cooldown(partner_id)?;
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for SqliteRepository {
    async fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
        self.lock()?.load_catalog()
    }
}
