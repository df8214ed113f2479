//! In-memory stand-ins for the platform, repository and cooldown store.
//!
//! Used by the unit tests here and by the daemon's lifecycle tests. Each fake
//! records what was asked of it and can be told to fail.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use outsweep_models::catalog::{CatalogEntry, Eligibility};
use outsweep_models::outbound::{ItemInstance, OutboundOffer};
use outsweep_store::{CatalogSnapshot, CatalogSource, CooldownStore, OutboundRepository, StoreError};
use tokio::sync::Mutex;

use crate::platform::{Inventory, PlatformError, TradingPlatform};

/// Build a catalog entry with no overrides and both sides whitelisted.
pub fn catalog_entry(item_id: u64, value: i64, rap: i64) -> CatalogEntry {
    CatalogEntry {
        item_id,
        name: None,
        value,
        rap,
        offer_value: None,
        request_value: None,
        eligibility: Eligibility::default(),
    }
}

pub fn outbound(
    id: u64,
    trade_type: &str,
    partner_id: u64,
    created_at: DateTime<Utc>,
    offering: Vec<ItemInstance>,
    requesting: Vec<ItemInstance>,
) -> OutboundOffer {
    OutboundOffer {
        id,
        trade_type: trade_type.to_string(),
        partner_id,
        created_at,
        offering,
        requesting,
    }
}

/// Platform fake: owns a fixed set of uaids and knows which offers are open.
pub struct FakePlatform {
    inventory: Mutex<Vec<u64>>,
    open_offers: Mutex<HashSet<u64>>,
    declined: Mutex<Vec<u64>>,
    inventory_calls: AtomicUsize,
    fail_inventory: AtomicBool,
    fail_declines: AtomicBool,
}

impl FakePlatform {
    pub fn new(uaids: Vec<u64>) -> Self {
        Self {
            inventory: Mutex::new(uaids),
            open_offers: Mutex::new(HashSet::new()),
            declined: Mutex::new(Vec::new()),
            inventory_calls: AtomicUsize::new(0),
            fail_inventory: AtomicBool::new(false),
            fail_declines: AtomicBool::new(false),
        }
    }

    /// Mark an offer as open so declining it succeeds.
    pub async fn track_offer(&self, offer_id: u64) {
        self.open_offers.lock().await.insert(offer_id);
    }

    pub async fn set_inventory(&self, uaids: Vec<u64>) {
        *self.inventory.lock().await = uaids;
    }

    pub async fn declined(&self) -> Vec<u64> {
        self.declined.lock().await.clone()
    }

    pub fn inventory_calls(&self) -> usize {
        self.inventory_calls.load(Ordering::SeqCst)
    }

    pub fn fail_inventory(&self, fail: bool) {
        self.fail_inventory.store(fail, Ordering::SeqCst);
    }

    pub fn fail_declines(&self, fail: bool) {
        self.fail_declines.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TradingPlatform for FakePlatform {
    async fn current_inventory(&self) -> Result<Inventory, PlatformError> {
        self.inventory_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_inventory.load(Ordering::SeqCst) {
            return Err(PlatformError::Http("injected inventory failure".to_string()));
        }
        let uaids = self.inventory.lock().await.clone();
        Ok(Inventory::new(uaids, Utc::now()))
    }

    async fn decline_offer(&self, offer_id: u64) -> Result<(), PlatformError> {
        if self.fail_declines.load(Ordering::SeqCst) {
            return Err(PlatformError::Http("injected decline failure".to_string()));
        }
        if !self.open_offers.lock().await.remove(&offer_id) {
            return Err(PlatformError::OfferNotFound(offer_id));
        }
        self.declined.lock().await.push(offer_id);
        Ok(())
    }
}

/// Repository fake holding outbounds in insertion order.
pub struct MemoryRepository {
    offers: Mutex<Vec<OutboundOffer>>,
    removed: Mutex<Vec<u64>>,
    fail_listing: AtomicBool,
    fail_removals: AtomicBool,
}

impl MemoryRepository {
    pub fn new(offers: Vec<OutboundOffer>) -> Self {
        Self {
            offers: Mutex::new(offers),
            removed: Mutex::new(Vec::new()),
            fail_listing: AtomicBool::new(false),
            fail_removals: AtomicBool::new(false),
        }
    }

    pub async fn push(&self, offer: OutboundOffer) {
        self.offers.lock().await.push(offer);
    }

    /// Drop an offer without going through `remove`, as if the partner accepted it.
    pub async fn accept_externally(&self, offer_id: u64) {
        self.offers.lock().await.retain(|o| o.id != offer_id);
    }

    pub async fn removed(&self) -> Vec<u64> {
        self.removed.lock().await.clone()
    }

    pub fn fail_listing(&self, fail: bool) {
        self.fail_listing.store(fail, Ordering::SeqCst);
    }

    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OutboundRepository for MemoryRepository {
    async fn list_pending(&self) -> Result<Vec<OutboundOffer>, StoreError> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected listing failure".to_string()));
        }
        Ok(self.offers.lock().await.clone())
    }

    async fn remove(&self, offer_id: u64) -> Result<(), StoreError> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected removal failure".to_string()));
        }
        self.offers.lock().await.retain(|o| o.id != offer_id);
        self.removed.lock().await.push(offer_id);
        Ok(())
    }
}

/// Cooldown fake that remembers every clear.
pub struct RecordingCooldowns {
    cleared: Mutex<Vec<u64>>,
    fail_clears: AtomicBool,
}

impl RecordingCooldowns {
    pub fn new() -> Self {
        Self {
            cleared: Mutex::new(Vec::new()),
            fail_clears: AtomicBool::new(false),
        }
    }

    pub async fn cleared(&self) -> Vec<u64> {
        self.cleared.lock().await.clone()
    }

    pub fn fail_clears(&self, fail: bool) {
        self.fail_clears.store(fail, Ordering::SeqCst);
    }
}

impl Default for RecordingCooldowns {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CooldownStore for RecordingCooldowns {
    async fn clear_cooldown(&self, partner_id: u64) -> Result<(), StoreError> {
        if self.fail_clears.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected clear failure".to_string()));
        }
        self.cleared.lock().await.push(partner_id);
        Ok(())
    }
}

/// Catalog source serving a fixed set of entries.
pub struct StaticCatalog {
    entries: Mutex<Vec<CatalogEntry>>,
}

impl StaticCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub async fn upsert(&self, entry: CatalogEntry) {
        let mut entries = self.entries.lock().await;
        entries.retain(|e| e.item_id != entry.item_id);
        entries.push(entry);
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
        let entries = self.entries.lock().await.clone();
        Ok(CatalogSnapshot::from_entries(entries, Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_platform_declines_only_open_offers() {
        let platform = FakePlatform::new(vec![1, 2]);
        platform.track_offer(10).await;

        assert!(platform.decline_offer(10).await.is_ok());
        assert_eq!(
            platform.decline_offer(10).await,
            Err(PlatformError::OfferNotFound(10))
        );
        assert_eq!(platform.declined().await, vec![10]);
    }

    #[tokio::test]
    async fn fake_platform_counts_inventory_calls() {
        let platform = FakePlatform::new(vec![1, 2]);
        let inventory = platform.current_inventory().await.unwrap();
        assert!(inventory.owns(2));

        platform.fail_inventory(true);
        assert!(platform.current_inventory().await.is_err());
        assert_eq!(platform.inventory_calls(), 2);
    }

    #[tokio::test]
    async fn memory_repository_external_acceptance() {
        let repo = MemoryRepository::new(vec![
            outbound(1, "upgrade", 5, Utc::now(), vec![], vec![]),
            outbound(2, "upgrade", 6, Utc::now(), vec![], vec![]),
        ]);
        repo.accept_externally(1).await;

        let pending = repo.list_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(repo.removed().await.is_empty());
    }
}
