use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::catalog::CatalogSnapshot;
use crate::error::StoreError;
use crate::repository::CatalogSource;

/// Catalog source that reuses the last loaded snapshot until its TTL runs out.
///
/// Catalog imports reach the poller at most one TTL late. Load failures are
/// not cached.
pub struct CachedCatalog {
    source: Arc<dyn CatalogSource>,
    cache: Cache<(), CatalogSnapshot>,
}

impl CachedCatalog {
    pub fn new(source: Arc<dyn CatalogSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Drop the cached snapshot so the next call reloads.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}

#[async_trait]
impl CatalogSource for CachedCatalog {
    async fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
        if let Some(snapshot) = self.cache.get(&()).await {
            return Ok(snapshot);
        }
        let snapshot = self.source.snapshot().await?;
        self.cache.insert((), snapshot.clone()).await;
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use chrono::Utc;
    use outsweep_models::catalog::{CatalogEntry, Eligibility};

    use crate::catalog::ItemCatalog;

    #[derive(Default)]
    struct CountingSource {
        loads: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("catalog offline".to_string()));
            }
            let loads = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
            let entry = CatalogEntry {
                item_id: 1,
                name: None,
                value: loads as i64,
                rap: 0,
                offer_value: None,
                request_value: None,
                eligibility: Eligibility::default(),
            };
            Ok(CatalogSnapshot::from_entries(vec![entry], Utc::now()))
        }
    }

    #[tokio::test]
    async fn reuses_snapshot_within_ttl() {
        let source = Arc::new(CountingSource::default());
        let cached = CachedCatalog::new(source.clone(), Duration::from_secs(60));

        let first = cached.snapshot().await.unwrap();
        let second = cached.snapshot().await.unwrap();

        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(first.lookup(1).unwrap().value, second.lookup(1).unwrap().value);
    }

    #[tokio::test]
    async fn reloads_after_ttl() {
        let source = Arc::new(CountingSource::default());
        let cached = CachedCatalog::new(source.clone(), Duration::from_millis(50));

        cached.snapshot().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let snapshot = cached.snapshot().await.unwrap();

        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
        assert_eq!(snapshot.lookup(1).unwrap().value, 2);
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let source = Arc::new(CountingSource::default());
        let cached = CachedCatalog::new(source.clone(), Duration::from_secs(60));

        cached.snapshot().await.unwrap();
        cached.invalidate().await;
        cached.snapshot().await.unwrap();

        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_load_is_not_cached() {
        let source = Arc::new(CountingSource::default());
        source.fail.store(true, Ordering::SeqCst);
        let cached = CachedCatalog::new(source.clone(), Duration::from_secs(60));

        assert!(cached.snapshot().await.is_err());

        source.fail.store(false, Ordering::SeqCst);
        assert!(cached.snapshot().await.is_ok());
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }
}
