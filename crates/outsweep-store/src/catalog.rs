use std::collections::HashMap;

use chrono::{DateTime, Utc};
use outsweep_models::catalog::CatalogEntry;

use crate::error::StoreError;

/// Lookup of static item attributes by item id.
///
/// Synchronous on purpose: the evaluator runs against a snapshot taken
/// at the start of a cycle and never does I/O.
pub trait ItemCatalog {
    /// Fails with `StoreError::UnknownItem` when the id is not in the catalog.
    fn lookup(&self, item_id: u64) -> Result<&CatalogEntry, StoreError>;
}

/// Point-in-time copy of the item catalog.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    entries: HashMap<u64, CatalogEntry>,
    loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn from_entries(entries: impl IntoIterator<Item = CatalogEntry>, loaded_at: DateTime<Utc>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.item_id, e)).collect(),
            loaded_at,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl ItemCatalog for CatalogSnapshot {
    fn lookup(&self, item_id: u64) -> Result<&CatalogEntry, StoreError> {
        self.entries
            .get(&item_id)
            .ok_or(StoreError::UnknownItem(item_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outsweep_models::catalog::Eligibility;

    fn entry(item_id: u64, value: i64) -> CatalogEntry {
        CatalogEntry {
            item_id,
            name: None,
            value,
            rap: value / 2,
            offer_value: None,
            request_value: None,
            eligibility: Eligibility::default(),
        }
    }

    #[test]
    fn lookup_known_item() {
        let snapshot = CatalogSnapshot::from_entries(vec![entry(1, 100), entry(2, 250)], Utc::now());
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.lookup(2).unwrap().value, 250);
    }

    #[test]
    fn lookup_unknown_item_fails() {
        let snapshot = CatalogSnapshot::from_entries(vec![entry(1, 100)], Utc::now());
        let err = snapshot.lookup(99).unwrap_err();
        assert!(matches!(err, StoreError::UnknownItem(99)));
    }

    #[test]
    fn later_duplicate_wins() {
        let snapshot = CatalogSnapshot::from_entries(vec![entry(1, 100), entry(1, 300)], Utc::now());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.lookup(1).unwrap().value, 300);
    }
}
