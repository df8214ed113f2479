use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlatformError {
    /// The trade was already accepted, declined or expired on the platform.
    #[error("Offer {0} no longer exists")]
    OfferNotFound(u64),

    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Rate limited by platform")]
    RateLimited,

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(String),
}

/// Unique asset ids owned by the account at one point in time.
#[derive(Debug, Clone)]
pub struct Inventory {
    uaids: HashSet<u64>,
    fetched_at: DateTime<Utc>,
}

impl Inventory {
    pub fn new(uaids: impl IntoIterator<Item = u64>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            uaids: uaids.into_iter().collect(),
            fetched_at,
        }
    }

    pub fn owns(&self, uaid: u64) -> bool {
        self.uaids.contains(&uaid)
    }

    pub fn len(&self) -> usize {
        self.uaids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uaids.is_empty()
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }
}

/// Trading platform client. Mockable for testing.
#[async_trait]
pub trait TradingPlatform: Send + Sync {
    /// Asset ids currently owned by the account.
    async fn current_inventory(&self) -> Result<Inventory, PlatformError>;

    /// Cancel an outbound. Fails with `OfferNotFound` if it is already gone.
    async fn decline_offer(&self, offer_id: u64) -> Result<(), PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inventory_membership() {
        let inventory = Inventory::new(vec![11, 12, 12, 13], Utc::now());
        assert_eq!(inventory.len(), 3);
        assert!(inventory.owns(12));
        assert!(!inventory.owns(14));
    }

    #[test]
    fn empty_inventory() {
        let inventory = Inventory::new(Vec::new(), Utc::now());
        assert!(inventory.is_empty());
        assert!(!inventory.owns(1));
    }
}
