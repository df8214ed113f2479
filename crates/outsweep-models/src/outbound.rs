use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Policy bucket an outbound was sent under (e.g. "upgrade", "downgrade").
/// Selects which gain ratios apply.
pub type TradeType = String;

/// A specific owned copy of an item type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ItemInstance {
    /// Catalog item-type identifier.
    pub item_id: u64,
    /// Unique asset id of this copy.
    pub uaid: u64,
}

impl ItemInstance {
    pub fn new(item_id: u64, uaid: u64) -> Self {
        Self { item_id, uaid }
    }
}

/// A trade proposal sent by this account and still awaiting the partner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundOffer {
    pub id: u64,
    pub trade_type: TradeType,
    /// Counterparty user id. Cooldowns are keyed by this.
    pub partner_id: u64,
    pub created_at: DateTime<Utc>,
    /// Items this account gives away, in the order they were offered.
    pub offering: Vec<ItemInstance>,
    /// Items this account receives, in the order they were requested.
    pub requesting: Vec<ItemInstance>,
}

impl OutboundOffer {
    pub fn offered_uaids(&self) -> impl Iterator<Item = u64> + '_ {
        self.offering.iter().map(|i| i.uaid)
    }
}
