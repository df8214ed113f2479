use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of evaluating one outbound offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Keep,
    Decline { reason: DeclineReason },
}

impl Verdict {
    pub fn decline(reason: DeclineReason) -> Self {
        Verdict::Decline { reason }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Verdict::Keep)
    }
}

/// Which side of a trade a check refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferSide {
    Offering,
    Requesting,
    Both,
}

/// Why an outbound should be cancelled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeclineReason {
    /// Offered copies the account no longer owns.
    UnownedItem { missing_uaids: Vec<u64> },
    /// Older than the configured maximum age.
    Expired { age_minutes: i64, max_age_hours: f64 },
    /// At least one item is not whitelisted for its side.
    IneligibleItem { side: OfferSide },
    /// Requested value or rap is below the trade type's minimum gain.
    InsufficientGain {
        totals: OfferTotals,
        min_value_gain: Decimal,
        min_rap_gain: Decimal,
    },
}

impl DeclineReason {
    /// Human-readable explanation for decline logs.
    pub fn detail(&self) -> String {
        match self {
            DeclineReason::UnownedItem { missing_uaids } => {
                let uaids: Vec<String> = missing_uaids.iter().map(|u| u.to_string()).collect();
                format!("offered items are no longer owned ({})", uaids.join(", "))
            }
            DeclineReason::Expired { max_age_hours, .. } => {
                let plural = if *max_age_hours == 1.0 { "" } else { "s" };
                format!("it's more than {max_age_hours} hour{plural} old")
            }
            DeclineReason::IneligibleItem { side } => match side {
                OfferSide::Offering => "offering items are blacklisted".to_string(),
                OfferSide::Requesting => "requesting items are blacklisted".to_string(),
                OfferSide::Both => "offering/requesting items are blacklisted".to_string(),
            },
            DeclineReason::InsufficientGain { totals, .. } => format!(
                "it's a loss ({} vs {})",
                totals.value_offering, totals.value_requesting
            ),
        }
    }
}

impl fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeclineReason::UnownedItem { .. } => "invalid/unowned offered item",
            DeclineReason::Expired { .. } => "expired",
            DeclineReason::IneligibleItem { .. } => "ineligible item",
            DeclineReason::InsufficientGain { .. } => "insufficient gain",
        };
        f.write_str(label)
    }
}

/// Aggregated value and rap of both sides of an offer.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OfferTotals {
    pub value_offering: i64,
    pub rap_offering: i64,
    pub value_requesting: i64,
    pub rap_requesting: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn canonical_reason_labels() {
        let unowned = DeclineReason::UnownedItem {
            missing_uaids: vec![1],
        };
        let expired = DeclineReason::Expired {
            age_minutes: 1500,
            max_age_hours: 24.0,
        };
        let ineligible = DeclineReason::IneligibleItem {
            side: OfferSide::Requesting,
        };
        let gain = DeclineReason::InsufficientGain {
            totals: OfferTotals::default(),
            min_value_gain: dec!(0),
            min_rap_gain: dec!(0),
        };
        assert_eq!(unowned.to_string(), "invalid/unowned offered item");
        assert_eq!(expired.to_string(), "expired");
        assert_eq!(ineligible.to_string(), "ineligible item");
        assert_eq!(gain.to_string(), "insufficient gain");
    }

    #[test]
    fn loss_detail_mentions_both_values() {
        let reason = DeclineReason::InsufficientGain {
            totals: OfferTotals {
                value_offering: 100,
                rap_offering: 90,
                value_requesting: 80,
                rap_requesting: 70,
            },
            min_value_gain: dec!(120),
            min_rap_gain: dec!(30),
        };
        assert_eq!(reason.detail(), "it's a loss (100 vs 80)");
    }

    #[test]
    fn expired_detail_pluralizes() {
        let one = DeclineReason::Expired {
            age_minutes: 61,
            max_age_hours: 1.0,
        };
        let many = DeclineReason::Expired {
            age_minutes: 200,
            max_age_hours: 3.0,
        };
        assert_eq!(one.detail(), "it's more than 1 hour old");
        assert_eq!(many.detail(), "it's more than 3 hours old");
    }

    #[test]
    fn verdict_serialization() {
        assert_eq!(
            serde_json::to_value(Verdict::Keep).unwrap(),
            serde_json::json!({"verdict": "keep"})
        );
        let declined = Verdict::decline(DeclineReason::IneligibleItem {
            side: OfferSide::Offering,
        });
        let json = serde_json::to_value(&declined).unwrap();
        assert_eq!(json["verdict"], "decline");
        assert_eq!(json["reason"]["kind"], "ineligible_item");
        assert_eq!(json["reason"]["side"], "offering");
    }
}
