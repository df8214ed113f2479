//! Keep-or-decline policy for a single outbound.
//!
//! Checks run in a fixed order and stop at the first failure:
//! ownership, expiration, eligibility, gain threshold.

use chrono::{DateTime, Utc};
use outsweep_models::config::{ExpirationPolicy, GainPolicy};
use outsweep_models::outbound::OutboundOffer;
use outsweep_models::verdict::{DeclineReason, OfferSide, OfferTotals, Verdict};
use outsweep_store::ItemCatalog;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::PolicyError;
use crate::platform::Inventory;

/// A verdict together with the totals it was based on.
///
/// `totals` is `None` when the offer was rejected before any catalog lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub totals: Option<OfferTotals>,
}

/// Decide whether an outbound should stay open.
pub fn evaluate(
    offer: &OutboundOffer,
    inventory: &Inventory,
    catalog: &dyn ItemCatalog,
    gain: &GainPolicy,
    expiration: &ExpirationPolicy,
    now: DateTime<Utc>,
) -> Result<Verdict, PolicyError> {
    evaluate_detailed(offer, inventory, catalog, gain, expiration, now).map(|e| e.verdict)
}

/// Same as [`evaluate`], also returning the aggregated totals.
pub fn evaluate_detailed(
    offer: &OutboundOffer,
    inventory: &Inventory,
    catalog: &dyn ItemCatalog,
    gain: &GainPolicy,
    expiration: &ExpirationPolicy,
    now: DateTime<Utc>,
) -> Result<Evaluation, PolicyError> {
    let missing_uaids: Vec<u64> = offer
        .offered_uaids()
        .filter(|uaid| !inventory.owns(*uaid))
        .collect();
    if !missing_uaids.is_empty() {
        return Ok(Evaluation {
            verdict: Verdict::decline(DeclineReason::UnownedItem { missing_uaids }),
            totals: None,
        });
    }

    if expiration.enabled {
        let age = now - offer.created_at;
        if age > expiration.max_age() {
            return Ok(Evaluation {
                verdict: Verdict::decline(DeclineReason::Expired {
                    age_minutes: age.num_minutes(),
                    max_age_hours: expiration.max_age_hours,
                }),
                totals: None,
            });
        }
    }

    let (totals, ineligible) = aggregate(offer, catalog)?;
    if let Some(side) = ineligible {
        return Ok(Evaluation {
            verdict: Verdict::decline(DeclineReason::IneligibleItem { side }),
            totals: Some(totals),
        });
    }

    // Both minimums scale off the offered value, not the offered rap.
    let value_offering = Decimal::from(totals.value_offering);
    let min_value_gain = value_offering
        .checked_mul(gain.min_value_gain)
        .ok_or_else(|| overflow(offer, "minimum value gain"))?;
    let min_rap_gain = value_offering
        .checked_mul(gain.min_rap_gain)
        .ok_or_else(|| overflow(offer, "minimum rap gain"))?;

    let verdict = if Decimal::from(totals.value_requesting) >= min_value_gain
        && Decimal::from(totals.rap_requesting) >= min_rap_gain
    {
        Verdict::Keep
    } else {
        Verdict::decline(DeclineReason::InsufficientGain {
            totals,
            min_value_gain,
            min_rap_gain,
        })
    };

    Ok(Evaluation {
        verdict,
        totals: Some(totals),
    })
}

/// Sum both sides and note which side, if any, holds a non-whitelisted item.
fn aggregate(
    offer: &OutboundOffer,
    catalog: &dyn ItemCatalog,
) -> Result<(OfferTotals, Option<OfferSide>), PolicyError> {
    let mut totals = OfferTotals::default();
    let mut offering_blocked = false;
    let mut requesting_blocked = false;

    for instance in &offer.offering {
        let item = catalog
            .lookup(instance.item_id)
            .map_err(PolicyError::Catalog)?;
        if !item.eligibility.offerable {
            offering_blocked = true;
        }
        totals.value_offering = add(offer, totals.value_offering, item.offering_value(), "offered value")?;
        totals.rap_offering = add(offer, totals.rap_offering, item.rap, "offered rap")?;
    }

    for instance in &offer.requesting {
        let item = catalog
            .lookup(instance.item_id)
            .map_err(PolicyError::Catalog)?;
        if !item.eligibility.requestable {
            requesting_blocked = true;
        }
        totals.value_requesting = add(offer, totals.value_requesting, item.requesting_value(), "requested value")?;
        totals.rap_requesting = add(offer, totals.rap_requesting, item.rap, "requested rap")?;
    }

    let side = match (offering_blocked, requesting_blocked) {
        (true, true) => Some(OfferSide::Both),
        (true, false) => Some(OfferSide::Offering),
        (false, true) => Some(OfferSide::Requesting),
        (false, false) => None,
    };
    Ok((totals, side))
}

fn add(offer: &OutboundOffer, total: i64, value: i64, quantity: &'static str) -> Result<i64, PolicyError> {
    total.checked_add(value).ok_or_else(|| overflow(offer, quantity))
}

fn overflow(offer: &OutboundOffer, quantity: &'static str) -> PolicyError {
    PolicyError::Overflow {
        offer_id: offer.id,
        quantity,
    }
}
