//! The sweep loop: list pending outbounds, evaluate each one, decline the
//! ones that fail policy, then wait for the next tick.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use outsweep_models::config::{ExpirationPolicy, GainPolicy, OutsweepConfig};
use outsweep_models::outbound::{OutboundOffer, TradeType};
use outsweep_models::verdict::Verdict;
use outsweep_policy::{evaluate, ActionExecutor, Inventory, PolicyError, TradingPlatform};
use outsweep_store::{CatalogSnapshot, CatalogSource, CooldownStore, OutboundRepository};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::DaemonError;

/// Everything the poller talks to.
pub struct Collaborators {
    pub repository: Arc<dyn OutboundRepository>,
    pub platform: Arc<dyn TradingPlatform>,
    pub catalog: Arc<dyn CatalogSource>,
    pub cooldowns: Arc<dyn CooldownStore>,
}

/// Counters for one pass over the pending list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub checked: usize,
    pub kept: usize,
    pub declined: usize,
    pub failed: usize,
}

impl CycleReport {
    fn new(cycle_id: Uuid) -> Self {
        Self {
            cycle_id,
            checked: 0,
            kept: 0,
            declined: 0,
            failed: 0,
        }
    }
}

enum OfferOutcome {
    Kept,
    Declined,
}

pub struct Poller {
    repository: Arc<dyn OutboundRepository>,
    platform: Arc<dyn TradingPlatform>,
    catalog: Arc<dyn CatalogSource>,
    executor: ActionExecutor,
    trading: BTreeMap<TradeType, GainPolicy>,
    expiration: ExpirationPolicy,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl Poller {
    pub fn new(
        config: &OutsweepConfig,
        interval: Duration,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let executor = ActionExecutor::new(
            collaborators.platform.clone(),
            collaborators.repository.clone(),
            collaborators.cooldowns,
        );
        Self {
            repository: collaborators.repository,
            platform: collaborators.platform,
            catalog: collaborators.catalog,
            executor,
            trading: config.trading.clone(),
            expiration: config.expiration.clone(),
            clock,
            interval,
        }
    }

    /// Refuse to start when a pending outbound uses a trade type with no
    /// gain policy.
    pub async fn validate_startup(&self) -> Result<(), DaemonError> {
        let offers = self.repository.list_pending().await?;
        let missing: BTreeSet<String> = offers
            .iter()
            .filter(|o| !self.trading.contains_key(&o.trade_type))
            .map(|o| o.trade_type.clone())
            .collect();

        if missing.is_empty() {
            info!(pending = offers.len(), "Startup check passed");
            Ok(())
        } else {
            Err(DaemonError::UnconfiguredTradeTypes(missing.into_iter().collect()))
        }
    }

    /// Run one cycle over every pending outbound.
    ///
    /// Listing, catalog and inventory failures abort the cycle. Failures on a
    /// single offer are logged and counted, and the cycle moves on.
    pub async fn run_cycle(&self) -> Result<CycleReport, DaemonError> {
        let mut report = CycleReport::new(Uuid::new_v4());

        let offers = self.repository.list_pending().await?;
        if offers.is_empty() {
            debug!(cycle_id = %report.cycle_id, "No pending outbounds");
            return Ok(report);
        }

        let catalog = self.catalog.snapshot().await?;
        let inventory = self.platform.current_inventory().await?;

        for offer in &offers {
            report.checked += 1;
            let now = self.clock.now();
            match self.process(offer, &inventory, &catalog, now).await {
                Ok(OfferOutcome::Kept) => report.kept += 1,
                Ok(OfferOutcome::Declined) => report.declined += 1,
                Err(PolicyError::PartialDecline(decline)) => {
                    report.failed += 1;
                    error!(
                        cycle_id = %report.cycle_id,
                        offer_id = offer.id,
                        "Decline only partly applied: {decline}"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        cycle_id = %report.cycle_id,
                        offer_id = offer.id,
                        error = %e,
                        "Failed to process outbound"
                    );
                }
            }
        }

        info!(
            cycle_id = %report.cycle_id,
            checked = report.checked,
            kept = report.kept,
            declined = report.declined,
            failed = report.failed,
            "Cycle complete"
        );
        Ok(report)
    }

    async fn process(
        &self,
        offer: &OutboundOffer,
        inventory: &Inventory,
        catalog: &CatalogSnapshot,
        now: DateTime<Utc>,
    ) -> Result<OfferOutcome, PolicyError> {
        let gain = self
            .trading
            .get(&offer.trade_type)
            .ok_or_else(|| PolicyError::UnknownTradeType(offer.trade_type.clone()))?;

        match evaluate(offer, inventory, catalog, gain, &self.expiration, now)? {
            Verdict::Keep => {
                debug!(offer_id = offer.id, "Keeping outbound");
                Ok(OfferOutcome::Kept)
            }
            Verdict::Decline { reason } => {
                info!(
                    offer_id = offer.id,
                    partner_id = offer.partner_id,
                    reason = %reason,
                    "Declining outbound: {}",
                    reason.detail()
                );
                self.executor.decline(offer).await?;
                Ok(OfferOutcome::Declined)
            }
        }
    }

    /// Cycle until cancelled. The first cycle starts immediately.
    pub async fn run(&self, cancel: CancellationToken) {
        loop {
            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "Cycle aborted, retrying next tick");
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Poller shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
