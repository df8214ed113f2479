use std::fmt;
use std::sync::Arc;

use outsweep_models::outbound::OutboundOffer;
use outsweep_store::{CooldownStore, OutboundRepository};
use serde::Serialize;
use tracing::warn;

use crate::error::PolicyError;
use crate::platform::{PlatformError, TradingPlatform};

/// Result of one side effect of a decline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum StepOutcome {
    Done,
    /// The platform no longer knew the offer; nothing left to cancel.
    AlreadyGone,
    Failed(String),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

/// What happened to each of the three decline steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclineReport {
    pub offer_id: u64,
    pub platform: StepOutcome,
    pub record: StepOutcome,
    pub cooldown: StepOutcome,
}

impl DeclineReport {
    pub fn is_complete(&self) -> bool {
        !(self.platform.is_failed() || self.record.is_failed() || self.cooldown.is_failed())
    }
}

impl fmt::Display for DeclineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offer {}", self.offer_id)?;
        let steps = [
            ("platform decline", &self.platform),
            ("record removal", &self.record),
            ("cooldown clear", &self.cooldown),
        ];
        for (step, outcome) in steps {
            if let StepOutcome::Failed(e) = outcome {
                write!(f, "; {step} failed: {e}")?;
            }
        }
        Ok(())
    }
}

/// Carries out decline verdicts against the platform and local state.
pub struct ActionExecutor {
    platform: Arc<dyn TradingPlatform>,
    repository: Arc<dyn OutboundRepository>,
    cooldowns: Arc<dyn CooldownStore>,
}

impl ActionExecutor {
    pub fn new(
        platform: Arc<dyn TradingPlatform>,
        repository: Arc<dyn OutboundRepository>,
        cooldowns: Arc<dyn CooldownStore>,
    ) -> Self {
        Self {
            platform,
            repository,
            cooldowns,
        }
    }

    /// Cancel the offer on the platform, drop the local record and clear the
    /// partner's cooldown.
    ///
    /// Every step is attempted even if an earlier one failed. Nothing is
    /// rolled back; a failed step is reported as `PolicyError::PartialDecline`.
    pub async fn decline(&self, offer: &OutboundOffer) -> Result<DeclineReport, PolicyError> {
        let platform = match self.platform.decline_offer(offer.id).await {
            Ok(()) => StepOutcome::Done,
            Err(PlatformError::OfferNotFound(_)) => StepOutcome::AlreadyGone,
            Err(e) => {
                warn!(offer_id = offer.id, error = %e, "Platform decline failed");
                StepOutcome::Failed(e.to_string())
            }
        };

        let record = match self.repository.remove(offer.id).await {
            Ok(()) => StepOutcome::Done,
            Err(e) => {
                warn!(offer_id = offer.id, error = %e, "Failed to remove outbound record");
                StepOutcome::Failed(e.to_string())
            }
        };

        let cooldown = match self.cooldowns.clear_cooldown(offer.partner_id).await {
            Ok(()) => StepOutcome::Done,
            Err(e) => {
                warn!(
                    offer_id = offer.id,
                    partner_id = offer.partner_id,
                    error = %e,
                    "Failed to clear partner cooldown"
                );
                StepOutcome::Failed(e.to_string())
            }
        };

        let report = DeclineReport {
            offer_id: offer.id,
            platform,
            record,
            cooldown,
        };

        if report.is_complete() {
            Ok(report)
        } else {
            Err(PolicyError::PartialDecline(report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use outsweep_models::outbound::ItemInstance;

    use crate::test_support::{FakePlatform, MemoryRepository, RecordingCooldowns};

    fn offer(id: u64, partner_id: u64) -> OutboundOffer {
        OutboundOffer {
            id,
            trade_type: "upgrade".to_string(),
            partner_id,
            created_at: Utc::now(),
            offering: vec![ItemInstance::new(1, 10)],
            requesting: vec![ItemInstance::new(2, 20)],
        }
    }

    fn executor(
        platform: &Arc<FakePlatform>,
        repository: &Arc<MemoryRepository>,
        cooldowns: &Arc<RecordingCooldowns>,
    ) -> ActionExecutor {
        ActionExecutor::new(platform.clone(), repository.clone(), cooldowns.clone())
    }

    #[tokio::test]
    async fn decline_runs_all_steps() {
        let platform = Arc::new(FakePlatform::new(vec![10]));
        platform.track_offer(5).await;
        let repository = Arc::new(MemoryRepository::new(vec![offer(5, 300)]));
        let cooldowns = Arc::new(RecordingCooldowns::new());

        let report = executor(&platform, &repository, &cooldowns)
            .decline(&offer(5, 300))
            .await
            .unwrap();

        assert_eq!(report.platform, StepOutcome::Done);
        assert_eq!(report.record, StepOutcome::Done);
        assert_eq!(report.cooldown, StepOutcome::Done);
        assert_eq!(platform.declined().await, vec![5]);
        assert!(repository.list_pending().await.unwrap().is_empty());
        assert_eq!(cooldowns.cleared().await, vec![300]);
    }

    #[tokio::test]
    async fn offer_gone_on_platform_still_cleans_up() {
        let platform = Arc::new(FakePlatform::new(vec![10]));
        let repository = Arc::new(MemoryRepository::new(vec![offer(5, 300)]));
        let cooldowns = Arc::new(RecordingCooldowns::new());

        let report = executor(&platform, &repository, &cooldowns)
            .decline(&offer(5, 300))
            .await
            .unwrap();

        assert_eq!(report.platform, StepOutcome::AlreadyGone);
        assert!(report.is_complete());
        assert!(repository.list_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn platform_failure_does_not_skip_local_steps() {
        let platform = Arc::new(FakePlatform::new(vec![10]));
        platform.fail_declines(true);
        let repository = Arc::new(MemoryRepository::new(vec![offer(5, 300)]));
        let cooldowns = Arc::new(RecordingCooldowns::new());

        let err = executor(&platform, &repository, &cooldowns)
            .decline(&offer(5, 300))
            .await
            .unwrap_err();

        let report = match err {
            PolicyError::PartialDecline(report) => report,
            other => panic!("expected partial decline, got {other:?}"),
        };
        assert!(report.platform.is_failed());
        assert_eq!(report.record, StepOutcome::Done);
        assert_eq!(report.cooldown, StepOutcome::Done);
        assert!(report.to_string().contains("platform decline failed"));
        assert_eq!(cooldowns.cleared().await, vec![300]);
    }

    #[tokio::test]
    async fn store_failures_are_reported() {
        let platform = Arc::new(FakePlatform::new(vec![10]));
        platform.track_offer(5).await;
        let repository = Arc::new(MemoryRepository::new(vec![offer(5, 300)]));
        repository.fail_removals(true);
        let cooldowns = Arc::new(RecordingCooldowns::new());
        cooldowns.fail_clears(true);

        let err = executor(&platform, &repository, &cooldowns)
            .decline(&offer(5, 300))
            .await
            .unwrap_err();

        let report = match err {
            PolicyError::PartialDecline(report) => report,
            other => panic!("expected partial decline, got {other:?}"),
        };
        assert_eq!(report.platform, StepOutcome::Done);
        assert!(report.record.is_failed());
        assert!(report.cooldown.is_failed());
        assert_eq!(platform.declined().await, vec![5]);
    }
}
