use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use outsweep_store::SqliteRepository;
use tokio_util::sync::CancellationToken;

use crate::error::DaemonError;
use crate::poller::Poller;

/// The sweeper daemon. Runs the poll loop and, when given a store, a periodic
/// sweep of elapsed cooldown rows.
pub struct Daemon {
    poller: Arc<Poller>,
    cooldown_cleanup: Option<(Arc<SqliteRepository>, Duration)>,
    cancel: CancellationToken,
}

impl Daemon {
    pub fn new(poller: Poller) -> Self {
        Self {
            poller: Arc::new(poller),
            cooldown_cleanup: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Periodically delete elapsed cooldowns from the given store.
    pub fn with_cooldown_cleanup(mut self, repository: Arc<SqliteRepository>, interval: Duration) -> Self {
        self.cooldown_cleanup = Some((repository, interval));
        self
    }

    /// Returns a CancellationToken that can be used to trigger shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the daemon until cancelled.
    pub async fn run(&self) -> Result<(), DaemonError> {
        tracing::info!("outsweep daemon starting");

        let mut join_set = tokio::task::JoinSet::new();

        {
            let poller = self.poller.clone();
            let cancel = self.cancel.clone();
            join_set.spawn(async move {
                poller.run(cancel).await;
            });
        }

        if let Some((repository, interval)) = &self.cooldown_cleanup {
            let repository = repository.clone();
            let interval = *interval;
            let cancel = self.cancel.clone();
            join_set.spawn(async move {
                cleanup_loop(repository, interval, cancel).await;
            });
        }

        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Daemon task panicked");
            }
        }

        tracing::info!("outsweep daemon stopped");
        Ok(())
    }
}

/// Delete cooldown rows whose expiry has passed.
fn expire_cooldowns(repository: &SqliteRepository) -> Result<usize, DaemonError> {
    let store = repository.lock()?;
    Ok(store.expire_cooldowns(Utc::now())?)
}

async fn cleanup_loop(repository: Arc<SqliteRepository>, interval: Duration, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Cooldown cleanup loop shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                match expire_cooldowns(&repository) {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Cleaned up elapsed cooldowns");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "Cooldown cleanup failed");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outsweep_store::SqliteStore;

    #[test]
    fn expire_cooldowns_drops_only_elapsed_rows() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .set_cooldown(1, Utc::now() - chrono::Duration::minutes(5))
            .unwrap();
        store
            .set_cooldown(2, Utc::now() + chrono::Duration::minutes(5))
            .unwrap();
        let repository = SqliteRepository::new(store);

        assert_eq!(expire_cooldowns(&repository).unwrap(), 1);
        let store = repository.lock().unwrap();
        assert!(store.is_on_cooldown(2, Utc::now()).unwrap());
        assert!(!store.is_on_cooldown(1, Utc::now()).unwrap());
    }
}
