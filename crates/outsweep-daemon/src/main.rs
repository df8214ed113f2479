use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use outsweep_store::{CachedCatalog, CatalogSource, SqliteRepository, SqliteStore};
use outsweep_daemon::clock::SystemClock;
use outsweep_daemon::config::DaemonConfig;
use outsweep_daemon::daemon::Daemon;
use outsweep_daemon::platform::HttpPlatform;
use outsweep_daemon::poller::{Collaborators, Poller};

#[derive(Parser, Debug)]
#[command(
    name = "outsweep-daemon",
    about = "Outbound trade sweeper - periodically declines pending outbounds that no longer meet policy"
)]
struct Cli {
    /// Path to daemon configuration file
    #[arg(short, long, default_value = "config/outsweep.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

fn init_logging(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let config = DaemonConfig::from_toml(&config_str).with_context(|| "Failed to parse daemon config")?;
    config.validate().with_context(|| "Invalid daemon config")?;

    let store = SqliteStore::open(&config.core.store.sqlite_path)
        .with_context(|| format!("Failed to open store: {}", config.core.store.sqlite_path))?;
    let repository = Arc::new(SqliteRepository::new(store));

    let catalog: Arc<dyn CatalogSource> = match config.core.catalog.cache_ttl_seconds {
        0 => repository.clone(),
        ttl => Arc::new(CachedCatalog::new(
            repository.clone(),
            Duration::from_secs(ttl),
        )),
    };

    let session = std::env::var(&config.platform.session_cookie_env).with_context(|| {
        format!(
            "Session cookie not set in ${}",
            config.platform.session_cookie_env
        )
    })?;
    let platform = Arc::new(HttpPlatform::new(config.platform.clone(), &session)?);

    let poller = Poller::new(
        &config.core,
        Duration::from_secs(config.poller.interval_seconds),
        Collaborators {
            repository: repository.clone(),
            platform,
            catalog,
            cooldowns: repository.clone(),
        },
        Arc::new(SystemClock),
    );
    poller
        .validate_startup()
        .await
        .with_context(|| "Startup validation failed")?;

    if cli.once {
        let report = poller.run_cycle().await?;
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    let daemon = Daemon::new(poller).with_cooldown_cleanup(
        repository,
        Duration::from_secs(config.poller.cooldown_cleanup_seconds),
    );
    let cancel = daemon.cancel_token();

    // Handle shutdown signals
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received shutdown signal");
        cancel.cancel();
    });

    daemon
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Daemon error: {e}"))?;

    Ok(())
}
