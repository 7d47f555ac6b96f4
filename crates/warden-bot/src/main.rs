//! Relay Warden bot - Main entry point.

use anyhow::Context;
use ledger_store::Database;
use relay_control::HttpRelayClient;
use relay_ledger::{EngineConfig, ReconciliationEngine, RegistrationAuthority};
use std::sync::Arc;
use std::time::Duration;
use telegram_client::{TelegramClient, UpdateReceiver};
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warden_bot::commands::Dispatcher;
use warden_bot::config::Config;
use warden_bot::error::AppResult;

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting Relay Warden...");

    // Open the ledger
    let db = Database::open(&config.store.path)
        .await
        .with_context(|| format!("Failed to open ledger at {}", config.store.path.display()))?;
    info!("Ledger ready at {}", config.store.path.display());

    // Relay control is required before anything touches credentials
    let relay = HttpRelayClient::connect(
        &config.relay.api_url,
        config.relay.connect_timeout,
        config.relay.request_timeout,
    )
    .await
    .with_context(|| format!("Relay control not reachable at {}", config.relay.api_url))?;

    let engine = Arc::new(ReconciliationEngine::new(
        Arc::new(relay),
        db.credentials(),
        db.users(),
        EngineConfig {
            inbound: config.relay.inbound_spec(),
            links: config.relay.link_renderer(),
            restore_concurrency: config.reconcile.restore_concurrency,
        },
    ));

    engine
        .prepare_inbound()
        .await
        .context("Failed to configure the managed inbound")?;

    tokio::spawn(restore(engine.clone()));

    if let Some(interval) = config.reconcile.periodic() {
        tokio::spawn(reconcile_periodically(engine.clone(), interval));
    } else {
        warn!("Periodic reconciliation disabled");
    }

    let telegram = TelegramClient::new(
        &config.telegram.api_url,
        config.telegram.bot_token.clone(),
        config.telegram.poll_timeout,
    )
    .context("Failed to create Telegram client")?;

    match telegram.get_me().await {
        Ok(me) => info!(
            "Telegram bot @{} ready",
            me.username.as_deref().unwrap_or("unknown")
        ),
        Err(e) => warn!("Telegram getMe failed - will keep polling: {}", e),
    }

    // Create command handlers
    let admins = Arc::new(config.bot.admin_ids());
    if admins.is_empty() {
        warn!("No admins configured - registration tokens cannot be issued");
    }
    let authority = Arc::new(RegistrationAuthority::new(db.users()));
    let dispatcher = Dispatcher::standard(engine.clone(), authority, admins);

    info!("Registered {} command handlers", dispatcher.len());
    info!("Listening for messages...");

    // Start update receiver
    let receiver = UpdateReceiver::new(telegram.clone());
    let mut stream = Box::pin(receiver.stream());

    // Main message loop
    loop {
        tokio::select! {
            Some(message) = stream.next() => {
                if let Some(response) = dispatcher.dispatch(&message).await {
                    if let Err(e) = telegram.reply(&message, &response).await {
                        error!("Failed to send reply: {}", e);
                    }
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    db.pool().close().await;
    Ok(())
}

async fn restore(engine: Arc<ReconciliationEngine>) {
    match engine.restore().await {
        Ok(report) if report.failed > 0 || report.missing > 0 => warn!(
            "Restore incomplete: {} activated, {} failed, {} missing",
            report.activated, report.failed, report.missing
        ),
        Ok(report) => info!(
            "Restored {} credentials for {} users",
            report.activated, report.identities
        ),
        Err(e) => error!("Restore failed: {}", e),
    }
}

async fn reconcile_periodically(engine: Arc<ReconciliationEngine>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    // The first tick fires immediately; restore runs at that point.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if let Err(e) = engine.reconcile().await {
            warn!("Periodic reconciliation failed: {}", e);
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
