//! smsgate - SMS gateway control panel entry point

use anyhow::Result;
use smsgate_api::AppState;
use smsgate_common::config::Config;
use smsgate_core::{
    AntiSpamThrottle, CampaignEngine, CampaignWorker, DbSpamLog, DeliveryReconciler,
    DispatchEngine, GatewayClient,
};
use smsgate_storage::db::DatabasePool;
use smsgate_storage::repository::{CampaignRepository, SettingsRepository, SpamLogRepository};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first so logging can use the configured filter
    let config = Config::load()?;
    init_logging(&config.logging.filter);

    info!("Starting smsgate...");

    // Initialize database
    let db_pool = DatabasePool::new(&config.database).await?;
    db_pool.migrate().await?;

    let pool = db_pool.pool().clone();

    // Anti-spam throttle with the interval from the settings table
    let settings = SettingsRepository::new(pool.clone());
    let interval_secs = settings
        .spam_interval(config.sms.spam_interval_secs)
        .await
        .unwrap_or(config.sms.spam_interval_secs);
    let throttle = Arc::new(AntiSpamThrottle::new(
        Arc::new(DbSpamLog::new(SpamLogRepository::new(pool.clone()))),
        interval_secs,
    ));
    info!("Anti-spam interval: {}s", interval_secs);

    // Gateway client shared by ad-hoc and campaign dispatch
    let client = GatewayClient::new(&config.sms);

    // Engines
    let dispatch = Arc::new(DispatchEngine::new(
        pool.clone(),
        throttle.clone(),
        client.clone(),
        config.sms.bulk_send_delay_ms,
    ));
    let campaigns = Arc::new(CampaignEngine::new(pool.clone(), client));
    let reconciler = Arc::new(DeliveryReconciler::new(pool.clone()));

    // Server-side campaign worker
    let worker_handle = if config.worker.enabled {
        let worker = CampaignWorker::new(
            campaigns.clone(),
            CampaignRepository::new(pool.clone()),
            config.worker.poll_interval_secs,
        );
        Some(tokio::spawn(async move {
            worker.run().await;
        }))
    } else {
        info!("Campaign worker disabled");
        None
    };

    // API server
    let state = Arc::new(AppState {
        db_pool,
        dispatch,
        campaigns,
        reconciler,
        throttle,
    });

    let app = smsgate_api::create_router(state);
    let bind = format!("{}:{}", config.server.bind_address, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!("Starting API server on {}", bind);

    let api_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    info!("smsgate started successfully");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    api_handle.abort();
    if let Some(handle) = worker_handle {
        handle.abort();
    }

    info!("smsgate shutdown complete");

    Ok(())
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter.to_string()));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .init();
}
