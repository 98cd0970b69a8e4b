// src/main.rs

use std::sync::Arc;

use shopwatch::catalog::HttpCatalogClient;
use shopwatch::config::WatchConfig;
use shopwatch::db::get_database_path;
use shopwatch::gateway::PersistenceGateway;
use shopwatch::services::{
    HistoryService, NotificationService, NullNotificationSink, SyncScheduler, SyncService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1. INFRASTRUCTURE
    let db_path = get_database_path()?;
    let config_path = db_path.with_file_name("config.json");
    let config = WatchConfig::load(&config_path)?;

    let gateway = Arc::new(PersistenceGateway::open(&db_path)?);
    let fetcher = Arc::new(HttpCatalogClient::new()?);

    // 2. SERVICES
    let sync_service = Arc::new(SyncService::new(gateway.clone(), fetcher));
    let history_service = Arc::new(HistoryService::new(gateway.clone()));
    let notification_service = Arc::new(NotificationService::new(
        gateway.clone(),
        Arc::new(NullNotificationSink),
        config.clone(),
    ));

    // 3. SCHEDULER
    let scheduler = SyncScheduler::new(
        sync_service,
        history_service,
        notification_service,
        config,
    );
    scheduler.start();

    log::info!("Shopwatch running; database at {}", db_path.display());

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    scheduler.stop();

    Ok(())
}
