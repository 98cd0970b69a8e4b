// src/services/scheduler.rs
//
// Background scheduling loop
//
// CRITICAL RULES:
// - One long-lived, cancellable task with an explicit start/stop
//   lifecycle (no recursive timers)
// - Runs sync_all_stores every interval (floor enforced in config),
//   dispatches emitted events to the notification bridge, then runs the
//   enabled retention sweeps
// - Scheduled syncs never surface modal errors; failures are logged and
//   live on as per-store ephemeral state for the UI

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::WatchConfig;
use crate::services::history_service::HistoryService;
use crate::services::notification_service::NotificationService;
use crate::services::sync_service::{SyncOutcome, SyncService};

pub struct SyncScheduler {
    sync_service: Arc<SyncService>,
    history_service: Arc<HistoryService>,
    notification_service: Arc<NotificationService>,
    config: WatchConfig,
    task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SyncScheduler {
    pub fn new(
        sync_service: Arc<SyncService>,
        history_service: Arc<HistoryService>,
        notification_service: Arc<NotificationService>,
        config: WatchConfig,
    ) -> Self {
        Self {
            sync_service,
            history_service,
            notification_service,
            config,
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the loop. Idempotent: a running loop is restarted.
    pub fn start(&self) {
        self.stop();

        let sync_service = Arc::clone(&self.sync_service);
        let history_service = Arc::clone(&self.history_service);
        let notification_service = Arc::clone(&self.notification_service);
        let config = self.config.clone();

        let task = tokio::spawn(async move {
            let interval =
                Duration::from_secs(config.effective_sync_interval_minutes() * 60);
            log::info!(
                "Background sync loop started, interval {}s",
                interval.as_secs()
            );

            loop {
                tokio::time::sleep(interval).await;

                let reports = match sync_service.sync_all_stores().await {
                    Ok(reports) => reports,
                    Err(e) => {
                        log::warn!("Scheduled sync cycle failed to start: {}", e);
                        continue;
                    }
                };

                for report in reports {
                    if let Ok(SyncOutcome::Completed(events)) = report.outcome {
                        if !events.is_empty() {
                            notification_service.dispatch(
                                report.store_id,
                                &report.store_name,
                                &events,
                            );
                        }
                    }
                }

                run_retention(&config, &history_service, &notification_service).await;
            }
        });

        if let Ok(mut handle) = self.task_handle.lock() {
            *handle = Some(task);
        }
    }

    /// Cooperative cancellation: an in-flight fetch is abandoned, and its
    /// partial results are discarded with it.
    pub fn stop(&self) {
        if let Ok(mut handle) = self.task_handle.lock() {
            if let Some(task) = handle.take() {
                task.abort();
                log::info!("Background sync loop stopped");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .lock()
            .map(|handle| handle.as_ref().map(|t| !t.is_finished()).unwrap_or(false))
            .unwrap_or(false)
    }
}

async fn run_retention(
    config: &WatchConfig,
    history_service: &HistoryService,
    notification_service: &NotificationService,
) {
    if config.event_retention.enabled {
        let cutoff = Utc::now() - ChronoDuration::days(config.event_retention.days as i64);
        if let Err(e) = notification_service.delete_events_older_than(cutoff).await {
            log::warn!("Event retention sweep failed: {}", e);
        }
    }

    if config.snapshot_retention.enabled {
        let cutoff = Utc::now() - ChronoDuration::days(config.snapshot_retention.days as i64);
        if let Err(e) = history_service.prune_snapshots(cutoff).await {
            log::warn!("Snapshot retention sweep failed: {}", e);
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MockCatalogFetcher;
    use crate::gateway::PersistenceGateway;
    use crate::services::notification_service::{NotificationService, NullNotificationSink};

    fn scheduler() -> (tempfile::TempDir, SyncScheduler) {
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(PersistenceGateway::open(&dir.path().join("test.db")).unwrap());
        let config = WatchConfig::default();

        let sync_service = Arc::new(SyncService::new(
            Arc::clone(&gateway),
            Arc::new(MockCatalogFetcher::new()),
        ));
        let history_service = Arc::new(HistoryService::new(Arc::clone(&gateway)));
        let notification_service = Arc::new(NotificationService::new(
            gateway,
            Arc::new(NullNotificationSink),
            config.clone(),
        ));

        (
            dir,
            SyncScheduler::new(sync_service, history_service, notification_service, config),
        )
    }

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let (_dir, scheduler) = scheduler();
        assert!(!scheduler.is_running());

        scheduler.start();
        assert!(scheduler.is_running());

        // Restart replaces the running task rather than stacking a second
        scheduler.start();
        assert!(scheduler.is_running());

        scheduler.stop();
        assert!(!scheduler.is_running());

        // Stop on an idle scheduler is a no-op
        scheduler.stop();
        assert!(!scheduler.is_running());
    }
}
