// src/services/notification_service.rs
//
// Event/Notification Bridge
//
// - Classifies a batch of change events into a single priority (max-wins)
// - Applies user thresholds BEFORE priority and dispatch; an event below
//   threshold stays persisted and visible in history, it just isn't
//   notified
// - The OS notification collaborator sits behind NotificationSink and
//   owns permission, formatting and delivery
// - Also the read side for the UI: paged event queries, unread counts,
//   mark-read, clear-all

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::ChangeEventDto;
use crate::config::{PriceThreshold, WatchConfig};
use crate::domain::{ChangeEvent, ChangeKind, Priority};
use crate::error::AppResult;
use crate::gateway::PersistenceGateway;
use crate::repositories::{EventQuery, EventRepository};

/// What gets handed to the OS-notification collaborator
#[derive(Debug, Clone)]
pub struct NotificationBatch {
    pub store_id: Uuid,
    pub store_name: String,
    pub priority: Priority,
    pub events: Vec<ChangeEventDto>,
}

/// External delivery collaborator. Receives already-filtered,
/// already-prioritized batches as plain values.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, batch: NotificationBatch);
}

/// Sink that drops everything; default for headless runs and tests.
pub struct NullNotificationSink;

impl NotificationSink for NullNotificationSink {
    fn deliver(&self, batch: NotificationBatch) {
        log::debug!(
            "Discarding notification batch for {} ({} events)",
            batch.store_name,
            batch.events.len()
        );
    }
}

/// Batch priority: the maximum-priority event wins. None for an empty batch.
pub fn determine_priority(events: &[ChangeEvent]) -> Option<Priority> {
    events.iter().map(|e| e.priority()).max()
}

pub struct NotificationService {
    gateway: Arc<PersistenceGateway>,
    sink: Arc<dyn NotificationSink>,
    config: WatchConfig,
}

impl NotificationService {
    pub fn new(
        gateway: Arc<PersistenceGateway>,
        sink: Arc<dyn NotificationSink>,
        config: WatchConfig,
    ) -> Self {
        Self {
            gateway,
            sink,
            config,
        }
    }

    /// Filter a freshly committed batch by the user's thresholds and hand
    /// the remainder to the sink. No-op when nothing survives filtering.
    pub fn dispatch(&self, store_id: Uuid, store_name: &str, events: &[ChangeEvent]) {
        let notifiable: Vec<&ChangeEvent> = events
            .iter()
            .filter(|e| self.passes_threshold(e))
            .collect();

        let Some(priority) = notifiable.iter().map(|e| e.priority()).max() else {
            return;
        };

        let batch = NotificationBatch {
            store_id,
            store_name: store_name.to_string(),
            priority,
            events: notifiable.iter().map(|e| ChangeEventDto::from(*e)).collect(),
        };

        log::info!(
            "Dispatching {} events for {} at priority {:?}",
            batch.events.len(),
            store_name,
            priority
        );
        self.sink.deliver(batch);
    }

    /// Per-kind toggle plus, for price kinds, the configured minimum
    /// dollar amount or percentage bucket.
    fn passes_threshold(&self, event: &ChangeEvent) -> bool {
        let toggles = &self.config.notify;
        let enabled = match event.kind {
            ChangeKind::PriceDropped => toggles.price_dropped,
            ChangeKind::PriceIncreased => toggles.price_increased,
            ChangeKind::BackInStock => toggles.back_in_stock,
            ChangeKind::OutOfStock => toggles.out_of_stock,
            ChangeKind::NewProduct => toggles.new_product,
            ChangeKind::ProductRemoved => toggles.product_removed,
            ChangeKind::ImagesChanged => toggles.images_changed,
        };
        if !enabled {
            return false;
        }

        let threshold = match event.kind {
            ChangeKind::PriceDropped => &self.config.price_drop_threshold,
            ChangeKind::PriceIncreased => &self.config.price_increase_threshold,
            _ => return true,
        };

        match threshold {
            None => true,
            Some(PriceThreshold::AbsoluteDollars(min)) => event
                .price_change
                .map(|delta| delta.abs() >= *min)
                .unwrap_or(false),
            Some(PriceThreshold::MagnitudeAtLeast(min)) => event.magnitude >= *min,
        }
    }

    // ------------------------------------------------------------------
    // Read side (UI collaborator)
    // ------------------------------------------------------------------

    pub fn events(&self, filter: &EventQuery) -> AppResult<Vec<ChangeEventDto>> {
        let conn = self.gateway.read()?;
        let events = EventRepository::query(&conn, filter)?;
        Ok(events.iter().map(ChangeEventDto::from).collect())
    }

    pub fn unread_count(&self, store_id: Option<Uuid>) -> AppResult<i64> {
        let conn = self.gateway.read()?;
        EventRepository::unread_count(&conn, store_id)
    }

    pub async fn mark_read(&self, event_id: Uuid) -> AppResult<()> {
        self.gateway
            .write(move |tx| EventRepository::mark_read(tx, event_id))
            .await
    }

    pub async fn mark_read_where(&self, filter: EventQuery) -> AppResult<usize> {
        self.gateway
            .write(move |tx| EventRepository::mark_read_where(tx, &filter))
            .await
    }

    pub async fn mark_all_read(&self) -> AppResult<usize> {
        self.mark_read_where(EventQuery::default()).await
    }

    pub async fn delete_all_events(&self, store_id: Option<Uuid>) -> AppResult<usize> {
        self.gateway
            .write(move |tx| EventRepository::delete_all(tx, store_id))
            .await
    }

    /// Event retention sweep, invoked per background cycle when enabled.
    pub async fn delete_events_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<usize> {
        let deleted = self
            .gateway
            .write(move |tx| EventRepository::delete_older_than(tx, cutoff))
            .await?;

        if deleted > 0 {
            log::info!("Swept {} change events past retention", deleted);
        }
        Ok(deleted)
    }
}
