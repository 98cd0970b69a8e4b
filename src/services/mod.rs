// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod diff_service;
pub mod history_service;
pub mod notification_service;
pub mod scheduler;
pub mod sync_service;

#[cfg(test)]
mod diff_service_tests;

// Re-export all services and their types
pub use diff_service::reconcile;

pub use history_service::HistoryService;

pub use notification_service::{
    determine_priority, NotificationBatch, NotificationService, NotificationSink,
    NullNotificationSink,
};

pub use scheduler::SyncScheduler;

pub use sync_service::{StoreSyncReport, SyncOutcome, SyncService};
