// src/lib.rs
// Shopwatch - Local-first storefront catalog watcher
//
// Architecture:
// - Single writer: all mutations flow through the persistence gateway,
//   one transaction per sync pass
// - Diff-driven: the catalog endpoint is the source of truth; local state
//   exists to detect what changed between fetches
// - Local-first: everything lives in one SQLite file, no accounts
// - Explicit: no implicit behavior, no magic

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod repositories;

// ============================================================================
// CATALOG + ORCHESTRATION
// ============================================================================

pub mod catalog;
pub mod services;

// ============================================================================
// APPLICATION LAYER (UI boundary)
// ============================================================================

pub mod application;

// ============================================================================
// PUBLIC API
// ============================================================================

pub use domain::{
    classify_magnitude,
    format_money,
    validate_store,
    // Events
    ChangeEvent,
    ChangeKind,
    Magnitude,
    Priority,
    // Entities
    Product,
    Store,
    Variant,
    VariantSnapshot,
};

pub use error::{AppError, AppResult, FetchError, SyncError};

pub use catalog::{CatalogFetcher, HttpCatalogClient, RemoteProduct, RemoteVariant};

pub use gateway::PersistenceGateway;

pub use config::WatchConfig;

pub use services::{
    HistoryService, NotificationService, NotificationSink, NullNotificationSink, SyncOutcome,
    SyncScheduler, SyncService,
};
