// src/services/sync_service.rs
//
// Sync Orchestrator
//
// State machine per store: idle -> syncing -> (idle | rate_limited).
//
// CRITICAL RULES:
// - At most one concurrent sync per store (reentrancy guard is a no-op,
//   not an error)
// - A local rate gate rejects syncs too soon after the last successful
//   fetch, before the catalog client is ever invoked
// - The whole reconcile commits in one gateway transaction; a fetch or
//   storage failure leaves last_fetched_at untouched so the next allowed
//   attempt can come sooner
// - The syncing flag and the ephemeral error live outside the gateway and
//   carry their own lock; UI reads them from another execution context

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::application::dto::{ProductDto, StoreDto, SyncFailureDto};
use crate::catalog::CatalogFetcher;
use crate::config::MIN_SYNC_INTERVAL_MINUTES;
use crate::domain::{validate_store, ChangeEvent, Store};
use crate::error::{AppError, AppResult, SyncError};
use crate::gateway::PersistenceGateway;
use crate::repositories::{EventRepository, ProductRepository, StoreRepository};
use crate::services::diff_service;

/// Result of a sync request that was not rejected by the rate gate
#[derive(Debug)]
pub enum SyncOutcome {
    /// Sync ran; these events were committed (possibly none)
    Completed(Vec<ChangeEvent>),
    /// A sync for this store was already in flight; nothing was done
    AlreadySyncing,
}

/// Per-store outcome of a `sync_all_stores` pass
#[derive(Debug)]
pub struct StoreSyncReport {
    pub store_id: Uuid,
    pub store_name: String,
    pub outcome: Result<SyncOutcome, SyncError>,
}

/// Transient, never-persisted sync state for one store
#[derive(Debug, Clone, Default)]
struct StoreSyncState {
    syncing: bool,
    last_error: Option<SyncFailure>,
}

#[derive(Debug, Clone)]
struct SyncFailure {
    message: String,
    occurred_at: DateTime<Utc>,
}

pub struct SyncService {
    gateway: Arc<PersistenceGateway>,
    fetcher: Arc<dyn CatalogFetcher>,
    state: Mutex<HashMap<Uuid, StoreSyncState>>,
}

impl SyncService {
    pub fn new(gateway: Arc<PersistenceGateway>, fetcher: Arc<dyn CatalogFetcher>) -> Self {
        Self {
            gateway,
            fetcher,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Sync one store now, subject to the reentrancy guard and rate gate.
    pub async fn sync_store(&self, store_id: Uuid) -> Result<SyncOutcome, SyncError> {
        let store = self
            .load_store(store_id)
            .map_err(|e| SyncError::Storage(e.to_string()))?
            .ok_or(SyncError::StoreNotFound)?;

        // Guard + gate under one lock so two callers can't both pass
        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| SyncError::Storage("Sync state lock poisoned".to_string()))?;
            let entry = state.entry(store_id).or_default();

            if entry.syncing {
                return Ok(SyncOutcome::AlreadySyncing);
            }

            if let Some(retry_after_secs) = rate_gate_remaining(&store, Utc::now()) {
                return Err(SyncError::RateLimited { retry_after_secs });
            }

            entry.syncing = true;
        }

        let result = self.run_sync(&store).await;

        {
            let mut state = self
                .state
                .lock()
                .map_err(|_| SyncError::Storage("Sync state lock poisoned".to_string()))?;
            let entry = state.entry(store_id).or_default();
            entry.syncing = false;
            entry.last_error = match &result {
                Ok(_) => None,
                Err(e) => Some(SyncFailure {
                    message: e.to_string(),
                    occurred_at: Utc::now(),
                }),
            };
        }

        result.map(SyncOutcome::Completed)
    }

    /// Fetch, reconcile and commit in one transaction.
    async fn run_sync(&self, store: &Store) -> Result<Vec<ChangeEvent>, SyncError> {
        let fetched = self
            .fetcher
            .fetch_all_products(&store.domain)
            .await
            .map_err(SyncError::Fetch)?;

        log::debug!(
            "Reconciling {} fetched products for {}",
            fetched.len(),
            store.name
        );

        let store_snapshot = store.clone();
        let events = self
            .gateway
            .write(move |tx| {
                let events = diff_service::reconcile(tx, &store_snapshot, &fetched)?;
                EventRepository::insert_batch(tx, &events)?;
                StoreRepository::update_last_fetched(tx, store_snapshot.id, Utc::now())?;
                Ok(events)
            })
            .await
            .map_err(|e| SyncError::Storage(e.to_string()))?;

        log::info!("Synced {}: {} change events", store.name, events.len());
        Ok(events)
    }

    /// Sync every store sequentially; one store's failure never aborts
    /// the rest.
    pub async fn sync_all_stores(&self) -> AppResult<Vec<StoreSyncReport>> {
        let stores = {
            let conn = self.gateway.read()?;
            StoreRepository::list_all(&conn)?
        };

        let mut reports = Vec::with_capacity(stores.len());
        for store in stores {
            let outcome = self.sync_store(store.id).await;
            if let Err(e) = &outcome {
                log::warn!("Sync failed for {}: {}", store.name, e);
            }
            reports.push(StoreSyncReport {
                store_id: store.id,
                store_name: store.name,
                outcome,
            });
        }

        Ok(reports)
    }

    /// Add a store after a validating probe fetch. The row is persisted
    /// only if the probe succeeds, so dead domains never become stores.
    pub async fn add_store(&self, name: String, domain: String) -> AppResult<Uuid> {
        let store = Store::new(name, domain);
        validate_store(&store).map_err(AppError::Other)?;

        {
            let conn = self.gateway.read()?;
            if StoreRepository::domain_exists(&conn, &store.domain)? {
                return Err(AppError::Other(format!(
                    "Store domain already monitored: {}",
                    store.domain
                )));
            }
        }

        self.fetcher.probe(&store.domain).await?;

        let store_id = store.id;
        self.gateway
            .write(move |tx| StoreRepository::insert(tx, &store))
            .await?;

        log::info!("Added store {}", store_id);
        Ok(store_id)
    }

    /// Delete a store and, by cascade, all its products, variants,
    /// snapshots and events.
    pub async fn delete_store(&self, store_id: Uuid) -> AppResult<()> {
        self.gateway
            .write(move |tx| StoreRepository::delete(tx, store_id))
            .await?;

        if let Ok(mut state) = self.state.lock() {
            state.remove(&store_id);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read side (UI collaborator)
    // ------------------------------------------------------------------

    pub fn list_stores(&self) -> AppResult<Vec<StoreDto>> {
        let conn = self.gateway.read()?;
        let stores = StoreRepository::list_all(&conn)?;

        let state = self
            .state
            .lock()
            .map_err(|_| AppError::Pool("Sync state lock poisoned".to_string()))?;

        Ok(stores
            .iter()
            .map(|store| {
                let entry = state.get(&store.id);
                StoreDto::from_store(
                    store,
                    entry.map(|s| s.syncing).unwrap_or(false),
                    entry.and_then(|s| s.last_error.as_ref()).map(|f| {
                        SyncFailureDto {
                            message: f.message.clone(),
                            occurred_at: f.occurred_at.to_rfc3339(),
                        }
                    }),
                )
            })
            .collect())
    }

    pub fn is_syncing(&self, store_id: Uuid) -> bool {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.get(&store_id).map(|s| s.syncing))
            .unwrap_or(false)
    }

    pub fn last_error(&self, store_id: Uuid) -> Option<SyncFailureDto> {
        self.state
            .lock()
            .ok()
            .and_then(|state| {
                state.get(&store_id).and_then(|s| s.last_error.clone())
            })
            .map(|f| SyncFailureDto {
                message: f.message,
                occurred_at: f.occurred_at.to_rfc3339(),
            })
    }

    pub fn list_products(&self, store_id: Uuid) -> AppResult<Vec<ProductDto>> {
        let conn = self.gateway.read()?;
        let products = ProductRepository::list_active(&conn, store_id)?;
        Ok(products.iter().map(ProductDto::from).collect())
    }

    pub fn search_products(&self, store_id: Uuid, needle: &str) -> AppResult<Vec<ProductDto>> {
        let conn = self.gateway.read()?;
        let products = ProductRepository::search_active(&conn, store_id, needle)?;
        Ok(products.iter().map(ProductDto::from).collect())
    }

    fn load_store(&self, store_id: Uuid) -> AppResult<Option<Store>> {
        let conn = self.gateway.read()?;
        StoreRepository::get_by_id(&conn, store_id)
    }
}

/// Seconds until the local gate opens, or None when a sync may proceed.
/// The gate keys off the last *successful* fetch; failed attempts leave
/// it untouched.
fn rate_gate_remaining(store: &Store, now: DateTime<Utc>) -> Option<u64> {
    let last = store.last_fetched_at?;
    let gate = Duration::minutes(MIN_SYNC_INTERVAL_MINUTES as i64);
    let since = now - last;
    if since < gate {
        Some((gate - since).num_seconds().max(0) as u64)
    } else {
        None
    }
}
