// src/services/history_service.rs
//
// History Tracker - append-only price/availability snapshots
//
// Snapshots are recorded only on actual deltas (the diff engine calls
// `record_snapshot` when it fires a price or availability event), never
// on every pass; growth is bounded by real change frequency plus the
// age-based retention sweep.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::dto::VariantSnapshotDto;
use crate::domain::VariantSnapshot;
use crate::error::AppResult;
use crate::gateway::PersistenceGateway;
use crate::repositories::SnapshotRepository;

/// Append one snapshot inside the caller's transaction.
pub fn record_snapshot(
    conn: &Connection,
    variant_id: Uuid,
    price: Decimal,
    compare_at_price: Option<Decimal>,
    available: bool,
) -> AppResult<()> {
    let snapshot = VariantSnapshot::new(variant_id, price, compare_at_price, available);
    SnapshotRepository::insert(conn, &snapshot)
}

pub struct HistoryService {
    gateway: Arc<PersistenceGateway>,
}

impl HistoryService {
    pub fn new(gateway: Arc<PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Age-based retention sweep; returns how many snapshots were pruned.
    pub async fn prune_snapshots(&self, older_than: DateTime<Utc>) -> AppResult<usize> {
        let pruned = self
            .gateway
            .write(move |tx| SnapshotRepository::delete_older_than(tx, older_than))
            .await?;

        if pruned > 0 {
            log::info!("Pruned {} variant snapshots", pruned);
        }
        Ok(pruned)
    }

    /// Read-side history for one variant, oldest first.
    pub fn variant_history(&self, variant_id: Uuid) -> AppResult<Vec<VariantSnapshotDto>> {
        let conn = self.gateway.read()?;
        let snapshots = SnapshotRepository::list_by_variant(&conn, variant_id)?;
        Ok(snapshots.iter().map(VariantSnapshotDto::from).collect())
    }
}
