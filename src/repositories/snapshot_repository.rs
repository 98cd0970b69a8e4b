// src/repositories/snapshot_repository.rs
//
// Price/availability history. Rows are append-only: there is no update
// here by design, only insert, list and the age-based retention delete.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::VariantSnapshot;
use crate::error::AppResult;

pub struct SnapshotRepository;

impl SnapshotRepository {
    fn row_to_snapshot(row: &Row) -> Result<VariantSnapshot, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let variant_id_str: String = row.get("variant_id")?;
        let variant_id = Uuid::parse_str(&variant_id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let captured_str: String = row.get("captured_at")?;
        let captured_at = DateTime::parse_from_rfc3339(&captured_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let price_str: String = row.get("price")?;
        let price = Decimal::from_str(&price_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let compare_str: Option<String> = row.get("compare_at_price")?;
        let compare_at_price = compare_str
            .map(|s| {
                Decimal::from_str(&s)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
            })
            .transpose()?;

        Ok(VariantSnapshot {
            id,
            variant_id,
            captured_at,
            price,
            compare_at_price,
            available: row.get("available")?,
        })
    }

    pub fn insert(conn: &Connection, snapshot: &VariantSnapshot) -> AppResult<()> {
        conn.execute(
            "INSERT INTO variant_snapshots (id, variant_id, captured_at, price, compare_at_price, available)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                snapshot.id.to_string(),
                snapshot.variant_id.to_string(),
                snapshot.captured_at.to_rfc3339(),
                snapshot.price.to_string(),
                snapshot.compare_at_price.map(|p| p.to_string()),
                snapshot.available,
            ],
        )?;

        Ok(())
    }

    /// History for one variant, oldest first (charting order).
    pub fn list_by_variant(conn: &Connection, variant_id: Uuid) -> AppResult<Vec<VariantSnapshot>> {
        let mut stmt = conn.prepare(
            "SELECT id, variant_id, captured_at, price, compare_at_price, available
             FROM variant_snapshots WHERE variant_id = ?1
             ORDER BY captured_at",
        )?;

        let snapshots: Vec<VariantSnapshot> = stmt
            .query_map(params![variant_id.to_string()], Self::row_to_snapshot)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(snapshots)
    }

    /// Retention sweep; returns the number of pruned rows.
    pub fn delete_older_than(conn: &Connection, cutoff: DateTime<Utc>) -> AppResult<usize> {
        let deleted = conn.execute(
            "DELETE FROM variant_snapshots WHERE captured_at < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(deleted)
    }
}
