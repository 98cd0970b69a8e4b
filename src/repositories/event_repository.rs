// src/repositories/event_repository.rs
//
// Change event persistence.
//
// Events are immutable facts: the only UPDATE in this file touches
// `is_read`. Deletes exist solely for the retention sweep and the
// explicit "clear all" action.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{ChangeEvent, ChangeKind, Magnitude};
use crate::error::{AppError, AppResult};

/// Filter for the paged event query and for bulk mark-read.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub store_id: Option<Uuid>,
    /// Restrict to these change kinds; None means all kinds
    pub kinds: Option<Vec<ChangeKind>>,
    /// Only events at or after this instant
    pub since: Option<DateTime<Utc>>,
    pub unread_only: bool,
    pub offset: u32,
    /// 0 falls back to [`EventQuery::DEFAULT_LIMIT`]
    pub limit: u32,
}

impl EventQuery {
    pub const DEFAULT_LIMIT: u32 = 50;

    pub fn for_store(store_id: Uuid) -> Self {
        Self {
            store_id: Some(store_id),
            ..Self::default()
        }
    }

    /// WHERE clause + owned params for this filter.
    fn where_clause(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(store_id) = self.store_id {
            values.push(Box::new(store_id.to_string()));
            clauses.push(format!("store_id = ?{}", values.len()));
        }
        if let Some(kinds) = &self.kinds {
            let mut placeholders = Vec::new();
            for kind in kinds {
                values.push(Box::new(kind.to_string()));
                placeholders.push(format!("?{}", values.len()));
            }
            if placeholders.is_empty() {
                // Empty kind set matches nothing
                clauses.push("1 = 0".to_string());
            } else {
                clauses.push(format!("kind IN ({})", placeholders.join(", ")));
            }
        }
        if let Some(since) = self.since {
            values.push(Box::new(since.to_rfc3339()));
            clauses.push(format!("occurred_at >= ?{}", values.len()));
        }
        if self.unread_only {
            clauses.push("is_read = 0".to_string());
        }

        let sql = if clauses.is_empty() {
            "1 = 1".to_string()
        } else {
            clauses.join(" AND ")
        };
        (sql, values)
    }
}

pub struct EventRepository;

impl EventRepository {
    fn row_to_event(row: &Row) -> Result<ChangeEvent, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let store_id_str: String = row.get("store_id")?;
        let store_id = Uuid::parse_str(&store_id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let occurred_str: String = row.get("occurred_at")?;
        let occurred_at = DateTime::parse_from_rfc3339(&occurred_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let kind_str: String = row.get("kind")?;
        let kind = ChangeKind::from_str(&kind_str).map_err(|_| rusqlite::Error::InvalidQuery)?;

        let magnitude_str: String = row.get("magnitude")?;
        let magnitude =
            Magnitude::from_str(&magnitude_str).map_err(|_| rusqlite::Error::InvalidQuery)?;

        let price_change_str: Option<String> = row.get("price_change")?;
        let price_change = price_change_str
            .map(|s| {
                Decimal::from_str(&s)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
            })
            .transpose()?;

        Ok(ChangeEvent {
            id,
            store_id,
            occurred_at,
            kind,
            product_title: row.get("product_title")?,
            variant_title: row.get("variant_title")?,
            old_value: row.get("old_value")?,
            new_value: row.get("new_value")?,
            price_change,
            magnitude,
            is_read: row.get("is_read")?,
            product_remote_id: row.get("product_remote_id")?,
        })
    }

    pub fn insert(conn: &Connection, event: &ChangeEvent) -> AppResult<()> {
        conn.execute(
            "INSERT INTO change_events (id, store_id, occurred_at, kind, product_title,
                                        variant_title, old_value, new_value, price_change,
                                        magnitude, is_read, product_remote_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                event.id.to_string(),
                event.store_id.to_string(),
                event.occurred_at.to_rfc3339(),
                event.kind.to_string(),
                event.product_title,
                event.variant_title,
                event.old_value,
                event.new_value,
                event.price_change.map(|d| d.to_string()),
                event.magnitude.to_string(),
                event.is_read,
                event.product_remote_id,
            ],
        )?;

        Ok(())
    }

    pub fn insert_batch(conn: &Connection, events: &[ChangeEvent]) -> AppResult<()> {
        for event in events {
            Self::insert(conn, event)?;
        }
        Ok(())
    }

    /// Paged, filtered query; newest first.
    pub fn query(conn: &Connection, filter: &EventQuery) -> AppResult<Vec<ChangeEvent>> {
        let (where_sql, values) = filter.where_clause();
        let limit = if filter.limit == 0 {
            EventQuery::DEFAULT_LIMIT
        } else {
            filter.limit
        };

        let sql = format!(
            "SELECT id, store_id, occurred_at, kind, product_title, variant_title,
                    old_value, new_value, price_change, magnitude, is_read, product_remote_id
             FROM change_events
             WHERE {where_sql}
             ORDER BY occurred_at DESC
             LIMIT {limit} OFFSET {offset}",
            offset = filter.offset,
        );

        let mut stmt = conn.prepare(&sql)?;
        let events: Vec<ChangeEvent> = stmt
            .query_map(params_from_iter(values.iter()), Self::row_to_event)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(events)
    }

    pub fn unread_count(conn: &Connection, store_id: Option<Uuid>) -> AppResult<i64> {
        let count: i64 = match store_id {
            Some(store_id) => conn.query_row(
                "SELECT COUNT(*) FROM change_events WHERE store_id = ?1 AND is_read = 0",
                params![store_id.to_string()],
                |row| row.get(0),
            )?,
            None => conn.query_row(
                "SELECT COUNT(*) FROM change_events WHERE is_read = 0",
                [],
                |row| row.get(0),
            )?,
        };
        Ok(count)
    }

    pub fn mark_read(conn: &Connection, event_id: Uuid) -> AppResult<()> {
        let rows = conn.execute(
            "UPDATE change_events SET is_read = 1 WHERE id = ?1",
            params![event_id.to_string()],
        )?;

        if rows == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    /// Bulk mark-read over the same filter the paged query accepts
    /// (offset/limit are ignored here).
    pub fn mark_read_where(conn: &Connection, filter: &EventQuery) -> AppResult<usize> {
        let (where_sql, values) = filter.where_clause();
        let sql = format!("UPDATE change_events SET is_read = 1 WHERE {where_sql}");
        let updated = conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(updated)
    }

    pub fn delete_all(conn: &Connection, store_id: Option<Uuid>) -> AppResult<usize> {
        let deleted = match store_id {
            Some(store_id) => conn.execute(
                "DELETE FROM change_events WHERE store_id = ?1",
                params![store_id.to_string()],
            )?,
            None => conn.execute("DELETE FROM change_events", [])?,
        };
        Ok(deleted)
    }

    /// Retention sweep; returns the number of deleted rows.
    pub fn delete_older_than(conn: &Connection, cutoff: DateTime<Utc>) -> AppResult<usize> {
        let deleted = conn.execute(
            "DELETE FROM change_events WHERE occurred_at < ?1",
            params![cutoff.to_rfc3339()],
        )?;
        Ok(deleted)
    }
}
