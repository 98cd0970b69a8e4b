// src/repositories/store_repository.rs
//
// Store persistence. All functions take a Connection so they run equally
// inside a gateway write transaction or on a pooled read connection.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::domain::Store;
use crate::error::{AppError, AppResult};

pub struct StoreRepository;

impl StoreRepository {
    fn row_to_store(row: &Row) -> Result<Store, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let created_at_str: String = row.get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let last_fetched_str: Option<String> = row.get("last_fetched_at")?;
        let last_fetched_at = last_fetched_str
            .map(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
            })
            .transpose()?;

        let preview_json: String = row.get("preview_images")?;
        let preview_images: Vec<String> = serde_json::from_str(&preview_json)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        Ok(Store {
            id,
            name: row.get("name")?,
            domain: row.get("domain")?,
            created_at,
            last_fetched_at,
            product_count: row.get("product_count")?,
            preview_images,
        })
    }

    pub fn insert(conn: &Connection, store: &Store) -> AppResult<()> {
        let preview_json = serde_json::to_string(&store.preview_images)?;

        conn.execute(
            "INSERT INTO stores (id, name, domain, created_at, last_fetched_at, product_count, preview_images)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                store.id.to_string(),
                store.name,
                store.domain,
                store.created_at.to_rfc3339(),
                store.last_fetched_at.map(|dt| dt.to_rfc3339()),
                store.product_count,
                preview_json,
            ],
        )?;

        Ok(())
    }

    pub fn get_by_id(conn: &Connection, id: Uuid) -> AppResult<Option<Store>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, domain, created_at, last_fetched_at, product_count, preview_images
             FROM stores WHERE id = ?1",
        )?;

        match stmt.query_row(params![id.to_string()], Self::row_to_store) {
            Ok(store) => Ok(Some(store)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    pub fn list_all(conn: &Connection) -> AppResult<Vec<Store>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, domain, created_at, last_fetched_at, product_count, preview_images
             FROM stores ORDER BY name",
        )?;

        let stores: Vec<Store> = stmt
            .query_map([], Self::row_to_store)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stores)
    }

    pub fn domain_exists(conn: &Connection, domain: &str) -> AppResult<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM stores WHERE domain = ?1",
            params![domain],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn update_last_fetched(
        conn: &Connection,
        id: Uuid,
        fetched_at: DateTime<Utc>,
    ) -> AppResult<()> {
        conn.execute(
            "UPDATE stores SET last_fetched_at = ?2 WHERE id = ?1",
            params![id.to_string(), fetched_at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// Write the denormalized display fields after a successful sync.
    pub fn update_caches(
        conn: &Connection,
        id: Uuid,
        product_count: i64,
        preview_images: &[String],
    ) -> AppResult<()> {
        let preview_json = serde_json::to_string(preview_images)?;
        conn.execute(
            "UPDATE stores SET product_count = ?2, preview_images = ?3 WHERE id = ?1",
            params![id.to_string(), product_count, preview_json],
        )?;
        Ok(())
    }

    /// Hard delete; cascades to products, variants, snapshots and events.
    pub fn delete(conn: &Connection, id: Uuid) -> AppResult<()> {
        let rows_affected = conn.execute(
            "DELETE FROM stores WHERE id = ?1",
            params![id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }
}
