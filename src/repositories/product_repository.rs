// src/repositories/product_repository.rs
//
// Product persistence.
//
// CRITICAL: `find_by_remote_id` matches soft-deleted rows too. Upsert
// logic relies on that to revive a removed product instead of inserting
// a duplicate when the same remote id reappears.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::Product;
use crate::error::{AppError, AppResult};

const PRODUCT_COLUMNS: &str = "id, store_id, remote_id, handle, title, vendor, product_type,
                               image_urls, first_seen_at, removed, cached_price,
                               cached_available, search_key";

pub struct ProductRepository;

impl ProductRepository {
    fn row_to_product(row: &Row) -> Result<Product, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let store_id_str: String = row.get("store_id")?;
        let store_id = Uuid::parse_str(&store_id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let image_json: String = row.get("image_urls")?;
        let image_urls: Vec<String> = serde_json::from_str(&image_json)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let first_seen_str: String = row.get("first_seen_at")?;
        let first_seen_at = DateTime::parse_from_rfc3339(&first_seen_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let price_str: String = row.get("cached_price")?;
        let cached_price = Decimal::from_str(&price_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        Ok(Product {
            id,
            store_id,
            remote_id: row.get("remote_id")?,
            handle: row.get("handle")?,
            title: row.get("title")?,
            vendor: row.get("vendor")?,
            product_type: row.get("product_type")?,
            image_urls,
            first_seen_at,
            removed: row.get("removed")?,
            cached_price,
            cached_available: row.get("cached_available")?,
            search_key: row.get("search_key")?,
        })
    }

    pub fn insert(conn: &Connection, product: &Product) -> AppResult<()> {
        let image_json = serde_json::to_string(&product.image_urls)?;

        conn.execute(
            "INSERT INTO products (id, store_id, remote_id, handle, title, vendor, product_type,
                                   image_urls, first_seen_at, removed, cached_price,
                                   cached_available, search_key)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                product.id.to_string(),
                product.store_id.to_string(),
                product.remote_id,
                product.handle,
                product.title,
                product.vendor,
                product.product_type,
                image_json,
                product.first_seen_at.to_rfc3339(),
                product.removed,
                product.cached_price.to_string(),
                product.cached_available,
                product.search_key,
            ],
        )?;

        Ok(())
    }

    /// Overwrite every mutable field of an existing row.
    pub fn update(conn: &Connection, product: &Product) -> AppResult<()> {
        let image_json = serde_json::to_string(&product.image_urls)?;

        let rows = conn.execute(
            "UPDATE products
             SET handle = ?2, title = ?3, vendor = ?4, product_type = ?5, image_urls = ?6,
                 removed = ?7, cached_price = ?8, cached_available = ?9, search_key = ?10
             WHERE id = ?1",
            params![
                product.id.to_string(),
                product.handle,
                product.title,
                product.vendor,
                product.product_type,
                image_json,
                product.removed,
                product.cached_price.to_string(),
                product.cached_available,
                product.search_key,
            ],
        )?;

        if rows == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    /// Look up by the origin's stable id, soft-deleted rows included.
    pub fn find_by_remote_id(
        conn: &Connection,
        store_id: Uuid,
        remote_id: i64,
    ) -> AppResult<Option<Product>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE store_id = ?1 AND remote_id = ?2"
        ))?;

        match stmt.query_row(
            params![store_id.to_string(), remote_id],
            Self::row_to_product,
        ) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// All non-removed products of a store.
    pub fn list_active(conn: &Connection, store_id: Uuid) -> AppResult<Vec<Product>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE store_id = ?1 AND removed = 0
             ORDER BY title"
        ))?;

        let products: Vec<Product> = stmt
            .query_map(params![store_id.to_string()], Self::row_to_product)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(products)
    }

    /// Case-insensitive substring search over the denormalized search key.
    pub fn search_active(
        conn: &Connection,
        store_id: Uuid,
        needle: &str,
    ) -> AppResult<Vec<Product>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE store_id = ?1 AND removed = 0 AND search_key LIKE ?2
             ORDER BY title"
        ))?;

        let pattern = format!("%{}%", needle.to_lowercase());
        let products: Vec<Product> = stmt
            .query_map(params![store_id.to_string(), pattern], Self::row_to_product)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(products)
    }

    pub fn count_active(conn: &Connection, store_id: Uuid) -> AppResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM products WHERE store_id = ?1 AND removed = 0",
            params![store_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Preview images for store list display: first image URL of up to
    /// `limit` most recently first-seen active products.
    pub fn recent_preview_images(
        conn: &Connection,
        store_id: Uuid,
        limit: usize,
    ) -> AppResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT image_urls FROM products
             WHERE store_id = ?1 AND removed = 0 AND image_urls != '[]'
             ORDER BY first_seen_at DESC",
        )?;

        let rows: Vec<String> = stmt
            .query_map(params![store_id.to_string()], |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut previews = Vec::new();
        for image_json in rows {
            let urls: Vec<String> = serde_json::from_str(&image_json)?;
            if let Some(first) = urls.into_iter().next() {
                previews.push(first);
                if previews.len() == limit {
                    break;
                }
            }
        }

        Ok(previews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_connection, initialize_database};
    use crate::domain::Store;
    use crate::repositories::StoreRepository;

    fn setup() -> (Connection, Store) {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        let store = Store::new("Acme".to_string(), "acme.test".to_string());
        StoreRepository::insert(&conn, &store).unwrap();
        (conn, store)
    }

    fn product(store_id: Uuid, remote_id: i64) -> Product {
        Product::new(
            store_id,
            remote_id,
            format!("handle-{remote_id}"),
            format!("Product {remote_id}"),
            "Acme".to_string(),
            "Widgets".to_string(),
            vec![format!("https://cdn.test/{remote_id}.jpg")],
        )
    }

    #[test]
    fn test_find_by_remote_id_includes_removed_rows() {
        let (conn, store) = setup();

        let mut p = product(store.id, 42);
        p.removed = true;
        ProductRepository::insert(&conn, &p).unwrap();

        let found = ProductRepository::find_by_remote_id(&conn, store.id, 42)
            .unwrap()
            .expect("removed rows must still match by remote id");
        assert!(found.removed);
        assert_eq!(found.id, p.id);
    }

    #[test]
    fn test_list_active_excludes_removed() {
        let (conn, store) = setup();

        ProductRepository::insert(&conn, &product(store.id, 1)).unwrap();
        let mut gone = product(store.id, 2);
        gone.removed = true;
        ProductRepository::insert(&conn, &gone).unwrap();

        let active = ProductRepository::list_active(&conn, store.id).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].remote_id, 1);
        assert_eq!(ProductRepository::count_active(&conn, store.id).unwrap(), 1);
    }

    #[test]
    fn test_remote_id_unique_per_store() {
        let (conn, store) = setup();

        ProductRepository::insert(&conn, &product(store.id, 5)).unwrap();
        assert!(ProductRepository::insert(&conn, &product(store.id, 5)).is_err());
    }

    #[test]
    fn test_search_active_matches_search_key() {
        let (conn, store) = setup();
        ProductRepository::insert(&conn, &product(store.id, 9)).unwrap();

        let hits = ProductRepository::search_active(&conn, store.id, "Product 9").unwrap();
        assert_eq!(hits.len(), 1);

        let misses = ProductRepository::search_active(&conn, store.id, "nothing").unwrap();
        assert!(misses.is_empty());
    }

    #[test]
    fn test_recent_preview_images_caps_at_limit() {
        let (conn, store) = setup();
        for remote_id in 1..=5 {
            ProductRepository::insert(&conn, &product(store.id, remote_id)).unwrap();
        }

        let previews = ProductRepository::recent_preview_images(&conn, store.id, 3).unwrap();
        assert_eq!(previews.len(), 3);
    }
}
