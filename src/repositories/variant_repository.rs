// src/repositories/variant_repository.rs

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::Variant;
use crate::error::{AppError, AppResult};

pub struct VariantRepository;

impl VariantRepository {
    fn row_to_variant(row: &Row) -> Result<Variant, rusqlite::Error> {
        let id_str: String = row.get("id")?;
        let id = Uuid::parse_str(&id_str)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

        let product_id_str: String = row.get("product_id")?;
        let product_id = Uuid::parse_str(&product_id_str)
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

        Ok(Variant {
            id,
            product_id,
            remote_id: row.get("remote_id")?,
            title: row.get("title")?,
            sku: row.get("sku")?,
            price,
            compare_at_price,
            available: row.get("available")?,
            position: row.get("position")?,
        })
    }

    pub fn insert(conn: &Connection, variant: &Variant) -> AppResult<()> {
        conn.execute(
            "INSERT INTO variants (id, product_id, remote_id, title, sku, price,
                                   compare_at_price, available, position)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                variant.id.to_string(),
                variant.product_id.to_string(),
                variant.remote_id,
                variant.title,
                variant.sku,
                variant.price.to_string(),
                variant.compare_at_price.map(|p| p.to_string()),
                variant.available,
                variant.position,
            ],
        )?;

        Ok(())
    }

    pub fn update(conn: &Connection, variant: &Variant) -> AppResult<()> {
        let rows = conn.execute(
            "UPDATE variants
             SET title = ?2, sku = ?3, price = ?4, compare_at_price = ?5,
                 available = ?6, position = ?7
             WHERE id = ?1",
            params![
                variant.id.to_string(),
                variant.title,
                variant.sku,
                variant.price.to_string(),
                variant.compare_at_price.map(|p| p.to_string()),
                variant.available,
                variant.position,
            ],
        )?;

        if rows == 0 {
            return Err(AppError::NotFound);
        }

        Ok(())
    }

    pub fn list_by_product(conn: &Connection, product_id: Uuid) -> AppResult<Vec<Variant>> {
        let mut stmt = conn.prepare(
            "SELECT id, product_id, remote_id, title, sku, price, compare_at_price,
                    available, position
             FROM variants WHERE product_id = ?1
             ORDER BY position, remote_id",
        )?;

        let variants: Vec<Variant> = stmt
            .query_map(params![product_id.to_string()], Self::row_to_variant)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(variants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_connection, initialize_database};
    use crate::domain::{Product, Store};
    use crate::repositories::{ProductRepository, StoreRepository};

    fn setup() -> (Connection, Product) {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        let store = Store::new("Acme".to_string(), "acme.test".to_string());
        StoreRepository::insert(&conn, &store).unwrap();
        let product = Product::new(
            store.id,
            1,
            "h".to_string(),
            "P".to_string(),
            "V".to_string(),
            "T".to_string(),
            vec![],
        );
        ProductRepository::insert(&conn, &product).unwrap();
        (conn, product)
    }

    #[test]
    fn test_insert_update_round_trip() {
        let (conn, product) = setup();

        let mut variant = Variant::new(
            product.id,
            11,
            "M".to_string(),
            Some("SKU-M".to_string()),
            Decimal::from(110),
            Some(Decimal::from(130)),
            true,
            1,
        );
        VariantRepository::insert(&conn, &variant).unwrap();

        variant.price = Decimal::from(89);
        variant.available = false;
        VariantRepository::update(&conn, &variant).unwrap();

        let loaded = VariantRepository::list_by_product(&conn, product.id).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].price, Decimal::from(89));
        assert!(!loaded[0].available);
        assert_eq!(loaded[0].compare_at_price, Some(Decimal::from(130)));
    }

    #[test]
    fn test_ordering_follows_position() {
        let (conn, product) = setup();

        for (remote_id, position) in [(3, 2), (1, 3), (2, 1)] {
            let variant = Variant::new(
                product.id,
                remote_id,
                format!("V{remote_id}"),
                None,
                Decimal::from(10),
                None,
                true,
                position,
            );
            VariantRepository::insert(&conn, &variant).unwrap();
        }

        let loaded = VariantRepository::list_by_product(&conn, product.id).unwrap();
        let positions: Vec<i32> = loaded.iter().map(|v| v.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }
}
