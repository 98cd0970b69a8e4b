// src/domain/variant.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One purchasable SKU within a product, keyed by the origin's stable
/// numeric identifier. Prices are exact decimals, never floats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: Uuid,
    pub product_id: Uuid,
    pub remote_id: i64,
    pub title: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub available: bool,
    pub position: i32,
}

impl Variant {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        product_id: Uuid,
        remote_id: i64,
        title: String,
        sku: Option<String>,
        price: Decimal,
        compare_at_price: Option<Decimal>,
        available: bool,
        position: i32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            remote_id,
            title,
            sku,
            price,
            compare_at_price,
            available,
            position,
        }
    }
}

/// Format a price the way events display it, e.g. "$89.00"
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount)
}
