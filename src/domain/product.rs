// src/domain/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::variant::Variant;

/// One catalog item, keyed by the origin's stable numeric identifier.
///
/// Products are never hard-deleted while history exists: when a product
/// disappears from a fetch it is soft-deleted via `removed`, and revived
/// on the same row if the same remote id reappears later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub remote_id: i64,
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub product_type: String,
    /// Ordered image URLs as last fetched
    pub image_urls: Vec<String>,
    pub first_seen_at: DateTime<Utc>,
    pub removed: bool,
    /// Denormalized: minimum variant price, 0 when the product has no variants
    pub cached_price: Decimal,
    /// Denormalized: true when any variant is available
    pub cached_available: bool,
    /// Denormalized: lowercased text blob for substring search
    pub search_key: String,
}

impl Product {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store_id: Uuid,
        remote_id: i64,
        handle: String,
        title: String,
        vendor: String,
        product_type: String,
        image_urls: Vec<String>,
    ) -> Self {
        let mut product = Self {
            id: Uuid::new_v4(),
            store_id,
            remote_id,
            handle,
            title,
            vendor,
            product_type,
            image_urls,
            first_seen_at: Utc::now(),
            removed: false,
            cached_price: Decimal::ZERO,
            cached_available: false,
            search_key: String::new(),
        };
        product.search_key = product.make_search_key();
        product
    }

    /// Recompute the denormalized cache fields from the current variant set.
    ///
    /// Must be called after any variant mutation; the caches are a pure
    /// function of the variants and are never adjusted by hand.
    pub fn recompute_caches(&mut self, variants: &[Variant]) {
        self.cached_price = variants
            .iter()
            .map(|v| v.price)
            .min()
            .unwrap_or(Decimal::ZERO);
        self.cached_available = variants.iter().any(|v| v.available);
        self.search_key = self.make_search_key();
    }

    fn make_search_key(&self) -> String {
        format!(
            "{} {} {} {}",
            self.title, self.vendor, self.product_type, self.handle
        )
        .to_lowercase()
    }
}
