// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are the only values that cross out of the writer context to
//   UI/notification consumers: plain, owned, serializable
// - Conversion FROM domain entities only (never TO)
// - No live references into the persisted object graph

use serde::{Deserialize, Serialize};

use crate::domain::{ChangeEvent, Product, Store, VariantSnapshot};

// ============================================================================
// STORE DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreDto {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub created_at: String,
    pub last_fetched_at: Option<String>,
    pub product_count: i64,
    pub preview_images: Vec<String>,
    /// Transient process state, supplied by the sync service
    pub is_syncing: bool,
    /// Last ephemeral sync error, if the most recent attempt failed
    pub last_error: Option<SyncFailureDto>,
}

impl StoreDto {
    pub fn from_store(
        store: &Store,
        is_syncing: bool,
        last_error: Option<SyncFailureDto>,
    ) -> Self {
        Self {
            id: store.id.to_string(),
            name: store.name.clone(),
            domain: store.domain.clone(),
            created_at: store.created_at.to_rfc3339(),
            last_fetched_at: store.last_fetched_at.map(|dt| dt.to_rfc3339()),
            product_count: store.product_count,
            preview_images: store.preview_images.clone(),
            is_syncing,
            last_error,
        }
    }
}

/// Not persisted: surfaced for "last sync failed X ago" UI states
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncFailureDto {
    pub message: String,
    pub occurred_at: String,
}

// ============================================================================
// PRODUCT DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDto {
    pub id: String,
    pub remote_id: i64,
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub product_type: String,
    pub image_urls: Vec<String>,
    pub price: String,
    pub available: bool,
    pub removed: bool,
}

impl From<&Product> for ProductDto {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            remote_id: product.remote_id,
            handle: product.handle.clone(),
            title: product.title.clone(),
            vendor: product.vendor.clone(),
            product_type: product.product_type.clone(),
            image_urls: product.image_urls.clone(),
            price: product.cached_price.to_string(),
            available: product.cached_available,
            removed: product.removed,
        }
    }
}

// ============================================================================
// EVENT DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEventDto {
    pub id: String,
    pub store_id: String,
    pub occurred_at: String,
    pub kind: String,
    pub product_title: String,
    pub variant_title: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub price_change: Option<String>,
    pub magnitude: String,
    pub is_read: bool,
    pub product_remote_id: Option<i64>,
}

impl From<&ChangeEvent> for ChangeEventDto {
    fn from(event: &ChangeEvent) -> Self {
        Self {
            id: event.id.to_string(),
            store_id: event.store_id.to_string(),
            occurred_at: event.occurred_at.to_rfc3339(),
            kind: event.kind.to_string(),
            product_title: event.product_title.clone(),
            variant_title: event.variant_title.clone(),
            old_value: event.old_value.clone(),
            new_value: event.new_value.clone(),
            price_change: event.price_change.map(|d| d.to_string()),
            magnitude: event.magnitude.to_string(),
            is_read: event.is_read,
            product_remote_id: event.product_remote_id,
        }
    }
}

// ============================================================================
// HISTORY DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSnapshotDto {
    pub captured_at: String,
    pub price: String,
    pub compare_at_price: Option<String>,
    pub available: bool,
}

impl From<&VariantSnapshot> for VariantSnapshotDto {
    fn from(snapshot: &VariantSnapshot) -> Self {
        Self {
            captured_at: snapshot.captured_at.to_rfc3339(),
            price: snapshot.price.to_string(),
            compare_at_price: snapshot.compare_at_price.map(|d| d.to_string()),
            available: snapshot.available,
        }
    }
}
