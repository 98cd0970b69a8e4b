// src/domain/store.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A monitored catalog origin.
///
/// `product_count` and `preview_images` are denormalized display fields,
/// recomputed after every successful sync (never hand-maintained).
/// The transient syncing flag lives in the sync service, not here: it is
/// process state, not persisted state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub product_count: i64,
    /// Up to 3 image URLs for list display
    pub preview_images: Vec<String>,
}

impl Store {
    pub fn new(name: String, domain: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            domain,
            created_at: Utc::now(),
            last_fetched_at: None,
            product_count: 0,
            preview_images: Vec::new(),
        }
    }
}

/// Validate a store before persisting it
pub fn validate_store(store: &Store) -> Result<(), String> {
    if store.name.trim().is_empty() {
        return Err("Store name must not be empty".to_string());
    }
    if store.domain.trim().is_empty() {
        return Err("Store domain must not be empty".to_string());
    }
    if store.domain.contains('/') || store.domain.contains(' ') {
        return Err(format!("Invalid store domain: {}", store.domain));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_defaults() {
        let store = Store::new("Acme".to_string(), "acme.example.com".to_string());
        assert!(store.last_fetched_at.is_none());
        assert_eq!(store.product_count, 0);
        assert!(store.preview_images.is_empty());
    }

    #[test]
    fn test_validate_rejects_url_as_domain() {
        let store = Store::new("Acme".to_string(), "https://acme.example.com".to_string());
        assert!(validate_store(&store).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        let store = Store::new("  ".to_string(), "acme.example.com".to_string());
        assert!(validate_store(&store).is_err());
    }
}
