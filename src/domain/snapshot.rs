// src/domain/snapshot.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An immutable point-in-time record of a variant's price and availability.
///
/// Append-only: snapshots are created when a sync detects an actual price
/// or availability delta (not on every pass) and are never mutated. They
/// are removed only by the age-based retention sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSnapshot {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub captured_at: DateTime<Utc>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub available: bool,
}

impl VariantSnapshot {
    pub fn new(
        variant_id: Uuid,
        price: Decimal,
        compare_at_price: Option<Decimal>,
        available: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            variant_id,
            captured_at: Utc::now(),
            price,
            compare_at_price,
            available,
        }
    }
}
