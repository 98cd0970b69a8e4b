// src/domain/event.rs
//
// Change events - the durable, de-duplicated facts a sync pass emits
//
// RULES:
// - Events are created only by the diff engine during a sync pass
// - After creation only `is_read` may change
// - Titles are denormalized at creation so an event stays meaningful
//   after its product is removed

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of change was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    PriceDropped,
    PriceIncreased,
    BackInStock,
    OutOfStock,
    NewProduct,
    ProductRemoved,
    ImagesChanged,
}

impl ChangeKind {
    pub fn is_price_change(self) -> bool {
        matches!(self, ChangeKind::PriceDropped | ChangeKind::PriceIncreased)
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeKind::PriceDropped => "price_dropped",
            ChangeKind::PriceIncreased => "price_increased",
            ChangeKind::BackInStock => "back_in_stock",
            ChangeKind::OutOfStock => "out_of_stock",
            ChangeKind::NewProduct => "new_product",
            ChangeKind::ProductRemoved => "product_removed",
            ChangeKind::ImagesChanged => "images_changed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ChangeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_dropped" => Ok(ChangeKind::PriceDropped),
            "price_increased" => Ok(ChangeKind::PriceIncreased),
            "back_in_stock" => Ok(ChangeKind::BackInStock),
            "out_of_stock" => Ok(ChangeKind::OutOfStock),
            "new_product" => Ok(ChangeKind::NewProduct),
            "product_removed" => Ok(ChangeKind::ProductRemoved),
            "images_changed" => Ok(ChangeKind::ImagesChanged),
            other => Err(format!("Unknown change kind: {}", other)),
        }
    }
}

/// Size bucket of a price change, by percentage of the old price.
///
/// Non-price events carry the default (`Small`) purely for storage
/// uniformity; it is ignored everywhere magnitude matters.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Magnitude {
    #[default]
    Small,
    Medium,
    Large,
}

impl std::fmt::Display for Magnitude {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Magnitude::Small => "small",
            Magnitude::Medium => "medium",
            Magnitude::Large => "large",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Magnitude {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(Magnitude::Small),
            "medium" => Ok(Magnitude::Medium),
            "large" => Ok(Magnitude::Large),
            other => Err(format!("Unknown magnitude: {}", other)),
        }
    }
}

/// Classify a price change by its percentage of the old price.
///
/// small < 10%, medium 10-25% (both ends inclusive), large > 25%.
/// A change from a zero price is `Large`: the percentage is undefined and
/// any move off free is a meaningful jump.
pub fn classify_magnitude(old_price: Decimal, new_price: Decimal) -> Magnitude {
    if old_price.is_zero() {
        return Magnitude::Large;
    }

    let percent = ((new_price - old_price) / old_price * Decimal::from(100)).abs();

    if percent < Decimal::from(10) {
        Magnitude::Small
    } else if percent <= Decimal::from(25) {
        Magnitude::Medium
    } else {
        Magnitude::Large
    }
}

/// Notification urgency tier; `Ord` so a batch classifies as its maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Passive,
    Active,
    TimeSensitive,
}

/// An immutable fact describing one detected change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub id: Uuid,
    pub store_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub kind: ChangeKind,
    pub product_title: String,
    pub variant_title: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// Signed delta for price changes (new - old)
    pub price_change: Option<Decimal>,
    pub magnitude: Magnitude,
    pub is_read: bool,
    /// Stable remote id of the originating product. Denormalized rather
    /// than a local foreign key, so it stays valid (and Some) even for
    /// removal events; None only when the source had no external id
    pub product_remote_id: Option<i64>,
}

impl ChangeEvent {
    fn base(store_id: Uuid, kind: ChangeKind, product_title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            store_id,
            occurred_at: Utc::now(),
            kind,
            product_title,
            variant_title: None,
            old_value: None,
            new_value: None,
            price_change: None,
            magnitude: Magnitude::default(),
            is_read: false,
            product_remote_id: None,
        }
    }

    pub fn new_product(store_id: Uuid, product_title: String, remote_id: i64) -> Self {
        let mut event = Self::base(store_id, ChangeKind::NewProduct, product_title);
        event.product_remote_id = Some(remote_id);
        event
    }

    pub fn product_removed(store_id: Uuid, product_title: String, remote_id: i64) -> Self {
        let mut event = Self::base(store_id, ChangeKind::ProductRemoved, product_title);
        event.product_remote_id = Some(remote_id);
        event
    }

    /// Build a price event; the kind follows the sign of `new - old`.
    /// Callers must not invoke this for equal prices.
    pub fn price_changed(
        store_id: Uuid,
        product_title: String,
        variant_title: String,
        remote_id: i64,
        old_price: Decimal,
        new_price: Decimal,
    ) -> Self {
        let kind = if new_price < old_price {
            ChangeKind::PriceDropped
        } else {
            ChangeKind::PriceIncreased
        };
        let mut event = Self::base(store_id, kind, product_title);
        event.variant_title = Some(variant_title);
        event.old_value = Some(crate::domain::format_money(old_price));
        event.new_value = Some(crate::domain::format_money(new_price));
        event.price_change = Some(new_price - old_price);
        event.magnitude = classify_magnitude(old_price, new_price);
        event.product_remote_id = Some(remote_id);
        event
    }

    pub fn availability_changed(
        store_id: Uuid,
        product_title: String,
        variant_title: String,
        remote_id: i64,
        now_available: bool,
    ) -> Self {
        let kind = if now_available {
            ChangeKind::BackInStock
        } else {
            ChangeKind::OutOfStock
        };
        let mut event = Self::base(store_id, kind, product_title);
        event.variant_title = Some(variant_title);
        event.old_value = Some((!now_available).to_string());
        event.new_value = Some(now_available.to_string());
        event.product_remote_id = Some(remote_id);
        event
    }

    pub fn images_changed(store_id: Uuid, product_title: String, remote_id: i64) -> Self {
        let mut event = Self::base(store_id, ChangeKind::ImagesChanged, product_title);
        event.product_remote_id = Some(remote_id);
        event
    }

    /// Notification urgency of this single event.
    ///
    /// back_in_stock and large price drops are time-sensitive; out_of_stock,
    /// new_product, product_removed and medium (or larger-increase) price
    /// changes are active; everything else is passive.
    pub fn priority(&self) -> Priority {
        match self.kind {
            ChangeKind::BackInStock => Priority::TimeSensitive,
            ChangeKind::PriceDropped if self.magnitude == Magnitude::Large => {
                Priority::TimeSensitive
            }
            ChangeKind::OutOfStock | ChangeKind::NewProduct | ChangeKind::ProductRemoved => {
                Priority::Active
            }
            ChangeKind::PriceDropped | ChangeKind::PriceIncreased => match self.magnitude {
                Magnitude::Small => Priority::Passive,
                Magnitude::Medium | Magnitude::Large => Priority::Active,
            },
            ChangeKind::ImagesChanged => Priority::Passive,
        }
    }
}
