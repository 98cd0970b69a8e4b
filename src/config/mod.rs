// src/config/mod.rs
//
// User-facing settings consumed by the sync loop and the notification
// bridge. Everything has a sensible default; the binary loads overrides
// from a JSON file when one exists.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::domain::Magnitude;
use crate::error::AppResult;

/// Hard floor on the background sync interval
pub const MIN_SYNC_INTERVAL_MINUTES: u64 = 5;

/// Minimum size a price change must reach to be notified.
/// Events below the threshold are still persisted, just not dispatched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceThreshold {
    /// Absolute dollar amount, e.g. notify only on changes >= $5
    AbsoluteDollars(Decimal),
    /// Percentage bucket, e.g. notify only on medium-or-larger changes
    MagnitudeAtLeast(Magnitude),
}

/// Per-change-kind notification toggles; everything on by default
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyToggles {
    pub price_dropped: bool,
    pub price_increased: bool,
    pub back_in_stock: bool,
    pub out_of_stock: bool,
    pub new_product: bool,
    pub product_removed: bool,
    pub images_changed: bool,
}

impl Default for NotifyToggles {
    fn default() -> Self {
        Self {
            price_dropped: true,
            price_increased: true,
            back_in_stock: true,
            out_of_stock: true,
            new_product: true,
            product_removed: true,
            images_changed: true,
        }
    }
}

/// Age-based retention for a table; disabled by default
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Retention {
    pub enabled: bool,
    pub days: u32,
}

impl Default for Retention {
    fn default() -> Self {
        Self {
            enabled: false,
            days: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Background cycle interval; values below the floor are raised to it
    pub sync_interval_minutes: u64,
    pub price_drop_threshold: Option<PriceThreshold>,
    pub price_increase_threshold: Option<PriceThreshold>,
    pub notify: NotifyToggles,
    pub event_retention: Retention,
    pub snapshot_retention: Retention,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            sync_interval_minutes: 30,
            price_drop_threshold: None,
            price_increase_threshold: None,
            notify: NotifyToggles::default(),
            event_retention: Retention::default(),
            snapshot_retention: Retention {
                enabled: false,
                days: 30,
            },
        }
    }
}

impl WatchConfig {
    /// Load from a JSON file; a missing file yields the defaults.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: WatchConfig = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Interval with the floor applied.
    pub fn effective_sync_interval_minutes(&self) -> u64 {
        self.sync_interval_minutes.max(MIN_SYNC_INTERVAL_MINUTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_floor_enforced() {
        let config = WatchConfig {
            sync_interval_minutes: 1,
            ..WatchConfig::default()
        };
        assert_eq!(config.effective_sync_interval_minutes(), 5);

        let config = WatchConfig {
            sync_interval_minutes: 45,
            ..WatchConfig::default()
        };
        assert_eq!(config.effective_sync_interval_minutes(), 45);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = WatchConfig::load(Path::new("/nonexistent/shopwatch.json")).unwrap();
        assert_eq!(config.sync_interval_minutes, 30);
        assert!(config.notify.price_dropped);
        assert!(!config.event_retention.enabled);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"sync_interval_minutes": 10, "event_retention": {"enabled": true, "days": 14}}"#,
        )
        .unwrap();

        let config = WatchConfig::load(&path).unwrap();
        assert_eq!(config.sync_interval_minutes, 10);
        assert!(config.event_retention.enabled);
        assert_eq!(config.event_retention.days, 14);
        assert!(config.notify.back_in_stock);
    }
}
