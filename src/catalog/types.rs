// src/catalog/types.rs
//
// Wire types for the remote product listing endpoint.
//
// The raw serde structs mirror the JSON payload exactly; `RemoteProduct`
// and `RemoteVariant` are the cleaned in-memory records the rest of the
// crate consumes (string/number prices already parsed into Decimal).

use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use crate::error::FetchError;

/// One product as observed in a fetch, detached from persistence
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteProduct {
    pub id: i64,
    pub title: String,
    pub vendor: String,
    pub product_type: String,
    pub handle: String,
    pub image_urls: Vec<String>,
    pub variants: Vec<RemoteVariant>,
}

/// One variant as observed in a fetch
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteVariant {
    pub id: i64,
    pub title: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub available: bool,
    pub position: i32,
}

// ---------------------------------------------------------------------------
// Raw payload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogPage {
    pub products: Vec<RawProduct>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawProduct {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub product_type: String,
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub variants: Vec<RawVariant>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawImage {
    pub src: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawVariant {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sku: Option<String>,
    // Origins serve prices as strings ("44.99") or bare numbers; both are
    // accepted and parsed exactly
    pub price: serde_json::Value,
    #[serde(default)]
    pub compare_at_price: Option<serde_json::Value>,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub position: i32,
}

/// Parse a price value from the wire. Strings and numbers are accepted;
/// anything else fails the fetch as an invalid response.
fn parse_price(value: &serde_json::Value) -> Result<Decimal, FetchError> {
    let text = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return Err(FetchError::InvalidResponse),
    };
    Decimal::from_str(text.trim()).map_err(|_| FetchError::InvalidResponse)
}

impl RawProduct {
    pub(crate) fn into_remote(self) -> Result<RemoteProduct, FetchError> {
        let variants = self
            .variants
            .into_iter()
            .map(|raw| {
                let price = parse_price(&raw.price)?;
                let compare_at_price = raw
                    .compare_at_price
                    .as_ref()
                    .filter(|v| !v.is_null())
                    .map(parse_price)
                    .transpose()?;
                Ok(RemoteVariant {
                    id: raw.id,
                    title: raw.title,
                    sku: raw.sku,
                    price,
                    compare_at_price,
                    available: raw.available,
                    position: raw.position,
                })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;

        Ok(RemoteProduct {
            id: self.id,
            title: self.title,
            vendor: self.vendor,
            product_type: self.product_type,
            handle: self.handle,
            image_urls: self.images.into_iter().map(|i| i.src).collect(),
            variants,
        })
    }
}
