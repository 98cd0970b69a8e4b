// src/catalog/mod.rs

pub mod client;
pub mod types;

pub use client::{CatalogFetcher, HttpCatalogClient, PAGE_SIZE};
pub use types::{RemoteProduct, RemoteVariant};

#[cfg(test)]
pub use client::MockCatalogFetcher;
