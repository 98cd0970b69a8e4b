// src/repositories/mod.rs
//
// Persistence layer. Repository functions take a `&Connection` so the
// same code serves both sides of the gateway: write paths run inside a
// writer transaction, read paths on a pooled connection.

pub mod event_repository;
pub mod product_repository;
pub mod snapshot_repository;
pub mod store_repository;
pub mod variant_repository;

pub use event_repository::{EventQuery, EventRepository};
pub use product_repository::ProductRepository;
pub use snapshot_repository::SnapshotRepository;
pub use store_repository::StoreRepository;
pub use variant_repository::VariantRepository;
