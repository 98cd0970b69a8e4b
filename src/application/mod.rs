// src/application/mod.rs

pub mod dto;

pub use dto::{ChangeEventDto, ProductDto, StoreDto, SyncFailureDto, VariantSnapshotDto};
