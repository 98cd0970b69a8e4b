// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// This file declares all domain modules and re-exports their public API.
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod event;
pub mod product;
pub mod snapshot;
pub mod store;
pub mod variant;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use event::{classify_magnitude, ChangeEvent, ChangeKind, Magnitude, Priority};
pub use product::Product;
pub use snapshot::VariantSnapshot;
pub use store::{validate_store, Store};
pub use variant::{format_money, Variant};
