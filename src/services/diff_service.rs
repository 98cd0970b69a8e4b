// src/services/diff_service.rs
//
// Diff Engine - reconcile a fetched catalog snapshot against persisted state
//
// CRITICAL RULES:
// - Runs entirely inside one gateway write transaction; the caller owns
//   commit/rollback
// - Matching is by the origin's stable remote id, soft-deleted rows
//   included (resurrection reuses the row, never duplicates it)
// - Event order per pass: removals first, then per product price ->
//   availability -> images
// - Emits the minimal event set: identical input on a second pass yields
//   zero events

use rusqlite::Connection;
use std::collections::{HashMap, HashSet};

use crate::catalog::{RemoteProduct, RemoteVariant};
use crate::domain::{ChangeEvent, Product, Store, Variant};
use crate::error::AppResult;
use crate::repositories::{ProductRepository, StoreRepository, VariantRepository};
use crate::services::history_service;

/// How many products to process between thread yields, so a large catalog
/// doesn't monopolize the writer thread
const YIELD_EVERY: usize = 50;

/// How many preview images the store list denormalizes
const PREVIEW_IMAGE_COUNT: usize = 3;

/// Reconcile the complete fetched listing for one store.
///
/// Returns the change events in emission order; the caller persists them
/// (same transaction) and hands them to the notification bridge after
/// commit.
pub fn reconcile(
    conn: &Connection,
    store: &Store,
    fetched: &[RemoteProduct],
) -> AppResult<Vec<ChangeEvent>> {
    let mut events = Vec::new();

    let fetched_ids: HashSet<i64> = fetched.iter().map(|p| p.id).collect();

    // Removal pass: any active product absent from the complete fetch is
    // soft-deleted. Its variants and history stay untouched.
    for mut product in ProductRepository::list_active(conn, store.id)? {
        if !fetched_ids.contains(&product.remote_id) {
            product.removed = true;
            ProductRepository::update(conn, &product)?;
            events.push(ChangeEvent::product_removed(
                store.id,
                product.title.clone(),
                product.remote_id,
            ));
        }
    }

    for (index, remote) in fetched.iter().enumerate() {
        if index > 0 && index % YIELD_EVERY == 0 {
            std::thread::yield_now();
        }

        match ProductRepository::find_by_remote_id(conn, store.id, remote.id)? {
            None => create_product(conn, store, remote, &mut events)?,
            Some(product) => update_product(conn, store, product, remote, &mut events)?,
        }
    }

    // Store-level denormalized display fields
    let product_count = ProductRepository::count_active(conn, store.id)?;
    let previews =
        ProductRepository::recent_preview_images(conn, store.id, PREVIEW_IMAGE_COUNT)?;
    StoreRepository::update_caches(conn, store.id, product_count, &previews)?;

    Ok(events)
}

/// First observation of a remote id: insert product + variants, emit one
/// new_product event. Individual variants are silent.
fn create_product(
    conn: &Connection,
    store: &Store,
    remote: &RemoteProduct,
    events: &mut Vec<ChangeEvent>,
) -> AppResult<()> {
    let mut product = Product::new(
        store.id,
        remote.id,
        remote.handle.clone(),
        remote.title.clone(),
        remote.vendor.clone(),
        remote.product_type.clone(),
        remote.image_urls.clone(),
    );
    ProductRepository::insert(conn, &product)?;

    let mut variants = Vec::with_capacity(remote.variants.len());
    for remote_variant in &remote.variants {
        let variant = new_variant(product.id, remote_variant);
        VariantRepository::insert(conn, &variant)?;
        variants.push(variant);
    }

    product.recompute_caches(&variants);
    ProductRepository::update(conn, &product)?;

    events.push(ChangeEvent::new_product(
        store.id,
        product.title.clone(),
        product.remote_id,
    ));

    Ok(())
}

/// Known remote id: revive if soft-deleted (silently), diff each variant,
/// then the image list, then refresh the caches.
fn update_product(
    conn: &Connection,
    store: &Store,
    mut product: Product,
    remote: &RemoteProduct,
    events: &mut Vec<ChangeEvent>,
) -> AppResult<()> {
    // Resurrection: same row, no event; title and images refresh silently
    let revived = product.removed;
    product.removed = false;

    product.handle = remote.handle.clone();
    product.title = remote.title.clone();
    product.vendor = remote.vendor.clone();
    product.product_type = remote.product_type.clone();

    let existing: HashMap<i64, Variant> = VariantRepository::list_by_product(conn, product.id)?
        .into_iter()
        .map(|v| (v.remote_id, v))
        .collect();

    // Availability events are buffered so that, whatever the variant
    // order, all of a product's price events precede them
    let mut availability_events = Vec::new();

    for remote_variant in &remote.variants {
        match existing.get(&remote_variant.id) {
            None => {
                // Variant newly added to a known product: stored silently,
                // no event kind exists for it
                let variant = new_variant(product.id, remote_variant);
                VariantRepository::insert(conn, &variant)?;
            }
            Some(variant) => {
                diff_variant(
                    conn,
                    store,
                    &product,
                    variant,
                    remote_variant,
                    events,
                    &mut availability_events,
                )?;
            }
        }
    }

    events.append(&mut availability_events);

    // Ordered image list comparison; replacement is wholesale
    if product.image_urls != remote.image_urls {
        product.image_urls = remote.image_urls.clone();
        if !revived {
            events.push(ChangeEvent::images_changed(
                store.id,
                product.title.clone(),
                product.remote_id,
            ));
        }
    }

    let variants = VariantRepository::list_by_product(conn, product.id)?;
    product.recompute_caches(&variants);
    ProductRepository::update(conn, &product)?;

    Ok(())
}

/// Compare one stored variant against its fetched counterpart.
///
/// Price and availability changes each emit their own event (never
/// merged); either one also records a history snapshot of the newly
/// observed state. Stored fields are updated to the fetched values
/// whether or not an event fired.
fn diff_variant(
    conn: &Connection,
    store: &Store,
    product: &Product,
    variant: &Variant,
    remote: &RemoteVariant,
    price_events: &mut Vec<ChangeEvent>,
    availability_events: &mut Vec<ChangeEvent>,
) -> AppResult<()> {
    let price_changed = variant.price != remote.price;
    let availability_changed = variant.available != remote.available;

    if price_changed {
        price_events.push(ChangeEvent::price_changed(
            store.id,
            product.title.clone(),
            remote.title.clone(),
            product.remote_id,
            variant.price,
            remote.price,
        ));
    }

    if availability_changed {
        availability_events.push(ChangeEvent::availability_changed(
            store.id,
            product.title.clone(),
            remote.title.clone(),
            product.remote_id,
            remote.available,
        ));
    }

    // One snapshot per variant per pass, however many deltas fired
    if price_changed || availability_changed {
        history_service::record_snapshot(
            conn,
            variant.id,
            remote.price,
            remote.compare_at_price,
            remote.available,
        )?;
    }

    let updated = Variant {
        id: variant.id,
        product_id: variant.product_id,
        remote_id: variant.remote_id,
        title: remote.title.clone(),
        sku: remote.sku.clone(),
        price: remote.price,
        compare_at_price: remote.compare_at_price,
        available: remote.available,
        position: remote.position,
    };
    VariantRepository::update(conn, &updated)?;

    Ok(())
}

fn new_variant(product_id: uuid::Uuid, remote: &RemoteVariant) -> Variant {
    Variant::new(
        product_id,
        remote.id,
        remote.title.clone(),
        remote.sku.clone(),
        remote.price,
        remote.compare_at_price,
        remote.available,
        remote.position,
    )
}
