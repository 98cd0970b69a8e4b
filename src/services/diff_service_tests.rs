// src/services/diff_service_tests.rs
//
// DIFF ENGINE UNIT TESTS
//
// PURPOSE:
// - Prove the change-event contract: exactly one event per real delta,
//   correct sign-to-kind mapping, correct magnitude
// - Prove idempotence: an unchanged catalog yields zero events
// - Prove soft-delete + resurrection reuse the same row
//
// All tests run against a real in-memory SQLite schema; the diff engine
// is exercised exactly as the gateway runs it.

#[cfg(test)]
mod reconcile_tests {
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use crate::catalog::{RemoteProduct, RemoteVariant};
    use crate::db::{create_test_connection, initialize_database};
    use crate::domain::{ChangeEvent, ChangeKind, Magnitude, Store};
    use crate::repositories::{
        ProductRepository, SnapshotRepository, StoreRepository, VariantRepository,
    };
    use crate::services::diff_service::reconcile;

    fn setup() -> (Connection, Store) {
        let conn = create_test_connection().unwrap();
        initialize_database(&conn).unwrap();
        let store = Store::new("Acme".to_string(), "acme.test".to_string());
        StoreRepository::insert(&conn, &store).unwrap();
        (conn, store)
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn remote_variant(id: i64, price: &str, available: bool) -> RemoteVariant {
        RemoteVariant {
            id,
            title: format!("Variant {id}"),
            sku: None,
            price: dec(price),
            compare_at_price: None,
            available,
            position: 1,
        }
    }

    fn remote_product(id: i64, variants: Vec<RemoteVariant>) -> RemoteProduct {
        RemoteProduct {
            id,
            title: format!("Product {id}"),
            vendor: "Acme".to_string(),
            product_type: "Widgets".to_string(),
            handle: format!("product-{id}"),
            image_urls: vec![format!("https://cdn.test/{id}.jpg")],
            variants,
        }
    }

    fn run(conn: &Connection, store: &Store, fetched: &[RemoteProduct]) -> Vec<ChangeEvent> {
        reconcile(conn, store, fetched).unwrap()
    }

    // ------------------------------------------------------------------
    // First sight / idempotence
    // ------------------------------------------------------------------

    #[test]
    fn test_first_sight_emits_one_new_product_event() {
        let (conn, store) = setup();

        let fetched = vec![remote_product(1, vec![remote_variant(11, "10.00", true)])];
        let events = run(&conn, &store, &fetched);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::NewProduct);
        assert_eq!(events[0].product_remote_id, Some(1));
        // Non-price events carry the default magnitude for storage uniformity
        assert_eq!(events[0].magnitude, Magnitude::Small);
    }

    #[test]
    fn test_identical_second_pass_is_silent() {
        let (conn, store) = setup();

        let fetched = vec![
            remote_product(1, vec![remote_variant(11, "10.00", true)]),
            remote_product(2, vec![remote_variant(21, "5.00", false)]),
        ];
        run(&conn, &store, &fetched);

        let second = run(&conn, &store, &fetched);
        assert!(second.is_empty(), "no remote change must mean no events");
    }

    #[test]
    fn test_new_variant_on_known_product_is_silent() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.00", true)])],
        );

        let grown = vec![remote_product(
            1,
            vec![
                remote_variant(11, "10.00", true),
                remote_variant(12, "12.00", true),
            ],
        )];
        let events = run(&conn, &store, &grown);

        assert!(events.is_empty());
        let product = ProductRepository::find_by_remote_id(&conn, store.id, 1)
            .unwrap()
            .unwrap();
        let variants = VariantRepository::list_by_product(&conn, product.id).unwrap();
        assert_eq!(variants.len(), 2);
    }

    // ------------------------------------------------------------------
    // Price changes
    // ------------------------------------------------------------------

    #[test]
    fn test_price_drop_end_to_end() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "110.00", true)])],
        );

        let events = run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "89.00", true)])],
        );

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.kind, ChangeKind::PriceDropped);
        assert_eq!(event.old_value.as_deref(), Some("$110.00"));
        assert_eq!(event.new_value.as_deref(), Some("$89.00"));
        assert_eq!(event.price_change, Some(dec("-21.00")));
        // |−21| / 110 = 19.09%, inside the 10–25% band
        assert_eq!(event.magnitude, Magnitude::Medium);

        // Variant row updated, exactly one history snapshot at the new price
        let product = ProductRepository::find_by_remote_id(&conn, store.id, 1)
            .unwrap()
            .unwrap();
        let variants = VariantRepository::list_by_product(&conn, product.id).unwrap();
        assert_eq!(variants[0].price, dec("89.00"));

        let history = SnapshotRepository::list_by_variant(&conn, variants[0].id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].price, dec("89.00"));
        assert!(history[0].available);
    }

    #[test]
    fn test_price_increase_maps_to_increase_kind() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "50.00", true)])],
        );
        let events = run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "65.00", true)])],
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::PriceIncreased);
        assert_eq!(events[0].price_change, Some(dec("15.00")));
        // +30% is a large change
        assert_eq!(events[0].magnitude, Magnitude::Large);
    }

    #[test]
    fn test_equal_price_never_fires() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.00", true)])],
        );
        // Same value, different textual scale
        let events = run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.0", true)])],
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_price_from_zero_classifies_large() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "0.00", true)])],
        );
        let events = run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "4.00", true)])],
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].magnitude, Magnitude::Large);
    }

    // ------------------------------------------------------------------
    // Availability
    // ------------------------------------------------------------------

    #[test]
    fn test_availability_flips() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.00", false)])],
        );

        let back = run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.00", true)])],
        );
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].kind, ChangeKind::BackInStock);

        let gone = run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.00", false)])],
        );
        assert_eq!(gone.len(), 1);
        assert_eq!(gone[0].kind, ChangeKind::OutOfStock);
    }

    #[test]
    fn test_price_and_availability_same_pass_emit_two_events() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "100.00", true)])],
        );
        let events = run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "80.00", false)])],
        );

        assert_eq!(events.len(), 2);
        // Price before availability for the same variant
        assert_eq!(events[0].kind, ChangeKind::PriceDropped);
        assert_eq!(events[1].kind, ChangeKind::OutOfStock);

        // Still just one snapshot for the variant in this pass
        let product = ProductRepository::find_by_remote_id(&conn, store.id, 1)
            .unwrap()
            .unwrap();
        let variants = VariantRepository::list_by_product(&conn, product.id).unwrap();
        let history = SnapshotRepository::list_by_variant(&conn, variants[0].id).unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].available);
    }

    #[test]
    fn test_price_events_for_all_variants_precede_availability_events() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(
                1,
                vec![
                    remote_variant(11, "100.00", true),
                    remote_variant(12, "50.00", true),
                ],
            )],
        );
        // Both variants drop 20% and sell out in the same pass; the price
        // events must not interleave with the availability events
        let events = run(
            &conn,
            &store,
            &[remote_product(
                1,
                vec![
                    remote_variant(11, "80.00", false),
                    remote_variant(12, "40.00", false),
                ],
            )],
        );

        let kinds: Vec<ChangeKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::PriceDropped,
                ChangeKind::PriceDropped,
                ChangeKind::OutOfStock,
                ChangeKind::OutOfStock,
            ]
        );
    }

    // ------------------------------------------------------------------
    // Removal / resurrection
    // ------------------------------------------------------------------

    #[test]
    fn test_missing_product_is_soft_removed() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[
                remote_product(1, vec![remote_variant(11, "10.00", true)]),
                remote_product(2, vec![remote_variant(21, "20.00", true)]),
            ],
        );

        // Product 2 vanishes from the fetch
        let events = run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.00", true)])],
        );

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::ProductRemoved);
        assert_eq!(events[0].product_remote_id, Some(2));

        let removed = ProductRepository::find_by_remote_id(&conn, store.id, 2)
            .unwrap()
            .unwrap();
        assert!(removed.removed);

        // Variants are untouched, not deleted
        let variants = VariantRepository::list_by_product(&conn, removed.id).unwrap();
        assert_eq!(variants.len(), 1);

        // Excluded from active queries
        let active = ProductRepository::list_active(&conn, store.id).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].remote_id, 1);
    }

    #[test]
    fn test_resurrection_reuses_row_without_new_product_event() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.00", true)])],
        );
        let original = ProductRepository::find_by_remote_id(&conn, store.id, 1)
            .unwrap()
            .unwrap();

        // Pass N: product disappears
        run(&conn, &store, &[]);
        assert!(
            ProductRepository::find_by_remote_id(&conn, store.id, 1)
                .unwrap()
                .unwrap()
                .removed
        );

        // Pass N+1: same remote id reappears, with new listing images
        let mut back = remote_product(1, vec![remote_variant(11, "10.00", true)]);
        back.image_urls = vec!["https://cdn.test/relisted.jpg".to_string()];
        let events = run(&conn, &store, &[back]);

        assert!(
            events.is_empty(),
            "revival is silent: no new_product, no un-removed kind, no image event"
        );

        let revived = ProductRepository::find_by_remote_id(&conn, store.id, 1)
            .unwrap()
            .unwrap();
        assert!(!revived.removed);
        assert_eq!(revived.id, original.id, "same row, not a duplicate");
        assert_eq!(revived.image_urls, vec!["https://cdn.test/relisted.jpg"]);

        // And the store sees exactly one product
        assert_eq!(ProductRepository::count_active(&conn, store.id).unwrap(), 1);
    }

    // ------------------------------------------------------------------
    // Images / ordering / caches
    // ------------------------------------------------------------------

    #[test]
    fn test_image_list_change_fires_once_and_replaces() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.00", true)])],
        );

        let mut changed = remote_product(1, vec![remote_variant(11, "10.00", true)]);
        changed.image_urls = vec![
            "https://cdn.test/new-1.jpg".to_string(),
            "https://cdn.test/new-2.jpg".to_string(),
        ];
        let events = run(&conn, &store, &[changed.clone()]);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::ImagesChanged);

        let product = ProductRepository::find_by_remote_id(&conn, store.id, 1)
            .unwrap()
            .unwrap();
        assert_eq!(product.image_urls, changed.image_urls);

        // Re-ordering alone also counts as a change
        let mut reordered = changed.clone();
        reordered.image_urls.reverse();
        let events = run(&conn, &store, &[reordered]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::ImagesChanged);
    }

    #[test]
    fn test_event_order_removal_then_price_then_availability_then_images() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[
                remote_product(1, vec![remote_variant(11, "100.00", true)]),
                remote_product(2, vec![remote_variant(21, "20.00", true)]),
            ],
        );

        // Product 2 disappears; product 1 changes price, availability and images
        let mut changed = remote_product(1, vec![remote_variant(11, "80.00", false)]);
        changed.image_urls = vec!["https://cdn.test/other.jpg".to_string()];
        let events = run(&conn, &store, &[changed]);

        let kinds: Vec<ChangeKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::ProductRemoved,
                ChangeKind::PriceDropped,
                ChangeKind::OutOfStock,
                ChangeKind::ImagesChanged,
            ]
        );
    }

    #[test]
    fn test_store_caches_refresh_after_pass() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[
                remote_product(1, vec![remote_variant(11, "10.00", true)]),
                remote_product(2, vec![remote_variant(21, "20.00", true)]),
            ],
        );

        let loaded = StoreRepository::get_by_id(&conn, store.id).unwrap().unwrap();
        assert_eq!(loaded.product_count, 2);
        assert_eq!(loaded.preview_images.len(), 2);

        // A removal shrinks the count on the next pass
        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.00", true)])],
        );
        let loaded = StoreRepository::get_by_id(&conn, store.id).unwrap().unwrap();
        assert_eq!(loaded.product_count, 1);
    }

    #[test]
    fn test_zero_variant_product_caches() {
        let (conn, store) = setup();

        run(&conn, &store, &[remote_product(1, vec![])]);

        let product = ProductRepository::find_by_remote_id(&conn, store.id, 1)
            .unwrap()
            .unwrap();
        assert_eq!(product.cached_price, Decimal::ZERO);
        assert!(!product.cached_available);
    }

    #[test]
    fn test_title_refresh_updates_search_key() {
        let (conn, store) = setup();

        run(
            &conn,
            &store,
            &[remote_product(1, vec![remote_variant(11, "10.00", true)])],
        );

        let mut renamed = remote_product(1, vec![remote_variant(11, "10.00", true)]);
        renamed.title = "Completely Different".to_string();
        let events = run(&conn, &store, &[renamed]);

        // Title changes are silent; no event kind exists for them
        assert!(events.is_empty());

        let hits = ProductRepository::search_active(&conn, store.id, "completely").unwrap();
        assert_eq!(hits.len(), 1);
    }
}
