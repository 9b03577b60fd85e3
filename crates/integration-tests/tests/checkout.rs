//! End-to-end checkout tests against the in-memory store.

use rust_decimal_macros::dec;

use satchel_core::{OrderStatus, PaymentMethod, PaymentStatus, ProductId, TrackingOrigin};
use satchel_integration_tests::{Harness, TEST_USER, cart_of, shipping};
use satchel_storefront::cart::Cart;
use satchel_storefront::services::checkout::{CheckoutError, CheckoutOutcome};
use satchel_storefront::store::OrderStore;

#[tokio::test]
async fn cod_places_order_decrements_stock_and_clears_cart() {
    let h = Harness::new();
    let tote = h.seed_product(1, "Canvas tote", dec!(10.00), 5, 2);
    let strap = h.seed_product(2, "Leather strap", dec!(25.00), 3, 1);
    let mut cart = cart_of([tote, strap]);
    assert_eq!(cart.total(), dec!(45.00));

    let outcome = h
        .service
        .place_order(TEST_USER, shipping(), PaymentMethod::Cod, &mut cart)
        .await
        .expect("checkout should succeed");

    let CheckoutOutcome::Placed { order_id } = outcome else {
        panic!("expected Placed, got {outcome:?}");
    };

    assert_eq!(h.store.order_count(), 1);
    assert!(cart.is_empty());
    assert_eq!(h.store.stock(ProductId::new(1)), Some(3));
    assert_eq!(h.store.stock(ProductId::new(2)), Some(2));

    let order = h.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.total_amount, dec!(45.00));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_method, PaymentMethod::Cod);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.contact_email, "shopper@example.com");

    let items = h.store.order_items(order_id).await.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].unit_price, dec!(10.00));
    assert_eq!(items[0].subtotal(), dec!(20.00));

    let tracking = h.store.tracking_history(order_id).await.unwrap();
    assert_eq!(tracking.len(), 1);
    assert_eq!(tracking[0].status, OrderStatus::Pending);
    assert_eq!(tracking[0].created_by, TrackingOrigin::System);
}

#[tokio::test]
async fn empty_cart_is_rejected_before_any_write() {
    let h = Harness::new();
    let mut cart = Cart::default();

    let err = h
        .service
        .place_order(TEST_USER, shipping(), PaymentMethod::Cod, &mut cart)
        .await
        .expect_err("empty cart must fail");

    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(h.store.order_count(), 0);
}

#[tokio::test]
async fn insufficient_stock_leaves_no_partial_writes() {
    let h = Harness::new();
    let tote = h.seed_product(1, "Canvas tote", dec!(10.00), 5, 2);
    let strap = h.seed_product(2, "Leather strap", dec!(25.00), 0, 1);
    let mut cart = cart_of([tote, strap]);

    let err = h
        .service
        .place_order(TEST_USER, shipping(), PaymentMethod::Cod, &mut cart)
        .await
        .expect_err("out-of-stock line must fail the whole order");

    match err {
        CheckoutError::InsufficientStock {
            product_id,
            requested,
            available,
        } => {
            assert_eq!(product_id, ProductId::new(2));
            assert_eq!(requested, 1);
            assert_eq!(available, 0);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing written, nothing decremented, cart untouched.
    assert_eq!(h.store.order_count(), 0);
    assert_eq!(h.store.stock(ProductId::new(1)), Some(5));
    assert_eq!(cart.lines().len(), 2);
}

#[tokio::test]
async fn concurrent_checkouts_cannot_oversell_the_last_unit() {
    let h = Harness::new();
    let line_a = h.seed_product(1, "Limited clutch", dec!(99.00), 1, 1);
    let line_b = line_a.clone();

    let mut cart_a = cart_of([line_a]);
    let mut cart_b = cart_of([line_b]);

    let service_a = h.service.clone();
    let service_b = h.service.clone();

    let (first, second) = tokio::join!(
        service_a.place_order(TEST_USER, shipping(), PaymentMethod::Cod, &mut cart_a),
        service_b.place_order(TEST_USER, shipping(), PaymentMethod::Cod, &mut cart_b),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one checkout may win the last unit");

    let loser = if first.is_ok() { second } else { first };
    assert!(matches!(
        loser,
        Err(CheckoutError::InsufficientStock { .. })
    ));

    assert_eq!(h.store.stock(ProductId::new(1)), Some(0));
    assert_eq!(h.store.order_count(), 1);
}

#[tokio::test]
async fn shipping_validation_failures_write_nothing() {
    let h = Harness::new();
    let tote = h.seed_product(1, "Canvas tote", dec!(10.00), 5, 1);
    let mut cart = cart_of([tote]);

    let mut bad = shipping();
    bad.city = String::new();

    let err = h
        .service
        .place_order(TEST_USER, bad, PaymentMethod::Cod, &mut cart)
        .await
        .expect_err("blank city must fail validation");

    assert!(matches!(err, CheckoutError::Validation { field, .. } if field == "shipping_city"));
    assert_eq!(h.store.order_count(), 0);
    assert!(!cart.is_empty());
}
