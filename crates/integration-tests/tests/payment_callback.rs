//! Online payment and callback tests against the in-memory store.

use std::sync::Arc;

use rust_decimal_macros::dec;

use satchel_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus};
use satchel_integration_tests::{Harness, MockGateway, TEST_USER, VerifyBehavior, cart_of, shipping};
use satchel_storefront::cart::Cart;
use satchel_storefront::payments::{BankTransferGateway, GatewayRegistry, PaymentGateway};
use satchel_storefront::services::checkout::{CallbackOutcome, CheckoutError, CheckoutOutcome};
use satchel_storefront::store::OrderStore;

/// Place an eSewa order and return its id plus the still-populated cart.
async fn place_online_order(h: &Harness) -> (OrderId, Cart) {
    let satchel = h.seed_product(1, "Weekender satchel", dec!(120.00), 4, 1);
    let mut cart = cart_of([satchel]);

    let outcome = h
        .service
        .place_order(TEST_USER, shipping(), PaymentMethod::Esewa, &mut cart)
        .await
        .expect("online checkout should start");

    let CheckoutOutcome::AwaitingPayment {
        order_id,
        payment_url,
    } = outcome
    else {
        panic!("expected AwaitingPayment, got {outcome:?}");
    };
    assert!(payment_url.contains("mock.test"));

    // The cart survives until the payment is verified.
    assert!(!cart.is_empty());
    (order_id, cart)
}

#[tokio::test]
async fn verified_success_confirms_order_and_clears_cart() {
    let h = Harness::with_mock_gateway(VerifyBehavior::Paid);
    let (order_id, mut cart) = place_online_order(&h).await;

    let outcome = h
        .service
        .payment_callback(order_id, "success", "txn-1", &mut cart)
        .await
        .expect("verified payment should confirm");

    assert_eq!(outcome, CallbackOutcome::Confirmed { order_id });
    assert!(cart.is_empty());

    let order = h.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Processing);
    assert!(order.payment_date.is_some());
    assert_eq!(order.payment_transaction_id.as_deref(), Some("txn-1"));

    let tracking = h.store.tracking_history(order_id).await.unwrap();
    assert_eq!(tracking.len(), 2);
    assert_eq!(tracking[1].status, OrderStatus::Processing);
}

#[tokio::test]
async fn failed_verification_marks_payment_failed_and_keeps_cart() {
    let h = Harness::with_mock_gateway(VerifyBehavior::Failed);
    let (order_id, mut cart) = place_online_order(&h).await;

    let err = h
        .service
        .payment_callback(order_id, "success", "txn-1", &mut cart)
        .await
        .expect_err("declined payment must fail");

    assert!(matches!(err, CheckoutError::PaymentVerificationFailed(_)));
    assert!(!cart.is_empty());

    let order = h.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Failed);
    // Order status is untouched; the shopper can retry the payment.
    assert_eq!(order.status, OrderStatus::Pending);

    let tracking = h.store.tracking_history(order_id).await.unwrap();
    assert_eq!(tracking.len(), 2);
    assert!(tracking[1].description.contains("Payment failed"));
}

#[tokio::test]
async fn gateway_reported_failure_skips_verification() {
    let h = Harness::with_mock_gateway(VerifyBehavior::Paid);
    let (order_id, mut cart) = place_online_order(&h).await;

    let err = h
        .service
        .payment_callback(order_id, "failure", "txn-1", &mut cart)
        .await
        .expect_err("reported failure must fail");

    assert!(matches!(err, CheckoutError::PaymentVerificationFailed(_)));
    let order = h.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Failed);
    assert!(!cart.is_empty());
}

#[tokio::test]
async fn gateway_outage_leaves_payment_pending() {
    let h = Harness::with_mock_gateway(VerifyBehavior::Error);
    let (order_id, mut cart) = place_online_order(&h).await;

    let err = h
        .service
        .payment_callback(order_id, "success", "txn-1", &mut cart)
        .await
        .expect_err("gateway outage must not confirm the order");

    assert!(matches!(err, CheckoutError::PaymentVerificationFailed(_)));
    assert!(!cart.is_empty());

    // The outcome is unknown, so the payment is neither confirmed nor
    // failed and no tracking entry is written.
    let order = h.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.status, OrderStatus::Pending);
    let tracking = h.store.tracking_history(order_id).await.unwrap();
    assert_eq!(tracking.len(), 1);
}

#[tokio::test]
async fn callback_redelivery_after_outage_confirms_order() {
    let gateway = Arc::new(MockGateway::new(VerifyBehavior::Error));
    let h = Harness::with_registry(
        GatewayRegistry::empty()
            .with(PaymentMethod::Esewa, Arc::clone(&gateway) as Arc<dyn PaymentGateway>),
    );
    let (order_id, mut cart) = place_online_order(&h).await;

    h.service
        .payment_callback(order_id, "success", "txn-1", &mut cart)
        .await
        .expect_err("outage delivery fails");

    // The gateway recovers and redelivers the same transaction.
    gateway.set_behavior(VerifyBehavior::Paid);
    let outcome = h
        .service
        .payment_callback(order_id, "success", "txn-1", &mut cart)
        .await
        .expect("redelivery confirms once the gateway recovers");

    assert_eq!(outcome, CallbackOutcome::Confirmed { order_id });
    assert!(cart.is_empty());
    let order = h.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Processing);
}

#[tokio::test]
async fn duplicate_callback_deliveries_are_idempotent() {
    let h = Harness::with_mock_gateway(VerifyBehavior::Paid);
    let (order_id, mut cart) = place_online_order(&h).await;

    let first = h
        .service
        .payment_callback(order_id, "success", "txn-1", &mut cart)
        .await
        .expect("first delivery confirms");
    assert_eq!(first, CallbackOutcome::Confirmed { order_id });

    let mut replay_cart = Cart::default();
    let second = h
        .service
        .payment_callback(order_id, "success", "txn-1", &mut replay_cart)
        .await
        .expect("replay is a no-op");
    assert_eq!(second, CallbackOutcome::Duplicate { order_id });

    // The replay changed nothing: still one confirmation tracking entry.
    let order = h.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    let tracking = h.store.tracking_history(order_id).await.unwrap();
    assert_eq!(tracking.len(), 2);
}

#[tokio::test]
async fn already_paid_order_treats_new_transaction_as_duplicate() {
    let h = Harness::with_mock_gateway(VerifyBehavior::Paid);
    let (order_id, mut cart) = place_online_order(&h).await;

    h.service
        .payment_callback(order_id, "success", "txn-1", &mut cart)
        .await
        .expect("first delivery confirms");

    // A second gateway redirect with a fresh transaction id must not
    // re-confirm a settled order.
    let mut other_cart = Cart::default();
    let outcome = h
        .service
        .payment_callback(order_id, "success", "txn-2", &mut other_cart)
        .await
        .expect("settled order ignores further callbacks");
    assert_eq!(outcome, CallbackOutcome::Duplicate { order_id });

    let tracking = h.store.tracking_history(order_id).await.unwrap();
    assert_eq!(tracking.len(), 2);
}

#[tokio::test]
async fn failure_callback_cannot_demote_a_paid_order() {
    let h = Harness::with_mock_gateway(VerifyBehavior::Paid);
    let (order_id, mut cart) = place_online_order(&h).await;

    h.service
        .payment_callback(order_id, "success", "txn-1", &mut cart)
        .await
        .expect("first delivery confirms");

    // A stale failure redirect with a fresh transaction id arrives after
    // the payment settled. It must not touch the order.
    let mut other_cart = Cart::default();
    let outcome = h
        .service
        .payment_callback(order_id, "failed", "txn-2", &mut other_cart)
        .await
        .expect("settled order ignores the stale failure");
    assert_eq!(outcome, CallbackOutcome::Duplicate { order_id });

    let order = h.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::Processing);
    assert_eq!(order.payment_transaction_id.as_deref(), Some("txn-1"));
    let tracking = h.store.tracking_history(order_id).await.unwrap();
    assert_eq!(tracking.len(), 2);
}

#[tokio::test]
async fn bank_transfer_callback_awaits_manual_confirmation() {
    let h = Harness::with_registry(
        GatewayRegistry::empty().with(PaymentMethod::BankTransfer, Arc::new(BankTransferGateway)),
    );
    let satchel = h.seed_product(1, "Weekender satchel", dec!(120.00), 4, 1);
    let mut cart = cart_of([satchel]);

    let outcome = h
        .service
        .place_order(TEST_USER, shipping(), PaymentMethod::BankTransfer, &mut cart)
        .await
        .expect("bank transfer checkout should start");
    let CheckoutOutcome::AwaitingPayment { order_id, .. } = outcome else {
        panic!("expected AwaitingPayment, got {outcome:?}");
    };

    let order = h.store.order(order_id).await.unwrap().unwrap();
    let transaction_id = order
        .payment_transaction_id
        .expect("initiation records the transaction id");

    let outcome = h
        .service
        .payment_callback(order_id, "success", &transaction_id, &mut cart)
        .await
        .expect("pending transfer is not a failure");
    assert_eq!(outcome, CallbackOutcome::AwaitingConfirmation { order_id });

    // Nothing settles until an admin confirms the deposit.
    let order = h.store.order(order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(!cart.is_empty());
    let tracking = h.store.tracking_history(order_id).await.unwrap();
    assert_eq!(tracking.len(), 1);
}
