//! Integration test harness for the checkout state machine.
//!
//! All tests run against [`MemoryStore`], which implements the same
//! atomicity guarantees as the `PostgreSQL` store. Payment gateways are
//! replaced with [`MockGateway`], programmed per test.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use satchel_core::{Email, PaymentMethod, PaymentStatus, ProductId, UserId};
use satchel_storefront::cart::{Cart, CartLine};
use satchel_storefront::payments::{
    GatewayError, GatewayRegistry, PaymentGateway, PaymentInitiation, PaymentVerification,
};
use satchel_storefront::services::checkout::CheckoutService;
use satchel_storefront::store::memory::MemoryStore;
use satchel_storefront::store::{Order, Product};

pub const TEST_USER: UserId = UserId::new(1);

/// What a [`MockGateway`] should do when asked to verify a transaction.
#[derive(Debug, Clone, Copy)]
pub enum VerifyBehavior {
    /// Verification succeeds with status Paid.
    Paid,
    /// Verification completes but reports a failed payment.
    Failed,
    /// The gateway round trip itself errors (simulates a timeout).
    Error,
}

/// A programmable gateway for tests. The behavior can be swapped mid-test
/// to model a gateway that recovers between callback deliveries.
pub struct MockGateway {
    behavior: std::sync::Mutex<VerifyBehavior>,
}

impl MockGateway {
    #[must_use]
    pub fn new(behavior: VerifyBehavior) -> Self {
        Self {
            behavior: std::sync::Mutex::new(behavior),
        }
    }

    pub fn set_behavior(&self, behavior: VerifyBehavior) {
        *self.behavior.lock().expect("behavior lock") = behavior;
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initiate(
        &self,
        order: &Order,
        return_url: &str,
    ) -> Result<PaymentInitiation, GatewayError> {
        Ok(PaymentInitiation {
            success: true,
            payment_url: Some(format!("https://mock.test/pay/{}", order.id)),
            transaction_id: Some(format!("mock-txn-{}", order.id)),
            message: format!("redirect then return to {return_url}"),
        })
    }

    async fn verify(&self, transaction_id: &str) -> Result<PaymentVerification, GatewayError> {
        match *self.behavior.lock().expect("behavior lock") {
            VerifyBehavior::Paid => Ok(PaymentVerification {
                success: true,
                status: PaymentStatus::Paid,
                transaction_id: transaction_id.to_owned(),
                message: "payment complete".to_owned(),
            }),
            VerifyBehavior::Failed => Ok(PaymentVerification {
                success: false,
                status: PaymentStatus::Failed,
                transaction_id: transaction_id.to_owned(),
                message: "payment declined".to_owned(),
            }),
            VerifyBehavior::Error => Err(GatewayError::InvalidResponse(
                "simulated gateway outage".to_owned(),
            )),
        }
    }
}

/// A seeded store plus a checkout service wired to it.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub service: CheckoutService,
}

impl Harness {
    /// Harness with no online gateways. Enough for cash-on-delivery flows.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(GatewayRegistry::empty())
    }

    /// Harness whose eSewa slot is filled by a [`MockGateway`].
    #[must_use]
    pub fn with_mock_gateway(behavior: VerifyBehavior) -> Self {
        Self::with_registry(
            GatewayRegistry::empty()
                .with(PaymentMethod::Esewa, Arc::new(MockGateway::new(behavior))),
        )
    }

    #[must_use]
    pub fn with_registry(registry: GatewayRegistry) -> Self {
        let store = Arc::new(MemoryStore::new());
        store.insert_user(
            TEST_USER,
            Email::parse("shopper@example.com").expect("valid email"),
            Some("555-0101".to_owned()),
        );

        let service = CheckoutService::new(
            Arc::clone(&store) as Arc<dyn satchel_storefront::store::OrderStore>,
            Arc::new(registry),
            "https://shop.example.com",
        );

        Self { store, service }
    }

    /// Seed a product and return a cart line for it.
    pub fn seed_product(
        &self,
        id: i32,
        name: &str,
        price: Decimal,
        stock: i32,
        quantity: u32,
    ) -> CartLine {
        let product_id = ProductId::new(id);
        self.store.insert_product(Product {
            id: product_id,
            name: name.to_owned(),
            price,
            image_url: None,
            stock_quantity: stock,
        });

        CartLine {
            product_id,
            product_name: name.to_owned(),
            unit_price: price,
            quantity,
            image_url: None,
            stock_quantity: stock,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a cart holding the given lines.
#[must_use]
pub fn cart_of(lines: impl IntoIterator<Item = CartLine>) -> Cart {
    let mut cart = Cart::default();
    for line in lines {
        cart.add(line);
    }
    cart
}

/// Well-formed shipping details for tests.
#[must_use]
pub fn shipping() -> satchel_storefront::services::checkout::ShippingDetails {
    satchel_storefront::services::checkout::ShippingDetails {
        address: "12 Hide Lane".to_owned(),
        city: "Kathmandu".to_owned(),
        state: "Bagmati".to_owned(),
        postal_code: "44600".to_owned(),
    }
}
