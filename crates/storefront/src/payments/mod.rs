//! Payment gateway adapters.
//!
//! Each supported payment method has one [`PaymentGateway`] implementation.
//! The [`GatewayRegistry`] is built once from configuration and injected via
//! application state; checkout dispatches through it by [`PaymentMethod`]
//! instead of constructing gateways per request.

pub mod bank_transfer;
pub mod cod;
pub mod esewa;
pub mod khalti;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use satchel_core::{PaymentMethod, PaymentStatus};

use crate::config::PaymentConfig;
use crate::store::Order;

pub use bank_transfer::BankTransferGateway;
pub use cod::CashOnDeliveryGateway;
pub use esewa::EsewaGateway;
pub use khalti::KhaltiGateway;

/// Errors from a gateway adapter.
///
/// The checkout orchestrator catches these at its boundary; they never
/// propagate as unhandled faults. A timeout surfaces here as `Http` and is
/// downgraded to a failed verification.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The HTTP round trip to the gateway failed (includes timeouts).
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway responded with something we could not interpret.
    #[error("gateway response invalid: {0}")]
    InvalidResponse(String),
}

/// Result of initiating a payment.
#[derive(Debug, Clone)]
pub struct PaymentInitiation {
    pub success: bool,
    /// Where to send the shopper to complete payment, when applicable.
    pub payment_url: Option<String>,
    pub transaction_id: Option<String>,
    pub message: String,
}

/// Result of verifying a payment.
#[derive(Debug, Clone)]
pub struct PaymentVerification {
    pub success: bool,
    /// One of `Paid`, `Pending`, or `Failed`.
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub message: String,
}

/// A pluggable payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Start a payment for `order`, directing the shopper back to
    /// `return_url` afterwards.
    async fn initiate(
        &self,
        order: &Order,
        return_url: &str,
    ) -> Result<PaymentInitiation, GatewayError>;

    /// Verify the outcome of a previously initiated payment.
    async fn verify(&self, transaction_id: &str) -> Result<PaymentVerification, GatewayError>;
}

/// Lookup table of gateway adapters keyed by payment method.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<PaymentMethod, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    /// Registry with no gateways. Useful as a test starting point.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the production registry from configuration.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the shared HTTP client cannot be built.
    pub fn from_config(config: &PaymentConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.gateway_timeout_secs))
            .build()?;

        Ok(Self::empty()
            .with(PaymentMethod::Cod, Arc::new(CashOnDeliveryGateway))
            .with(
                PaymentMethod::Esewa,
                Arc::new(EsewaGateway::new(client, config)),
            )
            .with(PaymentMethod::Khalti, Arc::new(KhaltiGateway))
            .with(
                PaymentMethod::BankTransfer,
                Arc::new(BankTransferGateway),
            ))
    }

    /// Register (or replace) a gateway for a method.
    #[must_use]
    pub fn with(mut self, method: PaymentMethod, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateways.insert(method, gateway);
        self
    }

    /// Look up the gateway for a method.
    #[must_use]
    pub fn get(&self, method: PaymentMethod) -> Option<Arc<dyn PaymentGateway>> {
        self.gateways.get(&method).cloned()
    }
}

#[cfg(test)]
pub(crate) fn order_fixture(method: PaymentMethod) -> Order {
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use satchel_core::{OrderId, OrderStatus, UserId};

    Order {
        id: OrderId::new(1),
        user_id: UserId::new(7),
        created_at: Utc::now(),
        total_amount: dec!(120.00),
        status: OrderStatus::Pending,
        payment_method: method,
        payment_status: PaymentStatus::Pending,
        payment_transaction_id: None,
        payment_date: None,
        shipping_address: "12 Hill Rd".to_owned(),
        shipping_city: "Kathmandu".to_owned(),
        shipping_state: "Bagmati".to_owned(),
        shipping_postal_code: "44600".to_owned(),
        contact_email: "shopper@example.com".to_owned(),
        contact_phone: None,
    }
}
