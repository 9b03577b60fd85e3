//! Khalti gateway adapter.
//!
//! The merchant account is not live yet, so both operations report
//! non-success without side effects. Checkout surfaces this as a payment
//! initiation failure and leaves the cart and order untouched.

use async_trait::async_trait;

use satchel_core::PaymentStatus;

use super::{GatewayError, PaymentGateway, PaymentInitiation, PaymentVerification};
use crate::store::Order;

pub struct KhaltiGateway;

#[async_trait]
impl PaymentGateway for KhaltiGateway {
    async fn initiate(
        &self,
        _order: &Order,
        _return_url: &str,
    ) -> Result<PaymentInitiation, GatewayError> {
        Ok(PaymentInitiation {
            success: false,
            payment_url: None,
            transaction_id: None,
            message: "Khalti payments are not yet available".to_owned(),
        })
    }

    async fn verify(&self, transaction_id: &str) -> Result<PaymentVerification, GatewayError> {
        Ok(PaymentVerification {
            success: false,
            status: PaymentStatus::Failed,
            transaction_id: transaction_id.to_owned(),
            message: "Khalti payments are not yet available".to_owned(),
        })
    }
}
