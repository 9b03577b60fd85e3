//! Cash-on-delivery "gateway".
//!
//! COD needs no external round trip; checkout completes immediately and the
//! balance is collected by the courier. The adapter exists so the registry
//! covers every payment method uniformly.

use async_trait::async_trait;

use satchel_core::PaymentStatus;

use super::{GatewayError, PaymentGateway, PaymentInitiation, PaymentVerification};
use crate::store::Order;

pub struct CashOnDeliveryGateway;

#[async_trait]
impl PaymentGateway for CashOnDeliveryGateway {
    async fn initiate(
        &self,
        _order: &Order,
        _return_url: &str,
    ) -> Result<PaymentInitiation, GatewayError> {
        Ok(PaymentInitiation {
            success: true,
            payment_url: None,
            transaction_id: None,
            message: "No online payment required".to_owned(),
        })
    }

    async fn verify(&self, transaction_id: &str) -> Result<PaymentVerification, GatewayError> {
        Ok(PaymentVerification {
            success: true,
            status: PaymentStatus::Pending,
            transaction_id: transaction_id.to_owned(),
            message: "Collected on delivery".to_owned(),
        })
    }
}
