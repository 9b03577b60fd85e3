//! Bank transfer adapter.
//!
//! No gateway round trip: `initiate` sends the shopper to the order page
//! with transfer instructions, and `verify` always reports `Pending` since
//! an admin confirms receipt of the transfer manually.

use async_trait::async_trait;
use uuid::Uuid;

use satchel_core::PaymentStatus;

use super::{GatewayError, PaymentGateway, PaymentInitiation, PaymentVerification};
use crate::store::Order;

pub struct BankTransferGateway;

#[async_trait]
impl PaymentGateway for BankTransferGateway {
    async fn initiate(
        &self,
        _order: &Order,
        return_url: &str,
    ) -> Result<PaymentInitiation, GatewayError> {
        let transaction_id = Uuid::new_v4().to_string();
        Ok(PaymentInitiation {
            success: true,
            payment_url: Some(format!(
                "{return_url}&transaction_id={transaction_id}&method=bank_transfer"
            )),
            transaction_id: Some(transaction_id),
            message: "Please complete the bank transfer".to_owned(),
        })
    }

    async fn verify(&self, transaction_id: &str) -> Result<PaymentVerification, GatewayError> {
        Ok(PaymentVerification {
            success: true,
            status: PaymentStatus::Pending,
            transaction_id: transaction_id.to_owned(),
            message: "Awaiting bank transfer confirmation".to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use satchel_core::PaymentMethod;

    use super::*;
    use crate::payments::order_fixture;

    #[tokio::test]
    async fn redirect_url_carries_the_minted_transaction_id() {
        let order = order_fixture(PaymentMethod::BankTransfer);
        let initiation = BankTransferGateway
            .initiate(&order, "https://shop.test/checkout/callback/1?method=bank_transfer")
            .await
            .unwrap();

        let transaction_id = initiation.transaction_id.unwrap();
        let url = initiation.payment_url.unwrap();
        assert!(url.contains(&format!("transaction_id={transaction_id}")));
    }

    #[tokio::test]
    async fn verification_reports_pending_until_confirmed() {
        let verification = BankTransferGateway.verify("txn-bank-1").await.unwrap();

        assert!(verification.success);
        assert_eq!(verification.status, PaymentStatus::Pending);
    }
}
