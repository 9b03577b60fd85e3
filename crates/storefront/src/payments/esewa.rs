//! eSewa gateway adapter.
//!
//! eSewa is a hosted-form gateway: `initiate` mints a transaction id and
//! builds the form URL the shopper is redirected to; `verify` posts a status
//! lookup for that transaction. A status of `COMPLETE` means the payment
//! settled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use satchel_core::PaymentStatus;

use super::{GatewayError, PaymentGateway, PaymentInitiation, PaymentVerification};
use crate::config::PaymentConfig;
use crate::store::Order;

pub struct EsewaGateway {
    client: reqwest::Client,
    form_url: String,
    status_url: String,
    product_code: String,
}

impl EsewaGateway {
    #[must_use]
    pub fn new(client: reqwest::Client, config: &PaymentConfig) -> Self {
        Self {
            client,
            form_url: config.esewa_form_url.clone(),
            status_url: config.esewa_status_url.clone(),
            product_code: config.esewa_product_code.clone(),
        }
    }
}

#[derive(Serialize)]
struct StatusRequest<'a> {
    product_code: &'a str,
    transaction_uuid: &'a str,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl PaymentGateway for EsewaGateway {
    #[instrument(skip(self, order), fields(order_id = %order.id))]
    async fn initiate(
        &self,
        order: &Order,
        return_url: &str,
    ) -> Result<PaymentInitiation, GatewayError> {
        let transaction_id = Uuid::new_v4().to_string();

        let mut payment_url = url::Url::parse(&self.form_url)
            .map_err(|e| GatewayError::InvalidResponse(format!("bad form URL: {e}")))?;
        payment_url
            .query_pairs_mut()
            .append_pair("total_amount", &format!("{:.2}", order.total_amount))
            .append_pair("transaction_uuid", &transaction_id)
            .append_pair("product_code", &self.product_code)
            .append_pair(
                "success_url",
                &format!("{return_url}&transaction_id={transaction_id}"),
            )
            .append_pair(
                "failure_url",
                &format!("{return_url}&transaction_id={transaction_id}&status=failed"),
            );

        Ok(PaymentInitiation {
            success: true,
            payment_url: Some(payment_url.into()),
            transaction_id: Some(transaction_id),
            message: "Payment initiated".to_owned(),
        })
    }

    #[instrument(skip(self))]
    async fn verify(&self, transaction_id: &str) -> Result<PaymentVerification, GatewayError> {
        let response = self
            .client
            .post(&self.status_url)
            .json(&StatusRequest {
                product_code: &self.product_code,
                transaction_uuid: transaction_id,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(PaymentVerification {
                success: false,
                status: PaymentStatus::Failed,
                transaction_id: transaction_id.to_owned(),
                message: format!("status lookup returned {}", response.status()),
            });
        }

        let body: StatusResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;

        let settled = body.status == "COMPLETE";
        Ok(PaymentVerification {
            success: settled,
            status: if settled {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            },
            transaction_id: transaction_id.to_owned(),
            message: body
                .message
                .unwrap_or_else(|| format!("eSewa status: {}", body.status)),
        })
    }
}

#[cfg(test)]
mod tests {
    use satchel_core::PaymentMethod;

    use super::*;
    use crate::payments::order_fixture;

    fn gateway() -> EsewaGateway {
        EsewaGateway::new(
            reqwest::Client::new(),
            &PaymentConfig {
                esewa_form_url: "https://esewa.test/epay/main".to_owned(),
                esewa_status_url: "https://esewa.test/api/epay/transaction/status".to_owned(),
                esewa_product_code: "EPAYTEST".to_owned(),
                gateway_timeout_secs: 5,
            },
        )
    }

    #[tokio::test]
    async fn form_url_carries_amount_and_merchant_details() {
        let order = order_fixture(PaymentMethod::Esewa);
        let initiation = gateway()
            .initiate(&order, "https://shop.test/checkout/callback/1?method=esewa")
            .await
            .unwrap();

        let url = initiation.payment_url.unwrap();
        assert!(url.contains("total_amount=120.00"));
        assert!(url.contains("product_code=EPAYTEST"));
    }

    #[tokio::test]
    async fn return_urls_carry_the_minted_transaction_id() {
        let order = order_fixture(PaymentMethod::Esewa);
        let initiation = gateway()
            .initiate(&order, "https://shop.test/checkout/callback/1?method=esewa")
            .await
            .unwrap();

        let transaction_id = initiation.transaction_id.unwrap();
        let url = initiation.payment_url.unwrap();
        assert!(url.contains(&format!("transaction_uuid={transaction_id}")));
        // Both redirect targets must name the transaction so the callback
        // can identify it.
        assert!(url.matches(&format!("transaction_id%3D{transaction_id}")).count() >= 2);
    }
}
