//! Checkout orchestration.
//!
//! Coordinates the cart, the order store, and the payment gateways:
//! validates the submission, materializes the cart into an order (header,
//! lines, stock decrements, and initial tracking entry in one atomic unit),
//! then either completes immediately (cash on delivery) or hands the
//! shopper to a gateway and finishes in [`CheckoutService::payment_callback`].
//!
//! The cart is cleared only on a confirmed success path: COD placement, or a
//! verified online payment. Every failure leaves the cart intact so the
//! shopper can retry.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use satchel_core::{OrderId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, UserId};

use crate::cart::Cart;
use crate::payments::GatewayRegistry;
use crate::store::{NewOrder, NewOrderLine, NewTrackingEntry, Order, OrderStore, StoreError};

/// Maximum lengths for the shipping form fields.
const MAX_ADDRESS_LEN: usize = 200;
const MAX_CITY_LEN: usize = 50;
const MAX_STATE_LEN: usize = 50;
const MAX_POSTAL_CODE_LEN: usize = 20;

/// Errors surfaced by checkout and the payment callback.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required shipping field is missing or malformed.
    #[error("{field} {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Checkout was attempted with no cart lines.
    #[error("cart is empty")]
    EmptyCart,

    /// The authenticated user could not be resolved.
    #[error("user not found")]
    UserNotFound,

    /// The callback referenced an order that does not exist.
    #[error("order not found")]
    OrderNotFound,

    /// A cart line's quantity exceeds the product's current stock.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Persistence failed while creating or updating the order.
    #[error("order placement failed")]
    PlacementFailed(#[source] StoreError),

    /// The gateway declined to start a payment.
    #[error("payment initiation failed: {0}")]
    PaymentInitiationFailed(String),

    /// The gateway could not confirm a payment (including timeouts).
    #[error("payment verification failed: {0}")]
    PaymentVerificationFailed(String),
}

/// Shipping fields submitted at checkout, copied verbatim onto the order.
#[derive(Debug, Clone)]
pub struct ShippingDetails {
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl ShippingDetails {
    /// Validate presence and length caps before any write happens.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), CheckoutError> {
        Self::check("shipping_address", &self.address, MAX_ADDRESS_LEN)?;
        Self::check("shipping_city", &self.city, MAX_CITY_LEN)?;
        Self::check("shipping_state", &self.state, MAX_STATE_LEN)?;
        Self::check("shipping_postal_code", &self.postal_code, MAX_POSTAL_CODE_LEN)?;
        Ok(())
    }

    fn check(field: &'static str, value: &str, max: usize) -> Result<(), CheckoutError> {
        if value.trim().is_empty() {
            return Err(CheckoutError::Validation {
                field,
                message: "is required".to_owned(),
            });
        }
        if value.len() > max {
            return Err(CheckoutError::Validation {
                field,
                message: format!("cannot exceed {max} characters"),
            });
        }
        Ok(())
    }
}

/// Result of a successful `place_order`.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// Cash on delivery: the order is placed and the cart has been cleared.
    Placed { order_id: OrderId },
    /// Online payment: the order exists but awaits gateway confirmation.
    /// The cart is intentionally left intact.
    AwaitingPayment {
        order_id: OrderId,
        payment_url: String,
    },
}

/// Result of a successful `payment_callback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Payment verified; the order moved Pending -> Processing.
    Confirmed { order_id: OrderId },
    /// The gateway accepted the callback but the payment settles offline
    /// (bank transfer). Payment stays Pending until an admin confirms it.
    AwaitingConfirmation { order_id: OrderId },
    /// This transaction was already processed; nothing changed.
    Duplicate { order_id: OrderId },
}

/// The checkout orchestrator.
#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn OrderStore>,
    gateways: Arc<GatewayRegistry>,
    base_url: String,
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateways: Arc<GatewayRegistry>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            gateways,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// A reference to the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// The URL the gateway redirects the shopper back to.
    #[must_use]
    pub fn callback_url(&self, order_id: OrderId) -> String {
        format!(
            "{}/checkout/payment/callback?order_id={order_id}",
            self.base_url
        )
    }

    /// Place an order from the session cart.
    ///
    /// The order, its lines, the stock decrements, and the initial tracking
    /// entry are written as one all-or-nothing unit. Cash on delivery clears
    /// the cart and completes; online methods return a payment URL and leave
    /// the cart intact until the payment is verified.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]. No error path clears the cart.
    #[instrument(skip(self, shipping, cart), fields(user_id = %user_id, method = %method))]
    pub async fn place_order(
        &self,
        user_id: UserId,
        shipping: ShippingDetails,
        method: PaymentMethod,
        cart: &mut Cart,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        shipping.validate()?;

        let user = self
            .store
            .user(user_id)
            .await
            .map_err(CheckoutError::PlacementFailed)?
            .ok_or(CheckoutError::UserNotFound)?;

        // Total from the cart's price snapshots, never re-fetched live prices.
        let total = cart.total();

        let new_order = NewOrder {
            user_id,
            total_amount: total,
            payment_method: method,
            shipping_address: shipping.address,
            shipping_city: shipping.city,
            shipping_state: shipping.state,
            shipping_postal_code: shipping.postal_code,
            contact_email: user.email.to_string(),
            contact_phone: user.phone,
            lines: cart
                .lines()
                .iter()
                .map(|line| NewOrderLine {
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                })
                .collect(),
            initial_tracking: NewTrackingEntry::system(OrderStatus::Pending, "Order placed"),
        };

        let order_id = self.store.create_order(new_order).await.map_err(|e| match e {
            StoreError::InsufficientStock {
                product_id,
                requested,
                available,
            } => CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            other => CheckoutError::PlacementFailed(other),
        })?;

        if !method.is_online() {
            cart.clear();
            tracing::info!(%order_id, %total, "order placed (cash on delivery)");
            return Ok(CheckoutOutcome::Placed { order_id });
        }

        let order = self
            .store
            .order(order_id)
            .await
            .map_err(CheckoutError::PlacementFailed)?
            .ok_or(CheckoutError::OrderNotFound)?;

        let gateway = self.gateways.get(method).ok_or_else(|| {
            CheckoutError::PaymentInitiationFailed(format!("no gateway registered for {method}"))
        })?;

        let return_url = self.callback_url(order_id);
        let initiation = match gateway.initiate(&order, &return_url).await {
            Ok(initiation) if initiation.success => initiation,
            Ok(initiation) => {
                tracing::warn!(%order_id, message = %initiation.message, "payment initiation declined");
                return Err(CheckoutError::PaymentInitiationFailed(initiation.message));
            }
            Err(e) => {
                tracing::warn!(%order_id, error = %e, "payment initiation failed");
                return Err(CheckoutError::PaymentInitiationFailed(e.to_string()));
            }
        };

        if let Some(transaction_id) = initiation.transaction_id.as_deref() {
            self.store
                .set_payment_state(
                    order_id,
                    PaymentStatus::Pending,
                    OrderStatus::Pending,
                    Some(transaction_id),
                )
                .await
                .map_err(CheckoutError::PlacementFailed)?;
        }

        tracing::info!(%order_id, %method, "order awaiting online payment");
        Ok(CheckoutOutcome::AwaitingPayment {
            order_id,
            payment_url: initiation.payment_url.unwrap_or(return_url),
        })
    }

    /// Handle the gateway's redirect/callback for an online payment.
    ///
    /// Idempotent against duplicate deliveries: each transaction id is
    /// claimed exactly once; replays return [`CallbackOutcome::Duplicate`],
    /// as does any callback for an order whose payment is already settled.
    /// Verified success sets payment status `Paid`, order status
    /// `Processing`, appends one tracking entry, and clears the cart. A
    /// verified `Pending` (bank transfer) changes nothing and returns
    /// [`CallbackOutcome::AwaitingConfirmation`]. A reported or verified
    /// failure sets payment status `Failed`, appends one tracking entry,
    /// leaves the order status unchanged, and keeps the cart so the shopper
    /// can retry. A gateway error or timeout releases the claim and leaves
    /// the payment state untouched, so the gateway's redelivery can retry.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::PaymentVerificationFailed`] on any
    /// non-success outcome; gateway faults never propagate.
    #[instrument(skip(self, cart), fields(order_id = %order_id))]
    pub async fn payment_callback(
        &self,
        order_id: OrderId,
        reported_status: &str,
        transaction_id: &str,
        cart: &mut Cart,
    ) -> Result<CallbackOutcome, CheckoutError> {
        let order = self
            .store
            .order(order_id)
            .await
            .map_err(CheckoutError::PlacementFailed)?
            .ok_or(CheckoutError::OrderNotFound)?;

        // A settled payment can be neither re-confirmed nor demoted, so a
        // late or replayed callback must not touch it.
        if !order.payment_status.can_transition_to(PaymentStatus::Paid)
            && !order.payment_status.can_transition_to(PaymentStatus::Failed)
        {
            tracing::info!(
                payment_status = %order.payment_status,
                "payment already settled; callback ignored"
            );
            return Ok(CallbackOutcome::Duplicate { order_id });
        }

        let claimed = self
            .store
            .claim_transaction(order_id, transaction_id)
            .await
            .map_err(CheckoutError::PlacementFailed)?;
        if !claimed {
            tracing::info!(transaction_id, "duplicate payment callback ignored");
            return Ok(CallbackOutcome::Duplicate { order_id });
        }

        if reported_status != "success" {
            self.mark_payment_failed(&order, transaction_id, "gateway reported failure")
                .await?;
            return Err(CheckoutError::PaymentVerificationFailed(
                "gateway reported failure".to_owned(),
            ));
        }

        let Some(gateway) = self.gateways.get(order.payment_method) else {
            self.mark_payment_failed(&order, transaction_id, "no gateway registered")
                .await?;
            return Err(CheckoutError::PaymentVerificationFailed(format!(
                "no gateway registered for {}",
                order.payment_method
            )));
        };

        let verification = match gateway.verify(transaction_id).await {
            Ok(verification) => verification,
            Err(e) => {
                // The payment outcome is unknown, so undo the claim and
                // leave the state alone; the gateway's redelivery retries.
                tracing::warn!(error = %e, "payment verification errored");
                self.store
                    .release_transaction(order_id, transaction_id)
                    .await
                    .map_err(CheckoutError::PlacementFailed)?;
                return Err(CheckoutError::PaymentVerificationFailed(e.to_string()));
            }
        };

        if verification.success && verification.status == PaymentStatus::Pending {
            // Bank transfers settle offline; nothing to record until an
            // admin confirms the deposit.
            tracing::info!(transaction_id, "payment pending offline confirmation");
            return Ok(CallbackOutcome::AwaitingConfirmation { order_id });
        }

        if verification.success && verification.status == PaymentStatus::Paid {
            self.store
                .set_payment_state(
                    order_id,
                    PaymentStatus::Paid,
                    OrderStatus::Processing,
                    Some(transaction_id),
                )
                .await
                .map_err(CheckoutError::PlacementFailed)?;
            self.store
                .append_tracking(
                    order_id,
                    NewTrackingEntry::system(
                        OrderStatus::Processing,
                        "Payment confirmed; order is being processed",
                    ),
                )
                .await
                .map_err(CheckoutError::PlacementFailed)?;

            cart.clear();
            tracing::info!(transaction_id, "payment verified, order processing");
            return Ok(CallbackOutcome::Confirmed { order_id });
        }

        self.mark_payment_failed(&order, transaction_id, &verification.message)
            .await?;
        Err(CheckoutError::PaymentVerificationFailed(
            verification.message,
        ))
    }

    /// Record a failed payment: payment status `Failed`, one tracking entry,
    /// order status untouched.
    async fn mark_payment_failed(
        &self,
        order: &Order,
        transaction_id: &str,
        reason: &str,
    ) -> Result<(), CheckoutError> {
        self.store
            .set_payment_state(
                order.id,
                PaymentStatus::Failed,
                order.status,
                Some(transaction_id),
            )
            .await
            .map_err(CheckoutError::PlacementFailed)?;
        self.store
            .append_tracking(
                order.id,
                NewTrackingEntry::system(order.status, format!("Payment failed: {reason}")),
            )
            .await
            .map_err(CheckoutError::PlacementFailed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> ShippingDetails {
        ShippingDetails {
            address: "12 Hide Lane".to_owned(),
            city: "Kathmandu".to_owned(),
            state: "Bagmati".to_owned(),
            postal_code: "44600".to_owned(),
        }
    }

    #[test]
    fn validation_accepts_complete_details() {
        assert!(details().validate().is_ok());
    }

    #[test]
    fn validation_rejects_missing_fields() {
        for blank in ["", "   "] {
            let mut d = details();
            d.city = blank.to_owned();
            match d.validate() {
                Err(CheckoutError::Validation { field, .. }) => {
                    assert_eq!(field, "shipping_city");
                }
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn validation_rejects_overlength_fields() {
        let mut d = details();
        d.postal_code = "9".repeat(21);
        match d.validate() {
            Err(CheckoutError::Validation { field, .. }) => {
                assert_eq!(field, "shipping_postal_code");
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let mut d = details();
        d.address = "a".repeat(201);
        assert!(matches!(
            d.validate(),
            Err(CheckoutError::Validation {
                field: "shipping_address",
                ..
            })
        ));
    }

    #[test]
    fn callback_url_embeds_the_order_id() {
        let service = CheckoutService::new(
            Arc::new(crate::store::memory::MemoryStore::new()),
            Arc::new(GatewayRegistry::empty()),
            "https://shop.example.com/",
        );
        assert_eq!(
            service.callback_url(OrderId::new(7)),
            "https://shop.example.com/checkout/payment/callback?order_id=7"
        );
    }
}
