//! Checkout route handlers.
//!
//! `place_order` drives the checkout orchestration from the session cart;
//! `payment_callback` is the target the online gateways redirect back to.

use axum::{
    Form,
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use satchel_core::{OrderId, PaymentMethod};

use crate::cart;
use crate::error::{AppError, Result};
use crate::models::session;
use crate::services::checkout::{CallbackOutcome, CheckoutOutcome, ShippingDetails};
use crate::state::AppState;

/// Checkout submission form.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_postal_code: String,
    /// One of the registered payment method names; defaults to COD.
    pub payment_method: Option<String>,
}

/// Gateway callback parameters.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub order_id: i32,
    /// "success" from the success redirect; anything else is a failure.
    pub status: Option<String>,
    pub transaction_id: String,
}

/// Place an order from the session cart.
#[instrument(skip(state, session, form))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Json<Value>> {
    let user = session::current_user(&session)
        .await
        .ok_or_else(|| AppError::Unauthorized("login required to check out".to_owned()))?;

    let method = form
        .payment_method
        .as_deref()
        .unwrap_or("cod")
        .parse::<PaymentMethod>()
        .map_err(AppError::BadRequest)?;

    let shipping = ShippingDetails {
        address: form.shipping_address,
        city: form.shipping_city,
        state: form.shipping_state,
        postal_code: form.shipping_postal_code,
    };

    let mut cart = cart::load(&session).await;
    let outcome = state
        .checkout()
        .place_order(user.id, shipping, method, &mut cart)
        .await?;
    cart::save(&session, &cart).await?;

    Ok(Json(match outcome {
        CheckoutOutcome::Placed { order_id } => json!({
            "order_id": order_id,
            "status": "placed",
        }),
        CheckoutOutcome::AwaitingPayment {
            order_id,
            payment_url,
        } => json!({
            "order_id": order_id,
            "status": "awaiting_payment",
            "payment_url": payment_url,
        }),
    }))
}

/// Handle the gateway's payment redirect/callback.
///
/// Safe against duplicate delivery: a replayed transaction id is
/// acknowledged without changing anything.
#[instrument(skip(state, session, params))]
pub async fn payment_callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Json<Value>> {
    let order_id = OrderId::new(params.order_id);
    let reported = params.status.as_deref().unwrap_or("success");

    let mut cart = cart::load(&session).await;
    let outcome = state
        .checkout()
        .payment_callback(order_id, reported, &params.transaction_id, &mut cart)
        .await?;
    cart::save(&session, &cart).await?;

    Ok(Json(match outcome {
        CallbackOutcome::Confirmed { order_id } => json!({
            "order_id": order_id,
            "status": "paid",
        }),
        CallbackOutcome::AwaitingConfirmation { order_id } => json!({
            "order_id": order_id,
            "status": "awaiting_confirmation",
        }),
        CallbackOutcome::Duplicate { order_id } => json!({
            "order_id": order_id,
            "status": "already_processed",
        }),
    }))
}
