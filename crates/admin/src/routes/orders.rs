//! Admin order route handlers.

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use satchel_core::{OrderId, OrderStatus};

use crate::db::OrderRepository;
use crate::db::orders::{Order, OrderItem, StatusChange, TrackingEntry};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Order detail payload: header, lines, and tracking history.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub tracking: Vec<TrackingEntry>,
}

/// Status change request body.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default = "default_notify")]
    pub notify_customer: bool,
}

const fn default_notify() -> bool {
    true
}

/// Show an order with its items and tracking history.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<OrderDetail>> {
    let repo = OrderRepository::new(state.pool());
    let id = OrderId::new(id);

    let order = repo.get(id).await?;
    let items = repo.items(id).await?;
    let tracking = repo.tracking(id).await?;

    Ok(Json(OrderDetail {
        order,
        items,
        tracking,
    }))
}

/// Change an order's status.
///
/// The transition is validated against the order state machine; the matching
/// tracking entry is written in the same transaction.
#[instrument(skip(state, body))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<Order>> {
    let new_status = body
        .status
        .parse::<OrderStatus>()
        .map_err(AppError::BadRequest)?;

    let change = StatusChange {
        new_status,
        description: body.description,
        location: body.location,
        tracking_number: body.tracking_number,
        carrier: body.carrier,
        estimated_delivery: body.estimated_delivery,
        notify_customer: body.notify_customer,
    };

    let order = OrderRepository::new(state.pool())
        .update_status(OrderId::new(id), change)
        .await?;

    Ok(Json(order))
}

/// Confirm a bank-transfer payment after checking the bank statement.
#[instrument(skip(state))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .confirm_payment(OrderId::new(id))
        .await?;

    Ok(Json(order))
}
