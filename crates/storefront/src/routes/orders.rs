//! Customer order route handlers.

use axum::{
    extract::{Path, State},
    response::Json,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use satchel_core::OrderId;

use crate::error::{AppError, Result};
use crate::models::session;
use crate::state::AppState;
use crate::store::{Order, OrderItem, TrackingEntry};

/// Order line display data, with the derived subtotal.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    #[serde(flatten)]
    pub item: OrderItem,
    pub subtotal: Decimal,
}

/// Order detail payload: header, lines, and tracking history.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItemView>,
    pub tracking: Vec<TrackingEntry>,
}

/// Show one of the logged-in user's orders.
///
/// Orders belonging to other users resolve to 404 rather than 403, so the
/// endpoint does not leak which order ids exist.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetail>> {
    let user = session::current_user(&session)
        .await
        .ok_or_else(|| AppError::Unauthorized("login required".to_owned()))?;

    let order_id = OrderId::new(id);
    let order = state
        .store()
        .order(order_id)
        .await?
        .filter(|order| order.user_id == user.id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    let items = state
        .store()
        .order_items(order_id)
        .await?
        .into_iter()
        .map(|item| {
            let subtotal = item.subtotal();
            OrderItemView { item, subtotal }
        })
        .collect();
    let tracking = state.store().tracking_history(order_id).await?;

    Ok(Json(OrderDetail {
        order,
        items,
        tracking,
    }))
}
