//! Cart route handlers.
//!
//! The cart lives in the shopper's session; every handler loads it, applies
//! one operation, writes it back, and returns the resulting view.

use axum::{Form, extract::State, response::Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use satchel_core::ProductId;

use crate::cart::{self, Cart, CartLine};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub subtotal: Decimal,
    pub image_url: Option<String>,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: Decimal,
    pub item_count: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            items: cart.lines().iter().map(CartItemView::from).collect(),
            total: cart.total(),
            item_count: cart.item_count(),
        }
    }
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line.product_name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            subtotal: line.subtotal(),
            image_url: line.image_url.clone(),
        }
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i32,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

/// Current cart contents.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Json<CartView> {
    let cart = cart::load(&session).await;
    Json(CartView::from(&cart))
}

/// Cart item count.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Json<Value> {
    let cart = cart::load(&session).await;
    Json(json!({ "count": cart.item_count() }))
}

/// Add a product to the cart.
///
/// Fails when the product does not exist or the cart's quantity for it
/// (including the addition) would exceed the current stock. The line stores
/// a price snapshot taken now.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Json<CartView>> {
    let product_id = ProductId::new(form.product_id);
    let quantity = form.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_owned()));
    }

    let product = state
        .store()
        .product(product_id)
        .await?
        .ok_or(AppError::OutOfStock { product_id })?;

    let mut cart = cart::load(&session).await;
    let requested = i64::from(cart.quantity_of(product_id)) + i64::from(quantity);
    if requested > i64::from(product.stock_quantity) {
        return Err(AppError::OutOfStock { product_id });
    }

    cart.add(CartLine {
        product_id,
        product_name: product.name,
        unit_price: product.price,
        quantity,
        image_url: product.image_url,
        stock_quantity: product.stock_quantity,
    });
    cart::save(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Set a line's quantity. Zero removes the line.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Json<CartView>> {
    let mut cart = cart::load(&session).await;
    cart.update_quantity(ProductId::new(form.product_id), form.quantity);
    cart::save(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Json<CartView>> {
    let mut cart = cart::load(&session).await;
    cart.remove(ProductId::new(form.product_id));
    cart::save(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}

/// Empty the cart.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartView>> {
    let cart = Cart::default();
    cart::save(&session, &cart).await?;

    Ok(Json(CartView::from(&cart)))
}
