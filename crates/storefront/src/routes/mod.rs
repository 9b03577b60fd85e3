//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (in main)
//!
//! # Cart
//! GET  /cart                       - Cart contents
//! GET  /cart/count                 - Cart item count
//! POST /cart/add                   - Add a product to the cart
//! POST /cart/update                - Set a line's quantity (0 removes)
//! POST /cart/remove                - Remove a line
//! POST /cart/clear                 - Empty the cart
//!
//! # Checkout (requires auth)
//! POST /checkout                   - Place an order from the cart
//! GET  /checkout/payment/callback  - Gateway redirect/callback target
//!
//! # Orders (requires auth)
//! GET  /orders/{id}                - Order detail with items and tracking
//! ```

pub mod cart;
pub mod checkout;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the storefront router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show))
        .route("/cart/count", get(cart::count))
        .route("/cart/add", post(cart::add))
        .route("/cart/update", post(cart::update))
        .route("/cart/remove", post(cart::remove))
        .route("/cart/clear", post(cart::clear))
        .route("/checkout", post(checkout::place_order))
        .route("/checkout/payment/callback", get(checkout::payment_callback))
        .route("/orders/{id}", get(orders::show))
}
