//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                - Health check
//!
//! # Orders
//! GET  /admin/orders/{id}                     - Order detail (items + tracking)
//! POST /admin/orders/{id}/status              - Change order status
//! POST /admin/orders/{id}/confirm-payment     - Confirm a bank-transfer payment
//!
//! # Repair inquiries
//! GET  /admin/repair-inquiries                - List inquiries
//! GET  /admin/repair-inquiries/export         - Download inquiries as CSV
//! POST /admin/repair-inquiries/{id}           - Update status/quote/notes
//! ```

pub mod inquiries;
pub mod orders;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the admin route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/orders/{id}", get(orders::show))
        .route("/admin/orders/{id}/status", post(orders::update_status))
        .route(
            "/admin/orders/{id}/confirm-payment",
            post(orders::confirm_payment),
        )
        .route("/admin/repair-inquiries", get(inquiries::list))
        .route("/admin/repair-inquiries/export", get(inquiries::export))
        .route("/admin/repair-inquiries/{id}", post(inquiries::update))
}
