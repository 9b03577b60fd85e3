//! Durable storage for orders, inventory, and tracking history.
//!
//! The [`OrderStore`] trait is the seam between the checkout orchestration
//! and persistence. Production uses [`postgres::PgStore`]; tests use
//! [`memory::MemoryStore`], which implements the same atomicity guarantees
//! behind a mutex instead of a database transaction.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use satchel_core::{
    Email, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
    TrackingEntryId, TrackingOrigin, UserId,
};

/// Errors from the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// A conditional stock decrement would have taken stock below zero.
    #[error(
        "insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },
}

/// A catalog product, as read by the cart and checkout flow.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
}

/// A storefront user, resolved during checkout for the contact snapshot.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub phone: Option<String>,
}

/// An order header.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_transaction_id: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_postal_code: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

/// One line of an order. The unit price is the cart snapshot taken when the
/// item was added, not the live product price.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderItem {
    /// Line subtotal, derived rather than stored.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// One immutable entry in an order's tracking history.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TrackingEntry {
    pub id: TrackingEntryId,
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub description: String,
    pub location: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_by: TrackingOrigin,
    pub notify_customer: bool,
    pub created_at: DateTime<Utc>,
}

/// A tracking entry to append. Identity and timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTrackingEntry {
    pub status: OrderStatus,
    pub description: String,
    pub location: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_by: TrackingOrigin,
    pub notify_customer: bool,
}

impl NewTrackingEntry {
    /// A minimal entry with the given status and description, created by the
    /// system with customer notification enabled.
    #[must_use]
    pub fn system(status: OrderStatus, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
            location: None,
            tracking_number: None,
            carrier: None,
            estimated_delivery: None,
            created_by: TrackingOrigin::System,
            notify_customer: true,
        }
    }
}

/// One line of an order to be created.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// A fully validated order to persist.
///
/// The store writes the header, the lines, the stock decrements, and the
/// initial tracking entry as one all-or-nothing unit.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_state: String,
    pub shipping_postal_code: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub lines: Vec<NewOrderLine>,
    pub initial_tracking: NewTrackingEntry,
}

/// Storage operations needed by the checkout flow.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Look up a product by id.
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError>;

    /// Look up a user by id.
    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Create an order atomically: header, lines, conditional stock
    /// decrements, and the initial tracking entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InsufficientStock`] (and persists nothing) if
    /// any line's quantity exceeds the product's current stock, including
    /// under concurrent order creation against the same product.
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, StoreError>;

    /// Fetch an order header.
    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Fetch an order's lines.
    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, StoreError>;

    /// Update the payment state of an order.
    ///
    /// `transaction_id` overwrites the stored transaction id when present;
    /// the payment date is stamped when `payment_status` becomes `Paid`.
    async fn set_payment_state(
        &self,
        id: OrderId,
        payment_status: PaymentStatus,
        order_status: OrderStatus,
        transaction_id: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Append one tracking entry. The log is append-only; there is no
    /// update or delete.
    async fn append_tracking(
        &self,
        order_id: OrderId,
        entry: NewTrackingEntry,
    ) -> Result<TrackingEntryId, StoreError>;

    /// List an order's tracking entries, oldest first.
    async fn tracking_history(&self, order_id: OrderId) -> Result<Vec<TrackingEntry>, StoreError>;

    /// Claim a gateway transaction id for processing.
    ///
    /// Returns `false` if the transaction was already claimed, which makes
    /// duplicate callback deliveries no-ops.
    async fn claim_transaction(
        &self,
        order_id: OrderId,
        transaction_id: &str,
    ) -> Result<bool, StoreError>;

    /// Undo a claim whose outcome could not be determined, so a redelivery
    /// of the same transaction id gets processed.
    async fn release_transaction(
        &self,
        order_id: OrderId,
        transaction_id: &str,
    ) -> Result<(), StoreError>;
}
