//! Order management repository.
//!
//! Status changes are transactional: the current status is locked, the
//! transition is validated against the closed state machine, and the tracking
//! entry is appended in the same transaction as the update.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use satchel_core::{
    OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, ProductId, TrackingEntryId,
    TrackingOrigin, UserId,
};

use super::RepositoryError;

/// An order header, as the admin panel sees it.
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

/// One line of an order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
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

/// A status change request. All tracking fields are optional; a missing
/// description falls back to a generated one.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub new_status: OrderStatus,
    pub description: Option<String>,
    pub location: Option<String>,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub notify_customer: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    status: OrderStatus,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
}

/// Repository for admin order operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch an order header.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] if the order does not exist.
    pub async fn get(&self, id: OrderId) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(
            "SELECT id, user_id, created_at, total_amount, status, payment_method,
                    payment_status, payment_transaction_id, payment_date,
                    shipping_address, shipping_city, shipping_state, shipping_postal_code,
                    contact_email, contact_phone
             FROM orders
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Fetch an order's lines.
    pub async fn items(&self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, quantity, unit_price
             FROM order_item
             WHERE order_id = $1
             ORDER BY id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// List an order's tracking entries, oldest first.
    pub async fn tracking(&self, id: OrderId) -> Result<Vec<TrackingEntry>, RepositoryError> {
        let entries = sqlx::query_as::<_, TrackingEntry>(
            "SELECT id, order_id, status, description, location, tracking_number,
                    carrier, estimated_delivery, created_by, notify_customer, created_at
             FROM order_tracking
             WHERE order_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Change an order's status and append the matching tracking entry.
    ///
    /// The current status row is locked for the duration, so two concurrent
    /// changes cannot both pass the transition check.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidTransition`] if the state machine
    /// does not allow the move, [`RepositoryError::NotFound`] if the order
    /// does not exist.
    pub async fn update_status(
        &self,
        id: OrderId,
        change: StatusChange,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, OrderStatus>(
            "SELECT status FROM orders WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if !current.can_transition_to(change.new_status) {
            return Err(RepositoryError::InvalidTransition {
                from: current.to_string(),
                to: change.new_status.to_string(),
            });
        }

        sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(change.new_status)
            .execute(&mut *tx)
            .await?;

        let description = change
            .description
            .unwrap_or_else(|| format!("Status updated to {}", change.new_status));

        sqlx::query(
            "INSERT INTO order_tracking
                 (order_id, status, description, location, tracking_number, carrier,
                  estimated_delivery, created_by, notify_customer)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(id)
        .bind(change.new_status)
        .bind(&description)
        .bind(change.location.as_deref())
        .bind(change.tracking_number.as_deref())
        .bind(change.carrier.as_deref())
        .bind(change.estimated_delivery)
        .bind(TrackingOrigin::Admin)
        .bind(change.notify_customer)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get(id).await
    }

    /// Confirm a bank-transfer payment after manual verification.
    ///
    /// Marks the payment as paid, advances a pending order to processing, and
    /// appends a tracking entry.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Conflict`] if the order is not a bank
    /// transfer or its payment cannot move to paid.
    pub async fn confirm_payment(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PaymentRow>(
            "SELECT status, payment_method, payment_status
             FROM orders
             WHERE id = $1
             FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        if row.payment_method != PaymentMethod::BankTransfer {
            return Err(RepositoryError::Conflict(format!(
                "order {id} is not a bank transfer"
            )));
        }
        if !row.payment_status.can_transition_to(PaymentStatus::Paid) {
            return Err(RepositoryError::Conflict(format!(
                "payment is already {}",
                row.payment_status
            )));
        }

        let new_status = if row.status.can_transition_to(OrderStatus::Processing) {
            OrderStatus::Processing
        } else {
            row.status
        };

        sqlx::query(
            "UPDATE orders
             SET payment_status = $2, payment_date = now(), status = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(PaymentStatus::Paid)
        .bind(new_status)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO order_tracking (order_id, status, description, created_by, notify_customer)
             VALUES ($1, $2, $3, $4, true)",
        )
        .bind(id)
        .bind(new_status)
        .bind("Bank transfer payment confirmed")
        .bind(TrackingOrigin::Admin)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get(id).await
    }
}
