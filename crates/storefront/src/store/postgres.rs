//! `PostgreSQL`-backed order store.
//!
//! All multi-row writes go through a transaction. The stock decrement is a
//! conditional update (`stock_quantity >= qty`) so two concurrent checkouts
//! against the last unit cannot both succeed; the loser rolls back with
//! [`StoreError::InsufficientStock`] and no partial order remains.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use satchel_core::{OrderId, OrderStatus, PaymentStatus, ProductId, TrackingEntryId, UserId};

use super::{
    NewOrder, NewTrackingEntry, Order, OrderItem, OrderStore, Product, StoreError, TrackingEntry,
    User,
};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Order store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, name, price, image_url, stock_quantity
             FROM product
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, phone
             FROM users
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderId, StoreError> {
        let mut tx = self.pool.begin().await?;

        let order_id = sqlx::query_scalar::<_, OrderId>(
            "INSERT INTO orders
                 (user_id, total_amount, status, payment_method, payment_status,
                  shipping_address, shipping_city, shipping_state, shipping_postal_code,
                  contact_email, contact_phone)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING id",
        )
        .bind(order.user_id)
        .bind(order.total_amount)
        .bind(OrderStatus::Pending)
        .bind(order.payment_method)
        .bind(PaymentStatus::Pending)
        .bind(&order.shipping_address)
        .bind(&order.shipping_city)
        .bind(&order.shipping_state)
        .bind(&order.shipping_postal_code)
        .bind(&order.contact_email)
        .bind(order.contact_phone.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        for line in &order.lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                StoreError::DataCorruption(format!("quantity {} out of range", line.quantity))
            })?;

            // Conditional decrement: fails the whole unit rather than going negative.
            let updated = sqlx::query(
                "UPDATE product
                 SET stock_quantity = stock_quantity - $2
                 WHERE id = $1 AND stock_quantity >= $2",
            )
            .bind(line.product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                let available = sqlx::query_scalar::<_, i32>(
                    "SELECT stock_quantity FROM product WHERE id = $1",
                )
                .bind(line.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .unwrap_or(0);

                tx.rollback().await?;
                return Err(StoreError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: u32::try_from(available).unwrap_or(0),
                });
            }

            sqlx::query(
                "INSERT INTO order_item (order_id, product_id, quantity, unit_price)
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(quantity)
            .bind(line.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        insert_tracking(&mut tx, order_id, &order.initial_tracking).await?;

        tx.commit().await?;
        Ok(order_id)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT id, user_id, created_at, total_amount, status, payment_method,
                    payment_status, payment_transaction_id, payment_date,
                    shipping_address, shipping_city, shipping_state, shipping_postal_code,
                    contact_email, contact_phone
             FROM orders
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, quantity, unit_price
             FROM order_item
             WHERE order_id = $1
             ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn set_payment_state(
        &self,
        id: OrderId,
        payment_status: PaymentStatus,
        order_status: OrderStatus,
        transaction_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE orders
             SET payment_status = $2,
                 status = $3,
                 payment_transaction_id = COALESCE($4, payment_transaction_id),
                 payment_date = CASE WHEN $2 = 'paid'::payment_status THEN now()
                                     ELSE payment_date END
             WHERE id = $1",
        )
        .bind(id)
        .bind(payment_status)
        .bind(order_status)
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn append_tracking(
        &self,
        order_id: OrderId,
        entry: NewTrackingEntry,
    ) -> Result<TrackingEntryId, StoreError> {
        let mut tx = self.pool.begin().await?;
        let id = insert_tracking(&mut tx, order_id, &entry).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn tracking_history(&self, order_id: OrderId) -> Result<Vec<TrackingEntry>, StoreError> {
        let entries = sqlx::query_as::<_, TrackingEntry>(
            "SELECT id, order_id, status, description, location, tracking_number,
                    carrier, estimated_delivery, created_by, notify_customer, created_at
             FROM order_tracking
             WHERE order_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn claim_transaction(
        &self,
        order_id: OrderId,
        transaction_id: &str,
    ) -> Result<bool, StoreError> {
        let inserted = sqlx::query(
            "INSERT INTO payment_transaction (order_id, transaction_id)
             VALUES ($1, $2)
             ON CONFLICT (transaction_id) DO NOTHING",
        )
        .bind(order_id)
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        Ok(inserted.rows_affected() == 1)
    }

    async fn release_transaction(
        &self,
        order_id: OrderId,
        transaction_id: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "DELETE FROM payment_transaction
             WHERE order_id = $1 AND transaction_id = $2",
        )
        .bind(order_id)
        .bind(transaction_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

async fn insert_tracking(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order_id: OrderId,
    entry: &NewTrackingEntry,
) -> Result<TrackingEntryId, StoreError> {
    let id = sqlx::query_scalar::<_, TrackingEntryId>(
        "INSERT INTO order_tracking
             (order_id, status, description, location, tracking_number, carrier,
              estimated_delivery, created_by, notify_customer)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING id",
    )
    .bind(order_id)
    .bind(entry.status)
    .bind(&entry.description)
    .bind(entry.location.as_deref())
    .bind(entry.tracking_number.as_deref())
    .bind(entry.carrier.as_deref())
    .bind(entry.estimated_delivery)
    .bind(entry.created_by)
    .bind(entry.notify_customer)
    .fetch_one(&mut **tx)
    .await?;

    Ok(id)
}
