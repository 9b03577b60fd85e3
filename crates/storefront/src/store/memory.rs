//! In-memory order store.
//!
//! Used by the integration tests and local experimentation. A single mutex
//! serializes writes, so `create_order` has the same all-or-nothing and
//! no-oversell behavior as the `PostgreSQL` transaction: stock for every
//! line is checked before any mutation is applied.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use satchel_core::{
    Email, OrderId, OrderStatus, PaymentStatus, ProductId, TrackingEntryId, UserId,
};

use super::{
    NewOrder, NewTrackingEntry, Order, OrderItem, OrderStore, Product, StoreError, TrackingEntry,
    User,
};

#[derive(Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    users: HashMap<UserId, User>,
    orders: HashMap<OrderId, Order>,
    items: HashMap<OrderId, Vec<OrderItem>>,
    tracking: HashMap<OrderId, Vec<TrackingEntry>>,
    claimed_transactions: HashSet<String>,
    next_order_id: i32,
    next_item_id: i32,
    next_tracking_id: i32,
}

/// In-memory [`OrderStore`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a product into the catalog.
    pub fn insert_product(&self, product: Product) {
        self.inner.lock().products.insert(product.id, product);
    }

    /// Seed a user.
    pub fn insert_user(&self, id: UserId, email: Email, phone: Option<String>) {
        self.inner.lock().users.insert(id, User { id, email, phone });
    }

    /// Current stock of a product, if it exists.
    #[must_use]
    pub fn stock(&self, id: ProductId) -> Option<i32> {
        self.inner.lock().products.get(&id).map(|p| p.stock_quantity)
    }

    /// Number of orders persisted.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.inner.lock().orders.len()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn product(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        Ok(self.inner.lock().products.get(&id).cloned())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.lock().users.get(&id).cloned())
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderId, StoreError> {
        let mut inner = self.inner.lock();

        // Validate every line before mutating anything.
        for line in &order.lines {
            let available = inner
                .products
                .get(&line.product_id)
                .map_or(0, |p| p.stock_quantity);
            let requested = i64::from(line.quantity);
            if i64::from(available) < requested {
                return Err(StoreError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: u32::try_from(available.max(0)).unwrap_or(0),
                });
            }
        }

        inner.next_order_id += 1;
        let order_id = OrderId::new(inner.next_order_id);
        let now = Utc::now();

        for line in &order.lines {
            if let Some(product) = inner.products.get_mut(&line.product_id) {
                product.stock_quantity -= i32::try_from(line.quantity).map_err(|_| {
                    StoreError::DataCorruption(format!("quantity {} out of range", line.quantity))
                })?;
            }
        }

        let items = order
            .lines
            .iter()
            .map(|line| {
                inner.next_item_id += 1;
                Ok(OrderItem {
                    id: satchel_core::OrderItemId::new(inner.next_item_id),
                    order_id,
                    product_id: line.product_id,
                    quantity: i32::try_from(line.quantity).map_err(|_| {
                        StoreError::DataCorruption(format!(
                            "quantity {} out of range",
                            line.quantity
                        ))
                    })?,
                    unit_price: line.unit_price,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        inner.orders.insert(
            order_id,
            Order {
                id: order_id,
                user_id: order.user_id,
                created_at: now,
                total_amount: order.total_amount,
                status: OrderStatus::Pending,
                payment_method: order.payment_method,
                payment_status: PaymentStatus::Pending,
                payment_transaction_id: None,
                payment_date: None,
                shipping_address: order.shipping_address,
                shipping_city: order.shipping_city,
                shipping_state: order.shipping_state,
                shipping_postal_code: order.shipping_postal_code,
                contact_email: order.contact_email,
                contact_phone: order.contact_phone,
            },
        );
        inner.items.insert(order_id, items);

        push_tracking(&mut inner, order_id, &order.initial_tracking);

        Ok(order_id)
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.inner.lock().orders.get(&id).cloned())
    }

    async fn order_items(&self, id: OrderId) -> Result<Vec<OrderItem>, StoreError> {
        Ok(self.inner.lock().items.get(&id).cloned().unwrap_or_default())
    }

    async fn set_payment_state(
        &self,
        id: OrderId,
        payment_status: PaymentStatus,
        order_status: OrderStatus,
        transaction_id: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let order = inner.orders.get_mut(&id).ok_or(StoreError::NotFound)?;

        order.payment_status = payment_status;
        order.status = order_status;
        if let Some(txn) = transaction_id {
            order.payment_transaction_id = Some(txn.to_owned());
        }
        if payment_status == PaymentStatus::Paid {
            order.payment_date = Some(Utc::now());
        }
        Ok(())
    }

    async fn append_tracking(
        &self,
        order_id: OrderId,
        entry: NewTrackingEntry,
    ) -> Result<TrackingEntryId, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.orders.contains_key(&order_id) {
            return Err(StoreError::NotFound);
        }
        Ok(push_tracking(&mut inner, order_id, &entry))
    }

    async fn tracking_history(&self, order_id: OrderId) -> Result<Vec<TrackingEntry>, StoreError> {
        Ok(self
            .inner
            .lock()
            .tracking
            .get(&order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn claim_transaction(
        &self,
        _order_id: OrderId,
        transaction_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .lock()
            .claimed_transactions
            .insert(transaction_id.to_owned()))
    }

    async fn release_transaction(
        &self,
        _order_id: OrderId,
        transaction_id: &str,
    ) -> Result<(), StoreError> {
        self.inner.lock().claimed_transactions.remove(transaction_id);
        Ok(())
    }
}

fn push_tracking(inner: &mut Inner, order_id: OrderId, entry: &NewTrackingEntry) -> TrackingEntryId {
    inner.next_tracking_id += 1;
    let id = TrackingEntryId::new(inner.next_tracking_id);
    inner.tracking.entry(order_id).or_default().push(TrackingEntry {
        id,
        order_id,
        status: entry.status,
        description: entry.description.clone(),
        location: entry.location.clone(),
        tracking_number: entry.tracking_number.clone(),
        carrier: entry.carrier.clone(),
        estimated_delivery: entry.estimated_delivery,
        created_by: entry.created_by,
        notify_customer: entry.notify_customer,
        created_at: Utc::now(),
    });
    id
}
