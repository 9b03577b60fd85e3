//! Session-backed shopping cart.
//!
//! The cart is an ordered list of price-snapshot lines serialized into the
//! shopper's session under a single key. It is exclusively owned by that
//! session, so there is no locking here; corrupt or missing session data is
//! treated as an empty cart rather than an error.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use satchel_core::ProductId;

use crate::models::session_keys;

/// One product's quantity and price snapshot within the cart.
///
/// `unit_price` and `stock_quantity` are captured when the item is added and
/// deliberately do not follow later catalog changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
}

impl CartLine {
    /// Line subtotal at the snapshot price.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A shopper's in-progress cart. Lines keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// The lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Quantity currently in the cart for a product.
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id)
            .map_or(0, |line| line.quantity)
    }

    /// Sum of line subtotals at snapshot prices.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Add a line, merging with an existing line for the same product by
    /// summing quantities.
    pub fn add(&mut self, line: CartLine) {
        match self
            .lines
            .iter_mut()
            .find(|existing| existing.product_id == line.product_id)
        {
            Some(existing) => existing.quantity += line.quantity,
            None => self.lines.push(line),
        }
    }

    /// Set a line's quantity. A quantity of zero removes the line; a product
    /// not in the cart is ignored.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            self.remove(product_id);
            return;
        }
        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            line.quantity = quantity;
        }
    }

    /// Remove a product's line, if present.
    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Load the cart from the session. Missing or undeserializable data yields
/// an empty cart.
pub async fn load(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::SHOPPING_CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Persist the cart back into the session.
///
/// # Errors
///
/// Returns the session store's error if the write fails.
pub async fn save(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::SHOPPING_CART, cart).await
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn line(id: i32, price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            product_name: format!("Bag {id}"),
            unit_price: price,
            quantity,
            image_url: None,
            stock_quantity: 10,
        }
    }

    #[test]
    fn add_merges_lines_for_the_same_product() {
        let mut cart = Cart::default();
        cart.add(line(1, dec!(10.00), 2));
        cart.add(line(1, dec!(10.00), 3));

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(1)), 5);
        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn lines_keep_insertion_order() {
        let mut cart = Cart::default();
        cart.add(line(3, dec!(5.00), 1));
        cart.add(line(1, dec!(7.00), 1));
        cart.add(line(2, dec!(9.00), 1));
        cart.add(line(1, dec!(7.00), 1));

        let ids: Vec<i32> = cart.lines().iter().map(|l| l.product_id.as_i32()).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn update_quantity_zero_is_equivalent_to_remove() {
        let mut a = Cart::default();
        a.add(line(1, dec!(10.00), 2));
        a.add(line(2, dec!(25.00), 1));
        let mut b = a.clone();

        a.update_quantity(ProductId::new(1), 0);
        b.remove(ProductId::new(1));

        assert_eq!(a, b);
        assert_eq!(a.lines().len(), 1);
    }

    #[test]
    fn op_sequence_nets_out() {
        let mut cart = Cart::default();
        cart.add(line(1, dec!(10.00), 2));
        cart.add(line(2, dec!(25.00), 1));
        cart.update_quantity(ProductId::new(1), 4);
        cart.add(line(3, dec!(3.00), 6));
        cart.remove(ProductId::new(2));
        cart.update_quantity(ProductId::new(3), 1);

        assert_eq!(cart.quantity_of(ProductId::new(1)), 4);
        assert_eq!(cart.quantity_of(ProductId::new(2)), 0);
        assert_eq!(cart.quantity_of(ProductId::new(3)), 1);
        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.total(), dec!(43.00));
    }

    #[test]
    fn update_quantity_for_absent_product_is_a_no_op() {
        let mut cart = Cart::default();
        cart.add(line(1, dec!(10.00), 2));
        cart.update_quantity(ProductId::new(9), 5);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.quantity_of(ProductId::new(9)), 0);
    }

    #[test]
    fn total_uses_snapshot_prices() {
        let mut cart = Cart::default();
        cart.add(line(1, dec!(10.00), 2));
        cart.add(line(2, dec!(25.00), 1));

        assert_eq!(cart.total(), dec!(45.00));
    }

    #[test]
    fn clear_empties_the_cart() {
        let mut cart = Cart::default();
        cart.add(line(1, dec!(10.00), 2));
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn corrupt_payload_deserializes_to_nothing() {
        // Session loads fall back to an empty cart when this fails.
        let corrupt: Result<Cart, _> = serde_json::from_str("{\"lines\": \"oops\"}");
        assert!(corrupt.is_err());

        let round_trip: Cart = serde_json::from_str(
            &serde_json::to_string(&Cart::default()).expect("serialize"),
        )
        .expect("deserialize");
        assert!(round_trip.is_empty());
    }
}
