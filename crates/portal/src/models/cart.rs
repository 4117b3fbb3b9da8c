//! Session-scoped shopping cart.
//!
//! A plain mapping from product ID to a product snapshot plus quantity.
//! The cart lives in the session and nowhere else: it is a convenience, not
//! a durable order, and dies with the session. The total is always derived
//! on read, never stored.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use reseller_core::ProductId;

use crate::catalog::Product;

/// A cart line: a product snapshot captured at add time, plus a quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
}

impl CartItem {
    /// Snapshot a catalog product as a cart line with quantity 1.
    #[must_use]
    pub fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            image: product.images.first().map(|img| img.src.clone()),
            quantity: 1,
        }
    }

    /// Line subtotal: unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The cart: product ID to line, unique per product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cart {
    items: BTreeMap<ProductId, CartItem>,
}

impl Cart {
    /// Add a product snapshot to the cart.
    ///
    /// If the product is already present its quantity is incremented by one;
    /// otherwise the snapshot is inserted with quantity one. Never fails.
    pub fn add(&mut self, item: CartItem) {
        self.items
            .entry(item.product_id)
            .and_modify(|existing| existing.quantity += 1)
            .or_insert(CartItem { quantity: 1, ..item });
    }

    /// Remove a product's line entirely. No-op if absent.
    pub fn remove(&mut self, product_id: ProductId) {
        self.items.remove(&product_id);
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Cart total, recomputed on each read.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.values().map(CartItem::subtotal).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.values().map(|item| item.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The cart lines, ordered by product ID.
    #[must_use]
    pub fn items(&self) -> Vec<&CartItem> {
        self.items.values().collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i64, pence: i64) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: Decimal::new(pence, 2),
            image: None,
            quantity: 1,
        }
    }

    #[test]
    fn test_add_new_product_inserts_with_quantity_one() {
        let mut cart = Cart::default();
        cart.add(item(1, 4999));

        assert_eq!(cart.count(), 1);
        assert_eq!(cart.total(), Decimal::new(4999, 2));
    }

    #[test]
    fn test_add_existing_product_increments_quantity() {
        let mut cart = Cart::default();
        cart.add(item(1, 4999));
        cart.add(item(1, 4999));
        cart.add(item(1, 4999));

        assert_eq!(cart.count(), 3);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.total(), Decimal::new(3 * 4999, 2));
    }

    #[test]
    fn test_total_is_sum_over_current_mapping() {
        let mut cart = Cart::default();
        cart.add(item(1, 4999)); // 49.99
        cart.add(item(2, 1250)); // 12.50
        cart.add(item(2, 1250)); // 12.50
        cart.add(item(3, 100)); // 1.00

        // 49.99 + 2 * 12.50 + 1.00
        assert_eq!(cart.total(), Decimal::new(7599, 2));

        cart.remove(ProductId::new(2));
        assert_eq!(cart.total(), Decimal::new(5099, 2));
    }

    #[test]
    fn test_remove_absent_product_is_noop() {
        let mut cart = Cart::default();
        cart.add(item(1, 4999));
        cart.remove(ProductId::new(99));

        assert_eq!(cart.count(), 1);
        assert_eq!(cart.total(), Decimal::new(4999, 2));
    }

    #[test]
    fn test_clear_then_total_is_zero() {
        let mut cart = Cart::default();
        cart.add(item(1, 4999));
        cart.add(item(2, 1250));
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_line_subtotal() {
        let mut line = item(1, 1250);
        line.quantity = 4;
        assert_eq!(line.subtotal(), Decimal::new(5000, 2));
    }

    #[test]
    fn test_cart_serde_roundtrip() {
        // The cart rides in the session store, so it must survive a
        // serialize/deserialize cycle including its map keys.
        let mut cart = Cart::default();
        cart.add(item(1123, 4999));
        cart.add(item(1123, 4999));
        cart.add(item(7, 1250));

        let json = serde_json::to_string(&cart).unwrap();
        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
        assert_eq!(restored.total(), cart.total());
    }
}
