//! Cart domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use greengrocer_core::{CartId, CartItemId, ProductId, UserId};

/// A user's cart. Created lazily on first cart interaction and cleared,
/// never deleted, after a successful checkout.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    /// Owning user; exactly one cart per user.
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One stored cart row: (cart, product, quantity).
///
/// At most one row exists per (cart, product) pair; adding the same product
/// again merges quantities instead of inserting a second row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    /// Always positive; a zero-quantity update deletes the row instead.
    pub quantity: i32,
}

/// A cart row joined with its product, as rendered to the customer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub product_name: String,
    /// Current catalog price. Carts track live prices; only orders snapshot.
    pub unit_price: Decimal,
    pub quantity: i32,
    /// Whether the product is still active and in stock.
    pub available: bool,
}

impl CartLine {
    /// `unit_price` × `quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A cart with its lines and derived totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartContents {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
    /// Sum of line subtotals.
    pub total: Decimal,
    /// Sum of line quantities.
    pub item_count: i64,
}

impl CartContents {
    /// Assemble contents from a cart and its joined lines.
    #[must_use]
    pub fn new(cart: Cart, lines: Vec<CartLine>) -> Self {
        let total = lines.iter().map(CartLine::subtotal).sum();
        let item_count = lines.iter().map(|line| i64::from(line.quantity)).sum();
        Self {
            cart,
            lines,
            total,
            item_count,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(quantity: i32, unit_price: Decimal) -> CartLine {
        CartLine {
            id: CartItemId::new(1),
            cart_id: CartId::new(1),
            product_id: ProductId::new(1),
            product_name: "Bananas".to_string(),
            unit_price,
            quantity,
            available: true,
        }
    }

    #[test]
    fn test_line_subtotal() {
        assert_eq!(line(3, Decimal::new(249, 2)).subtotal(), Decimal::new(747, 2));
    }

    #[test]
    fn test_contents_totals() {
        let cart = Cart {
            id: CartId::new(1),
            user_id: greengrocer_core::UserId::new(1),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let contents = CartContents::new(
            cart,
            vec![line(2, Decimal::new(399, 2)), line(1, Decimal::new(249, 2))],
        );

        assert_eq!(contents.total, Decimal::new(1047, 2));
        assert_eq!(contents.item_count, 3);
        assert!(!contents.is_empty());
    }
}
