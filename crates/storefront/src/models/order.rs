//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use greengrocer_core::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// A placed order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing unique token, e.g. `ORD-1754640000000-X7KQ`.
    pub order_number: String,
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Pickup location chosen at checkout.
    pub store_location: String,
    /// Sum of item subtotals, fixed at creation.
    pub total_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One purchased line: an immutable snapshot of product, quantity, and
/// price taken at order creation. Later catalog edits never change it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    /// Product name at purchase time.
    pub product_name: String,
    pub quantity: i32,
    /// Unit price at purchase time.
    pub unit_price: Decimal,
}

impl OrderItem {
    /// `unit_price` × `quantity`.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// An order with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetail {
    /// Sum of item quantities.
    #[must_use]
    pub fn total_items(&self) -> i64 {
        self.items.iter().map(|item| i64::from(item.quantity)).sum()
    }
}

/// Sum of item subtotals; what `orders.total_amount` is set to at creation.
#[must_use]
pub fn total_of(items: &[OrderItem]) -> Decimal {
    items.iter().map(OrderItem::subtotal).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(quantity: i32, unit_price: Decimal) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(1),
            product_name: "Strawberries".to_string(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn test_total_of_items() {
        // 3.99 x 2 + 2.49 x 1 = 10.47
        let items = vec![
            item(2, Decimal::new(399, 2)),
            item(1, Decimal::new(249, 2)),
        ];
        assert_eq!(total_of(&items), Decimal::new(1047, 2));
    }

    #[test]
    fn test_total_of_empty() {
        assert_eq!(total_of(&[]), Decimal::ZERO);
    }
}
