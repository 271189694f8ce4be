//! Catalog domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use greengrocer_core::{CategoryId, ProductId, Sku};

/// A product category (static reference data with display metadata).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductCategory {
    pub id: CategoryId,
    /// Unique category name.
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    /// Icon identifier used by the frontend.
    pub icon: Option<String>,
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    /// Unique stock-keeping unit.
    pub sku: Sku,
    pub name: String,
    pub description: Option<String>,
    /// Unit price. Orders snapshot this at purchase time.
    pub price: Decimal,
    /// On-hand stock. Never negative (enforced here and by a CHECK constraint).
    pub quantity: i32,
    /// Stock level at or below which the product counts as low stock.
    pub reorder_level: i32,
    pub image_url: Option<String>,
    /// Inactive products are hidden from the catalog and cannot be bought.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// A product can be bought only while active and in stock.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.is_active && self.quantity > 0
    }

    /// Whether on-hand stock has fallen to the reorder level.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(quantity: i32, is_active: bool) -> Product {
        Product {
            id: ProductId::new(1),
            category_id: CategoryId::new(1),
            sku: Sku::parse("APPLE-001").unwrap(),
            name: "Organic Apples".to_string(),
            description: None,
            price: Decimal::new(399, 2),
            quantity,
            reorder_level: 10,
            image_url: None,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_availability_requires_active_and_stock() {
        assert!(product(5, true).is_available());
        assert!(!product(0, true).is_available());
        assert!(!product(5, false).is_available());
    }

    #[test]
    fn test_low_stock_uses_reorder_level() {
        assert!(product(10, true).is_low_stock());
        assert!(product(0, true).is_low_stock());
        assert!(!product(11, true).is_low_stock());
    }
}
