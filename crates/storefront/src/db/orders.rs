//! Order repository and in-transaction order writes.
//!
//! Queries (list/filter/count) go through [`OrderRepository`]. The writes
//! that must commit atomically with stock changes (order creation and
//! cancellation) are free functions over a `PgConnection` so the order
//! service composes them into one transaction.
//!
//! The query layer has no authorization awareness: scoping to the caller's
//! own orders is done by whoever builds the [`OrderFilter`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use greengrocer_core::{OrderId, OrderStatus, ProductId, UserId};

use super::{Page, RepositoryError, SortDirection, clamp_page_size, page_offset};
use crate::models::{Order, OrderItem};

const ORDER_COLUMNS: &str = "id, order_number, user_id, status, store_location, total_amount, \
     notes, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, quantity, unit_price";

/// Combinable order listing filters. All absent = everything.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Restrict to one user's orders (customer scoping).
    pub user_id: Option<UserId>,
    pub status: Option<OrderStatus>,
    /// Inclusive lower bound on `created_at`.
    pub placed_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub placed_until: Option<DateTime<Utc>>,
    /// Case-insensitive substring matched against the line items' products.
    pub product_term: Option<String>,
}

impl OrderFilter {
    fn push_filters(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE TRUE");

        if let Some(user_id) = self.user_id {
            query.push(" AND o.user_id = ").push_bind(user_id);
        }
        if let Some(status) = self.status {
            query.push(" AND o.status = ").push_bind(status);
        }
        if let Some(from) = self.placed_from {
            query.push(" AND o.created_at >= ").push_bind(from);
        }
        if let Some(until) = self.placed_until {
            query.push(" AND o.created_at < ").push_bind(until);
        }
        if let Some(ref term) = self.product_term {
            query
                .push(
                    " AND EXISTS (SELECT 1 FROM order_items oi \
                     JOIN products p ON p.id = oi.product_id \
                     WHERE oi.order_id = o.id AND p.name ILIKE ",
                )
                .push_bind(format!("%{term}%"))
                .push(")");
        }
    }
}

/// Sort keys accepted for order listings. Unknown keys fall back to
/// `CreatedAt` rather than reaching the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderSortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    TotalAmount,
    Status,
    OrderNumber,
}

impl OrderSortKey {
    /// Parse a caller-supplied sort key, falling back to the default.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "updated_at" | "updatedAt" => Self::UpdatedAt,
            "total_amount" | "totalAmount" => Self::TotalAmount,
            "status" => Self::Status,
            "order_number" | "orderNumber" => Self::OrderNumber,
            _ => Self::CreatedAt,
        }
    }

    const fn as_sql(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::TotalAmount => "total_amount",
            Self::Status => "status",
            Self::OrderNumber => "order_number",
        }
    }
}

/// Per-status order counts (admin dashboard).
#[derive(Debug, Clone, serde::Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Repository for order queries and single-row status updates.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// Get an order by its order number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(order_number)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// An order's line items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }

    /// Filtered, paged, sorted order listing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: u32,
        size: u32,
        sort: OrderSortKey,
        direction: SortDirection,
    ) -> Result<Page<Order>, RepositoryError> {
        let size = clamp_page_size(size);

        let mut count_query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM orders o");
        filter.push_filters(&mut count_query);
        let total_items: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query: QueryBuilder<'_, Postgres> = QueryBuilder::new(
            "SELECT o.id, o.order_number, o.user_id, o.status, o.store_location, \
             o.total_amount, o.notes, o.created_at, o.updated_at FROM orders o",
        );
        filter.push_filters(&mut query);
        query
            .push(" ORDER BY o.")
            .push(sort.as_sql())
            .push(" ")
            .push(direction.as_sql())
            .push(" LIMIT ")
            .push_bind(i64::from(size))
            .push(" OFFSET ")
            .push_bind(page_offset(page, size));

        let orders = query.build_query_as().fetch_all(self.pool).await?;

        Ok(Page::new(orders, page, size, total_items))
    }

    /// Overwrite an order's status, bumping `updated_at`.
    ///
    /// Transition legality is the order service's concern.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        order.ok_or(RepositoryError::NotFound)
    }

    /// Order counts grouped by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self) -> Result<Vec<StatusCount>, RepositoryError> {
        let counts = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM orders GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(counts)
    }

    /// How many orders a user has placed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_user(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// In-transaction order writes
// =============================================================================

/// Insert the order header. Items and the final total follow in the same
/// transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` on an order-number collision.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert_order(
    conn: &mut PgConnection,
    user_id: UserId,
    order_number: &str,
    store_location: &str,
    notes: Option<&str>,
) -> Result<Order, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "INSERT INTO orders (order_number, user_id, status, store_location, total_amount, notes) \
         VALUES ($1, $2, $3, $4, 0, $5) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order_number)
    .bind(user_id)
    .bind(OrderStatus::Active)
    .bind(store_location)
    .bind(notes)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict("order number collision".to_owned());
        }
        RepositoryError::Database(e)
    })?;

    Ok(order)
}

/// Append a purchase-time snapshot line to an order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert_item(
    conn: &mut PgConnection,
    order_id: OrderId,
    product_id: ProductId,
    product_name: &str,
    quantity: i32,
    unit_price: Decimal,
) -> Result<OrderItem, RepositoryError> {
    let item = sqlx::query_as::<_, OrderItem>(&format!(
        "INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(order_id)
    .bind(product_id)
    .bind(product_name)
    .bind(quantity)
    .bind(unit_price)
    .fetch_one(&mut *conn)
    .await?;

    Ok(item)
}

/// Fix the order total once every line is in.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn set_total(
    conn: &mut PgConnection,
    order_id: OrderId,
    total: Decimal,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE orders SET total_amount = $2 WHERE id = $1")
        .bind(order_id)
        .bind(total)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Load an order with a row lock, so concurrent cancellations of the same
/// order serialize and stock is restored exactly once.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_for_update(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

/// An order's line items, inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn items(
    conn: &mut PgConnection,
    order_id: OrderId,
) -> Result<Vec<OrderItem>, RepositoryError> {
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Overwrite an order's status inside a transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<Order, RepositoryError> {
    let order = sqlx::query_as::<_, Order>(&format!(
        "UPDATE orders SET status = $2, updated_at = NOW() \
         WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(&mut *conn)
    .await?;

    order.ok_or(RepositoryError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_key_parse_whitelist() {
        assert_eq!(OrderSortKey::parse("status"), OrderSortKey::Status);
        assert_eq!(OrderSortKey::parse("totalAmount"), OrderSortKey::TotalAmount);
        // Unknown keys fall back instead of reaching the database.
        assert_eq!(OrderSortKey::parse("notes;--"), OrderSortKey::CreatedAt);
    }
}
