//! Order service: checkout, lifecycle transitions, and the query layer.
//!
//! Checkout is the one place several aggregates must change together: the
//! new order and its items, the stock decrements, and the cart clear all
//! commit in a single transaction or not at all. Each product row is taken
//! `FOR UPDATE` before its stock check, so two checkouts racing for the last
//! unit serialize and exactly one succeeds.

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use rust_decimal::Decimal;
use sqlx::PgPool;

use greengrocer_core::{OrderId, OrderStatus, UserId};

use super::{ServiceError, ServiceResult};
use crate::db::orders::{OrderFilter, OrderSortKey, StatusCount};
use crate::db::{Page, SortDirection, carts, orders, products, OrderRepository};
use crate::models::{Order, OrderDetail, User, Visitor};

/// Listing parameters accepted from the orders page.
#[derive(Debug, Clone, Default)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    /// Inclusive first day, in the store's (UTC) calendar.
    pub start_date: Option<NaiveDate>,
    /// Inclusive last day; the query bound is the start of the next day.
    pub end_date: Option<NaiveDate>,
    /// Product-name substring search across line items.
    pub search: Option<String>,
    pub page: u32,
    pub size: u32,
    pub sort: OrderSortKey,
    pub direction: SortDirection,
}

/// Order operations for the current visitor.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Convert the visitor's cart into a new `ACTIVE` order.
    ///
    /// For every cart line: re-check stock under a row lock, snapshot the
    /// current price and name into an order item, and decrement stock. Then
    /// fix the total and clear the cart. One transaction end to end: a
    /// failure on any line leaves cart and stock untouched.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for guests or a blank store location
    /// - `InvalidState` if the cart is empty
    /// - `InsufficientStock` naming the first product that cannot be covered
    pub async fn create_order_from_cart(
        &self,
        visitor: &Visitor,
        store_location: &str,
        notes: Option<&str>,
    ) -> ServiceResult<OrderDetail> {
        let user = require_customer(visitor)?;

        let store_location = store_location.trim();
        if store_location.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "store location is required".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let cart = carts::find_by_user(&mut tx, user.id)
            .await?
            .ok_or_else(|| ServiceError::InvalidState("cart is empty".to_owned()))?;
        let lines = carts::lines(&mut tx, cart.id).await?;
        if lines.is_empty() {
            return Err(ServiceError::InvalidState("cart is empty".to_owned()));
        }

        let order_number = generate_order_number();
        let order =
            orders::insert_order(&mut tx, user.id, &order_number, store_location, notes).await?;

        let mut items = Vec::with_capacity(lines.len());
        let mut total = Decimal::ZERO;
        for line in &lines {
            let product = products::get_for_update(&mut tx, line.product_id)
                .await?
                .ok_or(ServiceError::NotFound("product"))?;

            if product.quantity < line.quantity {
                return Err(ServiceError::InsufficientStock {
                    product: product.name,
                });
            }

            let item = orders::insert_item(
                &mut tx,
                order.id,
                product.id,
                &product.name,
                line.quantity,
                product.price,
            )
            .await?;
            products::decrement_stock(&mut tx, product.id, line.quantity).await?;

            total += item.subtotal();
            items.push(item);
        }

        orders::set_total(&mut tx, order.id, total).await?;
        carts::clear(&mut tx, cart.id).await?;
        carts::touch(&mut tx, cart.id).await?;

        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            user_id = %user.id,
            %total,
            "order placed"
        );

        Ok(OrderDetail {
            order: Order {
                total_amount: total,
                ..order
            },
            items,
        })
    }

    /// Fetch one order with its items. Customers see only their own orders;
    /// staff see all.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order does not exist
    /// - `Forbidden` if a customer asks for someone else's order
    pub async fn get_order(&self, visitor: &Visitor, id: OrderId) -> ServiceResult<OrderDetail> {
        let user = require_customer(visitor)?;

        let repo = OrderRepository::new(self.pool);
        let order = repo.get(id).await?.ok_or(ServiceError::NotFound("order"))?;

        if order.user_id != user.id && !user.is_staff() {
            return Err(ServiceError::Forbidden(
                "you don't have permission to view this order".to_owned(),
            ));
        }

        let items = repo.items(order.id).await?;
        Ok(OrderDetail { order, items })
    }

    /// Paged order listing with combinable status/date/product filters.
    /// Staff see every order; customers are scoped to their own before the
    /// filters apply.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if a query fails.
    pub async fn list_orders(
        &self,
        visitor: &Visitor,
        query: &OrderListQuery,
    ) -> ServiceResult<Page<Order>> {
        let user = require_customer(visitor)?;

        let filter = OrderFilter {
            user_id: (!user.is_staff()).then_some(user.id),
            status: query.status,
            placed_from: query.start_date.map(start_of_day),
            placed_until: query.end_date.map(|d| start_of_day(d + Duration::days(1))),
            product_term: query.search.clone(),
        };

        let page = OrderRepository::new(self.pool)
            .list(&filter, query.page, query.size, query.sort, query.direction)
            .await?;

        Ok(page)
    }

    /// Transition an order to a new status (staff operation).
    ///
    /// Guards: a cancelled order never transitions; a completed order only
    /// accepts `COMPLETED`. Everything else is allowed. Setting `CANCELLED`
    /// here does not restore stock; that is [`Self::cancel_order`].
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order does not exist
    /// - `InvalidState` for a guarded transition
    pub async fn update_status(
        &self,
        id: OrderId,
        new_status: OrderStatus,
    ) -> ServiceResult<Order> {
        let repo = OrderRepository::new(self.pool);
        let order = repo.get(id).await?.ok_or(ServiceError::NotFound("order"))?;

        if order.status == OrderStatus::Cancelled {
            return Err(ServiceError::InvalidState(
                "cannot update status of a cancelled order".to_owned(),
            ));
        }
        if !order.status.can_transition_to(new_status) {
            return Err(ServiceError::InvalidState(
                "cannot change status of a completed order".to_owned(),
            ));
        }

        let updated = repo.update_status(id, new_status).await?;
        tracing::info!(order_id = %id, from = %order.status, to = %new_status, "order status changed");
        Ok(updated)
    }

    /// Cancel an order, restoring each item's quantity onto its product.
    ///
    /// The caller must own the order or be staff, and the order must still
    /// be `ACTIVE` or `READY_TO_PICKUP`. The order row is locked first so a
    /// concurrent double-cancel restores stock only once.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the order does not exist
    /// - `Forbidden` for non-owner non-staff callers
    /// - `InvalidState` if the order is past cancellation
    pub async fn cancel_order(&self, visitor: &Visitor, id: OrderId) -> ServiceResult<OrderDetail> {
        let user = require_customer(visitor)?;

        let mut tx = self.pool.begin().await?;

        let order = orders::get_for_update(&mut tx, id)
            .await?
            .ok_or(ServiceError::NotFound("order"))?;

        if order.user_id != user.id && !user.is_staff() {
            return Err(ServiceError::Forbidden(
                "you don't have permission to cancel this order".to_owned(),
            ));
        }
        if !order.status.is_cancellable() {
            return Err(ServiceError::InvalidState(
                "only active or ready to pickup orders can be cancelled".to_owned(),
            ));
        }

        let items = orders::items(&mut tx, order.id).await?;
        for item in &items {
            products::restore_stock(&mut tx, item.product_id, item.quantity).await?;
        }

        let cancelled = orders::set_status(&mut tx, order.id, OrderStatus::Cancelled).await?;
        tx.commit().await?;

        tracing::info!(order_id = %id, user_id = %user.id, "order cancelled");
        Ok(OrderDetail {
            order: cancelled,
            items,
        })
    }

    /// Place a new `ACTIVE` order by re-walking an earlier order's items.
    ///
    /// Owner-only. Products that are no longer available are skipped; a
    /// product with some but not enough stock contributes a partial line
    /// that consumes the remainder (down to zero) instead of failing the
    /// whole operation; fully-covered products decrement normally.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the original order does not exist
    /// - `Forbidden` for non-owners
    /// - `InvalidState` if nothing could be carried over
    pub async fn reorder(
        &self,
        visitor: &Visitor,
        id: OrderId,
        store_location: &str,
    ) -> ServiceResult<OrderDetail> {
        let user = require_customer(visitor)?;

        let store_location = store_location.trim();
        if store_location.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "store location is required".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let original = orders::get_for_update(&mut tx, id)
            .await?
            .ok_or(ServiceError::NotFound("order"))?;

        if original.user_id != user.id {
            return Err(ServiceError::Forbidden(
                "you don't have permission to reorder this order".to_owned(),
            ));
        }

        let original_items = orders::items(&mut tx, original.id).await?;

        let order_number = generate_order_number();
        let order =
            orders::insert_order(&mut tx, user.id, &order_number, store_location, None).await?;

        let mut items = Vec::new();
        let mut total = Decimal::ZERO;
        for original_item in &original_items {
            let Some(product) = products::get_for_update(&mut tx, original_item.product_id).await?
            else {
                continue;
            };
            if !product.is_available() {
                continue;
            }

            let quantity = if product.quantity < original_item.quantity {
                // Partial line: take whatever stock remains.
                product.quantity
            } else {
                original_item.quantity
            };

            let item = orders::insert_item(
                &mut tx,
                order.id,
                product.id,
                &product.name,
                quantity,
                product.price,
            )
            .await?;
            products::decrement_stock(&mut tx, product.id, quantity).await?;

            total += item.subtotal();
            items.push(item);
        }

        if items.is_empty() {
            return Err(ServiceError::InvalidState(
                "none of the products from the original order are currently available".to_owned(),
            ));
        }

        orders::set_total(&mut tx, order.id, total).await?;
        tx.commit().await?;

        tracing::info!(
            original_order_id = %id,
            order_id = %order.id,
            user_id = %user.id,
            "reorder placed"
        );

        Ok(OrderDetail {
            order: Order {
                total_amount: total,
                ..order
            },
            items,
        })
    }

    /// Order counts grouped by status (admin dashboard).
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn counts_by_status(&self) -> ServiceResult<Vec<StatusCount>> {
        Ok(OrderRepository::new(self.pool).count_by_status().await?)
    }

    /// How many orders a user has placed.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn count_for_user(&self, user_id: UserId) -> ServiceResult<i64> {
        Ok(OrderRepository::new(self.pool).count_for_user(user_id).await?)
    }
}

/// Orders require a signed-in user.
fn require_customer(visitor: &Visitor) -> ServiceResult<&User> {
    visitor.user().ok_or_else(|| {
        ServiceError::InvalidArgument("you must be signed in to manage orders".to_owned())
    })
}

/// Midnight UTC at the start of the given day.
fn start_of_day(date: NaiveDate) -> chrono::DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Generate an order number like `ORD-1754640000000-X7KQ`.
///
/// The millisecond timestamp keeps numbers roughly sortable; the random
/// suffix and the unique index close the same-millisecond collision window.
fn generate_order_number() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(char::from)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}
