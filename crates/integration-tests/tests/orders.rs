//! Order query-layer and reorder behavior against a live database.
//!
//! Run with a PostgreSQL instance and `GROCER_TEST_DATABASE_URL` set:
//! `cargo test -p greengrocer-integration-tests -- --ignored`

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use greengrocer_core::OrderStatus;
use greengrocer_integration_tests::{
    create_category, create_customer, create_employee, create_product, signed_in, test_pool,
};
use greengrocer_storefront::models::Visitor;
use greengrocer_storefront::services::orders::OrderListQuery;
use greengrocer_storefront::services::{CartService, CatalogService, OrderService, ServiceError};

async fn place_order(
    pool: &sqlx::PgPool,
    visitor: &Visitor,
    product: &greengrocer_storefront::models::Product,
    quantity: i32,
) -> greengrocer_storefront::models::OrderDetail {
    CartService::new(pool)
        .add_product(visitor, product.id, quantity)
        .await
        .expect("add to cart");
    OrderService::new(pool)
        .create_order_from_cart(visitor, "Downtown", None)
        .await
        .expect("checkout")
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn customers_see_their_own_orders_and_staff_see_all() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let product = create_product(&pool, &category, Decimal::new(399, 2), 100).await;

    let customer = signed_in(create_customer(&pool).await);
    let other = signed_in(create_customer(&pool).await);
    let staff = signed_in(create_employee(&pool).await);

    let own = place_order(&pool, &customer, &product, 1).await;
    let theirs = place_order(&pool, &other, &product, 1).await;

    let orders = OrderService::new(&pool);

    // The customer's listing contains only their own order.
    let listing = orders
        .list_orders(&customer, &OrderListQuery::default())
        .await
        .expect("customer listing");
    assert!(listing.items.iter().all(|o| o.id == own.order.id));
    assert_eq!(listing.total_items, 1);

    // Staff see both.
    let listing = orders
        .list_orders(&staff, &OrderListQuery { size: 100, ..Default::default() })
        .await
        .expect("staff listing");
    let ids: Vec<_> = listing.items.iter().map(|o| o.id).collect();
    assert!(ids.contains(&own.order.id));
    assert!(ids.contains(&theirs.order.id));

    // Customers cannot read someone else's order directly either.
    let err = orders
        .get_order(&customer, theirs.order.id)
        .await
        .expect_err("not the owner");
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // But staff can.
    orders
        .get_order(&staff, theirs.order.id)
        .await
        .expect("staff access");
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn listing_filters_combine() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let product = create_product(&pool, &category, Decimal::new(399, 2), 100).await;
    let customer = signed_in(create_customer(&pool).await);

    let placed = place_order(&pool, &customer, &product, 1).await;
    let cancelled = place_order(&pool, &customer, &product, 1).await;
    OrderService::new(&pool)
        .cancel_order(&customer, cancelled.order.id)
        .await
        .expect("cancel");

    let orders = OrderService::new(&pool);

    // Status filter.
    let active = orders
        .list_orders(
            &customer,
            &OrderListQuery {
                status: Some(OrderStatus::Active),
                ..Default::default()
            },
        )
        .await
        .expect("status filter");
    assert_eq!(active.total_items, 1);
    assert_eq!(active.items[0].id, placed.order.id);

    // Date range: today inclusive on both ends finds the orders.
    let today = Utc::now().date_naive();
    let ranged = orders
        .list_orders(
            &customer,
            &OrderListQuery {
                start_date: Some(today),
                end_date: Some(today),
                ..Default::default()
            },
        )
        .await
        .expect("date filter");
    assert_eq!(ranged.total_items, 2);

    // A range ending yesterday finds nothing (end bound is exclusive of
    // the following midnight).
    let stale = orders
        .list_orders(
            &customer,
            &OrderListQuery {
                start_date: Some(today - Duration::days(7)),
                end_date: Some(today - Duration::days(1)),
                ..Default::default()
            },
        )
        .await
        .expect("past range");
    assert_eq!(stale.total_items, 0);

    // Product-name search joins through the line items.
    let named = orders
        .list_orders(
            &customer,
            &OrderListQuery {
                search: Some(product.name.clone()),
                status: Some(OrderStatus::Active),
                ..Default::default()
            },
        )
        .await
        .expect("search filter");
    assert_eq!(named.total_items, 1);

    let missed = orders
        .list_orders(
            &customer,
            &OrderListQuery {
                search: Some("no-such-product-anywhere".to_owned()),
                ..Default::default()
            },
        )
        .await
        .expect("search miss");
    assert_eq!(missed.total_items, 0);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn reorder_takes_partial_stock_rather_than_failing() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let plentiful = create_product(&pool, &category, Decimal::new(399, 2), 100).await;
    let scarce = create_product(&pool, &category, Decimal::new(249, 2), 10).await;
    let customer = signed_in(create_customer(&pool).await);

    let carts = CartService::new(&pool);
    carts
        .add_product(&customer, plentiful.id, 2)
        .await
        .expect("add plentiful");
    carts
        .add_product(&customer, scarce.id, 5)
        .await
        .expect("add scarce");
    let orders = OrderService::new(&pool);
    let original = orders
        .create_order_from_cart(&customer, "Downtown", None)
        .await
        .expect("checkout");

    // Leave only 3 units of the scarce product for the reorder.
    sqlx::query("UPDATE products SET quantity = 3 WHERE id = $1")
        .bind(scarce.id)
        .execute(&pool)
        .await
        .expect("drain");

    let reordered = orders
        .reorder(&customer, original.order.id, "Uptown")
        .await
        .expect("reorder");

    assert_eq!(reordered.items.len(), 2);
    let scarce_line = reordered
        .items
        .iter()
        .find(|i| i.product_id == scarce.id)
        .expect("scarce line present");
    // Partial line: all remaining stock, down to zero.
    assert_eq!(scarce_line.quantity, 3);
    assert_eq!(
        CatalogService::new(&pool)
            .product(scarce.id)
            .await
            .expect("reload")
            .quantity,
        0
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn reorder_with_nothing_available_fails() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let product = create_product(&pool, &category, Decimal::new(399, 2), 5).await;
    let customer = signed_in(create_customer(&pool).await);

    let original = place_order(&pool, &customer, &product, 1).await;

    CatalogService::new(&pool)
        .toggle_active(product.id)
        .await
        .expect("deactivate");

    let orders = OrderService::new(&pool);
    let err = orders
        .reorder(&customer, original.order.id, "Downtown")
        .await
        .expect_err("nothing to carry over");
    assert!(matches!(err, ServiceError::InvalidState(_)));

    // Reorder is owner-only, even for staff.
    let staff = signed_in(create_employee(&pool).await);
    let err = orders
        .reorder(&staff, original.order.id, "Downtown")
        .await
        .expect_err("not the owner");
    assert!(matches!(err, ServiceError::Forbidden(_)));
}
