//! Checkout workflow properties against a live database: totals, snapshot
//! prices, atomicity, stock restoration, and the concurrent last-unit race.
//!
//! Run with a PostgreSQL instance and `GROCER_TEST_DATABASE_URL` set:
//! `cargo test -p greengrocer-integration-tests -- --ignored`

use rust_decimal::Decimal;

use greengrocer_core::OrderStatus;
use greengrocer_integration_tests::{
    create_category, create_customer, create_product, signed_in, test_pool,
};
use greengrocer_storefront::services::{CartService, CatalogService, OrderService, ServiceError};

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn checkout_totals_stock_and_cart_clearing() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    // Product A at 3.99, product B at 2.49
    let product_a = create_product(&pool, &category, Decimal::new(399, 2), 100).await;
    let product_b = create_product(&pool, &category, Decimal::new(249, 2), 100).await;
    let visitor = signed_in(create_customer(&pool).await);

    let carts = CartService::new(&pool);
    carts
        .add_product(&visitor, product_a.id, 2)
        .await
        .expect("add A");
    carts
        .add_product(&visitor, product_b.id, 1)
        .await
        .expect("add B");

    let detail = OrderService::new(&pool)
        .create_order_from_cart(&visitor, "Downtown", Some("ring twice"))
        .await
        .expect("checkout");

    // 3.99 x 2 + 2.49 x 1 = 10.47
    assert_eq!(detail.order.total_amount, Decimal::new(1047, 2));
    assert_eq!(detail.order.status, OrderStatus::Active);
    assert_eq!(detail.order.store_location, "Downtown");
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.total_items(), 3);

    // Stock decremented by the purchased amounts.
    let catalog = CatalogService::new(&pool);
    assert_eq!(catalog.product(product_a.id).await.expect("A").quantity, 98);
    assert_eq!(catalog.product(product_b.id).await.expect("B").quantity, 99);

    // Cart is empty afterward, but still exists.
    let contents = carts.contents(&visitor).await.expect("cart");
    assert!(contents.is_empty());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn order_items_snapshot_the_purchase_price() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let product = create_product(&pool, &category, Decimal::new(399, 2), 50).await;
    let visitor = signed_in(create_customer(&pool).await);

    CartService::new(&pool)
        .add_product(&visitor, product.id, 1)
        .await
        .expect("add");
    let orders = OrderService::new(&pool);
    let detail = orders
        .create_order_from_cart(&visitor, "Downtown", None)
        .await
        .expect("checkout");

    // Raise the catalog price after purchase.
    sqlx::query("UPDATE products SET price = 99.99 WHERE id = $1")
        .bind(product.id)
        .execute(&pool)
        .await
        .expect("price change");

    let reloaded = orders
        .get_order(&visitor, detail.order.id)
        .await
        .expect("reload");
    assert_eq!(reloaded.items[0].unit_price, Decimal::new(399, 2));
    assert_eq!(reloaded.order.total_amount, Decimal::new(399, 2));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn empty_cart_checkout_is_rejected() {
    let pool = test_pool().await;
    let visitor = signed_in(create_customer(&pool).await);

    let err = OrderService::new(&pool)
        .create_order_from_cart(&visitor, "Downtown", None)
        .await
        .expect_err("empty cart");
    assert!(matches!(err, ServiceError::InvalidState(_)));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn failed_checkout_rolls_back_everything() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let plentiful = create_product(&pool, &category, Decimal::new(399, 2), 100).await;
    let scarce = create_product(&pool, &category, Decimal::new(249, 2), 5).await;
    let visitor = signed_in(create_customer(&pool).await);

    let carts = CartService::new(&pool);
    carts
        .add_product(&visitor, plentiful.id, 2)
        .await
        .expect("add plentiful");
    carts
        .add_product(&visitor, scarce.id, 5)
        .await
        .expect("add scarce");

    // Someone else drains the scarce product between add and checkout.
    sqlx::query("UPDATE products SET quantity = 1 WHERE id = $1")
        .bind(scarce.id)
        .execute(&pool)
        .await
        .expect("drain stock");

    let err = OrderService::new(&pool)
        .create_order_from_cart(&visitor, "Downtown", None)
        .await
        .expect_err("second line cannot be covered");
    assert!(matches!(err, ServiceError::InsufficientStock { .. }));

    // The first line's decrement was rolled back with everything else.
    let catalog = CatalogService::new(&pool);
    assert_eq!(
        catalog.product(plentiful.id).await.expect("reload").quantity,
        100
    );
    assert_eq!(catalog.product(scarce.id).await.expect("reload").quantity, 1);

    // The cart survives untouched.
    let contents = carts.contents(&visitor).await.expect("cart");
    assert_eq!(contents.lines.len(), 2);

    // And no half-written order exists for this user.
    let orders = OrderService::new(&pool)
        .list_orders(&visitor, &Default::default())
        .await
        .expect("list");
    assert_eq!(orders.total_items, 0);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn concurrent_checkout_of_last_unit_oversells_nothing() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let product = create_product(&pool, &category, Decimal::new(399, 2), 1).await;

    let buyer_a = signed_in(create_customer(&pool).await);
    let buyer_b = signed_in(create_customer(&pool).await);

    let carts = CartService::new(&pool);
    carts
        .add_product(&buyer_a, product.id, 1)
        .await
        .expect("A adds");
    carts
        .add_product(&buyer_b, product.id, 1)
        .await
        .expect("B adds");

    let task = |visitor: greengrocer_storefront::models::Visitor| {
        let pool = pool.clone();
        tokio::spawn(async move {
            OrderService::new(&pool)
                .create_order_from_cart(&visitor, "Downtown", None)
                .await
        })
    };

    let (result_a, result_b) = tokio::join!(task(buyer_a), task(buyer_b));
    let result_a = result_a.expect("task A");
    let result_b = result_b.expect("task B");

    // Exactly one success, one InsufficientStock, never both.
    let successes = [&result_a, &result_b]
        .iter()
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(successes, 1, "{result_a:?} / {result_b:?}");

    let failure = if result_a.is_err() { result_a } else { result_b };
    assert!(matches!(
        failure,
        Err(ServiceError::InsufficientStock { .. })
    ));

    let remaining = CatalogService::new(&pool)
        .product(product.id)
        .await
        .expect("reload")
        .quantity;
    assert_eq!(remaining, 0);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn cancel_restores_stock_once() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let product_a = create_product(&pool, &category, Decimal::new(399, 2), 50).await;
    let product_b = create_product(&pool, &category, Decimal::new(249, 2), 50).await;
    let visitor = signed_in(create_customer(&pool).await);

    let carts = CartService::new(&pool);
    carts
        .add_product(&visitor, product_a.id, 2)
        .await
        .expect("add A");
    carts
        .add_product(&visitor, product_b.id, 1)
        .await
        .expect("add B");

    let orders = OrderService::new(&pool);
    let detail = orders
        .create_order_from_cart(&visitor, "Downtown", None)
        .await
        .expect("checkout");

    let cancelled = orders
        .cancel_order(&visitor, detail.order.id)
        .await
        .expect("cancel");
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);

    // Both products back at their pre-order levels.
    let catalog = CatalogService::new(&pool);
    assert_eq!(catalog.product(product_a.id).await.expect("A").quantity, 50);
    assert_eq!(catalog.product(product_b.id).await.expect("B").quantity, 50);

    // A second cancel must fail and must not restore stock again.
    let err = orders
        .cancel_order(&visitor, detail.order.id)
        .await
        .expect_err("already cancelled");
    assert!(matches!(err, ServiceError::InvalidState(_)));
    assert_eq!(catalog.product(product_a.id).await.expect("A").quantity, 50);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn status_guards_hold_for_stored_orders() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let product = create_product(&pool, &category, Decimal::new(399, 2), 10).await;
    let visitor = signed_in(create_customer(&pool).await);

    CartService::new(&pool)
        .add_product(&visitor, product.id, 1)
        .await
        .expect("add");
    let orders = OrderService::new(&pool);
    let detail = orders
        .create_order_from_cart(&visitor, "Downtown", None)
        .await
        .expect("checkout");
    let order_id = detail.order.id;

    // Complete the order; afterwards only COMPLETED itself is accepted.
    orders
        .update_status(order_id, OrderStatus::Completed)
        .await
        .expect("complete");
    for target in [
        OrderStatus::Active,
        OrderStatus::ReadyToPickup,
        OrderStatus::Cancelled,
        OrderStatus::RefundProcessing,
        OrderStatus::Refunded,
    ] {
        let err = orders
            .update_status(order_id, target)
            .await
            .expect_err("completed orders are frozen");
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
    orders
        .update_status(order_id, OrderStatus::Completed)
        .await
        .expect("COMPLETED -> COMPLETED is the one allowed move");

    // A cancelled order rejects every transition.
    CartService::new(&pool)
        .add_product(&visitor, product.id, 1)
        .await
        .expect("add again");
    let second = orders
        .create_order_from_cart(&visitor, "Downtown", None)
        .await
        .expect("second order");
    orders
        .cancel_order(&visitor, second.order.id)
        .await
        .expect("cancel");
    for target in OrderStatus::ALL {
        let err = orders
            .update_status(second.order.id, target)
            .await
            .expect_err("cancelled orders are terminal");
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }
}
