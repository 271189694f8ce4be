//! Catalog store behavior against a live database.
//!
//! Run with a PostgreSQL instance and `GROCER_TEST_DATABASE_URL` set:
//! `cargo test -p greengrocer-integration-tests -- --ignored`

use rust_decimal::Decimal;

use greengrocer_core::Sku;
use greengrocer_integration_tests::{create_category, create_product, test_pool, unique};
use greengrocer_storefront::db::products::{NewProduct, ProductChanges, ProductSearchCriteria};
use greengrocer_storefront::services::{CatalogService, ServiceError};

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn duplicate_sku_is_rejected_on_create_and_rename() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let catalog = CatalogService::new(&pool);

    let existing = create_product(&pool, &category, Decimal::new(399, 2), 10).await;
    let other = create_product(&pool, &category, Decimal::new(249, 2), 10).await;

    // Creating with a taken SKU fails.
    let duplicate = NewProduct {
        category_id: category.id,
        sku: existing.sku.clone(),
        name: unique("Product"),
        description: None,
        price: Decimal::new(100, 2),
        quantity: 1,
        reorder_level: 5,
        image_url: None,
    };
    let err = catalog
        .create_product(&duplicate)
        .await
        .expect_err("duplicate SKU");
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Renaming another product onto that SKU fails too.
    let changes = ProductChanges {
        category_id: category.id,
        sku: existing.sku.clone(),
        name: other.name.clone(),
        description: None,
        price: other.price,
        quantity: other.quantity,
        reorder_level: other.reorder_level,
        image_url: None,
        is_active: true,
    };
    let err = catalog
        .update_product(other.id, &changes)
        .await
        .expect_err("SKU collision");
    assert!(matches!(err, ServiceError::Conflict(_)));

    // Keeping its own SKU on update is fine.
    let changes = ProductChanges {
        sku: other.sku.clone(),
        price: Decimal::new(299, 2),
        ..changes
    };
    let updated = catalog
        .update_product(other.id, &changes)
        .await
        .expect("self-update");
    assert_eq!(updated.price, Decimal::new(299, 2));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn search_filters_term_category_price_and_stock() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let catalog = CatalogService::new(&pool);

    let needle = unique("needle");
    let cheap = NewProduct {
        category_id: category.id,
        sku: Sku::parse(&unique("SKU")).expect("sku"),
        name: format!("{needle} crackers"),
        description: None,
        price: Decimal::new(199, 2),
        quantity: 10,
        reorder_level: 5,
        image_url: None,
    };
    let dear = NewProduct {
        sku: Sku::parse(&unique("SKU")).expect("sku"),
        name: format!("{needle} caviar"),
        price: Decimal::new(4999, 2),
        quantity: 0,
        ..cheap.clone()
    };
    catalog.create_product(&cheap).await.expect("cheap");
    catalog.create_product(&dear).await.expect("dear");

    // Term is matched case-insensitively as a substring.
    let criteria = ProductSearchCriteria {
        term: Some(needle.to_uppercase()),
        ..Default::default()
    };
    let page = catalog.search_products(&criteria).await.expect("by term");
    assert_eq!(page.total_items, 2);

    // Price ceiling excludes the caviar.
    let criteria = ProductSearchCriteria {
        term: Some(needle.clone()),
        max_price: Some(Decimal::new(1000, 2)),
        ..Default::default()
    };
    let page = catalog.search_products(&criteria).await.expect("by price");
    assert_eq!(page.total_items, 1);

    // In-stock-only excludes the empty shelf.
    let criteria = ProductSearchCriteria {
        term: Some(needle.clone()),
        in_stock_only: true,
        ..Default::default()
    };
    let page = catalog.search_products(&criteria).await.expect("in stock");
    assert_eq!(page.total_items, 1);

    // Category scoping.
    let criteria = ProductSearchCriteria {
        term: Some(needle.clone()),
        category_id: Some(category.id),
        ..Default::default()
    };
    let page = catalog.search_products(&criteria).await.expect("category");
    assert_eq!(page.total_items, 2);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn deactivation_hides_from_search_and_blocks_purchase() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let catalog = CatalogService::new(&pool);
    let product = create_product(&pool, &category, Decimal::new(399, 2), 10).await;

    let toggled = catalog.toggle_active(product.id).await.expect("toggle off");
    assert!(!toggled.is_active);
    assert!(!toggled.is_available());

    let criteria = ProductSearchCriteria {
        term: Some(product.name.clone()),
        ..Default::default()
    };
    assert_eq!(
        catalog.search_products(&criteria).await.expect("hidden").total_items,
        0
    );

    // Staff listings can still see it.
    let criteria = ProductSearchCriteria {
        term: Some(product.name.clone()),
        include_inactive: true,
        ..Default::default()
    };
    assert_eq!(
        catalog.search_products(&criteria).await.expect("staff view").total_items,
        1
    );

    let toggled = catalog.toggle_active(product.id).await.expect("toggle on");
    assert!(toggled.is_available());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL database"]
async fn stock_adjustment_never_goes_negative() {
    let pool = test_pool().await;
    let category = create_category(&pool).await;
    let catalog = CatalogService::new(&pool);
    let product = create_product(&pool, &category, Decimal::new(399, 2), 10).await;

    let adjusted = catalog.adjust_stock(product.id, -4).await.expect("down 4");
    assert_eq!(adjusted.quantity, 6);

    let adjusted = catalog.adjust_stock(product.id, 14).await.expect("up 14");
    assert_eq!(adjusted.quantity, 20);

    let err = catalog
        .adjust_stock(product.id, -21)
        .await
        .expect_err("would underflow");
    assert!(matches!(err, ServiceError::InvalidArgument(_)));

    // Unchanged after the rejected adjustment.
    assert_eq!(catalog.product(product.id).await.expect("reload").quantity, 20);
}
