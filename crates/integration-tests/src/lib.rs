//! Integration test support for Greengrocer.
//!
//! # Running Tests
//!
//! ```bash
//! # Start PostgreSQL and export the connection string
//! export GROCER_TEST_DATABASE_URL=postgres://localhost/greengrocer_test
//!
//! # Database-backed service tests
//! cargo test -p greengrocer-integration-tests -- --ignored
//!
//! # HTTP smoke tests additionally need a running storefront
//! # (GROCER_BASE_URL, default http://localhost:3000)
//! ```
//!
//! Every test builds its own users, categories, and products with
//! unique emails/SKUs/names, so tests are independent and the database
//! never needs wiping between runs.

#![cfg_attr(not(test), forbid(unsafe_code))]

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use greengrocer_core::Sku;
use greengrocer_storefront::db::categories::NewCategory;
use greengrocer_storefront::db::products::NewProduct;
use greengrocer_storefront::models::{Product, ProductCategory, User, Visitor};
use greengrocer_storefront::services::users::Registration;
use greengrocer_storefront::services::{CatalogService, UserService};

/// Connect to the test database and bring its schema up to date.
///
/// # Panics
///
/// Panics with instructions if `GROCER_TEST_DATABASE_URL` (or
/// `DATABASE_URL`) is not set or the database is unreachable.
pub async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();

    let url = std::env::var("GROCER_TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("set GROCER_TEST_DATABASE_URL to run database-backed tests");

    let pool = PgPool::connect(&url)
        .await
        .expect("failed to connect to the test database");

    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations on the test database");

    pool
}

/// A unique token for emails, SKUs, and names.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

/// Register a fresh customer account.
pub async fn create_customer(pool: &PgPool) -> User {
    let registration = Registration {
        first_name: "Test".to_owned(),
        last_name: "Customer".to_owned(),
        email: format!("{}@test.example", unique("customer")),
        password: "password123".to_owned(),
        phone: None,
    };

    UserService::new(pool)
        .register(&registration)
        .await
        .expect("failed to register test customer")
}

/// Register a fresh account and grant it the employee flag.
pub async fn create_employee(pool: &PgPool) -> User {
    let user = create_customer(pool).await;
    UserService::new(pool)
        .set_employee(user.id, true)
        .await
        .expect("failed to grant employee flag")
}

/// Register a fresh account and grant it the admin flag.
pub async fn create_admin(pool: &PgPool) -> User {
    let user = create_customer(pool).await;
    UserService::new(pool)
        .set_admin(user.id, true)
        .await
        .expect("failed to grant admin flag")
}

/// Create a category with a unique name.
pub async fn create_category(pool: &PgPool) -> ProductCategory {
    let new = NewCategory {
        name: unique("Category"),
        description: None,
        image_url: None,
        icon: None,
    };

    CatalogService::new(pool)
        .create_category(&new)
        .await
        .expect("failed to create test category")
}

/// Create an active product with a unique SKU.
pub async fn create_product(
    pool: &PgPool,
    category: &ProductCategory,
    price: Decimal,
    quantity: i32,
) -> Product {
    let new = NewProduct {
        category_id: category.id,
        sku: Sku::parse(&unique("SKU")).expect("generated SKU is valid"),
        name: unique("Product"),
        description: Some("test product".to_owned()),
        price,
        quantity,
        reorder_level: 5,
        image_url: None,
    };

    CatalogService::new(pool)
        .create_product(&new)
        .await
        .expect("failed to create test product")
}

/// Wrap a user as a signed-in visitor.
#[must_use]
pub fn signed_in(user: User) -> Visitor {
    Visitor::SignedIn(user)
}
