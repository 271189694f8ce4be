//! Seed command: sample users, categories, and products for development.
//!
//! Idempotent: rows are keyed on their unique columns and re-running the
//! command leaves existing data alone.

use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{CommandError, connect};

/// Seed the database with sample data.
///
/// # Errors
///
/// Returns an error if the connection or any insert fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    seed_users(&pool).await?;
    let fruits = seed_category(&pool, "Fruits", "/images/categories/fruits.jpg", "apple").await?;
    let vegetables =
        seed_category(&pool, "Vegetables", "/images/categories/vegetables.jpg", "carrot").await?;
    let dairy = seed_category(&pool, "Dairy", "/images/categories/dairy.jpg", "cup").await?;
    let meat =
        seed_category(&pool, "Meat & Seafood", "/images/categories/meat.jpg", "fish").await?;
    let bakery =
        seed_category(&pool, "Bakery", "/images/categories/bakery.jpg", "bread-slice").await?;
    let beverages =
        seed_category(&pool, "Beverages", "/images/categories/beverages.jpg", "cup-hot").await?;
    let snacks = seed_category(&pool, "Snacks", "/images/categories/snacks.jpg", "cookie").await?;
    seed_category(&pool, "Frozen Foods", "/images/categories/frozen.jpg", "snow").await?;
    seed_category(&pool, "Household Items", "/images/categories/household.jpg", "house").await?;
    let personal_care = seed_category(
        &pool,
        "Personal Care",
        "/images/categories/personal-care.jpg",
        "heart-pulse",
    )
    .await?;

    let products: &[(&str, &str, Decimal, i32, &str, i32)] = &[
        ("Organic Apples", "APPLE-001", Decimal::new(399, 2), 100, "Fresh organic red apples", fruits),
        ("Bananas", "BANANA-001", Decimal::new(249, 2), 150, "Fresh yellow bananas", fruits),
        ("Strawberries", "STRAWB-001", Decimal::new(499, 2), 75, "Sweet fresh strawberries", fruits),
        ("Organic Blueberries", "BLUEB-001", Decimal::new(599, 2), 40, "Fresh organic blueberries", fruits),
        ("Organic Carrots", "CARROT-001", Decimal::new(299, 2), 80, "Fresh organic baby carrots", vegetables),
        ("Spinach", "SPINACH-001", Decimal::new(349, 2), 60, "Fresh spinach leaves", vegetables),
        ("Whole Milk", "MILK-001", Decimal::new(429, 2), 50, "Whole milk, 1 gallon", dairy),
        ("Cheddar Cheese", "CHEESE-001", Decimal::new(549, 2), 35, "Sharp cheddar block, 8oz", dairy),
        ("Chicken Breast", "CHICKN-001", Decimal::new(799, 2), 30, "Boneless chicken breast, per lb", meat),
        ("Sourdough Bread", "BREAD-001", Decimal::new(449, 2), 25, "Fresh baked sourdough loaf", bakery),
        ("Orange Juice", "OJ-001", Decimal::new(379, 2), 45, "Fresh squeezed orange juice, 52oz", beverages),
        ("Tortilla Chips", "CHIPS-001", Decimal::new(329, 2), 70, "Restaurant style tortilla chips", snacks),
        ("Conditioner", "CONDIT-001", Decimal::new(499, 2), 35, "Conditioner for hair, 12 oz", personal_care),
    ];

    for (name, sku, price, quantity, description, category_id) in products {
        seed_product(&pool, name, sku, *price, *quantity, description, *category_id).await?;
    }

    tracing::info!("Seed complete");
    tracing::info!("Customer login: john.doe@example.com / password123");
    tracing::info!("Admin login:    admin@greengrocer.example / admin123");
    tracing::info!("Employee login: jane.smith@greengrocer.example / employee123");
    Ok(())
}

async fn seed_users(pool: &PgPool) -> Result<(), CommandError> {
    let users: &[(&str, &str, &str, &str, &str, bool, bool)] = &[
        ("John", "Doe", "john.doe@example.com", "password123", "555-0123", false, false),
        ("Admin", "User", "admin@greengrocer.example", "admin123", "555-0001", false, true),
        ("Jane", "Smith", "jane.smith@greengrocer.example", "employee123", "555-0002", true, false),
    ];

    for (first, last, email, password, phone, is_employee, is_admin) in users {
        sqlx::query(
            "INSERT INTO users (first_name, last_name, email, password, phone, is_employee, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (email) DO NOTHING",
        )
        .bind(first)
        .bind(last)
        .bind(email)
        .bind(password)
        .bind(phone)
        .bind(is_employee)
        .bind(is_admin)
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn seed_category(
    pool: &PgPool,
    name: &str,
    image_url: &str,
    icon: &str,
) -> Result<i32, CommandError> {
    // DO UPDATE on the name key so RETURNING yields the id either way.
    let id: i32 = sqlx::query_scalar(
        "INSERT INTO product_categories (name, image_url, icon) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
    )
    .bind(name)
    .bind(image_url)
    .bind(icon)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

async fn seed_product(
    pool: &PgPool,
    name: &str,
    sku: &str,
    price: Decimal,
    quantity: i32,
    description: &str,
    category_id: i32,
) -> Result<(), CommandError> {
    sqlx::query(
        "INSERT INTO products \
         (category_id, sku, name, description, price, quantity, reorder_level, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, 10, TRUE) \
         ON CONFLICT (sku) DO NOTHING",
    )
    .bind(category_id)
    .bind(sku)
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(quantity)
    .execute(pool)
    .await?;

    Ok(())
}
