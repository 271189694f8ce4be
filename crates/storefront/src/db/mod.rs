//! Database operations for the storefront `PostgreSQL`.
//!
//! ## Tables
//!
//! - `users` - Customer and staff accounts (guests are never persisted)
//! - `product_categories`, `products` - Catalog
//! - `carts`, `cart_items` - One cart per user, one row per (cart, product)
//! - `orders`, `order_items` - Placed orders with purchase-time snapshots
//! - `tower_sessions.session` - Session storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p greengrocer-cli -- migrate
//! ```

pub mod carts;
pub mod categories;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use categories::CategoryRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email or SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Sort direction for paged queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Parse a direction string, case-insensitively.
    ///
    /// Anything other than `DESC` sorts ascending.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("desc") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    /// The SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One page of query results plus the totals needed to render pagination.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Zero-based page index.
    pub page: u32,
    /// Requested page size.
    pub size: u32,
    /// Total matching rows across all pages.
    pub total_items: i64,
    /// Total page count for this size.
    pub total_pages: u32,
}

impl<T> Page<T> {
    /// Build a page, computing `total_pages` from the row count and size.
    #[must_use]
    pub fn new(items: Vec<T>, page: u32, size: u32, total_items: i64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            u32::try_from(
                u64::try_from(total_items.max(0))
                    .unwrap_or(u64::MAX)
                    .div_ceil(u64::from(size)),
            )
            .unwrap_or(u32::MAX)
        };

        Self {
            items,
            page,
            size,
            total_items,
            total_pages,
        }
    }

    /// An empty page (e.g. for a filter that matches nothing).
    #[must_use]
    pub fn empty(page: u32, size: u32) -> Self {
        Self::new(Vec::new(), page, size, 0)
    }
}

/// Clamp a requested page size to something the database should serve.
#[must_use]
pub fn clamp_page_size(size: u32) -> u32 {
    size.clamp(1, 100)
}

/// Compute the OFFSET for a zero-based page index.
#[must_use]
pub fn page_offset(page: u32, size: u32) -> i64 {
    i64::from(page) * i64::from(size)
}
