//! Product repository and in-transaction stock operations.
//!
//! Catalog reads and admin CRUD go through [`ProductRepository`]. The stock
//! mutations used by checkout, cancellation, and reorder are free functions
//! over a `PgConnection` so they compose into the caller's transaction; the
//! row is taken `FOR UPDATE` first, which is what serializes two checkouts
//! racing for the last unit.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use greengrocer_core::{CategoryId, ProductId, Sku};

use super::{Page, RepositoryError, SortDirection, clamp_page_size, page_offset};
use crate::models::Product;

const PRODUCT_COLUMNS: &str = "id, category_id, sku, name, description, price, quantity, \
     reorder_level, image_url, is_active, created_at, updated_at";

/// Fields for a new product. Activation is implicit: new products go live.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub category_id: CategoryId,
    pub sku: Sku,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub reorder_level: i32,
    pub image_url: Option<String>,
}

/// Full-row product update (the admin edit form posts every field).
#[derive(Debug, Clone)]
pub struct ProductChanges {
    pub category_id: CategoryId,
    pub sku: Sku,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub reorder_level: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
}

/// Sort keys accepted for product listings. Unknown keys fall back to
/// `Name` rather than reaching the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSortKey {
    #[default]
    Name,
    Price,
    Quantity,
    Sku,
    CreatedAt,
}

impl ProductSortKey {
    /// Parse a caller-supplied sort key, falling back to the default.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "price" => Self::Price,
            "quantity" => Self::Quantity,
            "sku" => Self::Sku,
            "created_at" | "createdAt" => Self::CreatedAt,
            _ => Self::Name,
        }
    }

    const fn as_sql(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Price => "price",
            Self::Quantity => "quantity",
            Self::Sku => "sku",
            Self::CreatedAt => "created_at",
        }
    }
}

/// Combined filter/paging parameters for catalog searches.
#[derive(Debug, Clone)]
pub struct ProductSearchCriteria {
    /// Case-insensitive substring matched against name and description.
    pub term: Option<String>,
    pub category_id: Option<CategoryId>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Only products with `quantity > 0`.
    pub in_stock_only: bool,
    /// Include inactive products (staff listings).
    pub include_inactive: bool,
    pub page: u32,
    pub size: u32,
    pub sort: ProductSortKey,
    pub direction: SortDirection,
}

impl Default for ProductSearchCriteria {
    fn default() -> Self {
        Self {
            term: None,
            category_id: None,
            min_price: None,
            max_price: None,
            in_stock_only: false,
            include_inactive: false,
            page: 0,
            size: 12,
            sort: ProductSortKey::Name,
            direction: SortDirection::Asc,
        }
    }
}

impl ProductSearchCriteria {
    fn push_filters(&self, query: &mut QueryBuilder<'_, Postgres>) {
        query.push(" WHERE TRUE");

        if !self.include_inactive {
            query.push(" AND is_active = TRUE");
        }
        if let Some(ref term) = self.term {
            let pattern = format!("%{term}%");
            query
                .push(" AND (name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(category_id) = self.category_id {
            query.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(min_price) = self.min_price {
            query.push(" AND price >= ").push_bind(min_price);
        }
        if let Some(max_price) = self.max_price {
            query.push(" AND price <= ").push_bind(max_price);
        }
        if self.in_stock_only {
            query.push(" AND quantity > 0");
        }
    }
}

/// Repository for catalog reads and admin product CRUD.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get a product by SKU.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_sku(&self, sku: &Sku) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = $1"
        ))
        .bind(sku)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Whether any product already uses this SKU.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists_by_sku(&self, sku: &Sku) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1)")
                .bind(sku)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Filtered, paged, sorted catalog search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn search(
        &self,
        criteria: &ProductSearchCriteria,
    ) -> Result<Page<Product>, RepositoryError> {
        let size = clamp_page_size(criteria.size);

        let mut count_query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM products");
        criteria.push_filters(&mut count_query);
        let total_items: i64 = count_query
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut query: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        criteria.push_filters(&mut query);
        query
            .push(" ORDER BY ")
            .push(criteria.sort.as_sql())
            .push(" ")
            .push(criteria.direction.as_sql())
            .push(" LIMIT ")
            .push_bind(i64::from(size))
            .push(" OFFSET ")
            .push_bind(page_offset(criteria.page, size));

        let products = query.build_query_as().fetch_all(self.pool).await?;

        Ok(Page::new(products, criteria.page, size, total_items))
    }

    /// Newest active products, for the home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn featured(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = TRUE ORDER BY id DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Active products at or below their reorder level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE quantity <= reorder_level AND is_active = TRUE ORDER BY quantity ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Create a new (active) product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products \
             (category_id, sku, name, description, price, quantity, reorder_level, image_url, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(new.category_id)
        .bind(&new.sku)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price)
        .bind(new.quantity)
        .bind(new.reorder_level)
        .bind(&new.image_url)
        .fetch_one(self.pool)
        .await
        .map_err(map_sku_conflict)?;

        Ok(product)
    }

    /// Replace a product's editable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if renamed to a SKU already in use.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products \
             SET category_id = $2, sku = $3, name = $4, description = $5, price = $6, \
                 quantity = $7, reorder_level = $8, image_url = $9, is_active = $10, \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.category_id)
        .bind(&changes.sku)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(changes.price)
        .bind(changes.quantity)
        .bind(changes.reorder_level)
        .bind(&changes.image_url)
        .bind(changes.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(map_sku_conflict)?;

        product.ok_or(RepositoryError::NotFound)
    }

    /// Set the active flag (soft delete / relist).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_active(
        &self,
        id: ProductId,
        is_active: bool,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET is_active = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(self.pool)
        .await?;

        product.ok_or(RepositoryError::NotFound)
    }

    /// Adjust on-hand stock by a signed amount.
    ///
    /// Returns `None` when the product doesn't exist or the adjustment would
    /// take the quantity below zero; the caller disambiguates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn adjust_quantity(
        &self,
        id: ProductId,
        delta: i32,
    ) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET quantity = quantity + $2, updated_at = NOW() \
             WHERE id = $1 AND quantity + $2 >= 0 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(delta)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Active product count for a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_category(&self, category_id: CategoryId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE category_id = $1 AND is_active = TRUE",
        )
        .bind(category_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Permanently delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if orders or carts still reference
    /// the product. Returns `RepositoryError::Database` for other failures.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_foreign_key_violation()
                {
                    return RepositoryError::Conflict(
                        "product is referenced by carts or orders".to_owned(),
                    );
                }
                RepositoryError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }
}

fn map_sku_conflict(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("SKU already exists".to_owned());
    }
    RepositoryError::Database(e)
}

// =============================================================================
// In-transaction stock operations
// =============================================================================

/// Load a product row inside a transaction, without locking it.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Load a product row with a row lock, blocking concurrent checkouts of the
/// same product until the surrounding transaction finishes.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn get_for_update(
    conn: &mut PgConnection,
    id: ProductId,
) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Decrement on-hand stock. The caller must hold the row lock and have
/// verified sufficient stock; the `quantity >= amount` guard here is a
/// backstop that surfaces as `Conflict` instead of a constraint violation.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if stock would go negative.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn decrement_stock(
    conn: &mut PgConnection,
    id: ProductId,
    amount: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE products SET quantity = quantity - $2, updated_at = NOW() \
         WHERE id = $1 AND quantity >= $2",
    )
    .bind(id)
    .bind(amount)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::Conflict(
            "stock underflow prevented".to_owned(),
        ));
    }

    Ok(())
}

/// Add stock back, e.g. when an order is cancelled.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product doesn't exist.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn restore_stock(
    conn: &mut PgConnection,
    id: ProductId,
    amount: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        "UPDATE products SET quantity = quantity + $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(amount)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}
