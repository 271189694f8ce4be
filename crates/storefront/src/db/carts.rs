//! Cart database operations.
//!
//! These are free functions over a `PgConnection` because every cart
//! mutation runs inside a service-owned transaction (item write and cart
//! timestamp must commit together); reads borrow a connection from the pool.

use rust_decimal::Decimal;
use sqlx::PgConnection;

use greengrocer_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, CartLine};

const CART_COLUMNS: &str = "id, user_id, created_at, updated_at";
const ITEM_COLUMNS: &str = "id, cart_id, product_id, quantity";

/// Find a user's cart, if one has been created.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_by_user(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<Cart>, RepositoryError> {
    let cart = sqlx::query_as::<_, Cart>(&format!(
        "SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(cart)
}

/// Get the user's cart, creating an empty one on first touch.
///
/// Safe under concurrent first touches: the unique `user_id` constraint
/// turns the race into a fetch of the winner's row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a query fails.
pub async fn get_or_create(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Cart, RepositoryError> {
    let inserted = sqlx::query_as::<_, Cart>(&format!(
        "INSERT INTO carts (user_id) VALUES ($1) \
         ON CONFLICT (user_id) DO NOTHING \
         RETURNING {CART_COLUMNS}"
    ))
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(cart) = inserted {
        return Ok(cart);
    }

    find_by_user(conn, user_id)
        .await?
        .ok_or(RepositoryError::NotFound)
}

/// The cart's rows joined with their products, ordered by insertion.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lines(
    conn: &mut PgConnection,
    cart_id: CartId,
) -> Result<Vec<CartLine>, RepositoryError> {
    let lines = sqlx::query_as::<_, CartLine>(
        "SELECT ci.id, ci.cart_id, ci.product_id, \
                p.name AS product_name, p.price AS unit_price, ci.quantity, \
                (p.is_active AND p.quantity > 0) AS available \
         FROM cart_items ci \
         JOIN products p ON p.id = ci.product_id \
         WHERE ci.cart_id = $1 \
         ORDER BY ci.id",
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

/// Find a cart item by its row ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_item(
    conn: &mut PgConnection,
    item_id: CartItemId,
) -> Result<Option<CartItem>, RepositoryError> {
    let item = sqlx::query_as::<_, CartItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM cart_items WHERE id = $1"
    ))
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(item)
}

/// Find the cart's row for a product, if present.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn find_item_by_product(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
) -> Result<Option<CartItem>, RepositoryError> {
    let item = sqlx::query_as::<_, CartItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM cart_items WHERE cart_id = $1 AND product_id = $2"
    ))
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(item)
}

/// Insert a new cart row.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the product is already in the cart
/// (callers merge quantities instead). Returns `RepositoryError::Database`
/// for other database errors.
pub async fn insert_item(
    conn: &mut PgConnection,
    cart_id: CartId,
    product_id: ProductId,
    quantity: i32,
) -> Result<CartItem, RepositoryError> {
    let item = sqlx::query_as::<_, CartItem>(&format!(
        "INSERT INTO cart_items (cart_id, product_id, quantity) \
         VALUES ($1, $2, $3) \
         RETURNING {ITEM_COLUMNS}"
    ))
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return RepositoryError::Conflict("product already in cart".to_owned());
        }
        RepositoryError::Database(e)
    })?;

    Ok(item)
}

/// Set a cart row's quantity.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the row doesn't exist.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn update_item_quantity(
    conn: &mut PgConnection,
    item_id: CartItemId,
    quantity: i32,
) -> Result<(), RepositoryError> {
    let result = sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
        .bind(item_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }

    Ok(())
}

/// Delete a cart row.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_item(
    conn: &mut PgConnection,
    item_id: CartItemId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE id = $1")
        .bind(item_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Remove every row from a cart (the cart itself stays).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Bump the cart's `updated_at`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn touch(conn: &mut PgConnection, cart_id: CartId) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// Total units across the user's cart (0 with no cart).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn item_count(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<i64, RepositoryError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(ci.quantity), 0) \
         FROM cart_items ci \
         JOIN carts c ON c.id = ci.cart_id \
         WHERE c.user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

/// Total value of the user's cart at current prices (0 with no cart).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn cart_total(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Decimal, RepositoryError> {
    let total: Decimal = sqlx::query_scalar(
        "SELECT COALESCE(SUM(p.price * ci.quantity), 0) \
         FROM cart_items ci \
         JOIN carts c ON c.id = ci.cart_id \
         JOIN products p ON p.id = ci.product_id \
         WHERE c.user_id = $1",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(total)
}
