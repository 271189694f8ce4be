//! Cart service.
//!
//! All mutations run inside one transaction covering the item write and the
//! cart's `updated_at`, so a partially-applied cart change is never visible.
//! Stock checks here are advisory (friendly errors at add time); checkout
//! re-validates under row locks before anything is decremented.

use rust_decimal::Decimal;
use sqlx::PgPool;

use greengrocer_core::{CartItemId, ProductId};

use super::{ServiceError, ServiceResult};
use crate::db::{carts, products};
use crate::models::{CartContents, User, Visitor};

/// Cart operations for the current visitor.
pub struct CartService<'a> {
    pool: &'a PgPool,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the visitor's cart with lines and totals, creating the cart on
    /// first touch. Repeat calls return the same cart.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` for guests.
    pub async fn contents(&self, visitor: &Visitor) -> ServiceResult<CartContents> {
        let user = require_shopper(visitor)?;

        let mut conn = self.pool.acquire().await?;
        let cart = carts::get_or_create(&mut conn, user.id).await?;
        let lines = carts::lines(&mut conn, cart.id).await?;

        Ok(CartContents::new(cart, lines))
    }

    /// Add a product to the cart. If the product is already present the
    /// quantities merge, and the merged total is re-validated against stock.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for guests or non-positive quantities
    /// - `NotFound` if the product does not exist
    /// - `InvalidState` if the product is inactive or out of stock
    /// - `InsufficientStock` if the (merged) quantity exceeds on-hand stock
    pub async fn add_product(
        &self,
        visitor: &Visitor,
        product_id: ProductId,
        quantity: i32,
    ) -> ServiceResult<CartContents> {
        let user = require_shopper(visitor)?;

        if quantity <= 0 {
            return Err(ServiceError::InvalidArgument(
                "quantity must be greater than 0".to_owned(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let cart = carts::get_or_create(&mut tx, user.id).await?;

        let product = products::get(&mut tx, product_id)
            .await?
            .ok_or(ServiceError::NotFound("product"))?;

        if !product.is_available() {
            return Err(ServiceError::InvalidState(format!(
                "product is not available: {}",
                product.name
            )));
        }

        let existing = carts::find_item_by_product(&mut tx, cart.id, product.id).await?;
        let merged = existing.as_ref().map_or(0, |item| item.quantity) + quantity;

        if product.quantity < merged {
            return Err(ServiceError::InsufficientStock {
                product: product.name,
            });
        }

        match existing {
            Some(item) => carts::update_item_quantity(&mut tx, item.id, merged).await?,
            None => {
                carts::insert_item(&mut tx, cart.id, product.id, quantity).await?;
            }
        }
        carts::touch(&mut tx, cart.id).await?;

        let lines = carts::lines(&mut tx, cart.id).await?;
        tx.commit().await?;

        tracing::debug!(user_id = %user.id, product_id = %product_id, quantity, "cart add");
        Ok(CartContents::new(cart, lines))
    }

    /// Set a cart line's quantity. Zero removes the line; any other value is
    /// re-validated against current stock.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for guests or negative quantities
    /// - `NotFound` if the line does not exist
    /// - `Forbidden` if the line belongs to another user's cart
    /// - `InsufficientStock` if the new quantity exceeds on-hand stock
    pub async fn update_item_quantity(
        &self,
        visitor: &Visitor,
        item_id: CartItemId,
        quantity: i32,
    ) -> ServiceResult<CartContents> {
        let user = require_shopper(visitor)?;

        if quantity < 0 {
            return Err(ServiceError::InvalidArgument("invalid quantity".to_owned()));
        }

        let mut tx = self.pool.begin().await?;

        let cart = carts::get_or_create(&mut tx, user.id).await?;
        let item = carts::find_item(&mut tx, item_id)
            .await?
            .ok_or(ServiceError::NotFound("cart item"))?;

        if item.cart_id != cart.id {
            return Err(ServiceError::Forbidden(
                "cart item does not belong to your cart".to_owned(),
            ));
        }

        if quantity == 0 {
            carts::delete_item(&mut tx, item.id).await?;
        } else {
            let product = products::get(&mut tx, item.product_id)
                .await?
                .ok_or(ServiceError::NotFound("product"))?;

            if product.quantity < quantity {
                return Err(ServiceError::InsufficientStock {
                    product: product.name,
                });
            }

            carts::update_item_quantity(&mut tx, item.id, quantity).await?;
        }
        carts::touch(&mut tx, cart.id).await?;

        let lines = carts::lines(&mut tx, cart.id).await?;
        tx.commit().await?;

        Ok(CartContents::new(cart, lines))
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for guests
    /// - `NotFound` if the line does not exist
    /// - `Forbidden` if the line belongs to another user's cart
    pub async fn remove_item(
        &self,
        visitor: &Visitor,
        item_id: CartItemId,
    ) -> ServiceResult<CartContents> {
        let user = require_shopper(visitor)?;

        let mut tx = self.pool.begin().await?;

        let cart = carts::get_or_create(&mut tx, user.id).await?;
        let item = carts::find_item(&mut tx, item_id)
            .await?
            .ok_or(ServiceError::NotFound("cart item"))?;

        if item.cart_id != cart.id {
            return Err(ServiceError::Forbidden(
                "cart item does not belong to your cart".to_owned(),
            ));
        }

        carts::delete_item(&mut tx, item.id).await?;
        carts::touch(&mut tx, cart.id).await?;

        let lines = carts::lines(&mut tx, cart.id).await?;
        tx.commit().await?;

        Ok(CartContents::new(cart, lines))
    }

    /// Remove every line from the cart. The cart row itself survives.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidArgument` for guests.
    pub async fn clear(&self, visitor: &Visitor) -> ServiceResult<()> {
        let user = require_shopper(visitor)?;

        let mut tx = self.pool.begin().await?;

        let cart = carts::get_or_create(&mut tx, user.id).await?;
        carts::clear(&mut tx, cart.id).await?;
        carts::touch(&mut tx, cart.id).await?;

        tx.commit().await?;

        Ok(())
    }

    /// Total units in the visitor's cart. Guests get 0 rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn item_count(&self, visitor: &Visitor) -> ServiceResult<i64> {
        let Some(user) = visitor.user() else {
            return Ok(0);
        };

        let mut conn = self.pool.acquire().await?;
        Ok(carts::item_count(&mut conn, user.id).await?)
    }

    /// Cart value at current prices. Guests get 0 rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn total(&self, visitor: &Visitor) -> ServiceResult<Decimal> {
        let Some(user) = visitor.user() else {
            return Ok(Decimal::ZERO);
        };

        let mut conn = self.pool.acquire().await?;
        Ok(carts::cart_total(&mut conn, user.id).await?)
    }
}

/// Carts belong to signed-in users only.
fn require_shopper(visitor: &Visitor) -> ServiceResult<&User> {
    visitor.user().ok_or_else(|| {
        ServiceError::InvalidArgument("you must be signed in to use the cart".to_owned())
    })
}
