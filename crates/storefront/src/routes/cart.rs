//! Cart route handlers.
//!
//! Every mutation requires a signed-in user; the count badge answers 0 for
//! guests instead of failing.

use axum::{
    Form, Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use greengrocer_core::{CartItemId, ProductId};

use crate::error::Result;
use crate::middleware::{CurrentVisitor, RequireUser};
use crate::models::{CartContents, Visitor};
use crate::services::CartService;
use crate::state::AppState;

/// Create the cart routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(show))
        .route("/add", post(add))
        .route("/update/{item_id}", post(update))
        .route("/remove/{item_id}", post(remove))
        .route("/clear", post(clear))
        .route("/count", get(count))
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<i32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub quantity: i32,
}

/// Cart contents with totals.
#[instrument(skip(user, state))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<CartContents>> {
    let visitor = Visitor::SignedIn(user);
    let contents = CartService::new(state.pool()).contents(&visitor).await?;
    Ok(Json(contents))
}

/// Add a product to the cart; quantities merge on repeat adds.
#[instrument(skip(user, state))]
pub async fn add(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Form(form): Form<AddToCartForm>,
) -> Result<Json<CartContents>> {
    let visitor = Visitor::SignedIn(user);
    let contents = CartService::new(state.pool())
        .add_product(
            &visitor,
            ProductId::new(form.product_id),
            form.quantity.unwrap_or(1),
        )
        .await?;
    Ok(Json(contents))
}

/// Set a line's quantity; zero removes it.
#[instrument(skip(user, state))]
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
    Form(form): Form<UpdateCartForm>,
) -> Result<Json<CartContents>> {
    let visitor = Visitor::SignedIn(user);
    let contents = CartService::new(state.pool())
        .update_item_quantity(&visitor, CartItemId::new(item_id), form.quantity)
        .await?;
    Ok(Json(contents))
}

/// Remove a line from the cart.
#[instrument(skip(user, state))]
pub async fn remove(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(item_id): Path<i32>,
) -> Result<Json<CartContents>> {
    let visitor = Visitor::SignedIn(user);
    let contents = CartService::new(state.pool())
        .remove_item(&visitor, CartItemId::new(item_id))
        .await?;
    Ok(Json(contents))
}

/// Remove every line from the cart.
#[instrument(skip(user, state))]
pub async fn clear(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let visitor = Visitor::SignedIn(user);
    CartService::new(state.pool()).clear(&visitor).await?;
    Ok(Json(json!({ "cleared": true })))
}

/// Unit count for the cart badge; 0 for guests.
#[instrument(skip(visitor, state))]
pub async fn count(
    CurrentVisitor(visitor): CurrentVisitor,
    State(state): State<AppState>,
) -> Result<Json<Value>> {
    let count = CartService::new(state.pool()).item_count(&visitor).await?;
    Ok(Json(json!({ "count": count })))
}
