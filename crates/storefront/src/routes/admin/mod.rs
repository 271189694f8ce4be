//! Admin surface: session-gated management pages.
//!
//! Everything here except `toggle-mode` requires both the admin role and
//! the session's admin-mode flag; admins browse as ordinary customers until
//! they switch modes.

pub mod customers;
pub mod products;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::orders::StatusCount;
use crate::error::Result;
use crate::middleware::auth::toggle_admin_mode;
use crate::middleware::{RequireAdmin, RequireAdminMode};
use crate::models::Product;
use crate::services::{CatalogService, OrderService, UserService};
use crate::state::AppState;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/toggle-mode", post(toggle_mode))
        .route("/dashboard", get(dashboard))
        .route("/customers", get(customers::list))
        .route("/customers/{id}", get(customers::show))
        .route("/customers/{id}/delete", post(customers::delete))
        .route("/customers/{id}/make-employee", post(customers::make_employee))
        .route(
            "/customers/{id}/remove-employee",
            post(customers::remove_employee),
        )
        .route("/customers/{id}/make-admin", post(customers::make_admin))
        .route("/customers/{id}/remove-admin", post(customers::remove_admin))
        .route("/products/add", post(products::add))
        .route("/products/{id}/edit", post(products::edit))
}

/// Flip the session between admin mode and customer mode (admin role only).
#[instrument(skip(_admin, session))]
pub async fn toggle_mode(
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> Result<Json<Value>> {
    let enabled = toggle_admin_mode(&session).await?;
    Ok(Json(json!({ "admin_mode": enabled })))
}

/// Dashboard payload.
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub order_status_counts: Vec<StatusCount>,
    pub low_stock_products: Vec<Product>,
    pub user_count: i64,
}

/// Operational overview: order counts per status, low-stock products,
/// registered-user count.
#[instrument(skip(_admin, state))]
pub async fn dashboard(
    RequireAdminMode(_admin): RequireAdminMode,
    State(state): State<AppState>,
) -> Result<Json<Dashboard>> {
    let order_status_counts = OrderService::new(state.pool()).counts_by_status().await?;
    let low_stock_products = CatalogService::new(state.pool()).low_stock_products().await?;
    let user_count = UserService::new(state.pool()).count().await?;

    Ok(Json(Dashboard {
        order_status_counts,
        low_stock_products,
        user_count,
    }))
}
