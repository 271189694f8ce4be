//! Admin customer management handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use greengrocer_core::UserId;

use crate::db::users::UserSortKey;
use crate::db::{Page, SortDirection};
use crate::error::Result;
use crate::middleware::RequireAdminMode;
use crate::models::User;
use crate::services::{OrderService, UserService};
use crate::state::AppState;

/// Customer listing parameters.
#[derive(Debug, Deserialize)]
pub struct CustomerListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    /// Free-text search across name, email, and phone.
    pub search: Option<String>,
}

/// Customer detail payload.
#[derive(Debug, Serialize)]
pub struct CustomerDetail {
    pub user: User,
    pub order_count: i64,
}

/// Paged customer listing with optional search.
#[instrument(skip(_admin, state))]
pub async fn list(
    RequireAdminMode(_admin): RequireAdminMode,
    State(state): State<AppState>,
    Query(params): Query<CustomerListParams>,
) -> Result<Json<Page<User>>> {
    let page = UserService::new(state.pool())
        .list_customers(
            params.search.as_deref().filter(|s| !s.trim().is_empty()),
            params.page.unwrap_or(0),
            params.size.unwrap_or(10),
            params
                .sort_by
                .as_deref()
                .map_or_else(UserSortKey::default, UserSortKey::parse),
            params
                .sort_direction
                .as_deref()
                .map_or_else(SortDirection::default, SortDirection::parse),
        )
        .await?;
    Ok(Json(page))
}

/// One customer with their order count.
#[instrument(skip(_admin, state))]
pub async fn show(
    RequireAdminMode(_admin): RequireAdminMode,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CustomerDetail>> {
    let id = UserId::new(id);
    let user = UserService::new(state.pool()).user(id).await?;
    let order_count = OrderService::new(state.pool()).count_for_user(id).await?;

    Ok(Json(CustomerDetail { user, order_count }))
}

/// Destructive delete: the customer's cart and orders cascade away.
#[instrument(skip(_admin, state))]
pub async fn delete(
    RequireAdminMode(_admin): RequireAdminMode,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    UserService::new(state.pool())
        .delete_customer(UserId::new(id))
        .await?;
    Ok(Json(json!({ "deleted": true })))
}

/// Grant the employee flag.
#[instrument(skip(_admin, state))]
pub async fn make_employee(
    RequireAdminMode(_admin): RequireAdminMode,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<User>> {
    let user = UserService::new(state.pool())
        .set_employee(UserId::new(id), true)
        .await?;
    Ok(Json(user))
}

/// Revoke the employee flag.
#[instrument(skip(_admin, state))]
pub async fn remove_employee(
    RequireAdminMode(_admin): RequireAdminMode,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<User>> {
    let user = UserService::new(state.pool())
        .set_employee(UserId::new(id), false)
        .await?;
    Ok(Json(user))
}

/// Grant the admin flag.
#[instrument(skip(_admin, state))]
pub async fn make_admin(
    RequireAdminMode(_admin): RequireAdminMode,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<User>> {
    let user = UserService::new(state.pool())
        .set_admin(UserId::new(id), true)
        .await?;
    Ok(Json(user))
}

/// Revoke the admin flag.
#[instrument(skip(_admin, state))]
pub async fn remove_admin(
    RequireAdminMode(_admin): RequireAdminMode,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<User>> {
    let user = UserService::new(state.pool())
        .set_admin(UserId::new(id), false)
        .await?;
    Ok(Json(user))
}
