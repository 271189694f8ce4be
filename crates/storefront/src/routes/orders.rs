//! Order and checkout route handlers.

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use greengrocer_core::{OrderId, OrderStatus};

use crate::db::SortDirection;
use crate::db::orders::OrderSortKey;
use crate::error::{AppError, Result};
use crate::middleware::{RequireStaff, RequireUser};
use crate::models::{Order, OrderDetail, Visitor};
use crate::services::orders::OrderListQuery;
use crate::services::{CartService, OrderService};
use crate::state::AppState;

/// Create the order routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/checkout", post(checkout))
        .route("/{id}", get(show))
        .route("/{id}/status", post(update_status))
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/reorder", post(reorder))
}

/// Listing filters. Filters combine rather than taking precedence.
#[derive(Debug, Deserialize)]
pub struct OrderListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    /// Status name, e.g. `ACTIVE`. Unknown values are ignored.
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Product-name substring search.
    pub search: Option<String>,
}

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub store_location: String,
    pub notes: Option<String>,
}

/// Status transition form data.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Reorder form data.
#[derive(Debug, Deserialize)]
pub struct ReorderForm {
    pub store_location: String,
}

/// Paged order listing. Staff see all orders, customers their own.
#[instrument(skip(user, state))]
pub async fn list(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<crate::db::Page<Order>>> {
    // Unknown status strings are ignored rather than rejected.
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<OrderStatus>().ok());

    let query = OrderListQuery {
        status,
        start_date: params.start_date,
        end_date: params.end_date,
        search: params.search.clone().filter(|s| !s.trim().is_empty()),
        page: params.page.unwrap_or(0),
        size: params.size.unwrap_or(10),
        sort: params
            .sort_by
            .as_deref()
            .map_or_else(OrderSortKey::default, OrderSortKey::parse),
        direction: params
            .sort_direction
            .as_deref()
            .map_or(SortDirection::Desc, SortDirection::parse),
    };

    let visitor = Visitor::SignedIn(user);
    let page = OrderService::new(state.pool())
        .list_orders(&visitor, &query)
        .await?;
    Ok(Json(page))
}

/// Order detail with line items.
#[instrument(skip(user, state))]
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetail>> {
    let visitor = Visitor::SignedIn(user);
    let detail = OrderService::new(state.pool())
        .get_order(&visitor, OrderId::new(id))
        .await?;
    Ok(Json(detail))
}

/// Checkout review: the cart as it would be ordered. An empty cart goes
/// back to the cart page instead.
#[instrument(skip(user, state))]
pub async fn checkout_page(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Response> {
    let visitor = Visitor::SignedIn(user);
    let contents = CartService::new(state.pool()).contents(&visitor).await?;

    if contents.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    Ok(Json(contents).into_response())
}

/// Convert the cart into an order.
#[instrument(skip(user, state))]
pub async fn checkout(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Form(form): Form<CheckoutForm>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let visitor = Visitor::SignedIn(user);
    let detail = OrderService::new(state.pool())
        .create_order_from_cart(&visitor, &form.store_location, form.notes.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Transition an order's status (staff).
#[instrument(skip(_staff, state))]
pub async fn update_status(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<StatusForm>,
) -> Result<Json<Order>> {
    let status: OrderStatus = form
        .status
        .parse()
        .map_err(|e: String| AppError::BadRequest(e))?;

    let order = OrderService::new(state.pool())
        .update_status(OrderId::new(id), status)
        .await?;
    Ok(Json(order))
}

/// Cancel an order, restoring stock.
#[instrument(skip(user, state))]
pub async fn cancel(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetail>> {
    let visitor = Visitor::SignedIn(user);
    let detail = OrderService::new(state.pool())
        .cancel_order(&visitor, OrderId::new(id))
        .await?;
    Ok(Json(detail))
}

/// Place a new order from an old one's items.
#[instrument(skip(user, state))]
pub async fn reorder(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<ReorderForm>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let visitor = Visitor::SignedIn(user);
    let detail = OrderService::new(state.pool())
        .reorder(&visitor, OrderId::new(id), &form.store_location)
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}
