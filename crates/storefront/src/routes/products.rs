//! Catalog route handlers.

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use greengrocer_core::{CategoryId, ProductId};

use crate::db::SortDirection;
use crate::db::products::{ProductSearchCriteria, ProductSortKey};
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::models::Product;
use crate::services::CatalogService;
use crate::state::AppState;

/// Create the product routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/search", get(search))
        .route("/category/{id}", get(by_category))
        .route("/{id}", get(show))
        .route("/{id}/update-quantity", post(update_quantity))
        .route("/{id}/toggle-active", post(toggle_active))
}

/// Paging and sorting parameters shared by the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

impl ListParams {
    fn apply(&self, criteria: &mut ProductSearchCriteria) {
        criteria.page = self.page.unwrap_or(0);
        criteria.size = self.size.unwrap_or(12);
        if let Some(ref key) = self.sort_by {
            criteria.sort = ProductSortKey::parse(key);
        }
        if let Some(ref direction) = self.sort_direction {
            criteria.direction = SortDirection::parse(direction);
        }
    }
}

/// Search filters for `/products/search`.
///
/// Paging fields are repeated here rather than flattened: the urlencoded
/// deserializer used by `Query` cannot drive `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Free-text term matched against name and description.
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
}

/// Paged listing of active products.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<crate::db::Page<Product>>> {
    let mut criteria = ProductSearchCriteria::default();
    params.apply(&mut criteria);

    let page = CatalogService::new(state.pool())
        .search_products(&criteria)
        .await?;
    Ok(Json(page))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    let product = CatalogService::new(state.pool())
        .product(ProductId::new(id))
        .await?;
    Ok(Json(product))
}

/// Paged listing of one category's active products.
#[instrument(skip(state))]
pub async fn by_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(params): Query<ListParams>,
) -> Result<Json<crate::db::Page<Product>>> {
    let mut criteria = ProductSearchCriteria::default();
    params.apply(&mut criteria);

    let page = CatalogService::new(state.pool())
        .products_by_category(CategoryId::new(id), &criteria)
        .await?;
    Ok(Json(page))
}

/// Multi-criteria catalog search.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<crate::db::Page<Product>>> {
    let criteria = ProductSearchCriteria {
        term: params.search.clone(),
        category_id: params.category_id.map(CategoryId::new),
        min_price: params.min_price,
        max_price: params.max_price,
        in_stock_only: params.in_stock.unwrap_or(false),
        include_inactive: false,
        page: params.page.unwrap_or(0),
        size: params.size.unwrap_or(12),
        sort: params
            .sort_by
            .as_deref()
            .map_or_else(ProductSortKey::default, ProductSortKey::parse),
        direction: params
            .sort_direction
            .as_deref()
            .map_or_else(SortDirection::default, SortDirection::parse),
    };

    let page = CatalogService::new(state.pool())
        .search_products(&criteria)
        .await?;
    Ok(Json(page))
}

/// Query parameters for the featured-products endpoint.
#[derive(Debug, Deserialize)]
pub struct FeaturedParams {
    pub limit: Option<i64>,
}

/// Featured (newest active) products.
#[instrument(skip(state))]
pub async fn featured(
    State(state): State<AppState>,
    Query(params): Query<FeaturedParams>,
) -> Result<Json<Vec<Product>>> {
    let limit = params.limit.unwrap_or(8).clamp(1, 50);
    let products = CatalogService::new(state.pool())
        .featured_products(limit)
        .await?;
    Ok(Json(products))
}

/// Stock adjustment form.
#[derive(Debug, Deserialize)]
pub struct AdjustStockForm {
    /// Signed change to on-hand quantity.
    pub adjustment: i32,
}

/// Adjust a product's on-hand stock (staff).
#[instrument(skip(_staff, state))]
pub async fn update_quantity(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<AdjustStockForm>,
) -> Result<Json<Product>> {
    let product = CatalogService::new(state.pool())
        .adjust_stock(ProductId::new(id), form.adjustment)
        .await?;
    Ok(Json(product))
}

/// Flip a product's active flag (staff).
#[instrument(skip(_staff, state))]
pub async fn toggle_active(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    let product = CatalogService::new(state.pool())
        .toggle_active(ProductId::new(id))
        .await?;
    Ok(Json(product))
}
