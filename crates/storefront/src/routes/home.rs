//! Home page handler.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::models::{Product, ProductCategory};
use crate::services::CatalogService;
use crate::state::AppState;

/// Number of featured products shown on the home page.
const FEATURED_LIMIT: i64 = 8;

/// Home page payload.
#[derive(Debug, Serialize)]
pub struct HomePage {
    pub featured: Vec<Product>,
    pub categories: Vec<ProductCategory>,
}

/// Featured products and the category list.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<Json<HomePage>> {
    let catalog = CatalogService::new(state.pool());

    let featured = catalog.featured_products(FEATURED_LIMIT).await?;
    let categories = catalog.categories().await?;

    Ok(Json(HomePage {
        featured,
        categories,
    }))
}
