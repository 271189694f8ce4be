//! Admin product management handlers.

use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use greengrocer_core::{CategoryId, ProductId, Sku};

use crate::db::products::{NewProduct, ProductChanges};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminMode;
use crate::models::Product;
use crate::services::CatalogService;
use crate::state::AppState;

/// Product add/edit form data.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub category_id: i32,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub reorder_level: Option<i32>,
    pub image_url: Option<String>,
    /// Edit only; creation always activates.
    pub is_active: Option<bool>,
}

impl ProductForm {
    fn parse_sku(&self) -> Result<Sku> {
        Sku::parse(&self.sku).map_err(|e| AppError::BadRequest(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("product name is required".to_owned()));
        }
        if self.price < Decimal::ZERO {
            return Err(AppError::BadRequest("price cannot be negative".to_owned()));
        }
        if self.quantity < 0 {
            return Err(AppError::BadRequest("quantity cannot be negative".to_owned()));
        }
        Ok(())
    }
}

/// Create a product.
#[instrument(skip(_admin, state, form))]
pub async fn add(
    RequireAdminMode(_admin): RequireAdminMode,
    State(state): State<AppState>,
    Form(form): Form<ProductForm>,
) -> Result<(StatusCode, Json<Product>)> {
    form.validate()?;

    let new = NewProduct {
        category_id: CategoryId::new(form.category_id),
        sku: form.parse_sku()?,
        name: form.name.trim().to_owned(),
        description: form.description.clone(),
        price: form.price,
        quantity: form.quantity,
        reorder_level: form.reorder_level.unwrap_or(10),
        image_url: form.image_url.clone(),
    };

    let product = CatalogService::new(state.pool()).create_product(&new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Edit a product's fields, SKU uniqueness enforced.
#[instrument(skip(_admin, state, form))]
pub async fn edit(
    RequireAdminMode(_admin): RequireAdminMode,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Json<Product>> {
    form.validate()?;

    let changes = ProductChanges {
        category_id: CategoryId::new(form.category_id),
        sku: form.parse_sku()?,
        name: form.name.trim().to_owned(),
        description: form.description.clone(),
        price: form.price,
        quantity: form.quantity,
        reorder_level: form.reorder_level.unwrap_or(10),
        image_url: form.image_url.clone(),
        is_active: form.is_active.unwrap_or(true),
    };

    let product = CatalogService::new(state.pool())
        .update_product(ProductId::new(id), &changes)
        .await?;
    Ok(Json(product))
}
