//! Catalog service: product browsing plus admin catalog management.

use sqlx::PgPool;

use greengrocer_core::{CategoryId, ProductId};

use super::{ServiceError, ServiceResult};
use crate::db::products::{NewProduct, ProductChanges, ProductSearchCriteria};
use crate::db::{CategoryRepository, Page, ProductRepository, categories::NewCategory};
use crate::models::{Product, ProductCategory};

/// Catalog operations.
pub struct CatalogService<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Filtered, paged, sorted product search.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if a query fails.
    pub async fn search_products(
        &self,
        criteria: &ProductSearchCriteria,
    ) -> ServiceResult<Page<Product>> {
        Ok(ProductRepository::new(self.pool).search(criteria).await?)
    }

    /// Get one product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    pub async fn product(&self, id: ProductId) -> ServiceResult<Product> {
        ProductRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("product"))
    }

    /// Paged products for one category. A missing category yields an empty
    /// page rather than an error.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if a query fails.
    pub async fn products_by_category(
        &self,
        category_id: CategoryId,
        criteria: &ProductSearchCriteria,
    ) -> ServiceResult<Page<Product>> {
        if CategoryRepository::new(self.pool)
            .get(category_id)
            .await?
            .is_none()
        {
            return Ok(Page::empty(criteria.page, criteria.size));
        }

        let criteria = ProductSearchCriteria {
            category_id: Some(category_id),
            ..criteria.clone()
        };
        Ok(ProductRepository::new(self.pool).search(&criteria).await?)
    }

    /// Newest active products for the home page.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn featured_products(&self, limit: i64) -> ServiceResult<Vec<Product>> {
        Ok(ProductRepository::new(self.pool).featured(limit).await?)
    }

    /// All categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn categories(&self) -> ServiceResult<Vec<ProductCategory>> {
        Ok(CategoryRepository::new(self.pool).list().await?)
    }

    /// Get one category.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist.
    pub async fn category(&self, id: CategoryId) -> ServiceResult<ProductCategory> {
        CategoryRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or(ServiceError::NotFound("category"))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` if the name is already taken.
    pub async fn create_category(&self, new: &NewCategory) -> ServiceResult<ProductCategory> {
        Ok(CategoryRepository::new(self.pool).create(new).await?)
    }

    /// Create a product. The SKU must be unused.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the category does not exist
    /// - `Conflict` if the SKU is already in use
    pub async fn create_product(&self, new: &NewProduct) -> ServiceResult<Product> {
        let repo = ProductRepository::new(self.pool);

        if CategoryRepository::new(self.pool)
            .get(new.category_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound("category"));
        }
        if repo.exists_by_sku(&new.sku).await? {
            return Err(ServiceError::Conflict(format!(
                "product with SKU {} already exists",
                new.sku
            )));
        }

        let product = repo.create(new).await?;
        tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    /// Replace a product's editable fields. Renaming to a SKU already used
    /// by a different product is rejected.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the product (or target category) does not exist
    /// - `Conflict` on a SKU collision
    pub async fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> ServiceResult<Product> {
        let repo = ProductRepository::new(self.pool);

        if let Some(holder) = repo.get_by_sku(&changes.sku).await?
            && holder.id != id
        {
            return Err(ServiceError::Conflict(format!(
                "product with SKU {} already exists",
                changes.sku
            )));
        }

        Ok(repo.update(id, changes).await?)
    }

    /// Flip a product's active flag, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    pub async fn toggle_active(&self, id: ProductId) -> ServiceResult<Product> {
        let repo = ProductRepository::new(self.pool);
        let product = repo.get(id).await?.ok_or(ServiceError::NotFound("product"))?;
        Ok(repo.set_active(id, !product.is_active).await?)
    }

    /// Adjust on-hand stock by a signed amount.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the product does not exist
    /// - `InvalidArgument` if the adjustment would take stock below zero
    pub async fn adjust_stock(&self, id: ProductId, delta: i32) -> ServiceResult<Product> {
        let repo = ProductRepository::new(self.pool);

        match repo.adjust_quantity(id, delta).await? {
            Some(product) => Ok(product),
            None => {
                // Either the product is missing or the delta underflows.
                repo.get(id).await?.ok_or(ServiceError::NotFound("product"))?;
                Err(ServiceError::InvalidArgument(
                    "adjustment would take stock below zero".to_owned(),
                ))
            }
        }
    }

    /// Active products at or below their reorder level.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the query fails.
    pub async fn low_stock_products(&self) -> ServiceResult<Vec<Product>> {
        Ok(ProductRepository::new(self.pool).low_stock().await?)
    }

    /// Permanently delete a product.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the product does not exist
    /// - `Conflict` while carts or orders still reference it
    pub async fn delete_product(&self, id: ProductId) -> ServiceResult<()> {
        if !ProductRepository::new(self.pool).delete(id).await? {
            return Err(ServiceError::NotFound("product"));
        }
        Ok(())
    }
}
