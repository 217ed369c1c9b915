//! Catalog queries.

use std::sync::Arc;

use super::models::Product;
use crate::store::{ProductStore, StoreError};

/// Number of products shown in the "newest arrivals" list by default.
pub const DEFAULT_LATEST_PRODUCTS_LIMIT: usize = 4;

#[derive(Clone)]
pub struct CatalogService {
    products: Arc<dyn ProductStore>,
    latest_limit: usize,
}

impl CatalogService {
    pub fn new(products: Arc<dyn ProductStore>, latest_limit: usize) -> Self {
        Self {
            products,
            latest_limit,
        }
    }

    /// Newest products first, capped at the configured limit.
    pub async fn latest_products(&self) -> Result<Vec<Product>, StoreError> {
        self.products.latest_products(self.latest_limit).await
    }

    pub async fn product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        self.products.find_product_by_slug(slug).await
    }
}
