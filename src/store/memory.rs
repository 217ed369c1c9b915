//! In-memory storage backed by [`DashMap`].
//!
//! Each cart row sits behind its own map entry, so a version check and the
//! write that follows it happen under the same shard lock.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use jiff::Timestamp;
use tracing::debug;
use uuid::Uuid;

use super::{records::CartRecord, CartStore, ProductStore, StoreError};
use crate::{
    cart::models::{Cart, CartKey, CartOwner, CartPatch, NewCart},
    catalog::models::Product,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Cart rows keyed by cart id.
    carts: DashMap<Uuid, CartRecord>,

    /// Live cart of each owner. DashMap entries make "create if absent" atomic.
    owners: DashMap<CartOwner, Uuid>,

    /// Catalog keyed by product id.
    products: DashMap<String, Product>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let store = Self::new();
        for product in products {
            store.insert_product(product);
        }
        store
    }

    pub fn insert_product(&self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    pub fn cart_count(&self) -> usize {
        self.carts.len()
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn find_cart(&self, key: &CartKey) -> Result<Option<Cart>, StoreError> {
        let Some(id) = self.owners.get(&key.owner()).map(|entry| *entry.value()) else {
            return Ok(None);
        };

        self.carts
            .get(&id)
            .map(|record| record.decode())
            .transpose()
    }

    async fn create_cart(&self, cart: NewCart) -> Result<Cart, StoreError> {
        let owner = cart.key().owner();
        let id = Uuid::new_v4();
        let record = CartRecord::create(id, cart, Timestamp::now())?;
        let created = record.decode()?;

        match self.owners.entry(owner) {
            Entry::Occupied(entry) => Err(StoreError::AlreadyExists(entry.key().to_string())),
            Entry::Vacant(slot) => {
                self.carts.insert(id, record);
                slot.insert(id);
                debug!(cart_id = %id, "cart row created");
                Ok(created)
            }
        }
    }

    async fn update_cart(&self, id: Uuid, patch: CartPatch) -> Result<Cart, StoreError> {
        let mut record = self
            .carts
            .get_mut(&id)
            .ok_or(StoreError::CartNotFound(id))?;

        if record.version != patch.expected_version() {
            return Err(StoreError::VersionConflict {
                cart: id,
                expected: patch.expected_version(),
                found: record.version,
            });
        }

        record.apply(patch, Timestamp::now())?;
        debug!(cart_id = %id, version = record.version, "cart row updated");

        record.decode()
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn find_product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.get(id).map(|product| product.value().clone()))
    }

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .products
            .iter()
            .find(|product| product.slug == slug)
            .map(|product| product.value().clone()))
    }

    async fn latest_products(&self, limit: usize) -> Result<Vec<Product>, StoreError> {
        let mut products: Vec<Product> = self
            .products
            .iter()
            .map(|product| product.value().clone())
            .collect();

        products.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        products.truncate(limit);

        Ok(products)
    }
}
