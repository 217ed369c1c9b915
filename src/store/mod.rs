//! Persistence
//!
//! Storage seams for carts and the product catalog, plus the in-memory
//! implementation the server ships with.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    cart::models::{Cart, CartKey, CartPatch, NewCart},
    catalog::models::Product,
};

pub mod memory;
mod records;

pub use memory::MemoryStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cart {0} not found")]
    CartNotFound(Uuid),

    #[error("cart {cart} changed concurrently (expected version {expected}, found {found})")]
    VersionConflict { cart: Uuid, expected: u64, found: u64 },

    #[error("a live cart already exists for {0}")]
    AlreadyExists(String),

    #[error("stored cart {cart} is invalid: {reason}")]
    Corrupt { cart: Uuid, reason: String },

    #[error("refusing to write invalid cart items: {0}")]
    InvalidItems(String),

    #[error("failed to encode cart items: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    /// Conflicts are resolved by re-reading the cart and trying again.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::VersionConflict { .. } | StoreError::AlreadyExists(_)
        )
    }
}

/// Cart persistence. Each call is atomic for the single cart it touches.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// The live cart owned by `key`: by user when signed in, otherwise the
    /// anonymous cart of the session.
    async fn find_cart(&self, key: &CartKey) -> Result<Option<Cart>, StoreError>;

    /// Persists a new cart. Fails with [`StoreError::AlreadyExists`] when the
    /// owner already has one.
    async fn create_cart(&self, cart: NewCart) -> Result<Cart, StoreError>;

    /// Replaces the items and totals of a cart if its version still matches.
    async fn update_cart(&self, id: Uuid, patch: CartPatch) -> Result<Cart, StoreError>;
}

/// Read-only product catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn find_product(&self, id: &str) -> Result<Option<Product>, StoreError>;

    async fn find_product_by_slug(&self, slug: &str) -> Result<Option<Product>, StoreError>;

    /// Newest products first.
    async fn latest_products(&self, limit: usize) -> Result<Vec<Product>, StoreError>;
}
