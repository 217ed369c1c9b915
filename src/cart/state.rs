//! Shopping Cart State Management
//!
//! This module wires the cart and catalog services, the session resolver and
//! the identity provider into the state shared by every request handler.

use std::sync::Arc;

use axum::http::HeaderMap;

use super::{
    errors::CartError,
    models::CartKey,
    service::{CartService, DEFAULT_MAX_WRITE_ATTEMPTS},
    session::{RequestCookies, SessionResolver},
};
use crate::{
    catalog::{seed::sample_products, service::DEFAULT_LATEST_PRODUCTS_LIMIT, CatalogService},
    identity::{HeaderIdentity, IdentityProvider},
    store::{CartStore, MemoryStore, ProductStore},
};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Tunables for the cart and catalog services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSettings {
    pub latest_products_limit: usize,
    pub mint_session_cookie: bool,
    pub max_write_attempts: u32,
}

impl Default for CartSettings {
    fn default() -> Self {
        Self {
            latest_products_limit: DEFAULT_LATEST_PRODUCTS_LIMIT,
            mint_session_cookie: true,
            max_write_attempts: DEFAULT_MAX_WRITE_ATTEMPTS,
        }
    }
}

/// Core application state: services plus request identity resolution
pub struct AppState {
    pub carts: CartService,
    pub catalog: CatalogService,
    pub sessions: SessionResolver,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// In-memory store seeded with the sample catalog and default settings
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::with_products(sample_products()));
        Self::with_store(store, &CartSettings::default(), Arc::new(HeaderIdentity::default()))
    }

    /// Builds the state over any backend that stores both carts and products
    pub fn with_store<S>(
        store: Arc<S>,
        settings: &CartSettings,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self
    where
        S: CartStore + ProductStore + 'static,
    {
        let carts = CartService::new(store.clone(), store.clone())
            .with_max_attempts(settings.max_write_attempts);
        let catalog = CatalogService::new(store, settings.latest_products_limit);

        Self {
            carts,
            catalog,
            sessions: SessionResolver::new(settings.mint_session_cookie),
            identity,
        }
    }

    /// Resolves the cart key of a request, minting a session token into
    /// `cookies` when the browser has none yet.
    pub async fn resolve_key(
        &self,
        headers: &HeaderMap,
        cookies: &mut RequestCookies,
    ) -> Result<CartKey, CartError> {
        let user_id = self.identity.current_user_id(headers).await;
        self.sessions.resolve(cookies, user_id)
    }
}
