//! Shopping Cart Domain Module
//!
//! This module contains all shopping cart business logic, including:
//! - Domain models (CartItem, Cart, CartKey, write payloads)
//! - Pricing (subtotal, shipping, tax, total)
//! - Session resolution (cookie token + signed-in user)
//! - The cart service (add, remove one unit, get)
//! - Application state management
//! - REST API handlers

pub mod errors;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod pricing;
pub mod service;
pub mod session;
pub mod state;

// Re-export commonly used types for convenience
pub use errors::CartError;
pub use handlers::routes;
pub use service::CartService;
pub use state::{AppState, CartSettings, SharedState};
