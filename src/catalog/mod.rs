//! Product Catalog Module
//!
//! Read-only product listings:
//! - Product model and listing rules
//! - Catalog loading (JSON file or bundled samples)
//! - Latest-products and by-slug queries
//! - REST API handlers

use std::path::PathBuf;

use thiserror::Error;

pub mod handlers;
pub mod models;
pub mod seed;
pub mod service;

pub use handlers::routes;
pub use service::CatalogService;

/// Errors raised while loading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("product {product} is invalid: {reason}")]
    Invalid { product: String, reason: String },

    #[error("duplicate product {0}")]
    Duplicate(String),
}
