//! REST API handlers for catalog browsing

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::error;

use crate::cart::{models::ActionResult, state::SharedState};

/// Creates routes for catalog operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/products/latest", get(latest_products))
        .route("/api/products/:slug", get(product_by_slug))
}

/// Endpoint: GET /api/products/latest
async fn latest_products(State(state): State<SharedState>) -> Response {
    match state.catalog.latest_products().await {
        Ok(products) => Json(products).into_response(),
        Err(e) => {
            error!("failed to list latest products: {e}");
            unavailable()
        }
    }
}

/// Endpoint: GET /api/products/:slug
async fn product_by_slug(State(state): State<SharedState>, Path(slug): Path<String>) -> Response {
    match state.catalog.product_by_slug(&slug).await {
        Ok(Some(product)) => Json(product).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ActionResult {
                success: false,
                message: "Product not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!(slug = %slug, "failed to load product: {e}");
            unavailable()
        }
    }
}

fn unavailable() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ActionResult {
            success: false,
            message: "Catalog is unavailable, please try again".to_string(),
        }),
    )
        .into_response()
}
