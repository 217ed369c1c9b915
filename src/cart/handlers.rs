//! REST API handlers for shopping cart operations
//!
//! This module implements HTTP endpoints for reading the shopper's cart and
//! adding or removing single units of a product.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::debug;

use super::{
    errors::CartError,
    helpers::{failure_response, format_item_summary},
    models::{ActionResult, CartItemInput},
    session::RequestCookies,
    state::SharedState,
};

/// Creates routes for cart-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/api/cart", get(get_my_cart))
        .route("/api/cart/items", post(add_item_to_cart))
        .route("/api/cart/items/:product_id", delete(remove_item_from_cart))
}

/// Endpoint: GET /api/cart
/// Returns the shopper's cart, or `null` when none has been created yet.
async fn get_my_cart(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let mut cookies = RequestCookies::from_headers(&headers);

    let result = async {
        let key = state.resolve_key(&headers, &mut cookies).await?;
        state.carts.get_cart(&key).await
    }
    .await;

    let mut response = match result {
        Ok(cart) => {
            if let Some(cart) = &cart {
                debug!(cart_id = %cart.id, "cart contents: {}", format_item_summary(&cart.items));
            }
            Json(cart).into_response()
        }
        Err(e) => failure_response(&e),
    };

    cookies.apply(&mut response);
    response
}

/// Endpoint: POST /api/cart/items
/// Adds the posted line, or one more unit of it when already in the cart.
async fn add_item_to_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Json<CartItemInput>, JsonRejection>,
) -> Response {
    let mut cookies = RequestCookies::from_headers(&headers);

    let result = async {
        let Json(input) = body.map_err(|e| CartError::Validation(e.body_text()))?;
        let key = state.resolve_key(&headers, &mut cookies).await?;
        state.carts.add_item(&key, input).await
    }
    .await;

    let mut response = match &result {
        Ok(_) => Json(ActionResult::from(&result)).into_response(),
        Err(e) => failure_response(e),
    };

    cookies.apply(&mut response);
    response
}

/// Endpoint: DELETE /api/cart/items/:product_id
/// Removes one unit of the product from the cart.
async fn remove_item_from_cart(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(product_id): Path<String>,
) -> Response {
    let mut cookies = RequestCookies::from_headers(&headers);

    let result = async {
        let key = state.resolve_key(&headers, &mut cookies).await?;
        state.carts.remove_one_unit(&key, &product_id).await
    }
    .await;

    let mut response = match &result {
        Ok(_) => Json(ActionResult::from(&result)).into_response(),
        Err(e) => failure_response(e),
    };

    cookies.apply(&mut response);
    response
}
