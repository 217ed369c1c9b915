//! JSON-RPC route handlers
//!
//! Exposes the storefront actions (cart mutations, cart read and catalog
//! lookups) behind a single `POST /rpc` endpoint. Action failures travel as
//! `{ "success": false, "message": ... }` results; only envelope problems
//! become JSON-RPC errors.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use super::{helpers::*, models::*};
use crate::cart::{models::ActionResult, session::RequestCookies, state::SharedState};

/// Creates routes for JSON-RPC operations
pub fn routes() -> Router<SharedState> {
    Router::new().route("/rpc", post(handle_rpc))
}

/// Endpoint: POST /rpc
async fn handle_rpc(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Json<JsonRpcRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(r)) => r,
        Err(e) => {
            warn!("rejected rpc body: {}", e.body_text());
            return bad_request(Value::Null, rejection_code(&e));
        }
    };

    let id = req.id.unwrap_or(Value::Null);
    if req.jsonrpc.as_deref() != Some(JSONRPC_VERSION) {
        warn!(jsonrpc = ?req.jsonrpc, "unsupported protocol version");
        return bad_request(id, INVALID_REQUEST);
    }

    let params = req.params.unwrap_or(Value::Null);
    debug!(method = %req.method, ?id, "rpc call");

    let mut cookies = RequestCookies::from_headers(&headers);
    let response_body = match dispatch(&state, &headers, &mut cookies, &req.method, params).await {
        Ok(result) => rpc_success(id, result),
        Err(failure) => {
            warn!(method = %req.method, code = failure.code, "{}", failure.message);
            rpc_error(id, failure.code, failure.message)
        }
    };

    let mut response = Json(response_body).into_response();
    cookies.apply(&mut response);
    response
}

/// Routes one method call to the cart or catalog services.
///
/// Session resolution only happens for cart methods, so catalog lookups never
/// mint a cookie.
pub async fn dispatch(
    state: &SharedState,
    headers: &HeaderMap,
    cookies: &mut RequestCookies,
    method: &str,
    params: Value,
) -> Result<Value, RpcFailure> {
    match method {
        ADD_ITEM_METHOD => {
            let AddItemParams { item } = parse_params(params)?;
            let result = match state.resolve_key(headers, cookies).await {
                Ok(key) => state.carts.add_item(&key, item).await,
                Err(e) => Err(e),
            };
            to_result(&ActionResult::from(&result))
        }
        REMOVE_ITEM_METHOD => {
            let RemoveItemParams { product_id } = parse_params(params)?;
            let result = match state.resolve_key(headers, cookies).await {
                Ok(key) => state.carts.remove_one_unit(&key, &product_id).await,
                Err(e) => Err(e),
            };
            to_result(&ActionResult::from(&result))
        }
        GET_CART_METHOD => {
            let cart = match state.resolve_key(headers, cookies).await {
                Ok(key) => state.carts.get_cart(&key).await,
                Err(e) => Err(e),
            };
            match cart {
                Ok(cart) => to_result(&cart),
                Err(e) => to_result(&ActionResult {
                    success: false,
                    message: e.user_message(),
                }),
            }
        }
        LATEST_PRODUCTS_METHOD => match state.catalog.latest_products().await {
            Ok(products) => to_result(&products),
            Err(e) => {
                error!("failed to list latest products: {e}");
                Ok(catalog_unavailable())
            }
        },
        PRODUCT_BY_SLUG_METHOD => {
            let ProductBySlugParams { slug } = parse_params(params)?;
            match state.catalog.product_by_slug(&slug).await {
                Ok(Some(product)) => to_result(&product),
                Ok(None) => to_result(&ActionResult {
                    success: false,
                    message: "Product not found".to_string(),
                }),
                Err(e) => {
                    error!(slug = %slug, "failed to load product: {e}");
                    Ok(catalog_unavailable())
                }
            }
        }
        PING_METHOD => Ok(json!({})),
        _ => Err(RpcFailure::new(METHOD_NOT_FOUND, "Method not found")),
    }
}

/// Malformed JSON is a parse error; well-formed JSON that is not a request
/// envelope (or is not sent as JSON) is an invalid request.
fn rejection_code(rejection: &JsonRejection) -> i32 {
    match rejection {
        JsonRejection::JsonSyntaxError(_) => PARSE_ERROR,
        _ => INVALID_REQUEST,
    }
}

fn bad_request(id: Value, code: i32) -> Response {
    let message = if code == PARSE_ERROR {
        "Parse error"
    } else {
        "Invalid Request"
    };
    (StatusCode::BAD_REQUEST, Json(rpc_error(id, code, message))).into_response()
}

fn catalog_unavailable() -> Value {
    json!({
        "success": false,
        "message": "Catalog is unavailable, please try again",
    })
}
