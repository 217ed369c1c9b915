//! Shopping Cart Transport Helpers
//!
//! Small functions shared by the REST and JSON-RPC surfaces: status codes for
//! failures, the uniform failure body and log-friendly cart summaries.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::{
    errors::{CartError, ErrorKind},
    models::{ActionResult, CartItem},
};

/// HTTP status used when a cart action fails with `kind`.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Stock => StatusCode::CONFLICT,
        ErrorKind::Session => StatusCode::UNAUTHORIZED,
        ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `{ success: false, message }` with the status matching the error kind.
pub fn failure_response(error: &CartError) -> Response {
    let body = ActionResult {
        success: false,
        message: error.user_message(),
    };

    (status_for(error.kind()), Json(body)).into_response()
}

/// Produces a human-readable one-line summary for a list of cart items.
///
/// Example output: `"2x Polo Shirt, 1x Hoodie"`.
pub fn format_item_summary(items: &[CartItem]) -> String {
    items
        .iter()
        .map(|i| format!("{}x {}", i.qty, i.name))
        .collect::<Vec<_>>()
        .join(", ")
}
