//! JSON-RPC Protocol Helpers
//!
//! This module contains helper functions for JSON-RPC envelopes and
//! parameter decoding.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::models::{RpcFailure, INTERNAL_ERROR, INVALID_PARAMS};

/// Builds a JSON-RPC 2.0 success response.
///
/// # Arguments
///
/// * `id` – The request identifier that must be echoed back.
/// * `result` – The payload representing the successful outcome.
///
/// # Returns
///
/// A `serde_json::Value` shaped as a JSON-RPC success envelope.
pub fn rpc_success(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result,
    })
}

/// Builds a JSON-RPC 2.0 error response.
///
/// # Arguments
///
/// * `id` – The request identifier (or `null` if unavailable).
/// * `code` – The JSON-RPC error code (e.g., -32601 for method not found).
/// * `message` – Human-readable description of the error.
///
/// # Returns
///
/// A `serde_json::Value` shaped as a JSON-RPC error envelope.
pub fn rpc_error(id: Value, code: i32, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message.into(),
        }
    })
}

/// Decodes method params, reporting shape problems as `-32602`.
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcFailure> {
    serde_json::from_value(params)
        .map_err(|e| RpcFailure::new(INVALID_PARAMS, format!("Invalid params: {e}")))
}

/// Serializes a result payload, reporting failures as `-32603`.
pub fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, RpcFailure> {
    serde_json::to_value(value)
        .map_err(|e| RpcFailure::new(INTERNAL_ERROR, format!("Unserializable result: {e}")))
}
