//! JSON-RPC Models and Constants
//!
//! Method names and parameter shapes of the storefront action endpoint.

use serde::Deserialize;
use serde_json::Value;

use crate::cart::models::CartItemInput;

// =============================================================================
// Method Names
// =============================================================================

/// Add one unit of a product to the shopper's cart
pub const ADD_ITEM_METHOD: &str = "addItemToCart";
/// Remove one unit of a product from the shopper's cart
pub const REMOVE_ITEM_METHOD: &str = "removeItemFromCart";
/// Read the shopper's cart
pub const GET_CART_METHOD: &str = "getMyCart";
/// Newest catalog products
pub const LATEST_PRODUCTS_METHOD: &str = "getLatestProducts";
/// Single catalog product by slug
pub const PRODUCT_BY_SLUG_METHOD: &str = "getProductBySlug";
/// Liveness probe
pub const PING_METHOD: &str = "ping";

// =============================================================================
// Error Codes
// =============================================================================

/// Only protocol version served
pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// =============================================================================
// Envelopes and Parameters
// =============================================================================

/// Standard JSON-RPC 2.0 Request envelope
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, must be "2.0"
    #[serde(default)]
    pub jsonrpc: Option<String>,

    /// Method name to invoke
    pub method: String,

    /// Parameters for the method
    pub params: Option<Value>,

    /// Request identifier
    pub id: Option<Value>,
}

/// Params of `addItemToCart`
#[derive(Debug, Deserialize)]
pub struct AddItemParams {
    pub item: CartItemInput,
}

/// Params of `removeItemFromCart`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemParams {
    pub product_id: String,
}

/// Params of `getProductBySlug`
#[derive(Debug, Deserialize)]
pub struct ProductBySlugParams {
    pub slug: String,
}

/// A JSON-RPC level failure (as opposed to an action reporting
/// `success: false`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcFailure {
    pub code: i32,
    pub message: String,
}

impl RpcFailure {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
