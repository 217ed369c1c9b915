//! JSON-RPC Action Module
//!
//! This module exposes the storefront actions over JSON-RPC 2.0, including:
//! - Protocol models (JsonRpcRequest, method names, error codes)
//! - RPC helpers (success/error envelopes, params decoding)
//! - The `/rpc` dispatcher

pub mod handlers;
pub mod helpers;
pub mod models;

// Re-export commonly used types and functions
pub use handlers::routes;
