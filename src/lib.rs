//! Storefront Cart Library
//!
//! This library provides the core functionality of a storefront shopping
//! cart: pricing, session resolution, cart mutations and catalog lookups,
//! served over REST and JSON-RPC.

// Domain modules
pub mod cart;
pub mod catalog;
pub mod identity;
pub mod rpc;

// Infrastructure
pub mod config;
pub mod router;
pub mod store;
