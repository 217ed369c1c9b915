//! Shopping Cart Domain Models
//!
//! This module contains all data structures related to the shopping cart
//! business domain: line items, carts, the key a cart is addressed by and the
//! write payloads handed to the persistence layer.

use std::fmt;

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{
    errors::CartError,
    pricing::{compute_totals, Amount, CartTotals},
};

// =============================================================================
// Line Items
// =============================================================================

/// Returns the default quantity (1) for cart items
fn default_qty() -> i64 {
    1
}

/// One validated product line within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Catalog identifier, unique within a cart
    pub product_id: String,

    /// Display metadata captured when the line was added
    pub name: String,
    pub slug: String,
    pub image: String,

    /// Units of this product in the cart
    pub qty: u32,

    /// Unit price captured when the line was added
    pub price: Amount,
}

impl CartItem {
    /// Unit price multiplied by quantity, unrounded.
    pub fn line_total(&self) -> Decimal {
        self.price.value() * Decimal::from(self.qty)
    }
}

/// Untrusted shape of a cart line, as received from a caller or read back
/// from storage. Turned into a [`CartItem`] by [`CartItemInput::validate`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub image: String,
    #[serde(default = "default_qty")]
    pub qty: i64,
    #[serde(default)]
    pub price: Value,
}

impl CartItemInput {
    /// Checks every field and reports all problems at once.
    pub fn validate(self) -> Result<CartItem, CartError> {
        let mut problems = Vec::new();

        let required = [
            (&self.product_id, "Product is required"),
            (&self.name, "Name is required"),
            (&self.slug, "Slug is required"),
            (&self.image, "Image is required"),
        ];
        for (field, message) in required {
            if field.trim().is_empty() {
                problems.push(message.to_string());
            }
        }

        let qty = match u32::try_from(self.qty) {
            Ok(qty) => Some(qty),
            Err(_) if self.qty < 0 => {
                problems.push("Quantity must be a non-negative number".to_string());
                None
            }
            Err(_) => {
                problems.push("Quantity is too large".to_string());
                None
            }
        };

        let price = match parse_price(&self.price) {
            Ok(price) => Some(price),
            Err(message) => {
                problems.push(message);
                None
            }
        };

        match (qty, price) {
            (Some(qty), Some(price)) if problems.is_empty() => Ok(CartItem {
                product_id: self.product_id,
                name: self.name,
                slug: self.slug,
                image: self.image,
                qty,
                price,
            }),
            _ => Err(CartError::Validation(problems.join(". "))),
        }
    }
}

impl From<CartItem> for CartItemInput {
    fn from(item: CartItem) -> Self {
        Self {
            product_id: item.product_id,
            name: item.name,
            slug: item.slug,
            image: item.image,
            qty: i64::from(item.qty),
            price: Value::String(item.price.to_string()),
        }
    }
}

fn parse_price(raw: &Value) -> Result<Amount, String> {
    let parsed = match raw {
        Value::Null => return Err("Price is required".to_string()),
        Value::String(text) => text.parse::<Amount>(),
        Value::Number(number) => number.to_string().parse::<Amount>(),
        _ => return Err("Price must be a number".to_string()),
    };

    parsed.map_err(|e| e.to_string())
}

// =============================================================================
// Carts
// =============================================================================

/// Identity a cart is addressed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartKey {
    /// Authenticated account, if any
    pub user_id: Option<String>,

    /// Browser session token; carried even once a user is signed in
    pub session_cart_id: String,
}

/// The single identity that owns a live cart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CartOwner {
    User(String),
    Session(String),
}

impl fmt::Display for CartOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartOwner::User(id) => write!(f, "user {id}"),
            CartOwner::Session(token) => write!(f, "session {token}"),
        }
    }
}

impl CartKey {
    pub fn anonymous(session_cart_id: impl Into<String>) -> Self {
        Self {
            user_id: None,
            session_cart_id: session_cart_id.into(),
        }
    }

    pub fn for_user(user_id: impl Into<String>, session_cart_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            session_cart_id: session_cart_id.into(),
        }
    }

    /// A signed-in user always wins over the session token.
    pub fn owner(&self) -> CartOwner {
        match &self.user_id {
            Some(user_id) => CartOwner::User(user_id.clone()),
            None => CartOwner::Session(self.session_cart_id.clone()),
        }
    }
}

/// A persisted shopping cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub session_cart_id: String,
    pub items: Vec<CartItem>,
    #[serde(flatten)]
    pub totals: CartTotals,
    /// Incremented on every successful write
    pub version: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Write Payloads
// =============================================================================

/// Payload for creating a cart. Totals are always derived from the items.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCart {
    pub(crate) key: CartKey,
    pub(crate) items: Vec<CartItem>,
    pub(crate) totals: CartTotals,
}

impl NewCart {
    pub fn new(key: CartKey, items: Vec<CartItem>) -> Self {
        let totals = compute_totals(&items);
        Self { key, items, totals }
    }

    pub fn key(&self) -> &CartKey {
        &self.key
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn totals(&self) -> &CartTotals {
        &self.totals
    }
}

/// Replacement item list for an existing cart, guarded by the version the
/// caller read. Totals are always derived from the items.
#[derive(Debug, Clone, PartialEq)]
pub struct CartPatch {
    pub(crate) items: Vec<CartItem>,
    pub(crate) totals: CartTotals,
    pub(crate) expected_version: u64,
}

impl CartPatch {
    pub fn new(items: Vec<CartItem>, expected_version: u64) -> Self {
        let totals = compute_totals(&items);
        Self {
            items,
            totals,
            expected_version,
        }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn totals(&self) -> &CartTotals {
        &self.totals
    }

    pub fn expected_version(&self) -> u64 {
        self.expected_version
    }
}

// =============================================================================
// Operation Results
// =============================================================================

/// Where a cart ended up after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CartState {
    Created,
    Updated,
    Empty,
}

/// Outcome of a successful add or remove.
#[derive(Debug, Clone)]
pub struct CartUpdate {
    pub cart: Cart,
    pub state: CartState,
    pub message: String,
}

/// Uniform caller-facing result of a cart action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl From<&Result<CartUpdate, CartError>> for ActionResult {
    fn from(result: &Result<CartUpdate, CartError>) -> Self {
        match result {
            Ok(update) => Self {
                success: true,
                message: update.message.clone(),
            },
            Err(e) => Self {
                success: false,
                message: e.user_message(),
            },
        }
    }
}
