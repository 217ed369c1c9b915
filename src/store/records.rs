//! Stored cart rows.
//!
//! Items are kept as a JSON document, the way a relational row would hold
//! them, and totals as rendered strings. Every read re-validates the document
//! and re-derives the totals before a [`Cart`] is handed out.

use std::collections::HashSet;

use jiff::Timestamp;
use serde_json::Value;
use uuid::Uuid;

use super::StoreError;
use crate::cart::{
    models::{Cart, CartItem, CartItemInput, CartPatch, NewCart},
    pricing::{compute_totals, CartTotals},
};

#[derive(Debug, Clone)]
pub(crate) struct CartRecord {
    pub(crate) id: Uuid,
    pub(crate) user_id: Option<String>,
    pub(crate) session_cart_id: String,
    pub(crate) items: Value,
    pub(crate) items_price: String,
    pub(crate) shipping_price: String,
    pub(crate) tax_price: String,
    pub(crate) total_price: String,
    pub(crate) version: u64,
    pub(crate) created_at: Timestamp,
    pub(crate) updated_at: Timestamp,
}

impl CartRecord {
    pub(crate) fn create(id: Uuid, cart: NewCart, now: Timestamp) -> Result<Self, StoreError> {
        check_lines(&cart.items).map_err(StoreError::InvalidItems)?;
        let items = serde_json::to_value(&cart.items)?;

        let mut record = Self {
            id,
            user_id: cart.key.user_id,
            session_cart_id: cart.key.session_cart_id,
            items,
            items_price: String::new(),
            shipping_price: String::new(),
            tax_price: String::new(),
            total_price: String::new(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        record.write_totals(&cart.totals);

        Ok(record)
    }

    /// Replaces items and totals. Nothing is changed when encoding fails.
    pub(crate) fn apply(&mut self, patch: CartPatch, now: Timestamp) -> Result<(), StoreError> {
        check_lines(&patch.items).map_err(StoreError::InvalidItems)?;
        let items = serde_json::to_value(&patch.items)?;

        self.items = items;
        self.write_totals(&patch.totals);
        self.version += 1;
        self.updated_at = now;

        Ok(())
    }

    pub(crate) fn decode(&self) -> Result<Cart, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            cart: self.id,
            reason,
        };

        let raw: Vec<CartItemInput> =
            serde_json::from_value(self.items.clone()).map_err(|e| corrupt(e.to_string()))?;
        let items = raw
            .into_iter()
            .map(CartItemInput::validate)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| corrupt(e.to_string()))?;
        check_lines(&items).map_err(corrupt)?;

        let totals = compute_totals(&items);
        let stored = [
            (&self.items_price, totals.items_price),
            (&self.shipping_price, totals.shipping_price),
            (&self.tax_price, totals.tax_price),
            (&self.total_price, totals.total_price),
        ];
        if stored
            .iter()
            .any(|(text, amount)| **text != amount.to_string())
        {
            return Err(corrupt("stored totals do not match items".to_string()));
        }

        Ok(Cart {
            id: self.id,
            user_id: self.user_id.clone(),
            session_cart_id: self.session_cart_id.clone(),
            items,
            totals,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    fn write_totals(&mut self, totals: &CartTotals) {
        self.items_price = totals.items_price.to_string();
        self.shipping_price = totals.shipping_price.to_string();
        self.tax_price = totals.tax_price.to_string();
        self.total_price = totals.total_price.to_string();
    }
}

/// Lines must have a positive quantity and a unique product.
fn check_lines(items: &[CartItem]) -> Result<(), String> {
    let mut seen = HashSet::new();

    for item in items {
        if item.qty == 0 {
            return Err(format!("line {} has zero quantity", item.product_id));
        }
        if !seen.insert(item.product_id.as_str()) {
            return Err(format!("product {} appears twice", item.product_id));
        }
    }

    Ok(())
}
