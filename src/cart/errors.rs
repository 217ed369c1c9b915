//! Cart Errors

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Failure of a cart or catalog operation.
#[derive(Debug, Error)]
pub enum CartError {
    /// Malformed input shape.
    #[error("{0}")]
    Validation(String),

    /// Missing cart, product or line item.
    #[error("{0}")]
    NotFound(String),

    /// Not enough inventory for the requested quantity.
    #[error("{0}")]
    Stock(String),

    /// No session token could be resolved for the request.
    #[error("{0}")]
    Session(String),

    /// Persistence failed or kept conflicting after retries.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Coarse classification of a [`CartError`], exposed to transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Stock,
    Session,
    Storage,
}

impl CartError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CartError::Validation(_) => ErrorKind::Validation,
            CartError::NotFound(_) => ErrorKind::NotFound,
            CartError::Stock(_) => ErrorKind::Stock,
            CartError::Session(_) => ErrorKind::Session,
            CartError::Store(_) => ErrorKind::Storage,
        }
    }

    /// Short message safe to show to a shopper. Storage details are logged,
    /// never returned.
    pub fn user_message(&self) -> String {
        match self {
            CartError::Store(source) => {
                error!("cart storage failure: {source}");

                "Something went wrong while saving your cart, please try again".to_string()
            }
            other => other.to_string(),
        }
    }
}
