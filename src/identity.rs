//! Authenticated identity lookup.
//!
//! Credential checks happen upstream (an auth gateway or reverse proxy);
//! this service only learns which user, if any, a request belongs to.

use async_trait::async_trait;
use axum::http::{header::InvalidHeaderName, HeaderMap, HeaderName};

/// Header consulted by [`HeaderIdentity`] unless configured otherwise.
pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user's id, or `None` for an anonymous shopper.
    async fn current_user_id(&self, headers: &HeaderMap) -> Option<String>;
}

/// Trusts a user id header set by the authentication gateway.
#[derive(Debug, Clone)]
pub struct HeaderIdentity {
    header: HeaderName,
}

impl Default for HeaderIdentity {
    fn default() -> Self {
        Self {
            header: HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
        }
    }
}

impl HeaderIdentity {
    pub fn new(header: &str) -> Result<Self, InvalidHeaderName> {
        Ok(Self {
            header: HeaderName::try_from(header.to_ascii_lowercase())?,
        })
    }
}

#[async_trait]
impl IdentityProvider for HeaderIdentity {
    async fn current_user_id(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(&self.header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}
