//! Session Resolution
//!
//! Works out the [`CartKey`] a request addresses: the signed-in user when
//! there is one, and always the `sessionCartId` cookie. A missing cookie is
//! minted here; writing it back to the browser is left to the transport.

use axum::{
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue,
    },
    response::Response,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{errors::CartError, models::CartKey};

/// Name of the cookie carrying the anonymous cart token.
pub const SESSION_COOKIE: &str = "sessionCartId";

/// Read/write access to the session-cart cookie of one request.
pub trait SessionCookies {
    fn session_cart_id(&self) -> Option<String>;

    /// Ask the transport to persist `token` as the session cookie.
    fn set_session_cart_id(&mut self, token: String);
}

/// Resolves the cart identity for a request.
#[derive(Debug, Clone, Copy)]
pub struct SessionResolver {
    mint_missing: bool,
}

impl Default for SessionResolver {
    fn default() -> Self {
        Self::new(true)
    }
}

impl SessionResolver {
    /// With `mint_missing` unset, a request without a session cookie fails
    /// with [`CartError::Session`] instead of receiving a fresh token.
    pub fn new(mint_missing: bool) -> Self {
        Self { mint_missing }
    }

    pub fn resolve(
        &self,
        cookies: &mut impl SessionCookies,
        user_id: Option<String>,
    ) -> Result<CartKey, CartError> {
        let existing = cookies
            .session_cart_id()
            .filter(|token| !token.trim().is_empty());

        let session_cart_id = match existing {
            Some(token) => token,
            None if self.mint_missing => {
                let token = Uuid::new_v4().to_string();
                debug!(session_cart_id = %token, "minted session cart token");
                cookies.set_session_cart_id(token.clone());
                token
            }
            None => return Err(CartError::Session("Cart session not found".to_string())),
        };

        Ok(CartKey {
            user_id: user_id.filter(|id| !id.trim().is_empty()),
            session_cart_id,
        })
    }
}

/// Cookie jar backed by the request's `Cookie` headers. A token minted
/// during the request is written back by [`RequestCookies::apply`].
#[derive(Debug, Default, Clone)]
pub struct RequestCookies {
    current: Option<String>,
    minted: Option<String>,
}

impl RequestCookies {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let current = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|raw| raw.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim_matches('"').to_string());

        Self {
            current,
            minted: None,
        }
    }

    /// Adds a `Set-Cookie` header for a freshly minted token.
    pub fn apply(&self, response: &mut Response) {
        let Some(token) = &self.minted else {
            return;
        };

        let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("could not encode session cookie: {e}"),
        }
    }
}

impl SessionCookies for RequestCookies {
    fn session_cart_id(&self) -> Option<String> {
        self.current.clone()
    }

    fn set_session_cart_id(&mut self, token: String) {
        self.current = Some(token.clone());
        self.minted = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use axum::response::IntoResponse;
    use testresult::TestResult;

    use super::*;

    fn headers_with_cookie(raw: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(raw));
        headers
    }

    #[test]
    fn existing_cookie_is_reused() -> TestResult {
        let mut cookies = RequestCookies::from_headers(&headers_with_cookie(
            "theme=dark; sessionCartId=abc-123; other=1",
        ));

        let key = SessionResolver::default().resolve(&mut cookies, None)?;

        assert_eq!(key, CartKey::anonymous("abc-123"));
        assert!(cookies.minted.as_deref().is_none());

        Ok(())
    }

    #[test]
    fn missing_cookie_is_minted_and_reported() -> TestResult {
        let mut cookies = RequestCookies::from_headers(&HeaderMap::new());

        let key = SessionResolver::default().resolve(&mut cookies, None)?;

        assert_eq!(cookies.minted.as_deref(), Some(key.session_cart_id.as_str()));
        assert!(Uuid::parse_str(&key.session_cart_id).is_ok());

        Ok(())
    }

    #[test]
    fn blank_cookie_counts_as_missing() -> TestResult {
        let mut cookies = RequestCookies::from_headers(&headers_with_cookie("sessionCartId="));

        let key = SessionResolver::default().resolve(&mut cookies, None)?;

        assert!(!key.session_cart_id.is_empty());
        assert!(cookies.minted.as_deref().is_some());

        Ok(())
    }

    #[test]
    fn missing_cookie_without_minting_is_a_session_error() {
        let mut cookies = RequestCookies::default();

        let result = SessionResolver::new(false).resolve(&mut cookies, Some("u1".into()));

        assert!(
            matches!(result, Err(CartError::Session(_))),
            "expected session error, got {result:?}"
        );
    }

    #[test]
    fn signed_in_user_keeps_session_token() -> TestResult {
        let mut cookies = RequestCookies::from_headers(&headers_with_cookie("sessionCartId=s1"));

        let key = SessionResolver::default().resolve(&mut cookies, Some("u1".into()))?;

        assert_eq!(key, CartKey::for_user("u1", "s1"));

        Ok(())
    }

    #[test]
    fn minted_token_is_written_back() -> TestResult {
        let mut cookies = RequestCookies::default();
        let key = SessionResolver::default().resolve(&mut cookies, None)?;

        let mut response = ().into_response();
        cookies.apply(&mut response);

        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .ok_or("missing set-cookie")?
            .to_str()?;
        assert!(set_cookie.starts_with(&format!("sessionCartId={}", key.session_cart_id)));
        assert!(set_cookie.contains("HttpOnly"));

        Ok(())
    }
}
