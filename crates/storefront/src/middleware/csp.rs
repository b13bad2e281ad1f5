//! CSP nonce middleware.
//!
//! Every page gets a fresh nonce. The layout puts it on the one inline
//! script it emits (the `history.replaceState` call after a load pass that
//! rewrote the URL) and `security_headers_middleware` allows exactly that
//! nonce in `script-src`.

use std::fmt;

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;

/// A per-request CSP nonce (128-bit, base64-encoded).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CspNonce(pub String);

impl CspNonce {
    /// Generate a new random nonce.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CspNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store a fresh [`CspNonce`] in the request extensions.
///
/// Must run before `security_headers_middleware`, which reads it back.
pub async fn csp_nonce_middleware(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(CspNonce::generate());
    next.run(request).await
}

/// Extractor for the request's nonce. Falls back to an empty nonce (which
/// no inline script can match) when the middleware is missing.
impl<S> FromRequestParts<S> for CspNonce
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_else(|| {
            tracing::warn!("CSP nonce not found in request extensions");
            Self(String::new())
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_is_base64_of_16_bytes() {
        let nonce = CspNonce::generate();
        let bytes = STANDARD.decode(nonce.value()).unwrap();
        assert_eq!(bytes.len(), 16);
    }

    #[test]
    fn test_nonces_differ() {
        assert_ne!(CspNonce::generate(), CspNonce::generate());
    }

    #[tokio::test]
    async fn test_extractor_reads_extension() {
        let (mut parts, ()) = axum::http::Request::new(()).into_parts();
        parts.extensions.insert(CspNonce("abc".to_string()));
        let nonce = CspNonce::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(nonce.to_string(), "abc");
    }

    #[tokio::test]
    async fn test_extractor_without_middleware() {
        let (mut parts, ()) = axum::http::Request::new(()).into_parts();
        let nonce = CspNonce::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(nonce.value().is_empty());
    }
}
