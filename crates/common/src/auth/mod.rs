//! Authentication utilities
//!
//! Provides:
//! - Bearer token extraction from the Authorization header
//! - Constant-time comparison against the configured token
//! - Axum middleware gating protected routes

use crate::config::AuthConfig;
use crate::errors::{AppError, Result};
use crate::metrics::record_auth_failure;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Characters of a rejected token kept for the audit log
const LOGGED_TOKEN_PREFIX: usize = 10;

/// Verifies bearer tokens against the single configured value
#[derive(Clone)]
pub struct BearerAuth {
    expected: Arc<str>,
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth").finish_non_exhaustive()
    }
}

impl BearerAuth {
    /// Create an authenticator for the given token
    pub fn new(expected: impl Into<Arc<str>>) -> Self {
        Self { expected: expected.into() }
    }

    /// Create an authenticator from configuration
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.bearer_token.as_str())
    }

    /// Check a presented token; `None` means no usable credential was sent
    pub fn verify(&self, presented: Option<&str>) -> Result<()> {
        let Some(token) = presented else {
            tracing::warn!("Missing bearer token");
            record_auth_failure("missing");
            return Err(AppError::Unauthorized);
        };

        if constant_time_str_eq(token, &self.expected) {
            return Ok(());
        }

        tracing::warn!(
            token_prefix = %token_prefix(token),
            "Invalid token attempt"
        );
        record_auth_failure("invalid");
        Err(AppError::Unauthorized)
    }
}

/// Constant-time comparison of two strings
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    let (scheme, token) = auth_header.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

fn token_prefix(token: &str) -> String {
    let prefix: String = token.chars().take(LOGGED_TOKEN_PREFIX).collect();
    format!("{}...", prefix)
}

/// Middleware for bearer token authentication.
///
/// Runs before any extractor of the wrapped handler, so a rejected request
/// never has its body or query parsed and never reaches the store.
pub async fn bearer_auth_middleware(
    State(auth): State<BearerAuth>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, AppError> {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token);

    auth.verify(presented)?;

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("abc123"), None);
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }

    #[test]
    fn test_verify() {
        let auth = BearerAuth::new("s3cr3t");
        assert!(auth.verify(Some("s3cr3t")).is_ok());
        assert!(matches!(auth.verify(Some("s3cr3")), Err(AppError::Unauthorized)));
        assert!(matches!(auth.verify(Some("s3cr3t-longer")), Err(AppError::Unauthorized)));
        assert!(matches!(auth.verify(None), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_token_prefix_truncates() {
        assert_eq!(token_prefix("abcdefghijklmnop"), "abcdefghij...");
        assert_eq!(token_prefix("short"), "short...");
    }

    #[test]
    fn test_from_config() {
        let config = AuthConfig { bearer_token: "configured".to_string() };
        let auth = BearerAuth::from_config(&config);
        assert!(auth.verify(Some("configured")).is_ok());
        assert!(!format!("{:?}", auth).contains("configured"));
    }

    fn protected_router() -> Router {
        Router::new()
            .route("/protected", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(
                BearerAuth::new("s3cr3t"),
                bearer_auth_middleware,
            ))
    }

    #[tokio::test]
    async fn test_middleware_accepts_valid_token() {
        let response = protected_router()
            .oneshot(
                HttpRequest::get("/protected")
                    .header("authorization", "Bearer s3cr3t")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_middleware_rejects_missing_and_wrong_token() {
        for value in [None, Some("Bearer wrong"), Some("s3cr3t")] {
            let mut request = HttpRequest::get("/protected");
            if let Some(value) = value {
                request = request.header("authorization", value);
            }
            let response = protected_router()
                .oneshot(request.body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(response.headers().get("www-authenticate").unwrap(), "Bearer");
        }
    }
}
