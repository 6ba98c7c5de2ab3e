// =============================================================================
// Bearer Token Authentication — Axum extractor
// =============================================================================
//
// Guards the admin endpoints (decision log, feature flags).  The expected
// token comes from `IDX_SWING_ADMIN_TOKEN`; comparison is constant time.
//
//   async fn handler(_auth: AuthBearer, ...) { ... }
//
// A missing, malformed or wrong token short-circuits with 403 Forbidden.
// =============================================================================

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::warn;

pub const ADMIN_TOKEN_ENV: &str = "IDX_SWING_ADMIN_TOKEN";

/// Compare two byte slices without short-circuiting on the first mismatch.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check a presented `Authorization` header value against `expected`.
fn check_bearer(header: Option<&str>, expected: &str) -> Result<String, AuthRejection> {
    if expected.is_empty() {
        warn!("{ADMIN_TOKEN_ENV} is not set; rejecting authenticated request");
        return Err(AuthRejection::new("Server authentication not configured"));
    }

    let token = match header.and_then(|v| v.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            warn!("missing or malformed Authorization header");
            return Err(AuthRejection::new("Missing or invalid authorization token"));
        }
    };

    if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        warn!("invalid admin token presented");
        return Err(AuthRejection::new("Invalid authorization token"));
    }

    Ok(token.to_string())
}

/// Yields the validated token.
pub struct AuthBearer(pub String);

impl AuthBearer {
    /// First four characters of the token, for audit logs.
    pub fn redacted(&self) -> String {
        let prefix: String = self.0.chars().take(4).collect();
        format!("{prefix}***")
    }
}

#[derive(Debug)]
pub struct AuthRejection {
    message: &'static str,
}

impl AuthRejection {
    fn new(message: &'static str) -> Self {
        Self { message }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (StatusCode::FORBIDDEN, axum::Json(body)).into_response()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthBearer
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Read per request so a rotated token applies without a restart.
        let expected = std::env::var(ADMIN_TOKEN_ENV).unwrap_or_default();
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        check_bearer(header, &expected).map(AuthBearer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_cases() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"short", b"longer_string"));
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"\x00", b"\x01"));
    }

    #[test]
    fn bearer_accepted() {
        assert_eq!(check_bearer(Some("Bearer s3cret"), "s3cret").unwrap(), "s3cret");
    }

    #[test]
    fn redacted_keeps_only_a_prefix() {
        assert_eq!(AuthBearer("s3cret-token".to_string()).redacted(), "s3cr***");
        assert_eq!(AuthBearer("ab".to_string()).redacted(), "ab***");
    }

    #[test]
    fn bearer_rejected() {
        assert!(check_bearer(Some("Bearer wrong"), "s3cret").is_err());
        assert!(check_bearer(Some("s3cret"), "s3cret").is_err());
        assert!(check_bearer(None, "s3cret").is_err());
        // Unconfigured server rejects everything, including an empty token.
        assert!(check_bearer(Some("Bearer "), "").is_err());
    }
}
