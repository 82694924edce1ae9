use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use sha2::{Digest, Sha256};

use crate::config::AdminConfig;

pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

pub fn secret_fingerprint(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn extract_bearer_token(raw: &str) -> Option<&str> {
    raw.strip_prefix("Bearer ")
        .or_else(|| raw.strip_prefix("bearer "))
        .map(str::trim)
}

fn configured_secret(admin: &AdminConfig) -> Option<&str> {
    admin
        .secret
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Shared-secret gate for admin endpoints.
///
/// Accepts the secret in `x-admin-secret` or as a bearer token. Digests are
/// compared rather than the raw strings.
pub fn ensure_admin_authorized(
    headers: &HeaderMap,
    admin: &AdminConfig,
) -> std::result::Result<(), (StatusCode, String)> {
    let Some(expected) = configured_secret(admin) else {
        if !admin.auth_required {
            return Ok(());
        }
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            "admin auth is required but admin.secret is not configured".to_string(),
        ));
    };

    let provided = headers
        .get(ADMIN_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .or_else(|| {
            headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(extract_bearer_token)
        });

    if provided.is_some_and(|v| secret_fingerprint(v) == secret_fingerprint(expected)) {
        return Ok(());
    }

    Err((
        StatusCode::UNAUTHORIZED,
        "admin auth failed (missing/invalid secret)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn admin(secret: Option<&str>, required: bool) -> AdminConfig {
        AdminConfig {
            secret: secret.map(str::to_string),
            auth_required: required,
        }
    }

    #[test]
    fn test_header_and_bearer_accepted() {
        let cfg = admin(Some("s3cret"), true);

        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_SECRET_HEADER, HeaderValue::from_static("s3cret"));
        assert!(ensure_admin_authorized(&headers, &cfg).is_ok());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer s3cret"));
        assert!(ensure_admin_authorized(&headers, &cfg).is_ok());
    }

    #[test]
    fn test_wrong_or_missing_secret_rejected() {
        let cfg = admin(Some("s3cret"), true);
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_SECRET_HEADER, HeaderValue::from_static("nope"));
        assert_eq!(
            ensure_admin_authorized(&headers, &cfg).unwrap_err().0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ensure_admin_authorized(&HeaderMap::new(), &cfg)
                .unwrap_err()
                .0,
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_unconfigured_secret() {
        assert_eq!(
            ensure_admin_authorized(&HeaderMap::new(), &admin(None, true))
                .unwrap_err()
                .0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert!(ensure_admin_authorized(&HeaderMap::new(), &admin(None, false)).is_ok());
    }
}
