//! Basic-auth gate for the history endpoints
//!
//! Opaque to the core: a request either carries valid admin credentials and
//! passes through, or is rejected with 401 before reaching the handler.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::prelude::{Engine, BASE64_STANDARD};
use log::info;

use super::{ApiError, AppState};

/// Admin credentials checked by the gate.
#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// Middleware: admit the request only with valid `Authorization: Basic`
/// credentials.
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    match authorized_user(request.headers(), &state.credentials) {
        Some(user) => {
            info!("[Auth] user {} accessed {}", user, request.uri().path());
            next.run(request).await
        }
        None => unauthorized(),
    }
}

/// The authenticated username, or `None` if the header is missing, garbled,
/// or the credentials do not match.
fn authorized_user(headers: &HeaderMap, credentials: &AdminCredentials) -> Option<String> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = BASE64_STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;

    if user == credentials.username && password == credentials.password {
        Some(user.to_string())
    } else {
        None
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"messages\"")],
        Json(ApiError::unauthorized("Authentication required")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn credentials() -> AdminCredentials {
        AdminCredentials {
            username: "admin".to_string(),
            password: "secret".to_string(),
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_valid_credentials_are_admitted() {
        let encoded = BASE64_STANDARD.encode("admin:secret");
        let headers = headers_with(&format!("Basic {}", encoded));
        assert_eq!(
            authorized_user(&headers, &credentials()),
            Some("admin".to_string())
        );
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let encoded = BASE64_STANDARD.encode("admin:wrong");
        let headers = headers_with(&format!("Basic {}", encoded));
        assert_eq!(authorized_user(&headers, &credentials()), None);
    }

    #[test]
    fn test_missing_header_is_rejected() {
        assert_eq!(authorized_user(&HeaderMap::new(), &credentials()), None);
    }

    #[test]
    fn test_non_basic_scheme_is_rejected() {
        let headers = headers_with("Bearer whatever");
        assert_eq!(authorized_user(&headers, &credentials()), None);
    }

    #[test]
    fn test_garbled_base64_is_rejected() {
        let headers = headers_with("Basic ???not-base64???");
        assert_eq!(authorized_user(&headers, &credentials()), None);
    }
}
