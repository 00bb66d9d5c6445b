//! Range queries over persisted messages

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use log::error;
use serde::Deserialize;
use serde_json::json;

use super::super::{ApiError, AppState};

/// Query parameters for the message history
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    /// Inclusive start, RFC 3339. Defaults to one hour ago.
    pub from: Option<String>,
    /// Inclusive end, RFC 3339. Defaults to now.
    pub to: Option<String>,
}

/// GET /messages - persisted messages in `[from, to]`, newest first
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Response {
    let from = match parse_bound(params.from.as_deref(), || Utc::now() - Duration::hours(1)) {
        Ok(from) => from,
        Err(()) => return invalid_param("from"),
    };
    let to = match parse_bound(params.to.as_deref(), Utc::now) {
        Ok(to) => to,
        Err(()) => return invalid_param("to"),
    };

    match state.store.query(from, to).await {
        Ok(messages) => (StatusCode::OK, Json(json!({ "messages": messages }))).into_response(),
        Err(e) => {
            error!("[API] message query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal("Failed to query messages")),
            )
                .into_response()
        }
    }
}

fn parse_bound(
    raw: Option<&str>,
    default: impl FnOnce() -> DateTime<Utc>,
) -> Result<DateTime<Utc>, ()> {
    match raw {
        None => Ok(default()),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| ()),
    }
}

fn invalid_param(name: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::bad_request(format!(
            "Invalid '{}' parameter",
            name
        ))),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bound_accepts_rfc3339() {
        let parsed = parse_bound(Some("2026-08-23T10:00:00Z"), Utc::now).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2026-08-23T10:00:00+00:00");
    }

    #[test]
    fn test_parse_bound_rejects_garbage() {
        assert!(parse_bound(Some("yesterday"), Utc::now).is_err());
    }

    #[test]
    fn test_parse_bound_uses_default_when_absent() {
        let marker = Utc::now();
        let parsed = parse_bound(None, || marker).unwrap();
        assert_eq!(parsed, marker);
    }
}
