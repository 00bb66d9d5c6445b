//! HTTP and WebSocket surface
//!
//! Everything here is plumbing around the hub: routing, the basic-auth gate,
//! the upgrade handshake, and the range-query endpoint.

pub mod auth;
pub mod http;
pub mod rest;
pub mod state;
pub mod ws;

use serde::Serialize;

pub use state::AppState;

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "BAD_REQUEST".to_string(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "UNAUTHORIZED".to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "INTERNAL_ERROR".to_string(),
        }
    }
}
