//! HTTP server setup with Axum

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use log::warn;
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::{auth, rest, ws, AppState};

/// Create the Axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(&state.frontend_url))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
        ])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 60 * 60));

    Router::new()
        // Real-time endpoints
        .route("/ws/listen", get(ws::listen_handler))
        .route("/ws/send", post(ws::send_handler))
        // Authenticated message history
        .route(
            "/messages",
            get(rest::messages::list_messages).route_layer(middleware::from_fn_with_state(
                Arc::clone(&state),
                auth::require_basic_auth,
            )),
        )
        // Liveness probe
        .route("/ping", get(ping))
        .layer(cors)
        .with_state(state)
}

/// Liveness probe endpoint
async fn ping() -> &'static str {
    "pong\n"
}

fn allowed_origins(frontend_url: &str) -> AllowOrigin {
    let origins: Vec<HeaderValue> = [frontend_url, "http://localhost:3000"]
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("[API] ignoring unparsable CORS origin: {}", origin);
                None
            }
        })
        .collect();
    AllowOrigin::list(origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hub::{Hub, KeepaliveConfig};
    use crate::store::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let store = Arc::new(MemoryStore::new());
        let hub = Hub::spawn(store.clone());
        let config = Config {
            port: 0,
            frontend_url: "http://localhost:5173".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "secret".to_string(),
            shutdown_timeout: Duration::from_secs(1),
            keepalive: KeepaliveConfig::default(),
        };
        Arc::new(AppState::new(hub, store, &config))
    }

    #[tokio::test]
    async fn test_ping() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_messages_requires_auth() {
        let app = create_router(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/messages")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 401);
    }
}
