//! Message Relay Server
//!
//! Relays short text messages from producers to all currently-connected
//! WebSocket listeners and records every message durably for later range
//! queries.
//!
//! # Architecture
//!
//! - `hub`: the core — connection registry, broadcast fan-out, connection
//!   lifecycle, and per-connection keepalive supervision
//! - `store`: the persistence collaborator (Postgres in production,
//!   in-memory for tests)
//! - `api`: HTTP/WebSocket surface — routing, basic-auth gate, upgrade
//!   handshake, range queries
//! - `config`: environment configuration
//! - `types`: the `Message` value types
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use message_relay::{api, AppState, Config, Hub, MemoryStore};
//!
//! # async fn demo() {
//! let store = Arc::new(MemoryStore::new());
//! let hub = Hub::spawn(store.clone());
//! let config = Config::from_env().unwrap();
//! let state = Arc::new(AppState::new(hub, store, &config));
//! let router = api::http::create_router(state);
//! # let _ = router;
//! # }
//! ```

pub mod api;
pub mod config;
pub mod hub;
pub mod store;
pub mod types;

// Re-export commonly used items at crate root
pub use api::AppState;
pub use config::{Config, DbConfig};
pub use hub::{CloseReason, Connection, ConnectionId, Hub, HubHandle, KeepaliveConfig};
pub use store::{MemoryStore, MessageStore, PgMessageStore, StoreError};
pub use types::{Message, StoredMessage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
