//! Persistence collaborator
//!
//! The relay consumes a durable store through the [`MessageStore`] trait:
//! append one row per logical message, range-query by creation time. The
//! production implementation is Postgres; tests use [`MemoryStore`].

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgMessageStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{Message, StoredMessage};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations
#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "database error: {}", e),
            StoreError::Unavailable(msg) => write!(f, "store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            StoreError::Unavailable(_) => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e)
    }
}

/// Durable message store consumed by the relay.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Record one message. The store assigns the creation timestamp.
    async fn append(&self, message: &Message) -> StoreResult<()>;

    /// All messages with creation time in the inclusive `[from, to]` range,
    /// newest first. An empty range yields an empty vec, not an error.
    async fn query(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<StoredMessage>>;

    /// Whether any message has been recorded for the given producer session.
    async fn session_exists(&self, session_id: &str) -> StoreResult<bool>;
}
