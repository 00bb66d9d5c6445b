//! Message value types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message submitted by a producer and relayed to all live listeners.
///
/// Immutable once constructed. The creation timestamp is assigned by the
/// persistence layer on append, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Correlates a batch of messages from one producer session
    #[serde(default)]
    pub session_id: String,

    /// Display name of the sender
    pub name: String,

    /// Numeric amount attached to the message
    pub amount: f64,

    /// Body text; an empty body is rejected at ingress
    pub message: String,

    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Message {
    /// Whether the message passes ingress validation
    pub fn is_valid(&self) -> bool {
        !self.message.is_empty()
    }
}

/// A persisted message as returned by range queries.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StoredMessage {
    #[serde(default)]
    pub session_id: String,
    pub name: String,
    pub amount: f64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Assigned by the store when the message was appended
    pub created_at: DateTime<Utc>,
}
