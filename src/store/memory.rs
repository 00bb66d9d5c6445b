//! In-memory message store
//!
//! Keeps rows in a Vec behind a mutex. Used by the test suite; also handy
//! for running the relay without a database.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{MessageStore, StoreError, StoreResult};
use crate::types::{Message, StoredMessage};

/// Message store backed by process memory.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<StoredMessage>>,
    fail_appends: AtomicBool,
    append_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent append fail, to exercise persistence-error
    /// paths.
    pub fn fail_appends(&self, fail: bool) {
        self.fail_appends.store(fail, Ordering::SeqCst);
    }

    /// How many times `append` was invoked, successful or not.
    pub fn append_count(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    /// Number of stored rows.
    pub fn len(&self) -> usize {
        self.rows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Insert a row with an explicit creation time, for range-query tests.
    pub fn insert_at(&self, message: Message, created_at: DateTime<Utc>) {
        self.rows.lock().push(StoredMessage {
            session_id: message.session_id,
            name: message.name,
            amount: message.amount,
            message: message.message,
            description: message.description,
            created_at,
        });
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append(&self, message: &Message) -> StoreResult<()> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("append failure injected".to_string()));
        }
        self.insert_at(message.clone(), Utc::now());
        Ok(())
    }

    async fn query(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<StoredMessage>> {
        let mut rows: Vec<StoredMessage> = self
            .rows
            .lock()
            .iter()
            .filter(|row| row.created_at >= from && row.created_at <= to)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn session_exists(&self, session_id: &str) -> StoreResult<bool> {
        Ok(self
            .rows
            .lock()
            .iter()
            .any(|row| row.session_id == session_id))
    }
}
