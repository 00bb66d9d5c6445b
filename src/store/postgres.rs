//! Postgres-backed message store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{MessageStore, StoreResult};
use crate::config::DbConfig;
use crate::types::{Message, StoredMessage};

// Queries as constants to keep the SQL in one place
const INSERT_MESSAGE: &str = "\
    INSERT INTO relay_messages (session_id, name, amount, message, description) \
    VALUES ($1, $2, $3, $4, $5)";

const SELECT_MESSAGES: &str = "\
    SELECT session_id, name, amount, message, description, created_at \
    FROM relay_messages \
    WHERE created_at >= $1 AND created_at <= $2 \
    ORDER BY created_at DESC";

const COUNT_SESSION: &str = "SELECT COUNT(*) FROM relay_messages WHERE session_id = $1";

/// Message store backed by a Postgres connection pool.
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    /// Connect and verify the database is reachable. An unreachable database
    /// is a startup failure, not something to retry at request time.
    pub async fn connect(config: &DbConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_conns)
            .min_connections(config.min_conns)
            .max_lifetime(config.max_conn_lifetime)
            .idle_timeout(config.max_conn_idle_time)
            .connect(&config.url)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        info!(
            "[Store] connected to database, pool size: {}",
            config.max_conns
        );

        Ok(Self { pool })
    }

    /// Close the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("[Store] database connection pool closed");
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn append(&self, message: &Message) -> StoreResult<()> {
        sqlx::query(INSERT_MESSAGE)
            .bind(&message.session_id)
            .bind(&message.name)
            .bind(message.amount)
            .bind(&message.message)
            .bind(&message.description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn query(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<StoredMessage>> {
        let rows = sqlx::query_as::<_, StoredMessage>(SELECT_MESSAGES)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn session_exists(&self, session_id: &str) -> StoreResult<bool> {
        let (count,): (i64,) = sqlx::query_as(COUNT_SESSION)
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }
}
