//! Connection lifecycle and per-connection write serialization
//!
//! A `Connection` owns the write half of one listener's WebSocket. Both
//! writers that target it (the hub during fan-out, the keepalive supervisor
//! during ping emission) go through the same async mutex, so their frames
//! never interleave on the wire.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::extract::ws;
use futures::{Sink, SinkExt};
use tokio::time::timeout;

/// Unique identity of a live connection within the hub registry.
pub type ConnectionId = u64;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Write half of a WebSocket, type-erased so tests can substitute a
/// channel-backed sink.
type BoxedSink = Box<dyn Sink<ws::Message, Error = axum::Error> + Send + Unpin>;

/// Lifecycle of a connection. Transitions only move forward; `Closed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Upgrade handshake in progress, not yet registered
    Connecting,
    /// Registered, read and write both possible
    Active,
    /// A failure was detected locally; transport close requested
    Closing,
    /// Removed from the registry, transport released
    Closed,
}

/// One live listener's transport session.
pub struct Connection {
    id: ConnectionId,
    writer: tokio::sync::Mutex<BoxedSink>,
    state: parking_lot::Mutex<ConnectionState>,
    write_deadline: Duration,
}

/// Error writing a frame to a connection. Any variant is terminal for the
/// connection it occurred on.
#[derive(Debug)]
pub enum SendError {
    /// The connection already left the `Active` state
    Closed,
    /// The write did not complete within the deadline
    Timeout,
    /// The transport reported an error
    Transport(axum::Error),
}

impl std::fmt::Display for SendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendError::Closed => write!(f, "connection is closed"),
            SendError::Timeout => write!(f, "write deadline exceeded"),
            SendError::Transport(e) => write!(f, "transport error: {}", e),
        }
    }
}

impl std::error::Error for SendError {}

impl Connection {
    /// Wrap the write half of an accepted WebSocket. The connection starts
    /// in `Connecting`; call [`mark_active`](Self::mark_active) once the
    /// handshake is complete.
    pub fn new<S>(sink: S, write_deadline: Duration) -> Self
    where
        S: Sink<ws::Message, Error = axum::Error> + Send + Unpin + 'static,
    {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            writer: tokio::sync::Mutex::new(Box::new(sink)),
            state: parking_lot::Mutex::new(ConnectionState::Connecting),
            write_deadline,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Handshake succeeded; the connection may now be registered.
    pub fn mark_active(&self) {
        let mut state = self.state.lock();
        if *state == ConnectionState::Connecting {
            *state = ConnectionState::Active;
        }
    }

    /// Request the transition to `Closing`. Returns `true` for the first
    /// caller only, so a connection racing into `Closing` from a read
    /// failure and a write failure still terminates exactly once.
    pub fn begin_close(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            ConnectionState::Connecting | ConnectionState::Active => {
                *state = ConnectionState::Closing;
                true
            }
            ConnectionState::Closing | ConnectionState::Closed => false,
        }
    }

    /// Close the transport and enter the terminal state. Idempotent: closing
    /// an already-closed connection is a no-op.
    pub async fn close(&self) {
        {
            let mut state = self.state.lock();
            if *state == ConnectionState::Closed {
                return;
            }
            *state = ConnectionState::Closed;
        }
        let mut writer = self.writer.lock().await;
        // Best effort; the peer may already be gone.
        let _ = timeout(self.write_deadline, writer.send(ws::Message::Close(None))).await;
    }

    /// Deliver a text frame under the write deadline.
    pub async fn send_text(&self, text: String) -> Result<(), SendError> {
        self.send(ws::Message::Text(text)).await
    }

    /// Emit a heartbeat probe under the write deadline.
    pub async fn send_ping(&self) -> Result<(), SendError> {
        self.send(ws::Message::Ping(Vec::new())).await
    }

    async fn send(&self, frame: ws::Message) -> Result<(), SendError> {
        if self.state() != ConnectionState::Active {
            return Err(SendError::Closed);
        }
        let mut writer = self.writer.lock().await;
        match timeout(self.write_deadline, writer.send(frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SendError::Transport(e)),
            Err(_) => Err(SendError::Timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{channel_connection, pending_connection};
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_new_connection_starts_connecting() {
        let (conn, _rx) = channel_connection();
        assert_eq!(conn.state(), ConnectionState::Connecting);
        conn.mark_active();
        assert_eq!(conn.state(), ConnectionState::Active);
    }

    #[tokio::test]
    async fn test_begin_close_first_caller_wins() {
        let (conn, _rx) = channel_connection();
        conn.mark_active();
        assert!(conn.begin_close());
        assert!(!conn.begin_close());
        assert_eq!(conn.state(), ConnectionState::Closing);
    }

    #[tokio::test]
    async fn test_send_text_delivers_frame() {
        let (conn, mut rx) = channel_connection();
        conn.mark_active();
        conn.send_text("hello".to_string()).await.unwrap();

        match rx.next().await {
            Some(ws::Message::Text(text)) => assert_eq!(text, "hello"),
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_fails_after_close_requested() {
        let (conn, _rx) = channel_connection();
        conn.mark_active();
        conn.begin_close();

        let err = conn.send_text("late".to_string()).await.unwrap_err();
        assert!(matches!(err, SendError::Closed));
    }

    #[tokio::test]
    async fn test_send_fails_when_peer_is_gone() {
        let (conn, rx) = channel_connection();
        conn.mark_active();
        drop(rx);

        let err = conn.send_text("hi".to_string()).await.unwrap_err();
        assert!(matches!(err, SendError::Transport(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_times_out_on_stuck_transport() {
        let conn = pending_connection();
        conn.mark_active();

        let err = conn.send_ping().await.unwrap_err();
        assert!(matches!(err, SendError::Timeout));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_terminal() {
        let (conn, _rx) = channel_connection();
        conn.mark_active();
        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Closed);
        conn.close().await;
        assert_eq!(conn.state(), ConnectionState::Closed);
        assert!(!conn.begin_close());
    }
}
