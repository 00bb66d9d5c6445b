//! Per-connection keepalive supervisor
//!
//! One supervisor task runs per live connection, independent of the hub's
//! coordination loop. It emits periodic ping probes, drains inbound frames,
//! and enforces the read deadline. The three activities are select branches
//! of the same loop, so a slow read can never starve the ping timer.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws;
use futures::{Stream, StreamExt};
use log::debug;
use tokio::time::{interval_at, sleep_until, Instant};

use super::connection::Connection;

/// Timing parameters for the keepalive supervisor.
#[derive(Debug, Clone)]
pub struct KeepaliveConfig {
    /// How often a ping probe is emitted
    pub ping_interval: Duration,
    /// Deadline for any single write, ping or fan-out
    pub write_deadline: Duration,
    /// How long a connection may stay silent before it is presumed dead.
    /// Renewed whenever the peer shows any sign of life.
    pub read_window: Duration,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            write_deadline: Duration::from_secs(10),
            read_window: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Why the supervisor loop ended. Every variant drives the connection to
/// `Closing`; the caller performs the (idempotent) unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer sent a close frame or ended the stream
    RemoteClosed,
    /// An inbound read failed
    ReadError,
    /// The read window elapsed without any inbound frame
    ReadDeadlineExpired,
    /// A ping probe could not be delivered
    HeartbeatFailed,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::RemoteClosed => write!(f, "remote closed"),
            CloseReason::ReadError => write!(f, "read error"),
            CloseReason::ReadDeadlineExpired => write!(f, "read deadline expired"),
            CloseReason::HeartbeatFailed => write!(f, "heartbeat send failed"),
        }
    }
}

/// Supervise one connection until it fails or the peer leaves.
///
/// Drives the connection to `Closing` before returning. The read half is
/// owned by this task; the write half is reached through the connection's
/// writer mutex, shared with the hub's fan-out.
pub async fn run<S>(conn: &Arc<Connection>, mut reader: S, config: &KeepaliveConfig) -> CloseReason
where
    S: Stream<Item = Result<ws::Message, axum::Error>> + Unpin,
{
    let mut ping = interval_at(Instant::now() + config.ping_interval, config.ping_interval);
    let mut read_deadline = Instant::now() + config.read_window;

    let reason = loop {
        tokio::select! {
            _ = ping.tick() => {
                if let Err(e) = conn.send_ping().await {
                    debug!("[Keepalive] ping to client {} failed: {}", conn.id(), e);
                    break CloseReason::HeartbeatFailed;
                }
            }

            frame = reader.next() => {
                match frame {
                    // Any inbound frame proves the peer is alive; pings and
                    // pongs are the expected heartbeat traffic.
                    Some(Ok(ws::Message::Close(_))) | None => break CloseReason::RemoteClosed,
                    Some(Ok(_)) => {
                        read_deadline = Instant::now() + config.read_window;
                    }
                    Some(Err(e)) => {
                        debug!("[Keepalive] read from client {} failed: {}", conn.id(), e);
                        break CloseReason::ReadError;
                    }
                }
            }

            _ = sleep_until(read_deadline) => {
                break CloseReason::ReadDeadlineExpired;
            }
        }
    };

    conn.begin_close();
    reason
}
