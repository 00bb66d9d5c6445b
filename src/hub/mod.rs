//! Connection registry and broadcast engine
//!
//! The hub is the single coordination point of the relay. One task owns the
//! registry of live connections and drains a command channel, so
//! registration, unregistration, and fan-out are processed one at a time in
//! arrival order: fan-out can never iterate a half-updated registry and a
//! connection is never written to after it was removed.
//!
//! Everything else talks to the hub through a cloneable [`HubHandle`].

pub mod connection;
pub mod keepalive;
#[cfg(test)]
pub(crate) mod testutil;

pub use connection::{Connection, ConnectionId, ConnectionState, SendError};
pub use keepalive::{CloseReason, KeepaliveConfig};

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use log::{debug, error, info, warn};
use tokio::sync::{mpsc, oneshot};

use crate::store::MessageStore;
use crate::types::Message;

/// Commands accepted by the hub's coordination loop.
enum Command {
    Register(Arc<Connection>),
    Unregister(ConnectionId),
    Broadcast(Message),
    Count(oneshot::Sender<usize>),
    Shutdown(oneshot::Sender<()>),
}

/// The coordinating loop: owns the registry, serializes all mutation.
pub struct Hub {
    connections: HashMap<ConnectionId, Arc<Connection>>,
    store: Arc<dyn MessageStore>,
    rx: mpsc::Receiver<Command>,
}

/// Handle for submitting work to a running hub. Cheap to clone; store one in
/// the application state.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<Command>,
}

impl Hub {
    /// Start the hub on its own task and return the handle to it.
    ///
    /// The store is invoked exactly once per broadcast message, regardless
    /// of how many listeners the message was delivered to.
    pub fn spawn(store: Arc<dyn MessageStore>) -> HubHandle {
        let (tx, rx) = mpsc::channel(64);
        let hub = Hub {
            connections: HashMap::new(),
            store,
            rx,
        };
        tokio::spawn(hub.run());
        HubHandle { tx }
    }

    async fn run(mut self) {
        while let Some(cmd) = self.rx.recv().await {
            match cmd {
                Command::Register(conn) => {
                    let id = conn.id();
                    self.connections.insert(id, conn);
                    info!(
                        "[Hub] client {} connected, total clients: {}",
                        id,
                        self.connections.len()
                    );
                }
                Command::Unregister(id) => {
                    // Idempotent: the broadcast path may already have
                    // removed a failed connection.
                    if let Some(conn) = self.connections.remove(&id) {
                        conn.close().await;
                        info!(
                            "[Hub] client {} disconnected, total clients: {}",
                            id,
                            self.connections.len()
                        );
                    }
                }
                Command::Broadcast(message) => self.handle_broadcast(message).await,
                Command::Count(reply) => {
                    let _ = reply.send(self.connections.len());
                }
                Command::Shutdown(ack) => {
                    for (_, conn) in self.connections.drain() {
                        conn.close().await;
                    }
                    let _ = ack.send(());
                    break;
                }
            }
        }
        debug!("[Hub] coordination loop stopped");
    }

    async fn handle_broadcast(&mut self, message: Message) {
        let payload = match serde_json::to_string(&message) {
            Ok(payload) => payload,
            Err(e) => {
                error!("[Hub] failed to encode message: {}", e);
                return;
            }
        };

        // Deliveries within one broadcast run concurrently and are
        // independent: one failing write must not hold up the rest.
        let deliveries: Vec<_> = self
            .connections
            .values()
            .map(|conn| {
                let conn = Arc::clone(conn);
                let payload = payload.clone();
                async move { (conn.id(), conn.send_text(payload).await) }
            })
            .collect();

        for (id, result) in join_all(deliveries).await {
            if let Err(e) = result {
                warn!("[Hub] write to client {} failed, dropping: {}", id, e);
                if let Some(conn) = self.connections.remove(&id) {
                    conn.begin_close();
                    conn.close().await;
                }
            }
        }

        // One durable row per logical message. Delivery and persistence are
        // independent effects: an append failure is reported but never
        // unregisters anyone.
        if let Err(e) = self.store.append(&message).await {
            error!("[Hub] failed to persist message: {}", e);
        }
    }
}

impl HubHandle {
    /// Add a connection to the live set.
    pub async fn register(&self, conn: Arc<Connection>) {
        self.send(Command::Register(conn)).await;
    }

    /// Remove a connection if present and close its transport. Unregistering
    /// an absent connection is a no-op.
    pub async fn unregister(&self, id: ConnectionId) {
        self.send(Command::Unregister(id)).await;
    }

    /// Deliver a message to every currently-registered connection and record
    /// it durably.
    pub async fn broadcast(&self, message: Message) {
        self.send(Command::Broadcast(message)).await;
    }

    /// Current registry membership count. Commands are processed in order,
    /// so the answer reflects every command submitted before this one.
    pub async fn connection_count(&self) -> usize {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Count(reply)).await;
        rx.await.unwrap_or(0)
    }

    /// Close every connection, drain the registry, and stop the loop.
    pub async fn shutdown(&self) {
        let (ack, rx) = oneshot::channel();
        self.send(Command::Shutdown(ack)).await;
        let _ = rx.await;
    }

    async fn send(&self, cmd: Command) {
        if self.tx.send(cmd).await.is_err() {
            warn!("[Hub] engine is not running, command dropped");
        }
    }
}
