//! Test doubles for connections: channel-backed and never-ready sinks.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::extract::ws;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::Sink;

use super::connection::Connection;

const TEST_WRITE_DEADLINE: Duration = Duration::from_secs(10);

/// A connection whose frames land in an in-memory channel. Dropping the
/// receiver makes every subsequent write fail, which is how tests simulate a
/// vanished peer.
pub(crate) fn channel_connection() -> (Arc<Connection>, UnboundedReceiver<ws::Message>) {
    let (tx, rx) = mpsc::unbounded();
    let conn = Arc::new(Connection::new(ChannelSink(tx), TEST_WRITE_DEADLINE));
    (conn, rx)
}

/// Channel-backed sink that keeps reporting errors (instead of panicking like
/// `sink_map_err` does) when polled again after the receiver is gone.
struct ChannelSink(UnboundedSender<ws::Message>);

impl Sink<ws::Message> for ChannelSink {
    type Error = axum::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.0.is_closed() {
            Poll::Ready(Err(axum::Error::new("receiver dropped")))
        } else {
            Poll::Ready(Ok(()))
        }
    }

    fn start_send(self: Pin<&mut Self>, item: ws::Message) -> Result<(), Self::Error> {
        self.0
            .unbounded_send(item)
            .map_err(|e| axum::Error::new(e.into_send_error()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.0.close_channel();
        Poll::Ready(Ok(()))
    }
}

/// A connection whose transport never accepts a frame, for deadline tests.
pub(crate) fn pending_connection() -> Arc<Connection> {
    Arc::new(Connection::new(PendingSink, TEST_WRITE_DEADLINE))
}

struct PendingSink;

impl Sink<ws::Message> for PendingSink {
    type Error = axum::Error;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Pending
    }

    fn start_send(self: Pin<&mut Self>, _item: ws::Message) -> Result<(), Self::Error> {
        Ok(())
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Pending
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}
