//! Core data structures for the relay

mod message;

pub use message::{Message, StoredMessage};
