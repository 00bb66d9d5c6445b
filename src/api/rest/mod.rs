//! REST endpoints for the durable message history

pub mod messages;
