//! The `transport` module is responsible for handling network communication
//! with clients, primarily via WebSockets.
//!
//! It defines the frames clients send to the server, accepts connections,
//! and hands each accepted socket to a session adapter. Updates flowing the
//! other way are the hub's own [`Message`](crate::hub::message::Message)
//! values serialized as JSON text frames.

pub mod message;
pub mod websocket;
