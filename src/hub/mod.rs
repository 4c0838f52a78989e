//! The `hub` module contains the broadcast hub at the heart of the server.
//!
//! A single [`Room`] owns the message history and the set of subscribed
//! users, serializes every mutation, and pushes a fresh snapshot to each
//! subscriber whenever the history grows.

pub mod message;
pub mod room;

pub use room::{DeliveryHandle, Room};

#[cfg(test)]
mod tests;
