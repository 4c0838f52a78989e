//! The `session` module bridges one accepted connection to exactly one
//! room registration.
//!
//! A session claims a username, forwards the user's chat lines into the
//! hub, streams the hub's updates back out, and releases its registration
//! once on the way out, whatever ended the connection.

pub mod adapter;

pub use adapter::run_session;

#[cfg(test)]
mod tests;
