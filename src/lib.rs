//! # ChatHub
//!
//! `chathub` is a minimalist, in-memory chat room server built with Rust.
//! It keeps a single shared room whose line-oriented history fans out to
//! every connected subscriber over WebSockets.
//!
//! ## Core Modules
//!
//! The library is structured into several modules, each with a distinct responsibility:
//!
//! - `hub`: the broadcast hub that owns room state (history, subscribers) and serializes every update.
//! - `session`: bridges one accepted connection to exactly one room registration.
//! - `config`: handles loading and merging server configuration.
//! - `transport`: the WebSocket server and the wire protocol spoken with clients.
//! - `utils`: shared utilities, such as error types and logging setup.

pub mod config;
pub mod hub;
pub mod session;
pub mod transport;
pub mod utils;
