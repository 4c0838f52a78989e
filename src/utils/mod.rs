//! The `utils` module provides common definitions used across the
//! `chathub` application: the error taxonomy and logging setup.

pub mod error;
pub mod logging;
