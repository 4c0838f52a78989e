//! The `error` module defines the error types surfaced by the hub.
//!
//! None of these is fatal to the room itself: a duplicate subscription is
//! rejected without touching existing state, and a saturated queue only
//! means one line was not accepted within the configured wait. A failure
//! in one subscriber's session never propagates into another's.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    /// The username already has an active registration. Callers should
    /// reject the new connection rather than retry.
    #[error("\"{0}\" is already subscribed")]
    DuplicateSubscription(String),

    /// The queue did not accept the line within its bounded wait.
    #[error("queue saturated")]
    QueueSaturated,
}
