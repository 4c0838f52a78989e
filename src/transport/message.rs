use serde::{Deserialize, Serialize};

/// Frames a client may send to the server.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First frame on every connection: claim a username.
    Join { username: String },

    /// One line of chat typed by the user.
    Chat { line: String },
}

/// Frames the server sends outside the normal update stream.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Error { message: String },
}
