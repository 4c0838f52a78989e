use serde::{Deserialize, Serialize};

/// An update pushed by the hub onto a subscriber's delivery handle.
///
/// The hub is the sole producer of these values and the set of cases is
/// fixed, so this is a closed enum rather than a trait. On the wire each
/// case becomes a tag-discriminated JSON object.
///
/// # Example
///
/// ```rust
/// use chathub::hub::message::Message;
///
/// let msg = Message::ChatSnapshot {
///     text: "Welcome!\nalice has joined".to_string(),
/// };
/// assert_eq!(
///     serde_json::to_string(&msg).unwrap(),
///     r#"{"type":"chat_snapshot","text":"Welcome!\nalice has joined"}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// The full joined history, replacing whatever the subscriber
    /// previously displayed.
    ChatSnapshot { text: String },

    /// The current roster. Ordering carries no meaning.
    UserListUpdate { usernames: Vec<String> },
}
