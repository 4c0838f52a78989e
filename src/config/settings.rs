use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for both the server and the chat room.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub room: RoomSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the WebSocket server will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Configuration settings for the chat room.
///
/// Controls the queue capacities and the bounded waits the hub applies
/// when queues fill up.
#[derive(Debug, Deserialize, Clone)]
pub struct RoomSettings {
    /// Line seeded into the history when the room opens.
    pub welcome_line: String,
    /// Capacity of the shared inbound queue all published lines pass through.
    pub inbound_capacity: usize,
    /// Capacity of each subscriber's delivery queue.
    pub handle_capacity: usize,
    /// How long a delivery may wait on one subscriber's full queue before
    /// that subscriber is evicted.
    pub delivery_timeout_ms: u64,
    /// How long a publisher may wait on a full inbound queue before the
    /// line is refused.
    pub publish_timeout_ms: u64,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub room: Option<PartialRoomSettings>,
}

/// Partial server settings.
///
/// Used when loading server configuration from external sources with optional values.
#[derive(Debug, Deserialize)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Partial room settings.
///
/// Used for room configuration from external sources with optional values.
#[derive(Debug, Deserialize)]
pub struct PartialRoomSettings {
    pub welcome_line: Option<String>,
    pub inbound_capacity: Option<usize>,
    pub handle_capacity: Option<usize>,
    pub delivery_timeout_ms: Option<u64>,
    pub publish_timeout_ms: Option<u64>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            room: RoomSettings {
                welcome_line: "Welcome!".to_string(),
                inbound_capacity: 1024,
                handle_capacity: 1024,
                delivery_timeout_ms: 1_000,
                publish_timeout_ms: 5_000,
            },
        }
    }
}
