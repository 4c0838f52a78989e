mod settings;

use crate::config::settings::PartialSettings;
use config::{Config, ConfigError, Environment, File};

pub use settings::{RoomSettings, ServerSettings, Settings};


/// Loads the configuration from the default file and environment variables.
///
/// Environment keys use a double-underscore separator (`SERVER__PORT`,
/// `ROOM__WELCOME_LINE`). Whatever is found is merged over the built-in
/// defaults, so a partial configuration is always enough.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(Environment::default().separator("__"));

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    // Merge with defaults
    let default = Settings::default();

    Ok(Settings {
        server: ServerSettings {
            host: partial
                .server
                .as_ref()
                .and_then(|s| s.host.clone())
                .unwrap_or(default.server.host),
            port: partial
                .server
                .as_ref()
                .and_then(|s| s.port)
                .unwrap_or(default.server.port),
        },
        room: RoomSettings {
            welcome_line: partial
                .room
                .as_ref()
                .and_then(|r| r.welcome_line.clone())
                .unwrap_or(default.room.welcome_line),
            inbound_capacity: partial
                .room
                .as_ref()
                .and_then(|r| r.inbound_capacity)
                .unwrap_or(default.room.inbound_capacity),
            handle_capacity: partial
                .room
                .as_ref()
                .and_then(|r| r.handle_capacity)
                .unwrap_or(default.room.handle_capacity),
            delivery_timeout_ms: partial
                .room
                .as_ref()
                .and_then(|r| r.delivery_timeout_ms)
                .unwrap_or(default.room.delivery_timeout_ms),
            publish_timeout_ms: partial
                .room
                .as_ref()
                .and_then(|r| r.publish_timeout_ms)
                .unwrap_or(default.room.publish_timeout_ms),
        },
    })
}
