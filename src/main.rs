use std::sync::Arc;

use tracing::{error, info};

use chathub::config::load_config;
use chathub::hub::Room;
use chathub::transport::websocket::start_websocket_server;
use chathub::utils::logging;

#[tokio::main]
async fn main() {
    // A missing .env file is fine; anything else is worth a warning.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: failed to load .env file: {e}");
        }
    }
    logging::init("info");

    if let Err(e) = run_server().await {
        error!("Server failed: {e}");
        std::process::exit(1);
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let room = Room::open(&config.room);

    tokio::select! {
        res = start_websocket_server(&addr, Arc::clone(&room)) => {
            res?;
            error!("WebSocket server exited unexpectedly.");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    Ok(())
}
