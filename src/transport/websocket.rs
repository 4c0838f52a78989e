use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tracing::{error, info};

use crate::hub::Room;
use crate::session;

/// Accepts WebSocket connections on `addr` and runs a session adapter for
/// each, all sharing the same room.
pub async fn start_websocket_server(addr: &str, room: Arc<Room>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;

    info!("WebSocket server listening on ws://{addr}");

    loop {
        let (stream, peer) = listener.accept().await?;
        let room = Arc::clone(&room);
        let conn_id = format!("conn-{}", uuid::Uuid::new_v4());

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!(%conn_id, %peer, "WebSocket handshake error: {e}");
                    return;
                }
            };
            session::run_session(room, ws_stream, conn_id).await;
        });
    }
}
