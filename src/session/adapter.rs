use std::sync::Arc;

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::spawn;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::hub::Room;
use crate::transport::message::{ClientMessage, ServerMessage};
use crate::utils::error::HubError;

/// A line the way it is committed to history: prefixed with its author.
pub(crate) fn chat_line(username: &str, line: &str) -> String {
    format!("{username}: {line}")
}

/// Drives one connection for its whole lifetime.
///
/// The first frame must claim a username; everything after that is chat.
/// Updates from the room are forwarded as JSON text frames. The
/// registration is released exactly once on the way out, whatever ended
/// the connection.
pub async fn run_session(room: Arc<Room>, ws_stream: WebSocketStream<TcpStream>, conn_id: String) {
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let username = match await_join(&mut ws_receiver).await {
        Some(name) => name,
        None => {
            debug!(%conn_id, "connection closed before joining");
            return;
        }
    };

    let mut handle = match room.subscribe(&username).await {
        Ok(handle) => handle,
        Err(err @ HubError::DuplicateSubscription(_)) => {
            warn!(%conn_id, %username, "rejecting connection: {err}");
            let rejection = ServerMessage::Error {
                message: err.to_string(),
            };
            if let Ok(text) = serde_json::to_string(&rejection) {
                let _ = ws_sender.send(WsMessage::text(text)).await;
            }
            let _ = ws_sender.send(WsMessage::Close(None)).await;
            return;
        }
        Err(err) => {
            warn!(%conn_id, %username, "subscribe failed: {err}");
            return;
        }
    };

    info!(%conn_id, %username, "joined");

    // Forward room updates to the socket.
    let forward_conn_id = conn_id.clone();
    spawn(async move {
        while let Some(msg) = handle.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(conn_id = %forward_conn_id, "failed to serialize update: {e}");
                    continue;
                }
            };
            if let Err(e) = ws_sender.send(WsMessage::text(text)).await {
                debug!(conn_id = %forward_conn_id, "send loop closed: {e}");
                return;
            }
        }
        // recv() returned None: the hub evicted us. Start the close
        // handshake so the read loop below winds down too.
        debug!(conn_id = %forward_conn_id, "delivery handle closed by hub");
        let _ = ws_sender.send(WsMessage::Close(None)).await;
    });

    // Handle incoming frames from the client.
    while let Some(Ok(msg)) = ws_receiver.next().await {
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else { continue };
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Chat { line }) => {
                if let Err(err) = room.publish(chat_line(&username, &line)).await {
                    warn!(%conn_id, %username, "line dropped: {err}");
                }
            }
            Ok(ClientMessage::Join { .. }) => {
                debug!(%conn_id, %username, "ignoring join on an established session");
            }
            Err(err) => {
                warn!(%conn_id, "invalid client message: {err} | {text}");
            }
        }
    }

    info!(%conn_id, %username, "disconnected");
    room.unsubscribe(&username);
}

/// Waits for the frame that claims this connection's username.
///
/// Frames that are not a valid join are dropped with a warning; `None`
/// means the peer went away (or claimed a blank name) and the session
/// never started.
async fn await_join(ws_receiver: &mut SplitStream<WebSocketStream<TcpStream>>) -> Option<String> {
    while let Some(Ok(msg)) = ws_receiver.next().await {
        if !msg.is_text() {
            continue;
        }
        let Ok(text) = msg.to_text() else { continue };
        match serde_json::from_str::<ClientMessage>(text) {
            Ok(ClientMessage::Join { username }) => {
                let username = username.trim();
                if username.is_empty() {
                    warn!("rejecting join with empty username");
                    return None;
                }
                return Some(username.to_string());
            }
            Ok(ClientMessage::Chat { .. }) => {
                warn!("chat before join, dropping frame");
            }
            Err(err) => {
                warn!("invalid client message: {err} | {text}");
            }
        }
    }
    None
}
