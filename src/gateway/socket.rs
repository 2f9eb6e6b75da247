use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::messages::{ClientEvent, ServerEvent};
use crate::error::GatewayError;
use crate::http::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Identity to attach to the session up front
    pub user_id: Option<String>,
}

/// GET /ws
/// Upgrade to the real-time event channel
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<ConnectParams>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params))
}

async fn handle_socket(socket: WebSocket, state: AppState, params: ConnectParams) {
    let gateway = state.gateway.clone();
    let (session, mut outbox) = gateway.connect(params.user_id).await;
    let session_id = session.id;
    let (mut sink, mut stream) = socket.split();

    // Outbox → wire. Ends when every sender is gone or the socket rejects a write.
    let writer = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to encode event: {}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    while let Some(frame) = stream.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!("Socket error for session {}: {}", session_id, e);
                break;
            }
        };

        match serde_json::from_str::<ClientEvent>(&text) {
            Ok(event) => gateway.dispatch(session_id, event).await,
            Err(e) => {
                let error = GatewayError::InvalidEvent(e.to_string());
                session.deliver(ServerEvent::error(error.code(), error.to_string()));
            }
        }
    }

    info!("{}", GatewayError::TransportDropped(session_id));
    gateway.disconnect(session_id).await;
    drop(session);
    writer.abort();
}
