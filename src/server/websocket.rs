//! WebSocket change feed.
//!
//! Every change event from the persistence adapter is pushed to connected
//! clients as a JSON text frame: `{"type": "lists", "data": [...]}`.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use super::state::AppState;
use grocer_core::{ChangeEvent, Persistence};

pub async fn ws_handler<P: Persistence + 'static>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<P>>,
) -> impl IntoResponse {
    // Subscribe before the upgrade so no event is missed in between.
    let rx = state.subscribe().await;
    ws.on_upgrade(move |socket| handle_socket(socket, rx))
}

async fn handle_socket(mut socket: WebSocket, mut rx: broadcast::Receiver<ChangeEvent>) {
    info!("WebSocket client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => match msg {
                Some(Ok(Message::Text(text))) => {
                    debug!("Received from client: {}", text.as_str());
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("Client closed connection");
                    break;
                }
                Some(Err(e)) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },

            update = rx.recv() => match update {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(j) => j,
                        Err(e) => {
                            error!("Failed to serialize update: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = socket.send(Message::Text(json.into())).await {
                        error!("Failed to send update: {}", e);
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket client fell behind the change feed");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    info!("WebSocket client disconnected");
}
