//! Live catalog feed over websockets.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::protocol::{ClientMessage, ServerMessage};
use super::AppState;
use crate::domain::Product;
use crate::notifier::{Snapshot, SubscriberId};

/// WebSocket upgrade handler.
pub(super) async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle a live connection: subscribe, forward snapshots, apply client events.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut ws_tx, ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Snapshot<Product>>(state.subscriber_buffer);

    // The initial catalog is queued before the id comes back.
    let subscriber_id = match state.gateway.subscribe(tx).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "Could not subscribe live client");
            return;
        }
    };
    info!(%subscriber_id, "Live client connected");

    let send_task = tokio::spawn(async move {
        while let Some(products) = rx.recv().await {
            let text = match serde_json::to_string(&ServerMessage::Products { products: &products }) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Failed to encode catalog");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    serve_client_frames(&state, subscriber_id, ws_rx).await;
    send_task.abort();

    info!(%subscriber_id, "Live client disconnected");
}

/// Applies client frames until the connection closes, then unsubscribes.
async fn serve_client_frames<S>(state: &AppState, subscriber_id: SubscriberId, mut frames: S)
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(msg) = frames.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                handle_client_frame(state, subscriber_id, serde_json::from_str(text.as_str())).await
            }
            Ok(Message::Binary(data)) => handle_client_frame(state, subscriber_id, serde_json::from_slice(&data)).await,
            Ok(Message::Close(_)) => break,
            // ping/pong are answered by axum
            Ok(_) => {}
            Err(e) => {
                warn!(%subscriber_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    if let Err(e) = state.gateway.unsubscribe(subscriber_id).await {
        debug!(%subscriber_id, error = %e, "Unsubscribe after disconnect failed");
    }
}

/// Live events get no reply; undecodable frames are only logged.
async fn handle_client_frame(
    state: &AppState,
    subscriber_id: SubscriberId,
    decoded: Result<ClientMessage, serde_json::Error>,
) {
    match decoded {
        Ok(msg) => {
            debug!(%subscriber_id, ?msg, "Live event received");
            state.gateway.submit(msg.into()).await;
        }
        Err(e) => warn!(%subscriber_id, error = %e, "Ignoring malformed live event"),
    }
}
