use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tracing::{debug, info};

use crate::api::ApiContext;

/// Upgrade to a live snapshot stream. Each tick is pushed to the client as
/// one JSON text frame; slow clients skip ticks rather than lag behind.
pub async fn ws_handler(ws: WebSocketUpgrade, State(context): State<ApiContext>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, context))
}

async fn handle_socket(socket: WebSocket, context: ApiContext) {
    let (mut sender, mut receiver) = socket.split();

    let (subscriber_id, mut updates) = context.engine.broadcaster().subscribe().await;
    info!(%subscriber_id, "live subscriber connected");

    // Seed the client with the current snapshot so it does not render an
    // empty view while waiting for the next tick.
    let initial = context.engine.snapshot().await;
    if let Ok(json) = serde_json::to_string(&initial) {
        if sender.send(Message::Text(json)).await.is_err() {
            context.engine.broadcaster().unsubscribe(subscriber_id).await;
            return;
        }
    }

    let send_task = tokio::spawn(async move {
        while let Some(snapshot) = updates.recv().await {
            match serde_json::to_string(&snapshot) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!("failed to encode snapshot: {}", e);
                }
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Close(_) => {
                    info!("live subscriber disconnected");
                    break;
                }
                Message::Ping(_) | Message::Pong(_) => {}
                _ => {
                    // The stream is push-only; client payloads are ignored.
                }
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    context.engine.broadcaster().unsubscribe(subscriber_id).await;
}
