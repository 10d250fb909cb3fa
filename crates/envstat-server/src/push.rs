//! `/ws` push channel: streams relay log lines to one dashboard console.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};

use envstat_core::Subscription;

use crate::AppState;

/// First frame every client receives.
pub const CONNECTED_GREETING: &str = "✓ Serial Monitor connected";

pub(crate) async fn handle_ws(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| stream_logs(socket, state))
}

async fn stream_logs(mut socket: WebSocket, state: Arc<AppState>) {
    let Subscription { id, mut receiver } = state.relay.subscribe_seeded();
    log::info!("WebSocket client #{id} connected");

    if socket
        .send(Message::Text(CONNECTED_GREETING.into()))
        .await
        .is_ok()
    {
        loop {
            tokio::select! {
                line = receiver.recv() => match line {
                    Some(line) => {
                        if socket.send(Message::Text(line.into())).await.is_err() {
                            break;
                        }
                    }
                    // Relay dropped us for falling behind.
                    None => break,
                },
                incoming = socket.recv() => match incoming {
                    Some(Ok(Message::Text(text))) => {
                        log::debug!("WebSocket client #{id} sent: {}", text.as_str());
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
            }
        }
    }

    state.relay.unsubscribe(id);
    log::info!("WebSocket client #{id} disconnected");
}
