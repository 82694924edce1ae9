use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info};

use crate::api::state::AppState;
use crate::api::types::WsMessage;
use crate::domain::LiveLeaderboard;

/// WebSocket handler -- pushes the full leaderboard on connect and on every
/// committed refresh.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

fn encode(board: &LiveLeaderboard) -> Option<String> {
    let msg = WsMessage::Leaderboard {
        updated_at: board.updated_at,
        data: board.entries.clone(),
    };
    match serde_json::to_string(&msg) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("Failed to serialize WebSocket message: {}", e);
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before reading the current board so no commit slips between.
    let mut rx = state.live.subscribe();
    let current = state.live.leaderboard().await;

    let send_task = tokio::spawn(async move {
        if let Some(json) = encode(&current) {
            if sender.send(Message::Text(json)).await.is_err() {
                return;
            }
        }

        loop {
            let board = match rx.recv().await {
                Ok(board) => board,
                Err(RecvError::Lagged(n)) => {
                    debug!("WebSocket subscriber lagged {} updates", n);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let Some(json) = encode(&board) else {
                continue;
            };
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages (ping/pong) in the main task
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    // Abort the send task when connection closes
    send_task.abort();

    info!("WebSocket connection closed");
}
