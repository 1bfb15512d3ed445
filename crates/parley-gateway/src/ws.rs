// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket channel for live viewers.
//!
//! Server -> Client (JSON): every viewer event, e.g.
//! ```json
//! {"type": "message", "from": "91999", "subType": "chat", "content": "hi", ...}
//! {"type": "message_deleted", "from": "91999", "id": "..."}
//! {"type": "error", "message": "..."}
//! ```
//!
//! Client -> Server (JSON):
//! ```json
//! {"type": "send", "to": "91999", "text": "on my way"}
//! ```

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use parley_core::jid::normalize_jid;
use serde::Deserialize;
use tokio::sync::{broadcast::error::RecvError, mpsc};

use crate::server::GatewayState;

/// Handshake query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Command sent by a viewer.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand {
    Send { to: String, text: String },
}

/// WebSocket upgrade handler.
///
/// Rejects the handshake unless `token` matches the gateway bearer token.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<GatewayState>,
) -> Response {
    if !state.auth.accepts(query.token.as_deref()) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

fn error_frame(message: &str) -> String {
    serde_json::json!({ "type": "error", "message": message }).to_string()
}

/// Handle an individual viewer connection.
///
/// A sender task forwards viewer events and direct replies to the socket;
/// the receive loop runs commands.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut events = state.agent.fanout().subscribe();
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let sender_task = tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to encode viewer event");
                            continue;
                        }
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "viewer fell behind, events dropped");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
                reply = rx.recv() => match reply {
                    Some(frame) => frame,
                    None => break,
                },
            };
            if ws_sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => {
                let command: WsCommand = match serde_json::from_str(&text) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!("invalid WebSocket message: {e}");
                        let _ = tx.send(error_frame("invalid command")).await;
                        continue;
                    }
                };
                run_command(&state, command, tx.clone());
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    sender_task.abort();
}

/// Runs a command on its own task so a slow rewrite never blocks the socket.
fn run_command(state: &GatewayState, command: WsCommand, replies: mpsc::Sender<String>) {
    match command {
        WsCommand::Send { to, text } => {
            let dispatcher = state.agent.dispatcher.clone();
            tokio::spawn(async move {
                let conversation = normalize_jid(&to);
                if conversation.is_empty() || text.trim().is_empty() {
                    let _ = replies.send(error_frame("send needs `to` and `text`")).await;
                    return;
                }
                if let Err(e) = dispatcher.send(&conversation, &text).await {
                    tracing::warn!(conversation = %conversation, error = %e, "viewer send failed");
                    let _ = replies.send(error_frame(&e.to_string())).await;
                }
            });
        }
    }
}
