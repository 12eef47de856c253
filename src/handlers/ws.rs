use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::jwt::authenticate_access_token;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Live feed of the caller's own journal events. Browsers cannot set
/// headers on the upgrade, so the access token comes as `?token=`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
) -> Response {
    let Some(token) = query.token.as_deref() else {
        tracing::warn!("WebSocket auth failed: missing token query parameter");
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };

    let user_id = match authenticate_access_token(token, &state.config) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "WebSocket auth failed");
            return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        }
    };

    let Some(rx) = state.ws_tx.as_ref().map(broadcast::Sender::subscribe) else {
        return (StatusCode::SERVICE_UNAVAILABLE, "Live updates disabled").into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, rx, user_id))
}

/// Events carry the owner's id; anything without one is not forwarded.
pub fn is_for_user(msg: &str, user_id: Uuid) -> bool {
    serde_json::from_str::<serde_json::Value>(msg)
        .ok()
        .and_then(|v| v.get("user_id")?.as_str()?.parse::<Uuid>().ok())
        == Some(user_id)
}

async fn handle_socket(socket: WebSocket, mut rx: broadcast::Receiver<String>, user_id: Uuid) {
    let (mut sender, mut receiver) = socket.split();

    tracing::debug!(user_id = %user_id, "WebSocket connection established");

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    if !is_for_user(&msg, user_id) {
                        continue;
                    }
                    if sender.send(Message::Text(msg)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(user_id = %user_id, skipped = skipped, "WebSocket client lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    // Client frames are only read to notice the close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::debug!(user_id = %user_id, "WebSocket connection closed");
}
