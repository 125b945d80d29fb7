use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;

use crate::api::auth::StreamSession;
use crate::auth::Session;
use crate::AppState;

/// GET /ws?token=...
pub async fn handler(
    State(state): State<AppState>,
    StreamSession(session): StreamSession,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, session: Session) {
    tracing::info!(user_id = %session.user_id, "Event stream client connected");

    let mut rx = state.notifier.subscribe();

    loop {
        tokio::select! {
            msg = rx.recv() => {
                match msg {
                    Ok(event) if !event.visible_to(&session) => {}
                    Ok(event) => match serde_json::to_string(&event) {
                        Ok(json) => {
                            if socket.send(Message::Text(json)).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize WsMessage");
                        }
                    },
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Event stream client lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            client_msg = socket.recv() => {
                match client_msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    tracing::info!(user_id = %session.user_id, "Event stream client disconnected");
}
