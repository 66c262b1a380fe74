//! Room chat: lines relayed to everyone in the room under a per-room name

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use chess_rooms_core::sync::{ChatInput, ChatLine};

use super::socket::parse_socket_room_id;
use super::{session_from, ApiError};
use crate::{AppState, RoomHandle};

pub async fn chat_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(id) = parse_socket_room_id(&raw_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(session) = session_from(&headers) else {
        return ApiError::new(StatusCode::UNAUTHORIZED, "no session").into_response();
    };

    let handle = match state.room(id, true) {
        Ok(Some(handle)) => handle,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return ApiError::from(e).into_response(),
    };
    let user = match join(&state, &handle, &session) {
        Ok(user) => user,
        Err(e) => return ApiError::from(e).into_response(),
    };

    ws.on_upgrade(move |socket| relay(socket, handle, user))
}

/// Touches the room and resolves the session's chat name.
fn join(state: &AppState, handle: &RoomHandle, session: &str) -> chess_rooms_core::Result<String> {
    let mut room = handle.lock();
    room.touch();
    let mut db = state.db();
    db.touch_room(room.id())?;
    db.chat_user(room.id(), session)
}

async fn relay(socket: WebSocket, handle: Arc<RoomHandle>, user: String) {
    let (mut sender, mut receiver) = socket.split();
    let mut lines = handle.chat.subscribe();
    tracing::debug!(%user, "chat joined");

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(line) = chat_line(&user, &text) {
                        let _ = handle.chat.send(line);
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("chat socket error: {}", e);
                    break;
                }
            },
            line = lines.recv() => match line {
                Ok(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "chat lines dropped for a slow reader");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }
}

/// `{"text": ...}` in, `{"user": ..., "text": ...}` out. Anything else is dropped.
fn chat_line(user: &str, text: &str) -> Option<String> {
    let input: ChatInput = serde_json::from_str(text).ok()?;
    serde_json::to_string(&ChatLine {
        user: user.to_string(),
        text: input.text,
    })
    .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_rooms_core::{Database, RuleSet};

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Database::open_in_memory().unwrap(),
            RuleSet::default(),
        ))
    }

    #[test]
    fn test_chat_line_is_attributed() {
        let line = chat_line("user1", r#"{"text":"nice move"}"#).unwrap();
        let line: ChatLine = serde_json::from_str(&line).unwrap();

        assert_eq!(line.user, "user1");
        assert_eq!(line.text, "nice move");
    }

    #[test]
    fn test_malformed_chat_is_dropped() {
        assert!(chat_line("user0", "hello").is_none());
        assert!(chat_line("user0", r#"{"user":"user9"}"#).is_none());
    }

    #[test]
    fn test_join_names_sessions_per_room() {
        let state = test_state();
        let first = state.room(1, true).unwrap().unwrap();
        let second = state.room(2, true).unwrap().unwrap();

        assert_eq!(join(&state, &first, "alice").unwrap(), "user0");
        assert_eq!(join(&state, &first, "bob").unwrap(), "user1");
        assert_eq!(join(&state, &first, "alice").unwrap(), "user0");
        assert_eq!(join(&state, &second, "bob").unwrap(), "user0");
    }

    #[tokio::test]
    async fn test_lines_reach_every_listener() {
        let state = test_state();
        let handle = state.room(5, true).unwrap().unwrap();
        let mut first = handle.chat.subscribe();
        let mut second = handle.chat.subscribe();

        let line = chat_line("user0", r#"{"text":"hi"}"#).unwrap();
        handle.chat.send(line.clone()).unwrap();

        assert_eq!(first.recv().await.unwrap(), line);
        assert_eq!(second.recv().await.unwrap(), line);
    }
}
