//! Room WebSocket: state on connect, then relayed interactions

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

use chess_rooms_core::sync::ChessMessage;

use super::{session_from, ApiError};
use crate::{AppState, RoomHandle};

/// Room ids in socket paths are 1 to 9 digits.
pub(super) fn parse_socket_room_id(raw: &str) -> Option<u32> {
    if raw.is_empty() || raw.len() > 9 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

pub async fn room_socket(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(id) = parse_socket_room_id(&raw_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let handle = match state.room(id, true) {
        Ok(Some(handle)) => handle,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => return ApiError::from(e).into_response(),
    };

    let session = session_from(&headers);
    ws.on_upgrade(move |socket| serve(socket, state, handle, session))
}

async fn serve(socket: WebSocket, state: Arc<AppState>, handle: Arc<RoomHandle>, session: Option<String>) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = handle.events.subscribe();

    let Some(initial) = state_frame(&handle) else {
        return;
    };
    if sender.send(Message::Text(initial)).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Some(event) = play(&state, &handle, session.as_deref(), &text) {
                        // no receivers only means nobody is listening
                        let _ = handle.events.send(event);
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("room socket error: {}", e);
                    break;
                }
            },
            event = events.recv() => match forward(&handle, event) {
                Some(text) => {
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
        }
    }
}

fn state_frame(handle: &RoomHandle) -> Option<String> {
    let encoded = {
        let room = handle.lock();
        ChessMessage::State(room.state()).to_json()
    };
    match encoded {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!("failed to encode room state: {}", e);
            None
        }
    }
}

/// The frame to send for one broadcast event, or `None` to hang up. A
/// receiver that fell behind gets the current state in place of the
/// interactions it missed.
fn forward(handle: &RoomHandle, event: Result<String, RecvError>) -> Option<String> {
    match event {
        Ok(text) => Some(text),
        Err(RecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "room socket fell behind, resending state");
            state_frame(handle)
        }
        Err(RecvError::Closed) => None,
    }
}

/// Applies one incoming frame. Returns the interaction to broadcast, or
/// `None` when the frame is dropped.
fn play(state: &AppState, handle: &RoomHandle, session: Option<&str>, text: &str) -> Option<String> {
    let session = session?;
    let ChessMessage::Interaction(request) = ChessMessage::from_json(text).ok()? else {
        return None;
    };

    let mut room = handle.lock();
    let event = match room.apply_interaction(session, request.source, request.target) {
        Ok(Some(event)) => event,
        Ok(None) => return None,
        Err(e) => {
            tracing::debug!(room = room.id(), "interaction rejected: {}", e);
            return None;
        }
    };

    room.touch();
    if let Err(e) = state.db().save_room(&room) {
        tracing::error!(room = room.id(), "failed to persist room: {}", e);
    }

    match ChessMessage::Interaction(event).to_json() {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!("failed to encode interaction: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_rooms_core::sync::{Backoff, InteractionEvent};
    use chess_rooms_core::{ChessSocket, ClientConfig, Color, Database, RuleSet};
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    fn seated_state() -> (Arc<AppState>, Arc<RoomHandle>) {
        let state = Arc::new(AppState::new(
            Database::open_in_memory().unwrap(),
            RuleSet::default(),
        ));
        let handle = state.room(1, true).unwrap().unwrap();
        {
            let mut room = handle.lock();
            room.claim("alice", Color::White).unwrap();
            room.claim("bob", Color::Black).unwrap();
            state.db().save_room(&room).unwrap();
        }
        (state, handle)
    }

    fn interaction(color: Color, source: usize, target: usize) -> String {
        ChessMessage::Interaction(InteractionEvent {
            color,
            source,
            target,
        })
        .to_json()
        .unwrap()
    }

    #[test]
    fn test_socket_room_ids() {
        assert_eq!(parse_socket_room_id("42"), Some(42));
        assert_eq!(parse_socket_room_id("999999999"), Some(999_999_999));
        assert_eq!(parse_socket_room_id("1234567890"), None);
        assert_eq!(parse_socket_room_id(""), None);
        assert_eq!(parse_socket_room_id("-1"), None);
        assert_eq!(parse_socket_room_id("1a"), None);
    }

    #[test]
    fn test_legal_interaction_is_played_and_persisted() {
        let (state, handle) = seated_state();

        let event = play(&state, &handle, Some("alice"), &interaction(Color::White, 52, 36)).unwrap();

        match ChessMessage::from_json(&event).unwrap() {
            ChessMessage::Interaction(played) => {
                assert_eq!(played.color, Color::White);
                assert_eq!((played.source, played.target), (52, 36));
            }
            other => panic!("expected interaction, got {:?}", other),
        }
        assert_eq!(handle.lock().turn(), Color::Black);

        let stored = state.db().load_room(1, RuleSet::default()).unwrap().unwrap();
        assert_eq!(stored.turn(), Color::Black);
        assert!(stored.board().is_occupied(36).unwrap());
    }

    #[test]
    fn test_invalid_frames_are_dropped() {
        let (state, handle) = seated_state();

        assert!(play(&state, &handle, None, &interaction(Color::White, 52, 36)).is_none());
        assert!(play(&state, &handle, Some("mallory"), &interaction(Color::White, 52, 36)).is_none());
        assert!(play(&state, &handle, Some("bob"), &interaction(Color::Black, 12, 28)).is_none());
        assert!(play(&state, &handle, Some("alice"), &interaction(Color::White, 60, 52)).is_none());
        assert!(play(&state, &handle, Some("alice"), &interaction(Color::White, 52, 99)).is_none());
        assert!(play(&state, &handle, Some("alice"), "not json").is_none());

        let state_frame = ChessMessage::State(handle.lock().state()).to_json().unwrap();
        assert!(play(&state, &handle, Some("alice"), &state_frame).is_none());

        assert_eq!(handle.lock().turn(), Color::White);
    }

    #[test]
    fn test_rooms_are_shared_between_lookups() {
        let (state, handle) = seated_state();
        let again = state.room(1, false).unwrap().unwrap();

        assert!(Arc::ptr_eq(&handle, &again));
        assert!(state.room(2, false).unwrap().is_none());
    }

    #[test]
    fn test_lagging_receiver_gets_fresh_state() {
        let (_state, handle) = seated_state();
        handle.lock().apply_interaction("alice", 52, 36).unwrap().unwrap();

        let frame = forward(&handle, Err(RecvError::Lagged(3))).unwrap();
        match ChessMessage::from_json(&frame).unwrap() {
            ChessMessage::State(state) => {
                assert_eq!(state.turn, Color::Black);
                assert!(state.pieces.iter().any(|p| p.pos == 36));
            }
            other => panic!("expected state, got {:?}", other),
        }

        assert_eq!(forward(&handle, Ok("x".to_string())).as_deref(), Some("x"));
        assert!(forward(&handle, Err(RecvError::Closed)).is_none());
    }

    async fn unused_addr() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    #[tokio::test]
    async fn test_chess_socket_plays_through_the_server() {
        let (state, handle) = seated_state();
        let addr = unused_addr().await;
        let config = ClientConfig {
            api_base: format!("http://{}", addr),
            ws_base: format!("ws://{}", addr),
            session: "alice".to_string(),
        };

        let socket = ChessSocket::connect(&config, 1).unwrap();
        let mut states = socket.subscribe_match_state();
        let mut white = socket.subscribe_interactions(Some(Color::White));
        let mut black = socket.subscribe_interactions(Some(Color::Black));
        socket
            .publish_interaction(InteractionEvent {
                color: Color::White,
                source: 52,
                target: 36,
            })
            .unwrap();

        // nothing listens yet, so the socket is backing off
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!socket.is_open());
        assert!(socket.retry_delay() > Backoff::INITIAL);

        let listener = TcpListener::bind(addr).await.unwrap();
        let server_state = state.clone();
        tokio::spawn(async move {
            axum::serve(listener, crate::app(server_state)).await.unwrap();
        });

        let opening = timeout(Duration::from_secs(5), states.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(opening.turn, Color::White);
        assert_eq!(opening.pieces.len(), 32);

        let echo = timeout(Duration::from_secs(5), white.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!((echo.source, echo.target), (52, 36));
        assert!(black.try_recv().is_err());

        assert!(socket.is_open());
        assert_eq!(socket.retry_delay(), Backoff::INITIAL);
        assert_eq!(handle.lock().turn(), Color::Black);
        let stored = state.db().load_room(1, RuleSet::default()).unwrap().unwrap();
        assert!(stored.board().is_occupied(36).unwrap());
    }

    #[test]
    fn test_idle_rooms_are_evicted() {
        let (state, handle) = seated_state();
        state.room(2, true).unwrap().unwrap();
        assert_eq!(state.cached_rooms(), 2);

        // room 2 has no holders left, room 1 is still held here
        state.room(3, true).unwrap();
        assert_eq!(state.cached_rooms(), 2);
        assert!(Arc::ptr_eq(&handle, &state.room(1, false).unwrap().unwrap()));

        drop(handle);
        let _listener = state.room(3, false).unwrap().unwrap().events.subscribe();
        state.room(4, true).unwrap();
        assert_eq!(state.cached_rooms(), 2);
        let reloaded = state.room(1, false).unwrap().unwrap();
        assert_eq!(reloaded.lock().white(), Some("alice"));
    }
}
