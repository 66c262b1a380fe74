use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use chess_rooms_core::api::{RoleResponse, RoomInfo};
use chess_rooms_core::api::SESSION_COOKIE;
use chess_rooms_core::config::new_session_key;
use chess_rooms_core::{Color, Error, Role, Room};

use crate::AppState;

pub mod chat;
pub mod socket;

/// An error answered to the HTTP client as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn room_not_found(id: u32) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("room {} does not exist", id))
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::SeatTaken(_) | Error::AlreadySeated => {
                Self::new(StatusCode::FORBIDDEN, e.to_string())
            }
            other => {
                tracing::error!("request failed: {}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub room_id: Option<String>,
    pub color: Option<String>,
}

/// Value of the session cookie, if the request carries one.
pub fn session_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn parse_room_id(raw: Option<&str>) -> Result<u32, ApiError> {
    raw.ok_or_else(|| ApiError::bad_request("room_id is required"))?
        .parse()
        .map_err(|_| ApiError::bad_request("room_id must be a number"))
}

pub fn room_info(room: &Room) -> RoomInfo {
    let last_accessed = chrono::DateTime::from_timestamp(room.last_accessed() as i64, 0)
        .map(|d| d.to_rfc3339())
        .unwrap_or_default();

    RoomInfo {
        id: room.id(),
        last_accessed,
        white_assigned: room.white().is_some(),
        black_assigned: room.black().is_some(),
        pieces: room.pieces(),
        turn: room.turn(),
    }
}

pub async fn health() -> &'static str {
    "OK"
}

/// Hands out a session cookie unless the request already carries one.
pub async fn issue_session(headers: HeaderMap) -> Response {
    if session_from(&headers).is_some() {
        return StatusCode::OK.into_response();
    }

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE,
        new_session_key()
    );
    ([(header::SET_COOKIE, cookie)], StatusCode::OK).into_response()
}

pub async fn room_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<RoomInfo>, ApiError> {
    let handle = state.room(id, true)?.ok_or_else(|| ApiError::room_not_found(id))?;

    let mut room = handle.lock();
    room.touch();
    state.db().touch_room(id)?;
    Ok(Json(room_info(&room)))
}

pub async fn get_role(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoleQuery>,
    headers: HeaderMap,
) -> Result<Json<RoleResponse>, ApiError> {
    let id = parse_room_id(query.room_id.as_deref())?;
    let handle = state.room(id, false)?.ok_or_else(|| ApiError::room_not_found(id))?;

    let role = match session_from(&headers) {
        Some(session) => handle.lock().role_of(&session),
        None => Role::Observer,
    };
    Ok(Json(RoleResponse { role }))
}

pub async fn claim_role(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoleQuery>,
    headers: HeaderMap,
) -> Result<Json<RoleResponse>, ApiError> {
    let id = parse_room_id(query.room_id.as_deref())?;
    let color: Color = query
        .color
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("color is required"))?
        .parse()
        .map_err(|e: Error| ApiError::bad_request(e.to_string()))?;

    let session = session_from(&headers)
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "no session"))?;
    let handle = state.room(id, false)?.ok_or_else(|| ApiError::room_not_found(id))?;

    let mut room = handle.lock();
    room.claim(&session, color)?;
    state.db().save_room(&room)?;
    Ok(Json(RoleResponse { role: color.into() }))
}
