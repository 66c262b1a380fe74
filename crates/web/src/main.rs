use axum::{routing::get, Router};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use chess_rooms_core::{Database, Result, Room, RuleSet, Settings};

mod routes;

const ROOM_EVENT_CAPACITY: usize = 64;

/// A live room with the channels its game and chat sockets listen on.
pub struct RoomHandle {
    room: Mutex<Room>,
    pub events: broadcast::Sender<String>,
    pub chat: broadcast::Sender<String>,
}

impl RoomHandle {
    fn new(room: Room) -> Self {
        let (events, _) = broadcast::channel(ROOM_EVENT_CAPACITY);
        let (chat, _) = broadcast::channel(ROOM_EVENT_CAPACITY);
        Self {
            room: Mutex::new(room),
            events,
            chat,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Room> {
        self.room.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Nobody but the registry holds it and no socket listens on it.
    fn is_idle(self: &Arc<Self>) -> bool {
        Arc::strong_count(self) == 1
            && self.events.receiver_count() == 0
            && self.chat.receiver_count() == 0
    }
}

pub struct AppState {
    db: Mutex<Database>,
    rooms: Mutex<HashMap<u32, Arc<RoomHandle>>>,
    pub rules: RuleSet,
}

impl AppState {
    pub fn new(db: Database, rules: RuleSet) -> Self {
        Self {
            db: Mutex::new(db),
            rooms: Mutex::new(HashMap::new()),
            rules,
        }
    }

    pub fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn cached_rooms(&self) -> usize {
        self.rooms.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Finds a room in memory or in the database. With `create`, a missing
    /// room is set up fresh and stored.
    ///
    /// Lock order is rooms, then database. Callers holding a room lock may
    /// take the database lock but never the rooms map.
    ///
    /// Idle rooms other than `id` are dropped from memory on the way. Every
    /// change is already in the database, so they reload on next use.
    pub fn room(&self, id: u32, create: bool) -> Result<Option<Arc<RoomHandle>>> {
        let mut rooms = self.rooms.lock().unwrap_or_else(PoisonError::into_inner);
        rooms.retain(|&room_id, handle| {
            let keep = room_id == id || !handle.is_idle();
            if !keep {
                tracing::debug!(room = room_id, "idle room evicted");
            }
            keep
        });

        if let Some(handle) = rooms.get(&id) {
            return Ok(Some(handle.clone()));
        }

        let mut db = self.db();
        let room = match db.load_room(id, self.rules)? {
            Some(room) => room,
            None if create => {
                let room = Room::new(id, self.rules)?;
                db.insert_room(&room)?;
                tracing::info!(room = id, "room created");
                room
            }
            None => return Ok(None),
        };

        let handle = Arc::new(RoomHandle::new(room));
        rooms.insert(id, handle.clone());
        Ok(Some(handle))
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/chess/rooms/:id", get(routes::room_detail))
        .route("/api/chess/role", get(routes::get_role).post(routes::claim_role))
        .route("/api/chat/cookie", get(routes::issue_session))
        .route("/ws/chess/room/:id", get(routes::socket::room_socket))
        .route("/ws/chat/room/:id", get(routes::chat::chat_socket))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let settings = Settings::from_env();

    let db = match Database::open(&settings.database_path) {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("failed to open database {}: {}", settings.database_path, e);
            std::process::exit(1);
        }
    };
    tracing::info!(rules = ?settings.rules, "rules in effect");

    let state = Arc::new(AppState::new(db, settings.rules));

    let listener = match tokio::net::TcpListener::bind(&settings.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind {}: {}", settings.bind_addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("server running at http://{}", settings.bind_addr);

    if let Err(e) = axum::serve(listener, app(state)).await {
        tracing::error!("server stopped: {}", e);
    }
}
