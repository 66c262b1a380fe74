//! Reconnecting WebSocket channel to a chess room
//!
//! The connection lives on a background task. Interactions published while
//! the socket is down are queued and flushed in order once it reopens.

use futures::{SinkExt, StreamExt};
use rand::Rng;
use std::collections::VecDeque;
use http::header::{HeaderValue, COOKIE};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio_websockets::{ClientBuilder, Message};

use super::messages::{ChessMessage, InteractionEvent, MatchStateEvent};
use crate::api::SESSION_COOKIE;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::rules::Color;

/// Exponential reconnect delay with a little jitter.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
}

impl Backoff {
    pub const INITIAL: Duration = Duration::from_millis(200);
    pub const CEILING: Duration = Duration::from_secs(20);
    const MAX_JITTER_MS: u64 = 100;

    pub fn new() -> Self {
        Self {
            current: Self::INITIAL,
        }
    }

    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = Self::INITIAL;
    }

    /// Doubles the delay and adds `jitter`, until the delay reaches the ceiling.
    pub fn grow(&mut self, jitter: Duration) -> Duration {
        if self.current < Self::CEILING {
            self.current = self.current * 2 + jitter;
        }
        self.current
    }

    pub fn next_delay(&mut self) -> Duration {
        let jitter = rand::rng().random_range(0..Self::MAX_JITTER_MS);
        self.grow(Duration::from_millis(jitter))
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Subscribers {
    state: Vec<UnboundedSender<MatchStateEvent>>,
    all: Vec<UnboundedSender<InteractionEvent>>,
    white: Vec<UnboundedSender<InteractionEvent>>,
    black: Vec<UnboundedSender<InteractionEvent>>,
}

impl Subscribers {
    /// Hands `msg` to every live subscriber and forgets the dropped ones.
    fn dispatch(&mut self, msg: ChessMessage) {
        match msg {
            ChessMessage::State(state) => {
                self.state.retain(|tx| tx.send(state.clone()).is_ok());
            }
            ChessMessage::Interaction(event) => {
                self.all.retain(|tx| tx.send(event).is_ok());
                let by_color = match event.color {
                    Color::White => &mut self.white,
                    Color::Black => &mut self.black,
                };
                by_color.retain(|tx| tx.send(event).is_ok());
            }
        }
    }
}

type SharedSubscribers = Arc<Mutex<Subscribers>>;

/// Connection flags shared with the background task.
#[derive(Debug)]
struct Status {
    open: AtomicBool,
    retry_delay_ms: AtomicU64,
}

impl Status {
    fn new() -> Self {
        Self {
            open: AtomicBool::new(false),
            retry_delay_ms: AtomicU64::new(Backoff::INITIAL.as_millis() as u64),
        }
    }

    fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::Release);
    }

    fn set_retry_delay(&self, delay: Duration) {
        self.retry_delay_ms.store(delay.as_millis() as u64, Ordering::Release);
    }
}

/// Upgrade request for the room, carrying the session cookie.
fn handshake(url: &str, cookie: &HeaderValue) -> Result<ClientBuilder<'static>> {
    let builder = ClientBuilder::new()
        .uri(url)
        .map_err(|e| Error::Socket(format!("invalid room url {}: {}", url, e)))?;
    Ok(builder.add_header(COOKIE, cookie.clone()))
}

pub struct ChessSocket {
    room_id: u32,
    outgoing: UnboundedSender<ChessMessage>,
    subscribers: SharedSubscribers,
    status: Arc<Status>,
    task: JoinHandle<()>,
}

impl ChessSocket {
    /// Starts connecting to `room_id`. Must be called inside a tokio runtime.
    pub fn connect(config: &ClientConfig, room_id: u32) -> Result<Self> {
        let url = format!("{}/ws/chess/room/{}", config.ws_base, room_id);
        let cookie = HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, config.session))
            .map_err(|e| Error::Socket(format!("invalid session key: {}", e)))?;
        handshake(&url, &cookie)?;

        let (outgoing, rx) = mpsc::unbounded_channel();
        let subscribers = SharedSubscribers::default();
        let status = Arc::new(Status::new());

        let task = tokio::spawn(run(url, cookie, rx, subscribers.clone(), status.clone()));

        Ok(Self {
            room_id,
            outgoing,
            subscribers,
            status,
            task,
        })
    }

    pub fn room_id(&self) -> u32 {
        self.room_id
    }

    pub fn is_open(&self) -> bool {
        self.status.open.load(Ordering::Acquire)
    }

    /// How long the next reconnect attempt waits. Back at
    /// [`Backoff::INITIAL`] once a connection has opened.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.status.retry_delay_ms.load(Ordering::Acquire))
    }

    fn subscribers(&self) -> std::sync::MutexGuard<'_, Subscribers> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe_match_state(&self) -> UnboundedReceiver<MatchStateEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers().state.push(tx);
        rx
    }

    /// Interactions of one color, or of both when `color` is `None`.
    /// Dropping the receiver unsubscribes.
    pub fn subscribe_interactions(&self, color: Option<Color>) -> UnboundedReceiver<InteractionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut subscribers = self.subscribers();
        match color {
            None => subscribers.all.push(tx),
            Some(Color::White) => subscribers.white.push(tx),
            Some(Color::Black) => subscribers.black.push(tx),
        }
        rx
    }

    pub fn publish_interaction(&self, event: InteractionEvent) -> Result<()> {
        self.outgoing
            .send(ChessMessage::Interaction(event))
            .map_err(|_| Error::Socket("connection task has stopped".to_string()))
    }
}

impl Drop for ChessSocket {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    url: String,
    cookie: HeaderValue,
    mut outgoing: UnboundedReceiver<ChessMessage>,
    subscribers: SharedSubscribers,
    status: Arc<Status>,
) {
    let mut backoff = Backoff::new();
    let mut pending: VecDeque<ChessMessage> = VecDeque::new();

    loop {
        let builder = match handshake(&url, &cookie) {
            Ok(builder) => builder,
            Err(e) => {
                tracing::error!("{}", e);
                return;
            }
        };

        match builder.connect().await {
            Ok((stream, _)) => {
                backoff.reset();
                status.set_retry_delay(backoff.current());
                status.set_open(true);
                tracing::info!("chess socket opened: {}", url);

                let (mut sink, mut stream) = stream.split();
                let mut healthy = true;

                while let Some(msg) = pending.pop_front() {
                    if let Err(e) = send(&mut sink, &msg).await {
                        tracing::warn!("failed to flush queued message: {}", e);
                        pending.push_front(msg);
                        healthy = false;
                        break;
                    }
                }

                while healthy {
                    tokio::select! {
                        incoming = stream.next() => match incoming {
                            Some(Ok(frame)) => {
                                if frame.is_close() {
                                    healthy = false;
                                } else if let Some(text) = frame.as_text() {
                                    match ChessMessage::from_json(text) {
                                        Ok(msg) => subscribers
                                            .lock()
                                            .unwrap_or_else(PoisonError::into_inner)
                                            .dispatch(msg),
                                        Err(e) => tracing::warn!("ignoring malformed message: {}", e),
                                    }
                                }
                            }
                            Some(Err(e)) => {
                                tracing::warn!("chess socket error: {}", e);
                                healthy = false;
                            }
                            None => healthy = false,
                        },
                        msg = outgoing.recv() => match msg {
                            Some(msg) => {
                                if let Err(e) = send(&mut sink, &msg).await {
                                    tracing::warn!("send failed, queueing: {}", e);
                                    pending.push_back(msg);
                                    healthy = false;
                                }
                            }
                            None => {
                                status.set_open(false);
                                return;
                            }
                        },
                    }
                }

                status.set_open(false);
                tracing::info!("chess socket closed: {}", url);
            }
            Err(e) => tracing::warn!("could not connect to {}: {}", url, e),
        }

        let delay = backoff.next_delay();
        status.set_retry_delay(delay);
        tracing::debug!(delay_ms = delay.as_millis() as u64, "reconnecting");
        tokio::time::sleep(delay).await;
    }
}

async fn send<S>(sink: &mut S, msg: &ChessMessage) -> Result<()>
where
    S: futures::Sink<Message, Error = tokio_websockets::Error> + Unpin,
{
    let text = msg.to_json()?;
    sink.send(Message::text(text))
        .await
        .map_err(|e| Error::Socket(e.to_string()))
}
