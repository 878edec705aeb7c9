//! Transport layer: health endpoints and the WebSocket game protocol.
//!
//! Every inbound request is schema-validated before the engine or store is
//! touched, every request is answered with an acknowledgement carrying
//! either the resulting data or a stable error code, and game state is
//! broadcast to a game's room only after the store accepted the save.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::game::{BOARD_SIDE, Difficulty, EngineError, GameState, TurnEngine, Verdict};
use crate::rooms::RoomRegistry;
use crate::store::{GameStore, StoreError};

/// Shared handles for every connection.
#[derive(Clone)]
pub struct AppState {
    /// Persistence for game state.
    pub store: Arc<dyn GameStore>,
    /// The turn engine (with its proposer registry).
    pub engine: Arc<TurnEngine>,
    /// Per-game broadcast rooms.
    pub rooms: RoomRegistry,
}

/// Builds the application router.
pub fn router(app: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/game", get(ws_upgrade))
        .with_state(app)
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn ready(State(app): State<AppState>) -> Response {
    match app.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "ok": true, "checks": { "store": "ok" } })),
        )
            .into_response(),
        Err(err) => {
            warn!(error = %err, "store not ready");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "ok": false, "checks": { "store": "down" } })),
            )
                .into_response()
        }
    }
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(app): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

#[derive(Debug, Deserialize)]
struct GameRef {
    #[serde(rename = "gameId")]
    game_id: String,
}

#[derive(Debug, Deserialize)]
struct NewGame {
    #[serde(rename = "gameId")]
    game_id: Option<String>,
    difficulty: Option<Difficulty>,
}

#[derive(Debug, Deserialize)]
struct ChangeDifficulty {
    #[serde(rename = "gameId")]
    game_id: String,
    difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
struct CellClick {
    #[serde(rename = "gameId")]
    game_id: String,
    row: u8,
    col: u8,
}

/// One inbound protocol message.
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data")]
enum ClientMessage {
    #[serde(rename = "join")]
    Join(GameRef),
    #[serde(rename = "game:new")]
    NewGame(NewGame),
    #[serde(rename = "game:change:diff")]
    ChangeDifficulty(ChangeDifficulty),
    #[serde(rename = "game:load")]
    LoadGame(Box<GameState>),
    #[serde(rename = "cell:click")]
    CellClick(CellClick),
}

/// Protocol-level failure carrying its stable wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WsError {
    code: &'static str,
}

impl WsError {
    const INVALID_PAYLOAD: WsError = WsError {
        code: "invalid_payload",
    };
    const GAME_NOT_FOUND: WsError = WsError {
        code: "game_not_found",
    };
    const ENGINE_UNAVAILABLE: WsError = WsError {
        code: "engine_unavailable",
    };
    const INTERNAL: WsError = WsError {
        code: "internal_error",
    };
}

impl From<StoreError> for WsError {
    fn from(err: StoreError) -> Self {
        let code = match err {
            StoreError::FirstVersion { .. } | StoreError::VersionConflict { .. } => {
                "version_conflict"
            }
            StoreError::ConcurrentUpdate { .. } => "concurrent_update",
            StoreError::Codec(_) => "internal_error",
        };
        WsError { code }
    }
}

impl From<EngineError> for WsError {
    fn from(err: EngineError) -> Self {
        let code = match err {
            EngineError::Move(_) => "invalid_payload",
            EngineError::Ai(crate::ai::AiError::Unavailable { .. }) => "engine_unavailable",
            _ => "internal_error",
        };
        WsError { code }
    }
}

type Outbound = mpsc::UnboundedSender<String>;

struct Connection {
    sid: Uuid,
    app: AppState,
    outbound: Outbound,
    room_task: Option<JoinHandle<()>>,
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    let sid = Uuid::new_v4();
    info!(%sid, "client connected");

    let (mut sink, mut stream) = socket.split();
    let (outbound, mut outbox) = mpsc::unbounded_channel::<String>();

    let writer = tokio::spawn(async move {
        while let Some(text) = outbox.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut conn = Connection {
        sid,
        app,
        outbound,
        room_task: None,
    };

    while let Some(Ok(message)) = stream.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let ack = match serde_json::from_str::<ClientMessage>(text.as_str()) {
            Ok(request) => conn.dispatch(request).await,
            Err(err) => {
                warn!(%sid, error = %err, "invalid payload");
                Err(WsError::INVALID_PAYLOAD)
            }
        };
        let reply = match ack {
            Ok(data) => json!({ "ok": true, "data": data }),
            Err(err) => {
                warn!(%sid, code = err.code, "request failed");
                json!({ "ok": false, "error": err.code })
            }
        };
        if conn.outbound.send(reply.to_string()).is_err() {
            break;
        }
    }

    if let Some(task) = conn.room_task.take() {
        task.abort();
    }
    writer.abort();
    info!(%sid, "client disconnected");
}

fn state_event(state: &GameState) -> String {
    json!({ "event": "state", "data": state }).to_string()
}

fn game_over_event(verdict: Verdict) -> String {
    json!({ "event": "game:over", "data": { "winner": verdict.winner_kind().code() } })
        .to_string()
}

impl Connection {
    async fn dispatch(&mut self, request: ClientMessage) -> Result<Value, WsError> {
        match request {
            ClientMessage::Join(payload) => self.on_join(payload).await,
            ClientMessage::NewGame(payload) => self.on_new_game(payload).await,
            ClientMessage::ChangeDifficulty(payload) => self.on_change_difficulty(payload).await,
            ClientMessage::LoadGame(payload) => self.on_load_game(*payload).await,
            ClientMessage::CellClick(payload) => self.on_cell_click(payload).await,
        }
    }

    /// Switches this connection onto the game's room, replacing any
    /// previous subscription.
    fn subscribe(&mut self, game_id: &str) {
        if let Some(previous) = self.room_task.take() {
            previous.abort();
        }
        let mut receiver = self.app.rooms.join(game_id);
        let outbound = self.outbound.clone();
        self.room_task = Some(tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) => {
                        if outbound.send(event).is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }));
    }

    fn ack(state: &GameState) -> Result<Value, WsError> {
        serde_json::to_value(state).map_err(|_| WsError::INTERNAL)
    }

    #[instrument(skip(self, payload), fields(sid = %self.sid, game_id = %payload.game_id))]
    async fn on_join(&mut self, payload: GameRef) -> Result<Value, WsError> {
        if payload.game_id.is_empty() {
            return Err(WsError::INVALID_PAYLOAD);
        }
        let state = match self.app.store.load(&payload.game_id).await? {
            Some(state) => state,
            None => {
                self.app
                    .store
                    .init_if_missing(GameState::new(payload.game_id.clone()))
                    .await?
            }
        };
        self.subscribe(&payload.game_id);
        let _ = self.outbound.send(state_event(&state));
        Self::ack(&state)
    }

    #[instrument(skip(self, payload), fields(sid = %self.sid))]
    async fn on_new_game(&mut self, payload: NewGame) -> Result<Value, WsError> {
        if payload.game_id.as_deref() == Some("") {
            return Err(WsError::INVALID_PAYLOAD);
        }
        let seed = match payload.game_id {
            Some(id) => GameState::new(id),
            None => GameState::with_random_id(),
        };
        let game_id = seed.id().clone();
        info!(%game_id, "new game requested");

        let mut created = self.app.store.init_if_missing(seed).await?;

        if let Some(difficulty) = payload.difficulty {
            if !self.app.engine.proxy().is_available(difficulty) {
                return Err(WsError::ENGINE_UNAVAILABLE);
            }
            created.set_difficulty(difficulty);
            created.bump_version();
            self.app.store.save(&created).await?;
        }

        self.subscribe(&game_id);
        self.app.rooms.publish(&game_id, state_event(&created));
        Self::ack(&created)
    }

    #[instrument(skip(self, payload), fields(sid = %self.sid, game_id = %payload.game_id))]
    async fn on_change_difficulty(&mut self, payload: ChangeDifficulty) -> Result<Value, WsError> {
        if payload.game_id.is_empty() {
            return Err(WsError::INVALID_PAYLOAD);
        }
        if !self.app.engine.proxy().is_available(payload.difficulty) {
            return Err(WsError::ENGINE_UNAVAILABLE);
        }
        let mut state = self
            .app
            .store
            .load(&payload.game_id)
            .await?
            .ok_or(WsError::GAME_NOT_FOUND)?;
        state.set_difficulty(payload.difficulty);
        state.bump_version();
        self.app.store.save(&state).await?;
        let _ = self.outbound.send(state_event(&state));
        Self::ack(&state)
    }

    #[instrument(skip(self, state), fields(sid = %self.sid, game_id = %state.id()))]
    async fn on_load_game(&mut self, mut state: GameState) -> Result<Value, WsError> {
        // A client-supplied game replaces whatever was stored under its id
        // and restarts the version sequence.
        self.app.store.remove(state.id()).await?;
        state.set_version(0);
        self.app.store.save(&state).await?;
        let game_id = state.id().clone();
        self.subscribe(&game_id);
        let _ = self.outbound.send(state_event(&state));
        Self::ack(&state)
    }

    #[instrument(skip(self, payload), fields(sid = %self.sid, game_id = %payload.game_id, row = payload.row, col = payload.col))]
    async fn on_cell_click(&mut self, payload: CellClick) -> Result<Value, WsError> {
        if payload.game_id.is_empty() || payload.row >= BOARD_SIDE || payload.col >= BOARD_SIDE {
            return Err(WsError::INVALID_PAYLOAD);
        }
        let current = self
            .app
            .store
            .load(&payload.game_id)
            .await?
            .ok_or(WsError::GAME_NOT_FOUND)?;

        let (mut next, verdict) = self
            .app
            .engine
            .apply_click(current, payload.row, payload.col)
            .await?;
        next.bump_version();
        self.app.store.save(&next).await?;

        self.app.rooms.publish(&payload.game_id, state_event(&next));
        if verdict.is_over() {
            info!(game_id = %payload.game_id, winner = verdict.winner_kind().code(), "game over");
            self.app
                .rooms
                .publish(&payload.game_id, game_over_event(verdict));
        }
        Self::ack(&next)
    }
}
