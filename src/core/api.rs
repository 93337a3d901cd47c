//! HTTP + WebSocket API for browser front ends that run detection locally
//!
//! Endpoints:
//! - POST /session/new - Create new scoring session
//! - GET /session/{id} - Current score and tier
//! - DELETE /session/{id} - End a session
//! - POST /session/{id}/frame - Submit one frame's detection (or null)
//! - POST /session/{id}/reinit - Camera retry path
//! - WS /ws/{id} - Live frame outcomes
//! - GET /health - Health check
//!
//! Sessions idle for longer than the configured TTL are pruned whenever a new
//! session is created.

use axum::{
    extract::{ws::{Message, WebSocket}, Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::config::SmileConfig;
use crate::core::{CelebrationMode, DisplayFit, ResetPolicy, SmileEngine};
use crate::types::{CelebrationEvent, Detection, FrameOutcome, ScoreUpdate};

/// Session state
#[derive(Debug)]
pub struct Session {
    pub id: String,
    pub engine: SmileEngine,
    pub frames: u64,
    pub rejected: u64,
    pub update_tx: broadcast::Sender<LiveUpdate>,
    /// Last create, frame or reinit
    pub last_seen: Instant,
}

/// Pushed to websocket subscribers for every accepted frame
#[derive(Debug, Clone, Serialize)]
pub struct LiveUpdate {
    pub outcome: FrameOutcome,
    /// Present on the frame that fired the celebration
    pub celebration: Option<CelebrationEvent>,
}

/// App state
pub struct AppState {
    pub sessions: RwLock<HashMap<String, Session>>,
    pub default_mode: CelebrationMode,
    pub reset_policy: ResetPolicy,
    pub session_ttl: Duration,
    next_id: AtomicU64,
}

impl AppState {
    pub fn new(config: &SmileConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            default_mode: config.celebration,
            reset_policy: config.reset_policy,
            session_ttl: config.session_ttl,
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe to a session's live updates
    pub async fn subscribe(&self, id: &str) -> Option<broadcast::Receiver<LiveUpdate>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|s| s.update_tx.subscribe())
    }

    /// Drop sessions idle for at least the TTL; returns how many went
    pub async fn prune_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let ttl = self.session_ttl;
        sessions.retain(|_, s| s.last_seen.elapsed() < ttl);
        before - sessions.len()
    }
}

/// Create new session request
#[derive(Debug, Default, Deserialize)]
pub struct NewSessionRequest {
    pub celebration: Option<CelebrationMode>,
}

/// Create new session response
#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
    pub celebration: CelebrationMode,
}

/// Session status response
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub score: f64,
    pub rounded: i64,
    pub tier: String,
    pub message: String,
    pub update_count: u64,
    pub frames: u64,
    pub rejected: u64,
    pub celebration: CelebrationMode,
    /// Last scored frame, if any
    pub last_update: Option<ScoreUpdate>,
}

/// Submit frame request; `detection: null` means no face
#[derive(Debug, Deserialize)]
pub struct FrameRequest {
    pub detection: Option<Detection>,
    /// Video and display sizes when landmarks are in video pixels
    #[serde(default)]
    pub geometry: Option<FrameGeometry>,
}

/// Source video size and the element it is shown in
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FrameGeometry {
    pub video_width: f64,
    pub video_height: f64,
    pub display_width: f64,
    pub display_height: f64,
}

/// Submit frame response
#[derive(Debug, Serialize)]
pub struct FrameResponse {
    pub score: f64,
    pub rounded: i64,
    pub tier: String,
    pub message: String,
    pub celebrate: bool,
    pub face_found: bool,
    pub outcome: FrameOutcome,
    /// Event to hand to the celebration layer, on the frame that fired it
    pub celebration: Option<CelebrationEvent>,
}

/// Reinitialize request; `reset` omitted means the server's policy
#[derive(Debug, Default, Deserialize)]
pub struct ReinitRequest {
    #[serde(default)]
    pub reset: Option<bool>,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions_active: usize,
}

/// Create the API router
pub fn create_router(config: &SmileConfig) -> Router {
    router(Arc::new(AppState::new(config)))
}

/// Router over existing state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/session/new", post(create_session))
        .route("/session/:id", get(get_session).delete(delete_session))
        .route("/session/:id/frame", post(submit_frame))
        .route("/session/:id/reinit", post(reinit_session))
        .route("/ws/:id", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let sessions = state.sessions.read().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        sessions_active: sessions.len(),
    })
}

/// Create new session
async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NewSessionRequest>,
) -> Json<NewSessionResponse> {
    let pruned = state.prune_idle().await;
    if pruned > 0 {
        info!(pruned, "idle sessions expired");
    }

    let session_id = generate_session_id(&state.next_id);
    let mode = req.celebration.unwrap_or(state.default_mode);
    let (tx, _) = broadcast::channel(100);

    let session = Session {
        id: session_id.clone(),
        engine: SmileEngine::new(mode),
        frames: 0,
        rejected: 0,
        update_tx: tx,
        last_seen: Instant::now(),
    };

    state.sessions.write().await.insert(session_id.clone(), session);
    info!(session = %session_id, ?mode, "session created");

    Json(NewSessionResponse {
        websocket_url: format!("/ws/{}", session_id),
        session_id,
        celebration: mode,
    })
}

/// Get session status
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, StatusCode> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    let tier = session.engine.tier();

    Ok(Json(SessionStatusResponse {
        session_id: session.id.clone(),
        score: session.engine.score(),
        rounded: session.engine.state().rounded(),
        tier: tier.key().to_string(),
        message: tier.message().to_string(),
        update_count: session.engine.state().update_count(),
        frames: session.frames,
        rejected: session.rejected,
        celebration: session.engine.celebration_mode(),
        last_update: session.engine.current_update().cloned(),
    }))
}

/// End a session
async fn delete_session(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> StatusCode {
    match state.sessions.write().await.remove(&id) {
        Some(session) => {
            info!(session = %id, frames = session.frames, "session ended");
            StatusCode::NO_CONTENT
        }
        None => StatusCode::NOT_FOUND,
    }
}

/// Score one frame
async fn submit_frame(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<FrameRequest>,
) -> Result<Json<FrameResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse { error: format!("session {} not found", id) }),
        )
    })?;
    session.last_seen = Instant::now();

    let detection = match (req.detection, req.geometry) {
        (Some(d), Some(g)) => {
            match DisplayFit::cover(g.video_width, g.video_height, g.display_width, g.display_height) {
                Some(fit) => Some(fit.rescale_detection(&d)),
                None => Some(d),
            }
        }
        (d, _) => d,
    };

    let outcome = match session.engine.process(detection.as_ref()) {
        Ok(outcome) => outcome,
        Err(e) => {
            session.rejected += 1;
            warn!(session = %id, error = %e, "frame rejected");
            return Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorResponse { error: e.to_string() }),
            ));
        }
    };
    session.frames += 1;

    let celebration = session.engine.take_celebration();
    // No subscribers is fine
    let _ = session.update_tx.send(LiveUpdate {
        outcome: outcome.clone(),
        celebration: celebration.clone(),
    });

    let tier = session.engine.tier();
    Ok(Json(FrameResponse {
        score: session.engine.score(),
        rounded: session.engine.state().rounded(),
        tier: tier.key().to_string(),
        message: tier.message().to_string(),
        celebrate: outcome.as_update().map_or(false, |u| u.celebrate),
        face_found: outcome.as_update().is_some(),
        outcome,
        celebration,
    }))
}

/// Camera retry: keep or reset the score, re-arm the celebration
async fn reinit_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ReinitRequest>,
) -> Result<Json<SessionStatusResponse>, StatusCode> {
    {
        let mut sessions = state.sessions.write().await;
        let session = sessions.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
        session.last_seen = Instant::now();
        let policy = match req.reset {
            Some(true) => ResetPolicy::Reset,
            Some(false) => ResetPolicy::Keep,
            None => state.reset_policy,
        };
        session.engine.reinitialize(policy);
    }
    get_session(State(state), Path(id)).await
}

/// WebSocket handler for live updates
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, StatusCode> {
    let rx = state.subscribe(&id).await.ok_or(StatusCode::NOT_FOUND)?;

    Ok(ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    }))
}

/// Handle WebSocket connection; ends when either side closes
async fn handle_websocket(socket: WebSocket, mut rx: broadcast::Receiver<LiveUpdate>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok(update) => {
                    let json = serde_json::to_string(&update).unwrap_or_default();
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                // Slow client: drop the backlog and keep streaming
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("websocket closed");
}

/// Generate session ID
fn generate_session_id(counter: &AtomicU64) -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let seq = counter.fetch_add(1, Ordering::SeqCst);
    format!("session_{:x}_{}", nanos, seq)
}

/// Run the API server
pub async fn run_server(config: &SmileConfig) -> crate::Result<()> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    info!("Smile Meter API running on {}", config.addr);
    info!("  POST /session/new        - Create session");
    info!("  GET  /session/:id        - Get status");
    info!("  DEL  /session/:id        - End session");
    info!("  POST /session/:id/frame  - Submit frame");
    info!("  POST /session/:id/reinit - Camera retry");
    info!("  WS   /ws/:id             - Live updates");
    info!("  GET  /health             - Health check");
    axum::serve(listener, router).await?;
    Ok(())
}
