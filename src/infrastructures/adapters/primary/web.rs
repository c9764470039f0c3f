use crate::application::controller::{Command, DashboardController};
use crate::application::use_cases::fetch_commits::FetchCommitsInteractor;
use crate::application::view::ServerMessage;
use crate::infrastructures::adapters::secondary::external_apis::github::GitHubApiAdapter;
use crate::infrastructures::adapters::secondary::storage::file_credential_store::FileCredentialStore;
use axum::extract::ws::Utf8Bytes;
use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

const INDEX_HTML: &str = include_str!("../../../../static/index.html");

/// Per-session channel sizes; a session produces at most a handful of messages per event.
const OUTBOX_CAPACITY: usize = 32;
const COMMAND_CAPACITY: usize = 16;

pub type DashboardUseCase = FetchCommitsInteractor<GitHubApiAdapter, FileCredentialStore>;

// Structure to hold application state (AppState)
#[derive(Clone)]
pub struct AppState {
    pub use_case: Arc<DashboardUseCase>,
    active_sessions: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(use_case: Arc<DashboardUseCase>) -> Self {
        Self {
            use_case,
            active_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of WebSocket sessions whose controller is still running.
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }
}

/// Counts a session for as long as it is alive.
struct SessionGuard {
    active_sessions: Arc<AtomicUsize>,
}

impl SessionGuard {
    fn enter(active_sessions: &Arc<AtomicUsize>) -> Self {
        let active = active_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(active_sessions = active, "Client connected");
        Self {
            active_sessions: active_sessions.clone(),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let active = self.active_sessions.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::info!(active_sessions = active, "Client disconnected");
    }
}

#[tracing::instrument(name = "index")]
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[axum::debug_handler]
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

#[tracing::instrument(name = "handle_socket", skip(socket, state))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let _guard = SessionGuard::enter(&state.active_sessions);
    let (outbox_tx, mut outbox_rx) = mpsc::channel::<ServerMessage>(OUTBOX_CAPACITY);
    let (commands_tx, commands_rx) = mpsc::channel::<Command>(COMMAND_CAPACITY);
    let controller = DashboardController::new(state.use_case.clone(), outbox_tx);
    let session = tokio::spawn(controller.run(commands_rx));

    // Reading and writing run separately, so a full command queue never stalls the outbox
    let (mut sender, mut receiver) = socket.split();

    // Forward rendered views and alerts to the page
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = outbox_rx.recv().await {
            match serde_json::to_string(&message) {
                Ok(json_string) => {
                    if sender
                        .send(Message::Text(Utf8Bytes::from(json_string)))
                        .await
                        .is_err()
                    {
                        tracing::info!("Client disconnected (send error)");
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to serialize message: {:?}", e);
                }
            }
        }
    });

    // Receive user actions from the page
    let mut recv_task = tokio::spawn(async move {
        loop {
            match receiver.next().await {
                Some(Ok(Message::Text(t))) => match serde_json::from_str::<Command>(t.as_str()) {
                    Ok(command) => {
                        if commands_tx.send(command).await.is_err() {
                            tracing::info!("Session ended, closing connection");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Ignoring malformed command {:?}: {}", t.as_str(), e);
                    }
                },
                Some(Ok(Message::Close(_))) => {
                    tracing::info!("Client disconnected (received close message)");
                    break;
                }
                Some(Ok(_)) => {
                    // Ignore Ping/Pong and Binary messages
                }
                Some(Err(e)) => {
                    tracing::info!("Client disconnected (receive error: {})", e);
                    break;
                }
                None => {
                    tracing::info!("Client disconnected (stream ended)");
                    break;
                }
            }
        }
    });

    // Whichever side finishes first takes the other down with it
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    // Tears down the countdown and any in-flight fetch with the controller
    session.abort();
    match session.await {
        Err(e) if !e.is_cancelled() => tracing::error!("Dashboard session failed: {}", e),
        _ => {}
    }
}

#[tracing::instrument(name = "health_check")]
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/ws", get(websocket_handler))
        .route("/health", get(health_check))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
