use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::ffi::OsString;
use std::future::Future;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::process::Command;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::core::model::Snapshot;
use crate::core::store::SnapshotStore;
use crate::error::WatchError;
use crate::ui::dashboard::DashboardView;

/// External command that performs one collection, run by `POST /api/update`.
#[derive(Debug, Clone)]
pub struct UpdateCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl UpdateCommand {
    pub fn new(program: impl Into<OsString>, args: Vec<OsString>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// This executable's `collect` subcommand, pointed at `data_dir`.
    pub fn current_exe(data_dir: &Path, alert_threshold: f64) -> Result<Self, WatchError> {
        let exe = std::env::current_exe()?;
        Ok(Self::new(
            exe,
            vec![
                "--data-dir".into(),
                data_dir.as_os_str().to_owned(),
                "--alert-threshold".into(),
                alert_threshold.to_string().into(),
                "collect".into(),
            ],
        ))
    }
}

pub struct DashboardState {
    pub store: SnapshotStore,
    pub alert_threshold: f64,
    pub pumping_threshold: f64,
    pub update_command: UpdateCommand,
    /// Held for the lifetime of one update subprocess; updates never overlap.
    update_lock: Mutex<()>,
}

impl DashboardState {
    pub fn new(
        store: SnapshotStore,
        alert_threshold: f64,
        pumping_threshold: f64,
        update_command: UpdateCommand,
    ) -> Self {
        Self {
            store,
            alert_threshold,
            pumping_threshold,
            update_command,
            update_lock: Mutex::new(()),
        }
    }
}

pub type SharedState = Arc<DashboardState>;

#[derive(Debug, Serialize)]
struct TokensResponse {
    success: bool,
    data: Snapshot,
    count: usize,
}

#[derive(Debug, Serialize)]
struct UpdateResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl UpdateResponse {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: Some(message.to_string()),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error),
        }
    }
}

pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/api/tokens", get(api_tokens))
        .route("/api/update", post(api_update))
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn load_latest(state: &DashboardState) -> Snapshot {
    let store = state.store.clone();
    match tokio::task::spawn_blocking(move || store.load_latest()).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("Loading latest snapshot panicked: {}", e);
            Snapshot::default()
        }
    }
}

async fn dashboard(State(state): State<SharedState>) -> Html<String> {
    let snapshot = load_latest(&state).await;
    let view = DashboardView::new(&snapshot, state.alert_threshold, state.pumping_threshold);
    Html(view.render())
}

async fn api_tokens(State(state): State<SharedState>) -> Json<TokensResponse> {
    let snapshot = load_latest(&state).await;
    let count = snapshot.len();
    Json(TokensResponse {
        success: true,
        data: snapshot,
        count,
    })
}

async fn api_update(State(state): State<SharedState>) -> Json<UpdateResponse> {
    info!("Manual update requested");

    // Runs on its own task so a client that disconnects does not cancel a
    // collection halfway through; the lock stays held until the child exits.
    let task = tokio::spawn(async move {
        let _guard = state.update_lock.lock().await;
        let command = &state.update_command;
        Command::new(&command.program)
            .args(&command.args)
            .output()
            .await
    });

    let output = match task.await {
        Ok(output) => output,
        Err(e) => {
            error!("Update task failed: {}", e);
            return Json(UpdateResponse::failed(e.to_string()));
        }
    };

    match output {
        Ok(out) if out.status.success() => Json(UpdateResponse::ok("Update complete")),
        Ok(out) => {
            let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
            warn!("Update command exited with {}: {}", out.status, stderr);
            Json(UpdateResponse::failed(stderr))
        }
        Err(e) => {
            error!("Failed to start update command: {}", e);
            Json(UpdateResponse::failed(e.to_string()))
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Binds the first free port in `ports` and returns the listener with its port.
pub async fn bind_free_port(
    host: &str,
    ports: RangeInclusive<u16>,
) -> Result<(TcpListener, u16), WatchError> {
    for port in ports.clone() {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => debug!("Port {} unavailable: {}", port, e),
        }
    }
    Err(WatchError::NoFreePort {
        start: *ports.start(),
        end: *ports.end(),
    })
}

pub async fn serve<F>(listener: TcpListener, state: SharedState, shutdown: F) -> Result<(), WatchError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Dashboard stopped");
    Ok(())
}
