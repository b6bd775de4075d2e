//! Local agent HTTP surface.
//!
//! The browser front-end reports events to this server and applies the
//! directives it gets back. Everything is JSON over localhost; CORS is open
//! so the exam page can call the agent from whatever origin it is served on.

use crate::core::AckOutcome;
use crate::engine::{Directive, EngineStatus, ProctorEngine};
use crate::error::MonitorError;
use crate::signal::ProctorEvent;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

pub struct ServerState {
    engine: RwLock<ProctorEngine>,
}

impl ServerState {
    pub fn new(engine: ProctorEngine) -> Self {
        Self {
            engine: RwLock::new(engine),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    directives: Vec<Directive>,
    state: EngineStatus,
}

#[derive(Debug, Serialize)]
struct AcknowledgeResponse {
    outcome: &'static str,
    state: EngineStatus,
}

#[derive(Debug, Deserialize)]
struct CalibrationRequest {
    point_index: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, err: impl std::fmt::Display) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
    })
}

async fn ingest(
    State(state): State<Arc<ServerState>>,
    Json(events): Json<Vec<ProctorEvent>>,
) -> Json<IngestResponse> {
    let mut engine = state.engine.write().await;
    let mut directives = Vec::new();
    for event in &events {
        directives.extend(engine.handle(event));
    }
    debug!(events = events.len(), directives = directives.len(), "batch ingested");
    Json(IngestResponse {
        directives,
        state: engine.status(Utc::now()),
    })
}

async fn acknowledge(State(state): State<Arc<ServerState>>) -> Json<AcknowledgeResponse> {
    let mut engine = state.engine.write().await;
    let outcome = match engine.acknowledge() {
        AckOutcome::Cleared => "cleared",
        AckOutcome::Retained => "retained",
        AckOutcome::Invalid => "invalid",
    };
    Json(AcknowledgeResponse {
        outcome,
        state: engine.status(Utc::now()),
    })
}

async fn calibration(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<CalibrationRequest>,
) -> Response {
    let mut engine = state.engine.write().await;
    match engine.record_calibration_sample(request.point_index) {
        Ok(progress) => Json(progress).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e),
    }
}

async fn session_reset(State(state): State<Arc<ServerState>>) -> Json<EngineStatus> {
    let mut engine = state.engine.write().await;
    engine.reset();
    Json(engine.status(Utc::now()))
}

async fn status(State(state): State<Arc<ServerState>>) -> Json<EngineStatus> {
    let engine = state.engine.read().await;
    Json(engine.status(Utc::now()))
}

/// Build the router with open CORS for the exam front-end.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/ingest", post(ingest))
        .route("/acknowledge", post(acknowledge))
        .route("/calibration", post(calibration))
        .route("/session/reset", post(session_reset))
        .layer(cors)
        .with_state(state)
}

/// Run the agent server until the shutdown signal fires.
///
/// In fallback mode (no gaze tracking) a background task drives the
/// inactivity clock at 1 Hz; the directives it produces are delivered to the
/// front-end with the next ingest response via the shared engine state.
pub async fn run(
    engine: ProctorEngine,
    addr: SocketAddr,
    shutdown: oneshot::Receiver<()>,
) -> Result<(), MonitorError> {
    let fallback = !engine.config().guards.gaze_tracking;
    let state = Arc::new(ServerState::new(engine));
    let router = build_router(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "agent server listening");

    let ticker = fallback.then(|| {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                let mut engine = state.engine.write().await;
                for directive in engine.tick(Utc::now()) {
                    info!(?directive, "inactivity directive");
                }
            }
        })
    });

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = shutdown.await;
            info!("shutdown signal received");
        })
        .await?;

    if let Some(ticker) = ticker {
        ticker.abort();
    }
    Ok(())
}
