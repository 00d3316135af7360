use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::{broadcast, watch, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::map::{MapLayers, SharedLayers};
use crate::sim::{SimulationEngine, SimulationStatus, SimulationUpdate};

pub type SharedEngine = Arc<Mutex<SimulationEngine>>;

#[derive(Clone)]
pub struct AppState {
    pub engine: SharedEngine,
    pub updates: watch::Receiver<Option<SimulationUpdate>>,
    pub layers: SharedLayers,
}

#[derive(Debug, Serialize)]
pub struct SimulationState {
    pub status: SimulationStatus,
    pub update: Option<SimulationUpdate>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: SimulationStatus,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/simulation/state", get(simulation_state))
        .route("/api/simulation/pause", post(pause_simulation))
        .route("/api/simulation/resume", post(resume_simulation))
        .route("/api/simulation/stop", post(stop_simulation))
        .route("/api/map/layers", get(map_layers))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn simulation_state(State(state): State<AppState>) -> Json<SimulationState> {
    let status = state.engine.lock().await.status();
    let update = state.updates.borrow().clone();
    Json(SimulationState { status, update })
}

async fn pause_simulation(State(state): State<AppState>) -> Json<StatusResponse> {
    let mut engine = state.engine.lock().await;
    engine.pause();
    Json(StatusResponse {
        status: engine.status(),
    })
}

async fn resume_simulation(State(state): State<AppState>) -> Json<StatusResponse> {
    let mut engine = state.engine.lock().await;
    engine.resume();
    Json(StatusResponse {
        status: engine.status(),
    })
}

async fn stop_simulation(State(state): State<AppState>) -> Json<StatusResponse> {
    let mut engine = state.engine.lock().await;
    engine.stop();
    Json(StatusResponse {
        status: engine.status(),
    })
}

async fn map_layers(State(state): State<AppState>) -> Json<MapLayers> {
    Json(state.layers.snapshot())
}

pub struct WebServer {
    state: AppState,
    host: String,
    port: u16,
}

impl WebServer {
    pub fn new(state: AppState, host: impl Into<String>, port: u16) -> Self {
        Self {
            state,
            host: host.into(),
            port,
        }
    }

    /// Serves until `shutdown` fires.
    pub async fn start(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        let app = router(self.state.clone());
        let address = format!("{}:{}", self.host, self.port);

        let listener = tokio::net::TcpListener::bind(&address)
            .await
            .context(format!("Failed to bind to {}", address))?;
        info!("Starting web server on http://{}", address);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                info!("Shutting down web server...");
            })
            .await
            .context("Failed to serve")?;
        Ok(())
    }
}
