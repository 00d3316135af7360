use std::sync::Arc;

use anyhow::Result;

use skyroute::config::CONFIG;
use skyroute::map::{PathDisplay, SharedLayers};
use skyroute::sim::{SimulationEngine, SimulationUpdate, TokioClock};
use skyroute::util::setup_logging;
use skyroute::web_server::{AppState, SharedEngine, WebServer};
use tokio::signal;
use tokio::sync::{broadcast, oneshot, watch, Mutex};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging(&CONFIG.general.log_level);
    info!("Application starting...");
    info!("Vehicle: {}", &CONFIG.general.vehicle_id);

    // Create a shutdown signal channel
    let (shutdown_tx, _) = broadcast::channel(1);

    let layers = SharedLayers::new();
    {
        let mut layers = layers.write();
        for base in &CONFIG.mission.bases {
            layers.add_base(base.clone());
        }
    }

    let mut display = PathDisplay::new(layers.clone(), CONFIG.animation.tick_interval());
    match display.show_path(&CONFIG.mission.path) {
        Some(mode) => info!("Mission path decorated as {:?}", mode),
        None => info!("Mission path has no decoration"),
    }

    let (update_tx, update_rx) = watch::channel(None);
    let engine: SharedEngine = Arc::new(Mutex::new(SimulationEngine::with_clock(
        TokioClock,
        CONFIG.simulation.tick_interval(),
    )));
    let completion = start_simulation(&engine, &layers, update_tx).await;

    let web_server = WebServer::new(
        AppState {
            engine: Arc::clone(&engine),
            updates: update_rx,
            layers: layers.clone(),
        },
        CONFIG.web.host.clone(),
        CONFIG.web.port,
    );
    let web_handle = spawn_web_server(web_server, shutdown_tx.subscribe()).await;

    tokio::spawn(async move {
        if completion.await.is_ok() {
            info!("Mission simulation complete");
        }
    });

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received, stopping services..."),
        Err(err) => error!("Failed to listen for shutdown signal: {}", err),
    }

    engine.lock().await.stop();
    display.clear_path();
    if shutdown_tx.send(()).is_err() {
        warn!("No services were listening for shutdown");
    }

    if let Err(e) = web_handle.await {
        error!("Web server join error: {}", e);
    }

    info!("All services stopped, shutting down");

    Ok(())
}

async fn start_simulation(
    engine: &SharedEngine,
    layers: &SharedLayers,
    updates: watch::Sender<Option<SimulationUpdate>>,
) -> oneshot::Receiver<()> {
    let (done_tx, done_rx) = oneshot::channel();
    let layers = layers.clone();
    let drone_id = CONFIG.general.vehicle_id.clone();
    let drone_name = CONFIG.general.vehicle_name.clone();

    engine.lock().await.start(
        CONFIG.mission.path.clone(),
        CONFIG.simulation.duration_secs,
        CONFIG.simulation.initial_telemetry,
        move |update| {
            layers
                .write()
                .upsert_drone(&drone_id, &drone_name, update.current_position);
            updates.send_replace(Some(update));
        },
        move || {
            let _ = done_tx.send(());
        },
    );
    done_rx
}

async fn spawn_web_server(
    server: WebServer,
    shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = server.start(shutdown).await {
            error!("Web server error: {:#}", e);
        }
    })
}
