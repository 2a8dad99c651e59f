//! Galaxy Events server binary.
//!
//! Wires the simulation, the tick scheduler and the broadcast server
//! together and runs until interrupted.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize structured logging (tracing)
//! 3. Load the event catalog (built-in or YAML file)
//! 4. Build the simulation and the shared application state
//! 5. Spawn the tick scheduler
//! 6. Serve HTTP and `WebSocket` traffic until Ctrl-C, SIGTERM, or the
//!    scheduler stopping
//! 7. Stop the scheduler

mod error;
mod supervisor;

use std::sync::Arc;

use galaxy_core::config::LogFormat;
use galaxy_core::{GalaxyConfig, GalaxySimulation, RuntimeMode, Scheduler};
use galaxy_observer::{AccessPolicy, AppState, ServerConfig};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Application entry point for the Galaxy Events server.
///
/// # Errors
///
/// Returns an error if configuration is invalid, the catalog cannot be
/// loaded, or the server cannot bind.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so a bad value is
    //    reported through the returned error.
    let config = GalaxyConfig::from_env().map_err(EngineError::from)?;

    // 2. Initialize structured logging.
    init_tracing(config.log_format);
    info!("galaxy-engine starting");

    run(config).await?;

    info!("galaxy-engine shutdown complete");
    Ok(())
}

/// Install the global tracing subscriber.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(config: GalaxyConfig) -> Result<(), EngineError> {
    info!(
        mode = ?config.mode,
        host = %config.server.host,
        port = config.server.port,
        tick_interval_ms = config.simulation.tick_interval_ms,
        trigger_probability = config.simulation.trigger_probability,
        history_limit = config.simulation.history_limit,
        "Configuration loaded"
    );
    if config.mode == RuntimeMode::Production {
        if config.access.api_token.is_none() {
            warn!("API_TOKEN is not set; trigger and WebSocket routes are disabled");
        }
        if config.access.allowed_origins.is_none() {
            warn!("CORS_ORIGINS is not set; cross-origin requests will be rejected");
        }
    }

    // 3. Load the catalog.
    let catalog = Arc::new(config.simulation.load_catalog()?);
    info!(
        event_types = catalog.len(),
        source = config
            .simulation
            .catalog_path
            .as_ref()
            .map_or_else(|| String::from("built-in"), |p| p.display().to_string()),
        "Event catalog loaded"
    );

    // 4. Build the simulation and shared state.
    let simulation = Arc::new(Mutex::new(GalaxySimulation::new(
        catalog,
        config.simulation.trigger_probability,
        config.simulation.history_limit,
    )));
    let policy = AccessPolicy::new(config.mode, &config.access);
    let state = Arc::new(AppState::new(Arc::clone(&simulation), policy));

    // 5. Spawn the scheduler.
    let scheduler = Scheduler::new(
        simulation,
        Arc::clone(&state),
        config.simulation.tick_interval(),
    );
    let (scheduler_guard, scheduler_stopped) =
        supervisor::supervise(tokio::spawn(scheduler.run()));

    // 6. Serve until a shutdown signal arrives or the scheduler dies.
    let shutdown = async move {
        tokio::select! {
            () = shutdown_signal() => {}
            _ = scheduler_stopped => {}
        }
    };
    let server_config = ServerConfig::from(&config.server);
    let served = galaxy_observer::start_server(&server_config, state, shutdown).await;

    // 7. Stop the scheduler whether or not serving succeeded.
    let scheduler_failed = scheduler_guard.stop().await;
    info!("Galaxy scheduler stopped");

    served?;
    if scheduler_failed {
        return Err(EngineError::SchedulerStopped);
    }
    Ok(())
}

/// Resolve on Ctrl-C or, on Unix, SIGTERM.
///
/// A signal that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        () = terminate => info!("Received terminate signal, initiating graceful shutdown"),
    }
}
