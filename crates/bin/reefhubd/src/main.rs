//! # reefhubd — reefhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialize logging from the configured filter
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the stores and the virtual hardware (adapters)
//! - Construct the subsystem services and register them
//! - Spawn the timer scheduler
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT): stop the scheduler and cancel
//!   in-flight macro runs
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use reefhub_adapter_http_axum::router;
use reefhub_adapter_http_axum::state::AppState;
use reefhub_adapter_storage_sqlite_sqlx::{SqliteEntityStore, SqliteUsageStore};
use reefhub_adapter_virtual::{VirtualDriver, VirtualProbe};
use reefhub_app::ports::SystemClock;
use reefhub_app::registry::SubsystemRegistry;
use reefhub_app::scheduler::run_scheduler;
use reefhub_app::services::{
    AtoService, DoserService, EquipmentService, MacroService, TemperatureService, TimerService,
};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Database
    let db = reefhub_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("failed to open database")?;
    let pool = db.pool().clone();

    // Hardware
    let driver = Arc::new(
        VirtualDriver::new()
            .with_realtime(config.hardware.realtime)
            .with_faulty_channels(config.hardware.faulty_channels.iter().copied()),
    );
    let probe = Arc::new(VirtualProbe::new());

    // Cancelling this token stops the scheduler and every in-flight run.
    let shutdown = CancellationToken::new();

    // Services
    let dosers = Arc::new(DoserService::new(
        SqliteEntityStore::new(pool.clone()),
        Arc::clone(&driver),
        SqliteUsageStore::new(pool.clone()),
        SystemClock,
    ));
    let atos = Arc::new(AtoService::new(
        SqliteEntityStore::new(pool.clone()),
        Arc::clone(&driver),
    ));
    let equipment = Arc::new(EquipmentService::new(
        SqliteEntityStore::new(pool.clone()),
        Arc::clone(&driver),
    ));
    let temperatures = Arc::new(TemperatureService::new(
        SqliteEntityStore::new(pool.clone()),
        probe,
    ));
    let macros = Arc::new(MacroService::new(
        SqliteEntityStore::new(pool.clone()),
        config.macro_engine(),
        shutdown.child_token(),
    ));
    let timers = Arc::new(TimerService::new(
        SqliteEntityStore::new(pool),
        Arc::clone(&macros),
        shutdown.child_token(),
    ));

    let registry = Arc::new(
        SubsystemRegistry::builder()
            .register(dosers)
            .register(atos)
            .register(equipment)
            .register(temperatures)
            .register(macros.clone())
            .register(timers.clone())
            .build()?,
    );
    tracing::info!(subsystems = ?registry.names(), "subsystem registry ready");

    // Scheduler
    let scheduler = tokio::spawn(run_scheduler(
        Arc::clone(&timers),
        Arc::clone(&registry),
        SystemClock,
        config.scheduler(),
        shutdown.child_token(),
    ));

    // HTTP
    let app = router::build(AppState::new(registry, macros, timers));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "reefhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("server error")?;

    shutdown.cancel();
    if let Err(err) = scheduler.await {
        tracing::warn!(error = %err, "scheduler task ended abnormally");
    }
    tracing::info!("reefhubd stopped");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM and cancel `shutdown`.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    tracing::info!("shutdown signal received");
    shutdown.cancel();
}
