//! tconnect connector
//!
//! - Runs the tconnectsync engine on a detached background thread
//! - Counts every record the engine pushes (hooked uploader)
//! - Serves `/health` and `/health/data` on 0.0.0.0:$PORT

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use tconnect_connector::config::{self, CredentialStatus};
use tconnect_connector::engine::{ProcessEngine, RelayUploader};
use tconnect_connector::supervisor::SyncSupervisor;
use tconnect_connector::{app_state, router};
use tconnect_core::error::{ConnectorError, Result};
use tconnect_core::InterceptingUploader;

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries relayed records; logs go to stderr.
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let env = |key: &str| std::env::var(key).ok();
    let cfg = config::load(env)?;
    let credentials = CredentialStatus::from_env(env);
    let listen = cfg.server.listen_addr();

    tracing::info!("initializing connector");
    let state = app_state::AppState::new(cfg);

    let engine = Arc::new(ProcessEngine::new(state.cfg().sync.command.clone()));
    let uploader = Arc::new(InterceptingUploader::new(RelayUploader::stdout(), state.metrics()));
    let sync = SyncSupervisor::new(&state.cfg().sync, credentials, engine, uploader).start();

    let app = router::build_router(state);

    tracing::info!(%listen, "tconnect-connector starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ConnectorError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ConnectorError::Internal(format!("server failed: {e}")))?;

    tracing::info!(sync_state = ?sync.state(), "shutting down connector");
    sync.detach();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "listening for ctrl-c failed");
        std::future::pending::<()>().await;
    }
}
