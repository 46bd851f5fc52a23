//! curfewd entry point.
//!
//! Initialises tracing, loads `CURFEW_SERVER_*` settings and the engine
//! config, converges the backends once at startup and serves the policy API.

use anyhow::{Context, Result};
use curfew_common::PolicyServerConfig;
use curfew_engine::infra::config::YamlConfigStore;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server: PolicyServerConfig = envy::prefixed("CURFEW_SERVER_")
        .from_env()
        .context("failed to load config from CURFEW_SERVER_* env vars")?;

    let store = match &server.config {
        Some(path) => YamlConfigStore::with_path(path.clone()),
        None => YamlConfigStore::new()?,
    };
    let config = store.load()?;
    info!(
        listen_addr = %server.listen_addr,
        config = %store.path().display(),
        backends = config.backends.len(),
        "configuration loaded"
    );

    let engine = curfew_engine::infra::start(&config).await?;
    // Bring the backends in line with the stored policy before serving.
    let ticket = engine.service.reconcile();
    info!(ticket, "startup reconciliation requested");

    let app = curfew_policy_server::router(engine.service.clone()).layer(TraceLayer::new_for_http());
    let listener = tokio::net::TcpListener::bind(server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", server.listen_addr))?;
    info!("policy API ready on http://{}", server.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    engine.shutdown().await?;
    info!("curfewd shut down");
    Ok(())
}

/// Wait for Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
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
    info!("received shutdown signal");
}
