//! HTTP server lifecycle
//!
//! Binds the listener, serves the router, and on SIGINT/SIGTERM cancels the
//! shared shutdown token so background tasks and in-flight provider requests
//! stop together.

use std::net::SocketAddr;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use authweb_api::http::SessionManager;
use authweb_api::{create_router, AppState};
use authweb_core::bootstrap::Services;
use authweb_core::Config;

pub struct AuthWebServer {
    config: Config,
    services: Services,
}

impl AuthWebServer {
    #[must_use]
    pub const fn new(config: Config, services: Services) -> Self {
        Self { config, services }
    }

    /// Serve until a shutdown signal arrives
    pub async fn run(self) -> anyhow::Result<()> {
        let shutdown = CancellationToken::new();

        let sessions = SessionManager::new(&self.config.session);
        let purge_task = sessions.spawn_purge_task(shutdown.child_token());

        let state = AppState::new(&self.services, sessions, shutdown.clone());
        let router = create_router(state);

        let http_address = self.config.http_address();
        let http_addr: SocketAddr = http_address
            .parse()
            .with_context(|| format!("Invalid HTTP address '{http_address}'"))?;
        let listener = tokio::net::TcpListener::bind(http_addr)
            .await
            .with_context(|| format!("Failed to bind HTTP address {http_addr}"))?;

        info!("HTTP server listening on {}", http_addr);

        let graceful = {
            let shutdown = shutdown.clone();
            async move {
                shutdown_signal().await;
                info!("Shutdown signal received, starting graceful shutdown...");
                shutdown.cancel();
            }
        };

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(graceful)
            .await;

        shutdown.cancel();
        if let Err(e) = purge_task.await {
            error!("Session purge task failed: {}", e);
        }

        served.context("HTTP server error")?;
        info!("HTTP server shut down gracefully");
        Ok(())
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}
