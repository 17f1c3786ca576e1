// HTTP/REST API module

pub mod error;
pub mod health;
pub mod oauth2;
pub mod session;

use std::sync::Arc;

use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use authweb_core::bootstrap::Services;
use authweb_core::service::OAuth2Service;

pub use error::{AppError, AppResult};
pub use session::{SessionHandle, SessionManager};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub oauth2_service: Arc<OAuth2Service>,
    pub sessions: SessionManager,
    /// Cancelled on shutdown; in-flight provider requests hang off it
    pub shutdown: CancellationToken,
}

impl AppState {
    #[must_use]
    pub fn new(services: &Services, sessions: SessionManager, shutdown: CancellationToken) -> Self {
        Self {
            oauth2_service: Arc::clone(&services.oauth2_service),
            sessions,
            shutdown,
        }
    }
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::create_health_router())
        .merge(oauth2::create_oauth2_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
