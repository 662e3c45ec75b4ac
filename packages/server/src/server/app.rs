//! Application setup and router configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{health_handler, storage_event_handler};

/// One pipeline pass makes two classifier calls plus storage round trips;
/// anything beyond this is stuck and better handed back for redelivery.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the router with all routes and middleware.
pub fn build_app(deps: Arc<ServerDeps>) -> Router {
    let state = AppState { deps };

    Router::new()
        .route("/health", get(health_handler))
        .route("/events/storage", post(storage_event_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}
