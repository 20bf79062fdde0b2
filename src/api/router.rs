//! Router setup and configuration.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{challenge, health};
use crate::api::state::AppState;

/// Create the challenge bridge router.
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics));

    // Widget page and the callbacks it posts back
    let challenge_routes = Router::new()
        .route("/{session}", get(challenge::page))
        .route("/{session}/verified", post(challenge::verified))
        .route("/{session}/error", post(challenge::error))
        .route("/{session}/expired", post(challenge::expired))
        .route("/{session}/cancel", post(challenge::cancel));

    Router::new()
        .merge(health_routes)
        .nest("/challenge", challenge_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
