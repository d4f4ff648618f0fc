//! synth-api — HTTP surface of the synthetic publication monitor.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/__health` | Health document derived from the latest outcome |
//! | GET | `/__gtg` | Good-to-go: 200 or 503 |
//! | GET | `/history` | Rolling history, most recent first |
//! | POST, GET | `/forcePublish` | Run one publish cycle now |
//!
//! Health and history only read the `History`; they never start a cycle.

pub mod handlers;

use axum::Router;
use axum::routing::get;
use synth_pipeline::Monitor;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub monitor: Monitor,
}

/// Build the complete router.
pub fn build_router(monitor: Monitor) -> Router {
    let state = ApiState { monitor };

    Router::new()
        .route("/__health", get(handlers::health))
        .route("/__gtg", get(handlers::good_to_go))
        .route("/history", get(handlers::history))
        .route(
            "/forcePublish",
            get(handlers::force_publish).post(handlers::force_publish),
        )
        .with_state(state)
}
