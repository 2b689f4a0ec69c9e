//! Axum router wiring for the health endpoints.

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(ops::health))
        .route("/health/data", get(ops::health_data))
        .with_state(state)
}
