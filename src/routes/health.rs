// src/routes/health.rs
//! Health check endpoint for the agrosense service.
//!
//! `/health` is polled by container orchestrators and CI to verify that the
//! service is up. Besides liveness it reports how many samples the station
//! currently holds and whether harvest loss storage is available, without
//! touching the database.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::AppState;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    samples: usize,
    history_capacity: usize,
    database: bool,
}

/// Handle `GET /health`.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    // ---
    Json(HealthResponse {
        status: "ok",
        samples: state.station.history_len(),
        history_capacity: state.config.history_capacity,
        database: state.pool.is_some(),
    })
}

/// Subrouter containing the `/health` route.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
