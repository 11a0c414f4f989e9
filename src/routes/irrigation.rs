//! Manual irrigation command.

use axum::{extract::State, routing::post, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::AppState;

// ---

pub fn router() -> Router<AppState> {
    Router::new().route("/api/irrigation/manual", post(activate_manual))
}

#[derive(Serialize)]
struct ManualResponse {
    success: bool,
    command: &'static str,
    message: String,
    irrigation_active: bool,
    context_version: u64,
    /// Moment the override lapses unless renewed.
    expires_at: DateTime<Utc>,
    timestamp: DateTime<Utc>,
}

async fn activate_manual(State(state): State<AppState>) -> Json<ManualResponse> {
    // ---
    let now = Utc::now();
    let activation = state.station.activate_manual(now);
    let window = i64::from(state.config.manual_override_secs);
    info!(
        "POST /api/irrigation/manual - override active for {}s (context v{})",
        window, activation.context_version
    );

    Json(ManualResponse {
        success: true,
        command: "IRRIGATION:MANUAL",
        message: format!("Manual irrigation activated for {} minutes", window / 60),
        irrigation_active: true,
        context_version: activation.context_version,
        expires_at: activation.activated_at + chrono::Duration::seconds(window),
        timestamp: now,
    })
}
