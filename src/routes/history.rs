//! Rolling history views: chart series, statistics and alerts.

use axum::{
    extract::Query, extract::State, http::StatusCode, response::IntoResponse, response::Response,
    routing::get, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{error_response, AppState};
use crate::history::{Statistics, STATS_WINDOW_HOURS};
use crate::station::AlertReport;

/// Widest chart window a client may request.
const MAX_WINDOW_HOURS: i64 = 24 * 7;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/history", get(history))
        .route("/api/statistics", get(statistics))
        .route("/api/alerts", get(alerts))
}

/// Query parameters for `/api/history`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Window length in hours (default 24).
    hours: Option<i64>,
}

async fn history(Query(params): Query<HistoryQuery>, State(state): State<AppState>) -> Response {
    // ---
    let hours = params.hours.unwrap_or(STATS_WINDOW_HOURS);
    info!("GET /api/history - window {}h", hours);

    if !(1..=MAX_WINDOW_HOURS).contains(&hours) {
        warn!("Rejected history window of {}h", hours);
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("hours must be between 1 and {}", MAX_WINDOW_HOURS),
        );
    }

    let points = state.station.series(Utc::now(), hours);
    debug!("Returning {} chart points", points.len());
    (StatusCode::OK, Json(points)).into_response()
}

async fn statistics(State(state): State<AppState>) -> Json<Statistics> {
    // ---
    info!("GET /api/statistics");
    Json(state.station.statistics())
}

async fn alerts(State(state): State<AppState>) -> Json<AlertReport> {
    // ---
    info!("GET /api/alerts");
    Json(state.station.alerts())
}
