//! Live readings: dashboard, sensors and weather.
//!
//! `/api/dashboard` and `/api/sensors` generate a fresh reading and record it
//! in the history. `/api/weather` only draws the weather and records nothing.

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use super::AppState;
use crate::advice::{self, Justification};
use crate::models::{Sample, WeatherReading};
use crate::simulator::{Diagnostics, Reading};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/dashboard", get(dashboard))
        .route("/api/sensors", get(sensors))
        .route("/api/weather", get(weather))
}

#[derive(Serialize)]
struct DashboardData {
    weather: WeatherReading,
    sensors: Sample,
    diagnostics: Diagnostics,
    justification: Justification,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct DashboardResponse {
    success: bool,
    data: DashboardData,
}

#[derive(Serialize)]
struct SensorsResponse {
    success: bool,
    sensors: Sample,
    diagnostics: Diagnostics,
    weather: WeatherReading,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
struct WeatherResponse {
    success: bool,
    weather: WeatherReading,
    timestamp: DateTime<Utc>,
}

async fn dashboard(State(state): State<AppState>) -> Json<DashboardResponse> {
    // ---
    info!("GET /api/dashboard");
    let now = Utc::now();

    let reading = state.station.sample(now);
    let manual_since = state.station.manual_since(now);
    let justification = advice::justify(&reading, manual_since);
    debug!(
        "Dashboard reading {} ({})",
        reading.sample.id, reading.diagnostics.cycle_label
    );

    let Reading {
        weather,
        sample,
        diagnostics,
    } = reading;
    Json(DashboardResponse {
        success: true,
        data: DashboardData {
            weather,
            sensors: sample,
            diagnostics,
            justification,
            timestamp: now,
        },
    })
}

async fn sensors(State(state): State<AppState>) -> Json<SensorsResponse> {
    // ---
    info!("GET /api/sensors");
    let now = Utc::now();

    let Reading {
        weather,
        sample,
        diagnostics,
    } = state.station.sample(now);
    debug!("Recorded sample {} ({})", sample.id, diagnostics.cycle_label);

    Json(SensorsResponse {
        success: true,
        sensors: sample,
        diagnostics,
        weather,
        timestamp: now,
    })
}

async fn weather(State(state): State<AppState>) -> Json<WeatherResponse> {
    // ---
    info!("GET /api/weather");
    let now = Utc::now();
    Json(WeatherResponse {
        success: true,
        weather: state.station.weather(now),
        timestamp: now,
    })
}
