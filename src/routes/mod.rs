//! Route gateway: merges every subrouter and attaches the shared state.

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json, Router};
use serde::Serialize;
use sqlx::PgPool;

use crate::{Config, Station};

mod health;
mod history;
mod irrigation;
mod losses;
mod sensors;

// ---

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub station: Arc<Station>,
    /// `None` when no database is configured.
    pub pool: Option<PgPool>,
    pub config: Config,
}

pub fn router(station: Arc<Station>, pool: Option<PgPool>, config: Config) -> Router {
    // ---
    Router::new()
        .merge(sensors::router())
        .merge(irrigation::router())
        .merge(history::router())
        .merge(losses::router())
        .merge(health::router())
        .with_state(AppState {
            station,
            pool,
            config,
        })
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

/// JSON error body with `success: false`.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    // ---
    (
        status,
        Json(ErrorBody {
            success: false,
            error: message.into(),
        }),
    )
        .into_response()
}
