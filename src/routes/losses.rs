//! Harvest loss analyses: create, list and delete.
//!
//! Analyses are persisted in the `harvest_loss` table. Invalid input is
//! rejected with `400` before storage is consulted; past that point, without a
//! configured database every route answers `503 Service Unavailable`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{error_response, AppState};
use crate::losses::{
    recommendations, ChecklistAnswers, LossAnalysis, LossBreakdown, NewLossAnalysis,
};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/api/losses", get(list).post(create))
        .route("/api/losses/{id}", get(show).delete(remove))
}

fn require_pool(state: &AppState) -> Result<&PgPool, Response> {
    // ---
    state.pool.as_ref().ok_or_else(|| {
        warn!("Harvest loss request rejected: no database configured");
        error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "harvest loss storage is not configured",
        )
    })
}

async fn create(State(state): State<AppState>, Json(input): Json<NewLossAnalysis>) -> Response {
    // ---
    info!("POST /api/losses");
    let analysis = match input.analyse(Utc::now()) {
        Ok(analysis) => analysis,
        Err(e) => {
            debug!("Invalid loss analysis: {}", e);
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let pool = match require_pool(&state) {
        Ok(pool) => pool,
        Err(response) => return response,
    };

    if let Err(e) = insert_analysis(pool, &analysis).await {
        error!("Failed to store loss analysis: {}", e);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to store analysis",
        );
    }

    info!(
        "Stored loss analysis {} ({:.1}% lost)",
        analysis.id, analysis.result.loss_percent
    );
    (StatusCode::CREATED, Json(analysis)).into_response()
}

async fn list(State(state): State<AppState>) -> Response {
    // ---
    info!("GET /api/losses");
    let pool = match require_pool(&state) {
        Ok(pool) => pool,
        Err(response) => return response,
    };

    match fetch_analyses(pool).await {
        Ok(analyses) => (StatusCode::OK, Json(analyses)).into_response(),
        Err(e) => {
            error!("Failed to list loss analyses: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch data")
        }
    }
}

async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    // ---
    info!("GET /api/losses/{}", id);
    let pool = match require_pool(&state) {
        Ok(pool) => pool,
        Err(response) => return response,
    };

    match fetch_analysis(pool, id).await {
        Ok(Some(analysis)) => (StatusCode::OK, Json(analysis)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("analysis {} not found", id)),
        Err(e) => {
            error!("Failed to fetch loss analysis {}: {}", id, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch data")
        }
    }
}

async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    // ---
    info!("DELETE /api/losses/{}", id);
    let pool = match require_pool(&state) {
        Ok(pool) => pool,
        Err(response) => return response,
    };

    match delete_analysis(pool, id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, format!("analysis {} not found", id)),
        Err(e) => {
            error!("Failed to delete loss analysis {}: {}", id, e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to delete analysis",
            )
        }
    }
}

// ---

#[derive(sqlx::FromRow)]
struct LossRow {
    id: Uuid,
    analysed_at: DateTime<Utc>,
    potential_tonnes: f64,
    harvested_tonnes: f64,
    price_per_tonne: f64,
    lost_tonnes: f64,
    loss_percent: f64,
    financial_loss: f64,
    checklist: String,
}

impl From<LossRow> for LossAnalysis {
    fn from(row: LossRow) -> Self {
        // ---
        let checklist: ChecklistAnswers = serde_json::from_str(&row.checklist).unwrap_or_else(|e| {
            warn!("Unreadable checklist on analysis {}: {}", row.id, e);
            ChecklistAnswers::new()
        });
        LossAnalysis {
            id: row.id,
            analysed_at: row.analysed_at,
            potential_tonnes: row.potential_tonnes,
            harvested_tonnes: row.harvested_tonnes,
            price_per_tonne: row.price_per_tonne,
            result: LossBreakdown {
                lost_tonnes: row.lost_tonnes,
                loss_percent: row.loss_percent,
                financial_loss: row.financial_loss,
            },
            recommendations: recommendations(&checklist),
            checklist,
        }
    }
}

async fn insert_analysis(pool: &PgPool, analysis: &LossAnalysis) -> anyhow::Result<()> {
    // ---
    let checklist = serde_json::to_string(&analysis.checklist)?;
    sqlx::query(
        r#"
        INSERT INTO harvest_loss (
            id, analysed_at, potential_tonnes, harvested_tonnes, price_per_tonne,
            lost_tonnes, loss_percent, financial_loss, checklist
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(analysis.id)
    .bind(analysis.analysed_at)
    .bind(analysis.potential_tonnes)
    .bind(analysis.harvested_tonnes)
    .bind(analysis.price_per_tonne)
    .bind(analysis.result.lost_tonnes)
    .bind(analysis.result.loss_percent)
    .bind(analysis.result.financial_loss)
    .bind(checklist)
    .execute(pool)
    .await?;

    Ok(())
}

/// All stored analyses, newest first.
async fn fetch_analyses(pool: &PgPool) -> Result<Vec<LossAnalysis>, sqlx::Error> {
    // ---
    let rows = sqlx::query_as::<_, LossRow>(
        r#"
        SELECT id, analysed_at, potential_tonnes, harvested_tonnes, price_per_tonne,
               lost_tonnes, loss_percent, financial_loss, checklist
        FROM harvest_loss
        ORDER BY analysed_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(LossAnalysis::from).collect())
}

async fn fetch_analysis(pool: &PgPool, id: Uuid) -> Result<Option<LossAnalysis>, sqlx::Error> {
    // ---
    let row = sqlx::query_as::<_, LossRow>(
        r#"
        SELECT id, analysed_at, potential_tonnes, harvested_tonnes, price_per_tonne,
               lost_tonnes, loss_percent, financial_loss, checklist
        FROM harvest_loss
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(LossAnalysis::from))
}

/// Returns `false` when no row matched `id`.
async fn delete_analysis(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    // ---
    let result = sqlx::query("DELETE FROM harvest_loss WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn row(checklist: &str) -> LossRow {
        // ---
        LossRow {
            id: Uuid::new_v4(),
            analysed_at: Utc.with_ymd_and_hms(2025, 5, 12, 9, 30, 0).unwrap(),
            potential_tonnes: 1_000.0,
            harvested_tonnes: 900.0,
            price_per_tonne: 120.0,
            lost_tonnes: 100.0,
            loss_percent: 10.0,
            financial_loss: 12_000.0,
            checklist: checklist.to_string(),
        }
    }

    #[test]
    fn test_row_rebuilds_analysis() {
        // ---
        let stored = row(r#"{"dry_soil":true,"ideal_speed":false,"trained_operator":false}"#);
        let id = stored.id;
        let analysis = LossAnalysis::from(stored);

        assert_eq!(analysis.id, id);
        assert_eq!(analysis.result.lost_tonnes, 100.0);
        assert_eq!(analysis.result.loss_percent, 10.0);
        assert_eq!(analysis.result.financial_loss, 12_000.0);
        assert_eq!(analysis.checklist.len(), 3);
        let keys: Vec<&str> = analysis.recommendations.iter().map(|i| i.key).collect();
        assert_eq!(keys, vec!["ideal_speed", "trained_operator"]);
    }

    #[test]
    fn test_corrupt_checklist_reads_as_empty() {
        // ---
        let analysis = LossAnalysis::from(row("not json"));
        assert!(analysis.checklist.is_empty());
        assert!(analysis.recommendations.is_empty());
        assert_eq!(analysis.potential_tonnes, 1_000.0);
    }
}
