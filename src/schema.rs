//! Database schema management for `agrosense`.
//!
//! Ensures the harvest loss table exists before serving requests.
//! Applied once on startup from `main.rs`, and only when a database is configured.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create or update the database schema (idempotent).
///
/// Creates the `harvest_loss` table holding computed loss analyses. Safe to
/// call on every startup; no-op if objects already exist.
///
/// Errors are propagated if any SQL execution fails.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    // One row per analysis served by `/api/losses`
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS harvest_loss (
            id                UUID             PRIMARY KEY,
            analysed_at       TIMESTAMPTZ      NOT NULL,
            potential_tonnes  DOUBLE PRECISION NOT NULL,
            harvested_tonnes  DOUBLE PRECISION NOT NULL,
            price_per_tonne   DOUBLE PRECISION NOT NULL,
            lost_tonnes       DOUBLE PRECISION NOT NULL,
            loss_percent      DOUBLE PRECISION NOT NULL,
            financial_loss    DOUBLE PRECISION NOT NULL,
            checklist         TEXT             NOT NULL DEFAULT '{}'
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // History listing is newest first
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_harvest_loss_analysed_at
            ON harvest_loss (analysed_at DESC);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
