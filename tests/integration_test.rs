use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, NaiveDateTime};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use agrosense::{routes, schema, Config, Station};

#[derive(Debug, Deserialize)]
struct ChartPoint {
    /// `%Y-%m-%d %H:%M:%S`, no offset
    timestamp: String,
    time: String,
    moisture: f64,
    ph: f64,
    irrigation: bool,
}

/// Serve a fresh station without a database on an ephemeral port.
async fn spawn_app() -> Result<String> {
    spawn_app_with(None).await
}

async fn spawn_app_with(pool: Option<PgPool>) -> Result<String> {
    // ---
    let station = Arc::new(Station::new(50, Duration::seconds(300), Some(11)));
    let app = routes::router(station, pool, Config::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, app).await });

    Ok(format!("http://{}", addr))
}

#[tokio::test]
async fn health_reports_ok() -> Result<()> {
    // ---
    let base = tokio_test::assert_ok!(spawn_app().await);
    let body: Value = Client::new()
        .get(format!("{}/health", base))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["samples"], 0);
    assert_eq!(body["database"], false);
    Ok(())
}

#[tokio::test]
async fn sensor_readings_feed_history() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    for _ in 0..3 {
        let body: Value = client
            .get(format!("{}/api/sensors", base))
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(body["success"], true);

        let quality = body["sensors"]["soil"]["quality"].as_f64().unwrap_or(-1.0);
        assert!(
            (20.0..=100.0).contains(&quality),
            "soil quality {} out of range",
            quality
        );
        let scenario = body["weather"]["cycle"].as_u64().unwrap_or(99);
        assert!(scenario < 6, "scenario index {} out of range", scenario);
    }

    let points: Vec<ChartPoint> = client
        .get(format!("{}/api/history?hours=24", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(points.len(), 3);
    let stamps = points
        .iter()
        .map(|p| NaiveDateTime::parse_from_str(&p.timestamp, "%Y-%m-%d %H:%M:%S"))
        .collect::<Result<Vec<_>, _>>()?;
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]), "history not chronological");
    for p in &points {
        assert_eq!(p.time.len(), 5, "time should be HH:MM, got {}", p.time);
        assert!((0.0..=100.0).contains(&p.moisture));
        assert!((0.0..=14.0).contains(&p.ph));
    }

    let stats: Value = client
        .get(format!("{}/api/statistics", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(stats["total_records"], 3);
    let activations = stats["irrigation"]["activations"].as_u64().unwrap_or(99);
    let irrigated = points.iter().filter(|p| p.irrigation).count() as u64;
    assert_eq!(activations, irrigated);

    let alerts: Value = client
        .get(format!("{}/api/alerts", base))
        .send()
        .await?
        .json()
        .await?;
    let listed = alerts["alerts"].as_array().map(Vec::len).unwrap_or(usize::MAX);
    assert_eq!(alerts["total"].as_u64(), Some(listed as u64));
    assert!(!alerts["last_checked"].is_null());

    Ok(())
}

#[tokio::test]
async fn weather_does_not_touch_history() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let body: Value = client
        .get(format!("{}/api/weather", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["success"], true);
    let next_change = body["weather"]["next_change_in"].as_u64().unwrap_or(0);
    assert!((1..=10).contains(&next_change));

    let points: Vec<ChartPoint> = client
        .get(format!("{}/api/history", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(points.is_empty());
    Ok(())
}

#[tokio::test]
async fn manual_irrigation_overrides_cycle() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let body: Value = client
        .post(format!("{}/api/irrigation/manual", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["command"], "IRRIGATION:MANUAL");
    assert_eq!(body["irrigation_active"], true);
    assert_eq!(body["context_version"], 1);

    let body: Value = client
        .get(format!("{}/api/sensors", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["sensors"]["irrigation"]["active"], true);
    assert_eq!(body["diagnostics"]["status"], "ACTIVE_MANUAL");

    let body: Value = client
        .get(format!("{}/api/dashboard", base))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["justification"]["action"], "ACTIVATE");
    assert_eq!(body["data"]["justification"]["priority"], "HIGH");

    Ok(())
}

#[tokio::test]
async fn history_rejects_invalid_window() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    for hours in ["0", "-3", "1000"] {
        let response = client
            .get(format!("{}/api/history?hours={}", base, hours))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "hours={}", hours);
        let body: Value = response.json().await?;
        assert_eq!(body["success"], false);
    }
    Ok(())
}

#[tokio::test]
async fn losses_unavailable_without_database() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/losses", base))
        .json(&json!({
            "potential_tonnes": 1000.0,
            "harvested_tonnes": 900.0,
            "price_per_tonne": 120.0
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = client.get(format!("{}/api/losses", base)).send().await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = client
        .get(format!("{}/api/losses/{}", base, Uuid::new_v4()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = client
        .delete(format!("{}/api/losses/{}", base, Uuid::new_v4()))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    Ok(())
}

#[tokio::test]
async fn invalid_loss_input_is_rejected() -> Result<()> {
    // ---
    let base = spawn_app().await?;
    let client = Client::new();

    let bad_inputs = [
        json!({"potential_tonnes": 100.0, "harvested_tonnes": 120.0, "price_per_tonne": 10.0}),
        json!({"potential_tonnes": 0.0, "harvested_tonnes": 0.0, "price_per_tonne": 10.0}),
        json!({"potential_tonnes": 100.0, "harvested_tonnes": 50.0, "price_per_tonne": 10.0,
               "checklist": {"weather_luck": false}}),
    ];
    for input in &bad_inputs {
        let response = client
            .post(format!("{}/api/losses", base))
            .json(input)
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "input {}", input);
        let body: Value = response.json().await?;
        assert_eq!(body["success"], false);
    }
    Ok(())
}

#[tokio::test]
async fn loss_analysis_lifecycle() -> Result<()> {
    // ---
    let Ok(db_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping loss_analysis_lifecycle");
        return Ok(());
    };

    let pool = PgPoolOptions::new().max_connections(2).connect(&db_url).await?;
    schema::create_schema(&pool).await?;
    let base = spawn_app_with(Some(pool)).await?;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/losses", base))
        .json(&json!({
            "potential_tonnes": 20000.0,
            "harvested_tonnes": 18500.0,
            "price_per_tonne": 150.0,
            "checklist": {"ideal_speed": false, "dry_soil": true}
        }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await?;
    assert_eq!(created["result"]["loss_percent"], 7.5);
    let id = created["id"].as_str().unwrap_or_default().to_string();
    let detail_url = format!("{}/api/losses/{}", base, id);

    let detail: Value = client.get(&detail_url).send().await?.json().await?;
    assert_eq!(detail["id"], id.as_str());
    assert_eq!(detail["result"]["financial_loss"], 225000.0);
    assert_eq!(detail["checklist"]["dry_soil"], true);
    assert_eq!(detail["recommendations"][0]["key"], "ideal_speed");

    let listed: Vec<Value> = client
        .get(format!("{}/api/losses", base))
        .send()
        .await?
        .json()
        .await?;
    assert!(listed.iter().any(|a| a["id"] == id.as_str()), "new analysis not listed");

    let response = client.delete(&detail_url).send().await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client.delete(&detail_url).send().await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client.get(&detail_url).send().await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    Ok(())
}
