//! `agrosense`: simulated field station for precision irrigation.
//!
//! The crate generates correlated soil, nutrient and weather readings on a
//! fixed scenario cycle, decides whether irrigation should run, keeps a rolling
//! history with statistics and alerts, and serves all of it over HTTP.
//!
//! Module layout:
//! - `simulator` / `irrigation` – reading generation and the irrigation context
//! - `history` / `station` – rolling buffer and the shared, locked state
//! - `advice` / `losses` – dashboard justification and harvest loss analysis
//! - `routes` – the axum gateway; `config` and `schema` support the binary

pub mod advice;
pub mod config;
pub mod history;
pub mod irrigation;
pub mod losses;
pub mod models;
pub mod routes;
pub mod schema;
pub mod simulator;
pub mod station;

pub use config::Config;
pub use models::{ChartPoint, Sample, WeatherReading};
pub use station::Station;
