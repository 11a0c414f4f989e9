//! Rolling history of recent samples.
//!
//! A bounded FIFO of [`Sample`]s. Every insert recomputes the 24-hour
//! [`Statistics`] snapshot from scratch and rebuilds the alert list from the
//! sample just inserted. Both are derived state; nothing here is persisted.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::{round1, ChartPoint, Sample};

// ---

pub const DEFAULT_CAPACITY: usize = 1000;

/// Window the statistics are computed over.
pub const STATS_WINDOW_HOURS: i64 = 24;

/// Number of trailing values considered for a trend.
const TREND_SPAN: usize = 10;

/// Look-ahead used when checking whether irrigation raised soil moisture.
const EFFICIENCY_LOOKAHEAD: usize = 8;
const EFFICIENCY_WINDOW_SECS: i64 = 2 * 3600;

/// Minutes credited per activation when estimating irrigation time.
const MINUTES_PER_ACTIVATION: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    #[default]
    Stable,
}

/// Classify the direction of the last few values of a metric.
pub fn trend(values: &[f64]) -> Trend {
    // ---
    if values.len() < 2 {
        return Trend::Stable;
    }

    let recent = &values[values.len().saturating_sub(TREND_SPAN)..];
    let diffs: Vec<f64> = recent.windows(2).map(|w| w[1] - w[0]).collect();
    let mean_diff = diffs.iter().sum::<f64>() / diffs.len() as f64;

    if mean_diff > 0.5 {
        Trend::Rising
    } else if mean_diff < -0.5 {
        Trend::Falling
    } else {
        Trend::Stable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NutrientStatus {
    High,
    Adequate,
    Low,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl QualityRating {
    pub fn classify(value: f64) -> Self {
        // ---
        if value >= 80.0 {
            QualityRating::Excellent
        } else if value >= 60.0 {
            QualityRating::Good
        } else if value >= 40.0 {
            QualityRating::Fair
        } else if value >= 20.0 {
            QualityRating::Poor
        } else {
            QualityRating::Critical
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
}

impl Nutrient {
    // ---
    pub fn name(self) -> &'static str {
        match self {
            Nutrient::Nitrogen => "Nitrogen",
            Nutrient::Phosphorus => "Phosphorus",
            Nutrient::Potassium => "Potassium",
        }
    }

    /// Thresholds for high / adequate / low, in ppm.
    fn thresholds(self) -> (f64, f64, f64) {
        match self {
            Nutrient::Nitrogen => (80.0, 40.0, 20.0),
            Nutrient::Phosphorus => (70.0, 35.0, 15.0),
            Nutrient::Potassium => (75.0, 40.0, 20.0),
        }
    }

    pub fn classify(self, value: f64) -> NutrientStatus {
        // ---
        let (high, adequate, low) = self.thresholds();
        if value >= high {
            NutrientStatus::High
        } else if value >= adequate {
            NutrientStatus::Adequate
        } else if value >= low {
            NutrientStatus::Low
        } else {
            NutrientStatus::Critical
        }
    }

    fn alert_kind(self) -> AlertKind {
        match self {
            Nutrient::Nitrogen => AlertKind::LowNitrogen,
            Nutrient::Phosphorus => AlertKind::LowPhosphorus,
            Nutrient::Potassium => AlertKind::LowPotassium,
        }
    }

    fn level(self, sample: &Sample) -> f64 {
        match self {
            Nutrient::Nitrogen => sample.npk.nitrogen,
            Nutrient::Phosphorus => sample.npk.phosphorus,
            Nutrient::Potassium => sample.npk.potassium,
        }
    }
}

// ---

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSummary {
    pub current: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub trend: Trend,
}

impl MetricSummary {
    fn from_values(values: &[f64]) -> Self {
        // ---
        let Some(&current) = values.last() else {
            return Self::default();
        };
        Self {
            current,
            mean: mean(values),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            trend: trend(values),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySummary {
    pub current: f64,
    pub mean: f64,
    pub rating: QualityRating,
}

impl Default for QualitySummary {
    fn default() -> Self {
        Self {
            current: 0.0,
            mean: 0.0,
            rating: QualityRating::Critical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientSummary {
    pub current: f64,
    pub mean: f64,
    pub status: NutrientStatus,
}

impl Default for NutrientSummary {
    fn default() -> Self {
        Self {
            current: 0.0,
            mean: 0.0,
            status: NutrientStatus::Critical,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorStatistics {
    pub soil_moisture: MetricSummary,
    pub temperature: MetricSummary,
    pub ph: MetricSummary,
    pub soil_quality: QualitySummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NpkStatistics {
    pub nitrogen: NutrientSummary,
    pub phosphorus: NutrientSummary,
    pub potassium: NutrientSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IrrigationStatistics {
    // ---
    pub activations: usize,
    /// Estimated minutes of irrigation in the window.
    pub active_minutes: usize,
    /// Percentage of activations followed by a moisture rise, 0-100.
    pub efficiency: f64,
    /// `%H:%M` of the latest activation in the window.
    pub last_activation: Option<String>,
}

/// 24-hour aggregate snapshot. Fully derived from the buffer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    // ---
    pub period: String,
    pub total_records: usize,
    pub sensors: SensorStatistics,
    pub npk: NpkStatistics,
    pub irrigation: IrrigationStatistics,
    /// Alert count as of the previous insert; alerts are rebuilt after statistics.
    pub active_alerts: usize,
    pub last_update: Option<DateTime<Utc>>,
}

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowMoisture,
    AcidicPh,
    AlkalinePh,
    LowNitrogen,
    LowPhosphorus,
    LowPotassium,
    ExtremeTemperature,
    HighSalinity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub severity: Severity,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Evaluate every alert rule against a single sample.
pub fn evaluate_alerts(sample: &Sample) -> Vec<Alert> {
    // ---
    let mut alerts = Vec::new();
    let mut push = |severity, kind, title: String, message: String| {
        alerts.push(Alert {
            severity,
            kind,
            title,
            message,
            timestamp: sample.timestamp,
        });
    };

    let soil = &sample.soil;
    if soil.moisture < 20.0 {
        push(
            Severity::Critical,
            AlertKind::LowMoisture,
            "Critical Moisture".to_string(),
            format!("Soil moisture very low: {:.1}%", soil.moisture),
        );
    }

    if soil.ph < 6.0 || soil.ph > 7.5 {
        let (kind, label) = if soil.ph < 6.0 {
            (AlertKind::AcidicPh, "Acidic")
        } else {
            (AlertKind::AlkalinePh, "Alkaline")
        };
        push(
            Severity::Warning,
            kind,
            format!("{label} pH"),
            format!("Soil pH outside the ideal range: {:.1}", soil.ph),
        );
    }

    for nutrient in [Nutrient::Nitrogen, Nutrient::Phosphorus, Nutrient::Potassium] {
        let level = nutrient.level(sample);
        if level < 15.0 {
            push(
                Severity::Warning,
                nutrient.alert_kind(),
                format!("Low {}", nutrient.name()),
                format!("{} critical: {:.1} ppm", nutrient.name(), level),
            );
        }
    }

    let temperature = sample.air.temperature;
    if !(5.0..=35.0).contains(&temperature) {
        push(
            Severity::Critical,
            AlertKind::ExtremeTemperature,
            "Extreme Temperature".to_string(),
            format!("Temperature critical for plants: {temperature:.1}°C"),
        );
    }

    if soil.salinity > 2.0 {
        push(
            Severity::Warning,
            AlertKind::HighSalinity,
            "High Salinity".to_string(),
            format!("Soil salinity elevated: {:.1} dS/m", soil.salinity),
        );
    }

    alerts
}

// ---

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Share of activations followed by a soil-moisture rise, in percent.
///
/// Each active sample looks ahead at most [`EFFICIENCY_LOOKAHEAD`] later samples
/// that fall within two hours of it.
pub fn irrigation_efficiency(window: &[&Sample]) -> f64 {
    // ---
    let mut activations = 0usize;
    let mut responsive = 0usize;

    for (i, sample) in window.iter().enumerate() {
        if !sample.irrigation.active {
            continue;
        }
        activations += 1;

        let rose = window[i + 1..]
            .iter()
            .take(EFFICIENCY_LOOKAHEAD)
            .filter(|later| {
                (later.timestamp - sample.timestamp).num_seconds() <= EFFICIENCY_WINDOW_SECS
            })
            .any(|later| later.soil.moisture > sample.soil.moisture);
        if rose {
            responsive += 1;
        }
    }

    if activations == 0 {
        0.0
    } else {
        responsive as f64 / activations as f64 * 100.0
    }
}

fn compute_statistics(window: &[&Sample], previous_alerts: usize, now: DateTime<Utc>) -> Statistics {
    // ---
    let series = |f: fn(&Sample) -> f64| -> Vec<f64> { window.iter().map(|s| f(s)).collect() };

    let moisture = series(|s| s.soil.moisture);
    let temperature = series(|s| s.air.temperature);
    let ph = series(|s| s.soil.ph);
    let quality = series(|s| s.soil.quality);

    let nutrient = |n: Nutrient| {
        let values: Vec<f64> = window.iter().map(|s| n.level(s)).collect();
        let avg = mean(&values);
        NutrientSummary {
            current: values.last().copied().unwrap_or_default(),
            mean: avg,
            status: n.classify(avg),
        }
    };

    let active: Vec<&&Sample> = window.iter().filter(|s| s.irrigation.active).collect();
    let quality_mean = mean(&quality);

    Statistics {
        period: format!("{STATS_WINDOW_HOURS}h"),
        total_records: window.len(),
        sensors: SensorStatistics {
            soil_moisture: MetricSummary::from_values(&moisture),
            temperature: MetricSummary::from_values(&temperature),
            ph: MetricSummary::from_values(&ph),
            soil_quality: QualitySummary {
                current: quality.last().copied().unwrap_or_default(),
                mean: quality_mean,
                rating: QualityRating::classify(quality_mean),
            },
        },
        npk: NpkStatistics {
            nitrogen: nutrient(Nutrient::Nitrogen),
            phosphorus: nutrient(Nutrient::Phosphorus),
            potassium: nutrient(Nutrient::Potassium),
        },
        irrigation: IrrigationStatistics {
            activations: active.len(),
            active_minutes: active.len() * MINUTES_PER_ACTIVATION,
            efficiency: round1(irrigation_efficiency(window)),
            last_activation: active.last().map(|s| s.timestamp.format("%H:%M").to_string()),
        },
        active_alerts: previous_alerts,
        last_update: Some(now),
    }
}

// ---

/// Bounded, insertion-ordered sample history with derived aggregates.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    // ---
    capacity: usize,
    samples: VecDeque<Sample>,
    statistics: Statistics,
    alerts: Vec<Alert>,
    last_update: Option<DateTime<Utc>>,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryBuffer {
    // ---
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        // ---
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            statistics: Statistics::default(),
            alerts: Vec::new(),
            last_update: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Stored samples, oldest first.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// [`record_at`](Self::record_at) anchored at `Utc::now()`.
    pub fn record(&mut self, sample: Sample) {
        self.record_at(sample, Utc::now());
    }

    /// Append `sample`, evicting the oldest past capacity, then refresh the
    /// statistics (window anchored at `now`) and the alerts.
    pub fn record_at(&mut self, sample: Sample, now: DateTime<Utc>) {
        // ---
        let alerts = evaluate_alerts(&sample);

        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
        self.last_update = Some(now);

        let cutoff = now - Duration::hours(STATS_WINDOW_HOURS);
        let window: Vec<&Sample> = self.samples.iter().filter(|s| s.timestamp >= cutoff).collect();

        self.statistics = if window.is_empty() {
            Statistics::default()
        } else {
            compute_statistics(&window, self.alerts.len(), now)
        };
        self.alerts = alerts;

        tracing::debug!(
            stored = self.samples.len(),
            window = self.statistics.total_records,
            alerts = self.alerts.len(),
            "History updated"
        );
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    /// [`series_at`](Self::series_at) anchored at `Utc::now()`.
    pub fn series(&self, window_hours: i64) -> Vec<ChartPoint> {
        self.series_at(Utc::now(), window_hours)
    }

    /// Chart points for samples at most `window_hours` old, oldest first.
    pub fn series_at(&self, now: DateTime<Utc>, window_hours: i64) -> Vec<ChartPoint> {
        // ---
        let cutoff = now - Duration::hours(window_hours);
        let mut recent: Vec<&Sample> = self.samples.iter().filter(|s| s.timestamp >= cutoff).collect();
        recent.sort_by_key(|s| s.timestamp);
        recent.into_iter().map(ChartPoint::from).collect()
    }
}
