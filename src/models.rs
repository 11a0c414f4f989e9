//! Data models for the simulated field station.
//!
//! A [`Sample`] is one synthetic reading produced by the simulator and stored in
//! the rolling history. [`WeatherReading`] is the weather snapshot the sample was
//! derived from. Everything here serializes to the JSON shapes served by the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---

/// Round to one decimal place, the precision used for every display value.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Coarse weather profile selected from the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherScenario {
    SunnyDry,
    ModerateRain,
    Storm,
    MildHumid,
    Frost,
    WindyDry,
}

impl WeatherScenario {
    // ---
    pub const ALL: [WeatherScenario; 6] = [
        WeatherScenario::SunnyDry,
        WeatherScenario::ModerateRain,
        WeatherScenario::Storm,
        WeatherScenario::MildHumid,
        WeatherScenario::Frost,
        WeatherScenario::WindyDry,
    ];

    /// Scenario for a cycle index; indices wrap modulo 6.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn index(self) -> usize {
        // ---
        match self {
            WeatherScenario::SunnyDry => 0,
            WeatherScenario::ModerateRain => 1,
            WeatherScenario::Storm => 2,
            WeatherScenario::MildHumid => 3,
            WeatherScenario::Frost => 4,
            WeatherScenario::WindyDry => 5,
        }
    }

    /// Human readable name shown on the dashboard.
    pub fn name(self) -> &'static str {
        // ---
        match self {
            WeatherScenario::SunnyDry => "Strong Sun and Dry Air",
            WeatherScenario::ModerateRain => "Moderate Rain",
            WeatherScenario::Storm => "Storm",
            WeatherScenario::MildHumid => "Mild and Humid",
            WeatherScenario::Frost => "Intense Cold with Frost",
            WeatherScenario::WindyDry => "Strong Dry Wind",
        }
    }
}

/// How much the irrigation decision can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilReading {
    // ---
    /// Volumetric moisture, percent.
    pub moisture: f64,
    pub ph: f64,
    /// Quality score, always within [20, 100].
    pub quality: f64,
    /// Electrical conductivity, dS/m.
    pub salinity: f64,
    /// Evapotranspiration rate, mm/day.
    pub evapotranspiration: f64,
}

/// Nutrient concentrations in ppm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientLevels {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirReading {
    // ---
    /// Probe temperature in °C. This is what statistics and alerts track.
    pub temperature: f64,
    pub humidity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationDecision {
    pub active: bool,
    pub reason: String,
    pub confidence: Confidence,
}

/// One synthetic reading. Created once by the simulator and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    // ---
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub soil: SoilReading,
    pub npk: NutrientLevels,
    pub air: AirReading,
    pub weather_scenario: WeatherScenario,
    pub irrigation: IrrigationDecision,
}

/// What the weather suggests for irrigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAdvice {
    pub irrigate: bool,
    pub rain_expected: bool,
    /// Forecast precipitation for the next 24h, mm.
    pub precipitation_24h: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    // ---
    pub scenario: WeatherScenario,
    pub scenario_name: String,
    pub location: String,
    pub condition: String,
    pub temperature: f64,
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    /// km/h
    pub wind: f64,
    /// mm
    pub precipitation: f64,
    /// km
    pub visibility: f64,
    pub advice: WeatherAdvice,
    /// Scenario index, 0-5.
    pub cycle: usize,
    /// Seconds until the next scenario change.
    pub next_change_in: u64,
}

/// Lossy projection of a [`Sample`] for dashboard charts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    // ---
    /// `%Y-%m-%d %H:%M:%S`
    pub timestamp: String,
    /// `%H:%M`
    pub time: String,
    pub moisture: f64,
    pub temperature: f64,
    pub ph: f64,
    pub irrigation: bool,
}

impl From<&Sample> for ChartPoint {
    fn from(sample: &Sample) -> Self {
        // ---
        ChartPoint {
            timestamp: sample.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            time: sample.timestamp.format("%H:%M").to_string(),
            moisture: round1(sample.soil.moisture),
            temperature: round1(sample.air.temperature),
            ph: round1(sample.soil.ph),
            irrigation: sample.irrigation.active,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_round1() {
        // ---
        assert_eq!(round1(22.449), 22.4);
        assert_eq!(round1(22.46), 22.5);
        assert_eq!(round1(-1.26), -1.3);
    }

    #[test]
    fn test_scenario_index_roundtrip() {
        // ---
        for (i, scenario) in WeatherScenario::ALL.iter().enumerate() {
            assert_eq!(scenario.index(), i);
            assert_eq!(WeatherScenario::from_index(i), *scenario);
        }
        assert_eq!(WeatherScenario::from_index(7), WeatherScenario::ModerateRain);
    }

    #[test]
    fn test_scenario_serialization() {
        // ---
        let json = serde_json::to_string(&WeatherScenario::SunnyDry).unwrap();
        assert_eq!(json, "\"SUNNY_DRY\"");
        let json = serde_json::to_string(&Confidence::Medium).unwrap();
        assert_eq!(json, "\"MEDIUM\"");
    }

    #[test]
    fn test_chart_point_projection() {
        // ---
        let sample = Sample {
            id: Uuid::new_v4(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 7).unwrap(),
            soil: SoilReading {
                moisture: 41.26,
                ph: 6.44,
                quality: 70.0,
                salinity: 0.5,
                evapotranspiration: 4.0,
            },
            npk: NutrientLevels {
                nitrogen: 50.0,
                phosphorus: 40.0,
                potassium: 45.0,
            },
            air: AirReading {
                temperature: 24.06,
                humidity: 60.0,
            },
            weather_scenario: WeatherScenario::MildHumid,
            irrigation: IrrigationDecision {
                active: true,
                reason: "test".to_string(),
                confidence: Confidence::High,
            },
        };

        let point = ChartPoint::from(&sample);
        assert_eq!(point.timestamp, "2025-03-26 18:45:07");
        assert_eq!(point.time, "18:45");
        assert_eq!(point.moisture, 41.3);
        assert_eq!(point.temperature, 24.1);
        assert_eq!(point.ph, 6.4);
        assert!(point.irrigation);
    }
}
