//! Scenario generator for synthetic field readings.
//!
//! The wall clock picks one of six weather scenarios every 10 seconds. Each
//! scenario fixes an envelope for the weather and soil fields; values are drawn
//! uniformly inside it, nutrient presence is derived from availability factors,
//! and a priority cascade settles whether irrigation runs.
//!
//! Randomness and time are both injected so a seeded [`rand::Rng`] and a fixed
//! instant reproduce a reading exactly.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use uuid::Builder;

use crate::irrigation::IrrigationContext;
use crate::models::{
    round1, AirReading, Confidence, IrrigationDecision, NutrientLevels, Sample, SoilReading,
    WeatherAdvice, WeatherReading, WeatherScenario,
};

// ---

/// Length of one scenario bucket.
pub const BUCKET_SECS: i64 = 10;

const LOCATION: &str = "Simulated Farm";

type Span = (f64, f64);

struct WeatherEnvelope {
    condition: &'static str,
    temperature: Span,
    humidity: Span,
    pressure: Span,
    wind: Span,
    precipitation: Option<Span>,
    visibility: Span,
    irrigate: bool,
    rain_expected: bool,
    precipitation_24h: Option<Span>,
    reason: &'static str,
}

struct SensorEnvelope {
    moisture: Span,
    ph: Span,
    /// Probe temperature relative to air temperature.
    temperature_offset: Span,
    evapotranspiration: Span,
    salinity: Span,
    quality: Span,
    baseline_irrigation: bool,
}

#[rustfmt::skip]
const WEATHER: [WeatherEnvelope; 6] = [
    WeatherEnvelope {
        condition: "Strong sun", temperature: (35.0, 42.0), humidity: (15.0, 30.0),
        pressure: (1015.0, 1025.0), wind: (8.0, 20.0), precipitation: None,
        visibility: (12.0, 20.0), irrigate: true, rain_expected: false, precipitation_24h: None,
        reason: "Intense sun and very dry air - irrigation urgently needed",
    },
    WeatherEnvelope {
        condition: "Moderate rain", temperature: (18.0, 25.0), humidity: (80.0, 95.0),
        pressure: (995.0, 1005.0), wind: (10.0, 25.0), precipitation: Some((5.0, 15.0)),
        visibility: (3.0, 8.0), irrigate: false, rain_expected: true,
        precipitation_24h: Some((15.0, 35.0)),
        reason: "Rain in progress - irrigation unnecessary",
    },
    WeatherEnvelope {
        condition: "Storm", temperature: (16.0, 22.0), humidity: (85.0, 98.0),
        pressure: (985.0, 995.0), wind: (35.0, 60.0), precipitation: Some((20.0, 50.0)),
        visibility: (1.0, 4.0), irrigate: false, rain_expected: true,
        precipitation_24h: Some((40.0, 80.0)),
        reason: "Active storm - irrigation suspended for safety",
    },
    WeatherEnvelope {
        condition: "Cloudy", temperature: (20.0, 26.0), humidity: (65.0, 80.0),
        pressure: (1008.0, 1018.0), wind: (5.0, 12.0), precipitation: None,
        visibility: (8.0, 12.0), irrigate: false, rain_expected: true,
        precipitation_24h: Some((8.0, 20.0)),
        reason: "Adequate humidity and rain forecast - irrigation not needed",
    },
    WeatherEnvelope {
        condition: "Frost", temperature: (-2.0, 5.0), humidity: (70.0, 90.0),
        pressure: (1020.0, 1030.0), wind: (2.0, 8.0), precipitation: None,
        visibility: (5.0, 10.0), irrigate: false, rain_expected: false, precipitation_24h: None,
        reason: "Temperature too low - system suspended to protect plants",
    },
    WeatherEnvelope {
        condition: "Windy", temperature: (28.0, 35.0), humidity: (25.0, 45.0),
        pressure: (1012.0, 1022.0), wind: (25.0, 45.0), precipitation: None,
        visibility: (6.0, 12.0), irrigate: true, rain_expected: false, precipitation_24h: None,
        reason: "Strong wind dries the soil - irrigate with care",
    },
];

#[rustfmt::skip]
const SENSORS: [SensorEnvelope; 6] = [
    SensorEnvelope {
        moisture: (15.0, 30.0), ph: (6.8, 7.4), temperature_offset: (5.0, 10.0),
        evapotranspiration: (8.0, 12.0), salinity: (1.2, 2.0), quality: (35.0, 50.0),
        baseline_irrigation: true,
    },
    SensorEnvelope {
        moisture: (65.0, 80.0), ph: (6.2, 6.8), temperature_offset: (0.0, 3.0),
        evapotranspiration: (3.0, 5.0), salinity: (0.3, 0.8), quality: (70.0, 85.0),
        baseline_irrigation: false,
    },
    SensorEnvelope {
        moisture: (90.0, 98.0), ph: (5.8, 6.4), temperature_offset: (-5.0, -2.0),
        evapotranspiration: (0.5, 1.5), salinity: (0.1, 0.3), quality: (45.0, 65.0),
        baseline_irrigation: false,
    },
    SensorEnvelope {
        moisture: (55.0, 70.0), ph: (6.4, 7.0), temperature_offset: (1.0, 4.0),
        evapotranspiration: (4.0, 6.0), salinity: (0.4, 0.7), quality: (80.0, 95.0),
        baseline_irrigation: false,
    },
    SensorEnvelope {
        moisture: (60.0, 80.0), ph: (6.0, 6.6), temperature_offset: (-1.0, 2.0),
        evapotranspiration: (0.2, 1.0), salinity: (0.8, 1.5), quality: (30.0, 50.0),
        baseline_irrigation: false,
    },
    SensorEnvelope {
        moisture: (25.0, 45.0), ph: (6.6, 7.2), temperature_offset: (3.0, 8.0),
        evapotranspiration: (7.0, 11.0), salinity: (1.0, 1.8), quality: (40.0, 60.0),
        baseline_irrigation: true,
    },
];

fn draw<R: Rng + ?Sized>(rng: &mut R, (lo, hi): Span) -> f64 {
    round1(rng.gen_range(lo..=hi))
}

// ---

fn bucket(now: DateTime<Utc>) -> i64 {
    now.timestamp().div_euclid(BUCKET_SECS)
}

/// Scenario selected by `floor(now / 10) mod 6`.
pub fn scenario_at(now: DateTime<Utc>) -> WeatherScenario {
    WeatherScenario::from_index(bucket(now).rem_euclid(6) as usize)
}

/// Square wave alternating every bucket: `floor(now / 10) mod 2 == 1`.
pub fn system_active_at(now: DateTime<Utc>) -> bool {
    bucket(now).rem_euclid(2) == 1
}

/// Draw a weather reading inside the envelope of the current scenario.
pub fn weather<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> WeatherReading {
    // ---
    let scenario = scenario_at(now);
    let env = &WEATHER[scenario.index()];

    WeatherReading {
        scenario,
        scenario_name: scenario.name().to_string(),
        location: LOCATION.to_string(),
        condition: env.condition.to_string(),
        temperature: draw(rng, env.temperature),
        humidity: draw(rng, env.humidity),
        pressure: draw(rng, env.pressure),
        wind: draw(rng, env.wind),
        precipitation: env.precipitation.map_or(0.0, |span| draw(rng, span)),
        visibility: draw(rng, env.visibility),
        advice: WeatherAdvice {
            irrigate: env.irrigate,
            rain_expected: env.rain_expected,
            precipitation_24h: env.precipitation_24h.map_or(0.0, |span| draw(rng, span)),
            reason: env.reason.to_string(),
        },
        cycle: scenario.index(),
        next_change_in: (BUCKET_SECS - now.timestamp().rem_euclid(BUCKET_SECS)) as u64,
    }
}

// ---

/// Nutrient availability multipliers derived from soil conditions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AvailabilityFactors {
    pub temperature: f64,
    pub moisture: f64,
    pub ph: f64,
    /// Product of the three factors.
    pub availability: f64,
}

impl AvailabilityFactors {
    // ---
    pub fn assess(temperature: f64, moisture: f64, ph: f64) -> Self {
        // ---
        let temperature_factor = if temperature < 10.0 {
            0.2
        } else if temperature < 20.0 {
            0.6
        } else if temperature > 35.0 {
            0.4
        } else {
            1.0
        };

        let moisture_factor = if moisture < 30.0 {
            0.3
        } else if moisture > 85.0 {
            0.5
        } else {
            1.0
        };

        let ph_factor = if !(6.0..=7.5).contains(&ph) { 0.6 } else { 1.0 };

        Self {
            temperature: temperature_factor,
            moisture: moisture_factor,
            ph: ph_factor,
            availability: temperature_factor * moisture_factor * ph_factor,
        }
    }

    pub fn confidence(&self) -> Confidence {
        // ---
        if self.availability > 0.7 {
            Confidence::High
        } else if self.availability > 0.4 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Probability that each nutrient is present in available form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NutrientOdds {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl NutrientOdds {
    // ---
    pub fn assess(
        factors: &AvailabilityFactors,
        temperature: f64,
        moisture: f64,
        ph: f64,
        evapotranspiration: f64,
    ) -> Self {
        // ---
        let base = factors.availability;

        // Nitrogen volatilizes in heat and leaches in saturated soil
        let mut nitrogen = base * 0.8;
        if temperature > 30.0 {
            nitrogen *= 0.5;
        }
        if moisture > 90.0 {
            nitrogen *= 0.3;
        }

        // Phosphorus fixes outside a narrow pH band
        let mut phosphorus = base * 0.9;
        if !(6.0..=7.0).contains(&ph) {
            phosphorus *= 0.4;
        }

        let mut potassium = base * 0.7;
        if moisture > 80.0 {
            potassium *= 0.6;
        }
        if evapotranspiration > 8.0 {
            potassium *= 0.7;
        }

        Self {
            nitrogen,
            phosphorus,
            potassium,
        }
    }
}

/// Apply extreme-condition penalties and the nutrient bonus, then clamp to [20, 100].
pub fn adjust_quality(
    base: f64,
    temperature: f64,
    moisture: f64,
    ph: f64,
    nutrients_present: usize,
) -> f64 {
    // ---
    let mut quality = base;
    if !(5.0..=40.0).contains(&temperature) {
        quality *= 0.7;
    }
    if !(20.0..=95.0).contains(&moisture) {
        quality *= 0.8;
    }
    if !(5.5..=8.0).contains(&ph) {
        quality *= 0.6;
    }
    if nutrients_present >= 2 {
        quality *= 1.1;
    }
    round1(quality).clamp(20.0, 100.0)
}

// ---

/// Irrigation system state reported alongside a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemStatus {
    Active,
    Inactive,
    ActiveManual,
}

impl SystemStatus {
    // ---
    pub fn is_active(self) -> bool {
        !matches!(self, SystemStatus::Inactive)
    }

    pub fn label(self) -> &'static str {
        // ---
        match self {
            SystemStatus::Active => "ACTIVE",
            SystemStatus::Inactive => "INACTIVE",
            SystemStatus::ActiveManual => "ACTIVE (MANUAL)",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    // ---
    pub status: SystemStatus,
    /// e.g. `SCENARIO 2 - INACTIVE`
    pub cycle_label: String,
    pub last_irrigation: String,
    pub factors: AvailabilityFactors,
}

/// Everything produced by one generation.
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub weather: WeatherReading,
    pub sample: Sample,
    pub diagnostics: Diagnostics,
}

impl Reading {
    /// The weather and the sample, dropping the diagnostics.
    pub fn into_parts(self) -> (WeatherReading, Sample) {
        (self.weather, self.sample)
    }
}

/// Generate one reading for `now`.
///
/// The context is consulted for the manual override (expired first if stale)
/// and updated when irrigation ends up active.
pub fn generate<R: Rng + ?Sized>(
    ctx: &mut IrrigationContext,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Reading {
    // ---
    ctx.expire_override(now);

    let scenario = scenario_at(now);
    let wave = system_active_at(now);
    let weather = weather(rng, now);
    let env = &SENSORS[scenario.index()];

    let mut moisture = draw(rng, env.moisture);
    let ph = draw(rng, env.ph);
    let (offset_lo, offset_hi) = env.temperature_offset;
    let temperature = round1(weather.temperature + rng.gen_range(offset_lo..=offset_hi));
    let evapotranspiration = draw(rng, env.evapotranspiration);
    let salinity = draw(rng, env.salinity);
    let base_quality = draw(rng, env.quality);

    // Keep moisture coherent with the baseline state and the forecast
    if env.baseline_irrigation && wave {
        if moisture > 50.0 {
            moisture = draw(rng, (25.0, 45.0));
        }
    } else if weather.advice.rain_expected && moisture < 60.0 {
        moisture = draw(rng, (65.0, 85.0));
    }

    let factors = AvailabilityFactors::assess(temperature, moisture, ph);
    let odds = NutrientOdds::assess(&factors, temperature, moisture, ph, evapotranspiration);
    let nitrogen_present = rng.gen::<f64>() < odds.nitrogen;
    let phosphorus_present = rng.gen::<f64>() < odds.phosphorus;
    let potassium_present = rng.gen::<f64>() < odds.potassium;
    let present = [nitrogen_present, phosphorus_present, potassium_present]
        .iter()
        .filter(|p| **p)
        .count();

    let quality = adjust_quality(base_quality, temperature, moisture, ph, present);

    let status = if ctx.manual_active() {
        SystemStatus::ActiveManual
    } else if weather.advice.rain_expected || !weather.advice.irrigate {
        moisture = if weather.advice.rain_expected {
            draw(rng, (70.0, 90.0))
        } else {
            draw(rng, (60.0, 75.0))
        };
        SystemStatus::Inactive
    } else if moisture < 40.0 {
        SystemStatus::Active
    } else if moisture > 70.0 {
        SystemStatus::Inactive
    } else if wave {
        if moisture > 60.0 {
            moisture = draw(rng, (30.0, 50.0));
        }
        SystemStatus::Active
    } else {
        if moisture < 60.0 {
            moisture = draw(rng, (60.0, 85.0));
        }
        SystemStatus::Inactive
    };

    if status.is_active() {
        ctx.note_activation(now);
    }

    let npk = NutrientLevels {
        nitrogen: if nitrogen_present {
            draw(rng, (40.0, 80.0))
        } else {
            draw(rng, (10.0, 35.0))
        },
        phosphorus: if phosphorus_present {
            draw(rng, (35.0, 70.0))
        } else {
            draw(rng, (5.0, 30.0))
        },
        potassium: if potassium_present {
            draw(rng, (40.0, 75.0))
        } else {
            draw(rng, (10.0, 35.0))
        },
    };

    tracing::debug!(
        scenario = ?scenario,
        status = status.label(),
        moisture,
        availability = factors.availability,
        "Generated reading"
    );

    let sample = Sample {
        id: Builder::from_random_bytes(rng.gen()).into_uuid(),
        timestamp: now,
        soil: SoilReading {
            moisture,
            ph,
            quality,
            salinity,
            evapotranspiration,
        },
        npk,
        air: AirReading {
            temperature,
            humidity: weather.humidity,
        },
        weather_scenario: scenario,
        irrigation: IrrigationDecision {
            active: status.is_active(),
            reason: format!("System {} - Scenario {}", status.label(), scenario.index()),
            confidence: factors.confidence(),
        },
    };

    Reading {
        diagnostics: Diagnostics {
            status,
            cycle_label: format!("SCENARIO {} - {}", scenario.index(), status.label()),
            last_irrigation: ctx.last_irrigation_label(now),
            factors,
        },
        weather,
        sample,
    }
}
