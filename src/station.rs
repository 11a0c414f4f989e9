//! Shared station state.
//!
//! One mutex guards the irrigation context, the random source and the history
//! buffer, so a generation and the insert that follows it are never
//! interleaved with another request. Reads hand back clones of the last
//! committed snapshot.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::history::{Alert, HistoryBuffer, Statistics};
use crate::irrigation::IrrigationContext;
use crate::models::{ChartPoint, WeatherReading};
use crate::simulator::{self, Reading};

// ---

struct StationState {
    context: IrrigationContext,
    rng: StdRng,
    history: HistoryBuffer,
}

/// Alerts together with the time of the insert that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct AlertReport {
    pub alerts: Vec<Alert>,
    pub total: usize,
    pub last_checked: Option<DateTime<Utc>>,
}

/// Result of switching irrigation to manual.
#[derive(Debug, Clone, Serialize)]
pub struct ManualActivation {
    pub activated_at: DateTime<Utc>,
    pub context_version: u64,
}

pub struct Station {
    inner: Mutex<StationState>,
}

impl Station {
    // ---
    /// Build a station. `seed` makes every reading reproducible; without it the
    /// random source is seeded from the OS.
    pub fn new(capacity: usize, override_window: Duration, seed: Option<u64>) -> Self {
        // ---
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Mutex::new(StationState {
                context: IrrigationContext::new(override_window),
                rng,
                history: HistoryBuffer::new(capacity),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StationState> {
        // A panic mid-update leaves fully derived state; keep serving it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Generate a reading for `now` and append its sample to the history.
    pub fn sample(&self, now: DateTime<Utc>) -> Reading {
        // ---
        let mut guard = self.lock();
        let state = &mut *guard;
        let reading = simulator::generate(&mut state.context, &mut state.rng, now);
        state.history.record_at(reading.sample.clone(), now);
        reading
    }

    /// Weather only; nothing is recorded.
    pub fn weather(&self, now: DateTime<Utc>) -> WeatherReading {
        let mut guard = self.lock();
        simulator::weather(&mut guard.rng, now)
    }

    pub fn activate_manual(&self, now: DateTime<Utc>) -> ManualActivation {
        // ---
        let mut guard = self.lock();
        guard.context.activate_manual(now);
        ManualActivation {
            activated_at: now,
            context_version: guard.context.version(),
        }
    }

    /// Start of the manual override still in force at `now`, if any.
    pub fn manual_since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut guard = self.lock();
        guard.context.expire_override(now);
        guard.context.manual_since()
    }

    pub fn statistics(&self) -> Statistics {
        self.lock().history.statistics().clone()
    }

    pub fn alerts(&self) -> AlertReport {
        // ---
        let guard = self.lock();
        let alerts = guard.history.alerts().to_vec();
        AlertReport {
            total: alerts.len(),
            alerts,
            last_checked: guard.history.last_update(),
        }
    }

    pub fn series(&self, now: DateTime<Utc>, window_hours: i64) -> Vec<ChartPoint> {
        self.lock().history.series_at(now, window_hours)
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }
}
