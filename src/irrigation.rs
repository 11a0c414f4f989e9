//! Irrigation control context.
//!
//! Holds the manual override and the "last irrigated" timestamp that the
//! simulator consults on every generation. The context is owned by the
//! [`Station`](crate::Station) and only changes through the methods below, each
//! of which bumps [`IrrigationContext::version`].

use chrono::{DateTime, Duration, Utc};

// ---

/// Default lifetime of a manual override.
pub const DEFAULT_OVERRIDE_WINDOW_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct IrrigationContext {
    // ---
    version: u64,
    override_window: Duration,
    manual_since: Option<DateTime<Utc>>,
    last_irrigation: Option<DateTime<Utc>>,
}

impl Default for IrrigationContext {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_OVERRIDE_WINDOW_SECS))
    }
}

impl IrrigationContext {
    // ---
    pub fn new(override_window: Duration) -> Self {
        // ---
        Self {
            version: 0,
            override_window,
            manual_since: None,
            last_irrigation: None,
        }
    }

    /// Monotonic counter of mutations applied to this context.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn manual_active(&self) -> bool {
        self.manual_since.is_some()
    }

    pub fn manual_since(&self) -> Option<DateTime<Utc>> {
        self.manual_since
    }

    pub fn last_irrigation(&self) -> Option<DateTime<Utc>> {
        self.last_irrigation
    }

    /// Force irrigation on. Also stamps the last irrigation time.
    pub fn activate_manual(&mut self, now: DateTime<Utc>) {
        // ---
        self.manual_since = Some(now);
        self.last_irrigation = Some(now);
        self.version += 1;
        tracing::info!(version = self.version, "Manual irrigation override activated");
    }

    /// Drop the manual override once it is older than the override window.
    ///
    /// Returns `true` when the override was cleared by this call.
    pub fn expire_override(&mut self, now: DateTime<Utc>) -> bool {
        // ---
        match self.manual_since {
            Some(since) if now - since > self.override_window => {
                self.manual_since = None;
                self.version += 1;
                tracing::info!(version = self.version, "Manual irrigation override expired");
                true
            }
            _ => false,
        }
    }

    /// Record that irrigation is running.
    ///
    /// Only the first activation is kept; later activations leave the stored
    /// timestamp untouched, so the label stays frozen at that first time.
    pub fn note_activation(&mut self, now: DateTime<Utc>) {
        // ---
        if self.last_irrigation.is_none() {
            self.last_irrigation = Some(now);
            self.version += 1;
            tracing::debug!(version = self.version, "First irrigation activation recorded");
        }
    }

    /// "Now", "N min ago", "Nh Mmin ago", "Nh ago" or "Never".
    pub fn last_irrigation_label(&self, now: DateTime<Utc>) -> String {
        // ---
        let Some(last) = self.last_irrigation else {
            return "Never".to_string();
        };

        let elapsed = (now - last).num_seconds();
        if elapsed < 60 {
            "Now".to_string()
        } else if elapsed < 3600 {
            format!("{} min ago", elapsed / 60)
        } else {
            let hours = elapsed / 3600;
            let minutes = (elapsed % 3600) / 60;
            if minutes > 0 {
                format!("{hours}h {minutes}min ago")
            } else {
                format!("{hours}h ago")
            }
        }
    }
}
