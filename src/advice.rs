//! Plain-language justification for the current irrigation decision.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::simulator::Reading;

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Activate,
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct Justification {
    // ---
    pub action: Action,
    pub priority: Priority,
    pub title: String,
    pub summary: String,
    pub reasons: Vec<String>,
    pub analysed: Vec<String>,
    pub recommendations: Vec<String>,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Explain `reading`. `manual_since` is set while a manual override is in force.
pub fn justify(reading: &Reading, manual_since: Option<DateTime<Utc>>) -> Justification {
    // ---
    if let Some(since) = manual_since {
        return Justification {
            action: Action::Activate,
            priority: Priority::High,
            title: "System in manual mode".to_string(),
            summary: "Irrigation was switched on manually and stays on regardless of sensor readings."
                .to_string(),
            reasons: vec!["Manual activation by the user".to_string()],
            analysed: vec!["Manual command".to_string()],
            recommendations: vec!["System operating as manually requested".to_string()],
            confidence: 1.0,
            timestamp: since,
        };
    }

    let moisture = reading.sample.soil.moisture;
    let (action, title, summary) = if reading.sample.irrigation.active {
        (
            Action::Activate,
            "System active",
            "Irrigation system running".to_string(),
        )
    } else if moisture < 40.0 {
        (
            Action::Activate,
            "Irrigation needed",
            format!("Soil moisture low ({moisture}%)"),
        )
    } else {
        (
            Action::Wait,
            "Conditions adequate",
            format!("Soil moisture adequate ({moisture}%)"),
        )
    };

    Justification {
        action,
        priority: Priority::Medium,
        title: title.to_string(),
        summary,
        reasons: vec![format!("Soil moisture: {moisture}%")],
        analysed: vec!["Soil moisture".to_string(), "Irrigation status".to_string()],
        recommendations: vec!["Keep monitoring the sensors".to_string()],
        confidence: 0.7,
        timestamp: reading.sample.timestamp,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::irrigation::IrrigationContext;
    use crate::simulator;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn reading_at(secs: i64) -> Reading {
        let now = Utc.timestamp_opt(secs, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        simulator::generate(&mut IrrigationContext::default(), &mut rng, now)
    }

    #[test]
    fn test_manual_mode_takes_priority() {
        // ---
        let reading = reading_at(1_700_000_000);
        let since = Utc.timestamp_opt(1_699_999_990, 0).unwrap();
        let j = justify(&reading, Some(since));
        assert_eq!(j.action, Action::Activate);
        assert_eq!(j.priority, Priority::High);
        assert_eq!(j.confidence, 1.0);
        assert_eq!(j.timestamp, since);
    }

    #[test]
    fn test_inactive_humid_soil_waits() {
        // ---
        // 1_700_000_000 falls in the storm scenario: inactive, moisture >= 70
        let reading = reading_at(1_700_000_000);
        assert!(!reading.sample.irrigation.active);
        let j = justify(&reading, None);
        assert_eq!(j.action, Action::Wait);
        assert_eq!(j.title, "Conditions adequate");
    }

    #[test]
    fn test_active_system_activates() {
        // ---
        let mut reading = reading_at(1_700_000_000);
        reading.sample.irrigation.active = true;
        let j = justify(&reading, None);
        assert_eq!(j.action, Action::Activate);
        assert_eq!(j.title, "System active");
    }

    #[test]
    fn test_dry_soil_activates_even_when_idle() {
        // ---
        let mut reading = reading_at(1_700_000_000);
        reading.sample.soil.moisture = 30.0;
        let j = justify(&reading, None);
        assert_eq!(j.action, Action::Activate);
        assert_eq!(j.summary, "Soil moisture low (30%)");
    }
}
