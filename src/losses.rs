//! Harvest loss analysis.
//!
//! Compares the potential harvest with what was actually collected, prices the
//! difference, and turns a best-practice checklist into recommendations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ---

#[derive(Debug, Error, PartialEq)]
pub enum LossError {
    #[error("potential harvest must be greater than zero (got {0})")]
    NonPositivePotential(f64),

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("harvested tonnage {harvested} exceeds the potential {potential}")]
    HarvestExceedsPotential { harvested: f64, potential: f64 },

    #[error("unknown checklist item: {0}")]
    UnknownChecklistItem(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossBreakdown {
    pub lost_tonnes: f64,
    pub loss_percent: f64,
    pub financial_loss: f64,
}

/// Compute tonnage, percentage and money lost.
pub fn compute_loss(
    potential_tonnes: f64,
    harvested_tonnes: f64,
    price_per_tonne: f64,
) -> Result<LossBreakdown, LossError> {
    // ---
    if potential_tonnes <= 0.0 {
        return Err(LossError::NonPositivePotential(potential_tonnes));
    }
    if harvested_tonnes < 0.0 {
        return Err(LossError::Negative {
            field: "harvested_tonnes",
            value: harvested_tonnes,
        });
    }
    if price_per_tonne < 0.0 {
        return Err(LossError::Negative {
            field: "price_per_tonne",
            value: price_per_tonne,
        });
    }
    if harvested_tonnes > potential_tonnes {
        return Err(LossError::HarvestExceedsPotential {
            harvested: harvested_tonnes,
            potential: potential_tonnes,
        });
    }

    let lost_tonnes = potential_tonnes - harvested_tonnes;
    Ok(LossBreakdown {
        lost_tonnes,
        loss_percent: lost_tonnes / potential_tonnes * 100.0,
        financial_loss: lost_tonnes * price_per_tonne,
    })
}

// ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistItem {
    pub key: &'static str,
    pub question: &'static str,
    pub recommendation: &'static str,
}

pub const CHECKLIST: [ChecklistItem; 8] = [
    ChecklistItem {
        key: "maintenance_up_to_date",
        question: "Was harvester maintenance (blades, etc.) up to date?",
        recommendation: "Dull or badly adjusted blades tear the cane instead of cutting it, losing sucrose and damaging the ratoon.",
    },
    ChecklistItem {
        key: "ideal_speed",
        question: "Was the operating speed kept at the recommended level?",
        recommendation: "Running the harvester too fast sharply increases losses because the machine cannot process the volume efficiently.",
    },
    ChecklistItem {
        key: "extractors_tuned",
        question: "Were the harvester extractor fans tuned for this plot?",
        recommendation: "Badly tuned extractors throw billets out with the straw, a direct product loss.",
    },
    ChecklistItem {
        key: "cut_height_calibrated",
        question: "Was the cutting height calibrated correctly?",
        recommendation: "Cutting too high leaves valuable cane in the field; too low damages the ratoon and the next crop.",
    },
    ChecklistItem {
        key: "dry_soil",
        question: "Was the harvest done on predominantly dry soil?",
        recommendation: "Harvesting wet soil increases compaction and carries more soil impurities to the mill.",
    },
    ChecklistItem {
        key: "standing_cane",
        question: "Was the cane predominantly standing (not lodged)?",
        recommendation: "Harvesting lodged cane is inherently less efficient and always loses more.",
    },
    ChecklistItem {
        key: "trained_operator",
        question: "Has the machine operator had recent training?",
        recommendation: "A well trained operator is the most important factor in harvest efficiency, adjusting the machine to field conditions in real time.",
    },
    ChecklistItem {
        key: "fast_logistics",
        question: "Was the time between cutting and transport to the mill minimal?",
        recommendation: "Cut cane loses sucrose quickly; logistics delays cost quality and value.",
    },
];

/// Checklist answers keyed by item key: `true` means the practice was followed.
pub type ChecklistAnswers = BTreeMap<String, bool>;

/// Reject answers for keys that are not on the checklist.
pub fn validate_answers(answers: &ChecklistAnswers) -> Result<(), LossError> {
    // ---
    match answers
        .keys()
        .find(|key| !CHECKLIST.iter().any(|item| item.key == key.as_str()))
    {
        Some(unknown) => Err(LossError::UnknownChecklistItem(unknown.clone())),
        None => Ok(()),
    }
}

/// Checklist items answered "no", in checklist order.
pub fn recommendations(answers: &ChecklistAnswers) -> Vec<ChecklistItem> {
    CHECKLIST
        .iter()
        .filter(|item| answers.get(item.key) == Some(&false))
        .copied()
        .collect()
}

// ---

/// Request body for a new analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct NewLossAnalysis {
    pub potential_tonnes: f64,
    pub harvested_tonnes: f64,
    pub price_per_tonne: f64,
    #[serde(default)]
    pub checklist: ChecklistAnswers,
}

/// A computed analysis as stored.
#[derive(Debug, Clone, Serialize)]
pub struct LossAnalysis {
    // ---
    pub id: Uuid,
    pub analysed_at: DateTime<Utc>,
    pub potential_tonnes: f64,
    pub harvested_tonnes: f64,
    pub price_per_tonne: f64,
    pub result: LossBreakdown,
    pub checklist: ChecklistAnswers,
    pub recommendations: Vec<ChecklistItem>,
}

impl NewLossAnalysis {
    /// Validate the input and compute the analysis.
    pub fn analyse(self, now: DateTime<Utc>) -> Result<LossAnalysis, LossError> {
        // ---
        validate_answers(&self.checklist)?;
        let result = compute_loss(
            self.potential_tonnes,
            self.harvested_tonnes,
            self.price_per_tonne,
        )?;
        Ok(LossAnalysis {
            id: Uuid::new_v4(),
            analysed_at: now,
            potential_tonnes: self.potential_tonnes,
            harvested_tonnes: self.harvested_tonnes,
            price_per_tonne: self.price_per_tonne,
            result,
            recommendations: recommendations(&self.checklist),
            checklist: self.checklist,
        })
    }
}
