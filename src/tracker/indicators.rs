//! Goal-tracker output types.
//!
//! The JSON shape matches what the dashboard front-end consumes: camelCase
//! keys, and indicators whose preconditions are not met are left out entirely
//! (never `null`).

use serde::{Deserialize, Serialize};

use crate::domain::AnnualTarget;

/// Derived indicators for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalTracker {
    /// Real-time alignment index (RAI), capped at 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment_index_pct: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Velocity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathway: Option<Pathway>,
}

/// Year-to-date carbon budget (tons CO₂).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub ytd_tons: i64,
    pub ytd_budget_tons: i64,
    /// Days of emissions at the year-to-date rate that still fit in the
    /// pro-rata allowance; negative when over budget.
    pub days_ahead: i64,
}

/// Decarbonization velocity (g/kWh per year, negative means intensity is falling).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Velocity {
    pub on_track: bool,
    pub actual_rate: f64,
    pub required_rate: f64,
}

/// Projection toward near-zero intensity plus the target series for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pathway {
    pub eta_year: i32,
    pub series: Vec<PathwayPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathwayPoint {
    pub year: i32,
    pub target_emissions_mt: f64,
}

impl From<&AnnualTarget> for PathwayPoint {
    fn from(t: &AnnualTarget) -> Self {
        Self {
            year: t.year,
            target_emissions_mt: t.target_emissions_mt,
        }
    }
}

/// Result of an evaluation as handed to callers: indicators or an error string.
///
/// Serialized untagged, so a failure is exactly `{"error": "..."}` with no
/// indicator fields next to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackerOutcome {
    Failed { error: String },
    Indicators(GoalTracker),
}

impl TrackerOutcome {
    pub fn indicators(&self) -> Option<&GoalTracker> {
        match self {
            TrackerOutcome::Indicators(t) => Some(t),
            TrackerOutcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TrackerOutcome::Failed { error } => Some(error),
            TrackerOutcome::Indicators(_) => None,
        }
    }
}
