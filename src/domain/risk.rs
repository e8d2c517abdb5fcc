//! Risk assessment and premium advisory types.
//!
//! Assessments are computed on demand and never persisted; they advise the
//! underwriter but do not drive any transition automatically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ApplicationId;

/// Deterministic banding of a 0-100 risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Band boundaries: `< 30` low, `< 70` medium, otherwise high.
    pub fn from_score(score: f64) -> Self {
        if score < 30.0 {
            RiskLevel::Low
        } else if score < 70.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Advised premium band. Invariant: `min <= recommended <= max`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumRange {
    pub min: f64,
    pub max: f64,
    pub recommended: f64,
}

/// Full advisory output for one application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub application_id: ApplicationId,
    pub insurance_type: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    /// Named 0-100 risk contributions, keyed by component name.
    pub components: BTreeMap<String, f64>,
    /// Top contributing factors, ordered by weighted contribution.
    pub top_drivers: Vec<String>,
    pub premium_range: PremiumRange,
}

/// Inputs to a what-if premium simulation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WhatIfParams {
    pub deductible: f64,
    /// Policy term in months.
    pub term: u32,
}

/// Outcome of a what-if simulation. Pure computation, no state change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatIfOutcome {
    pub application_id: ApplicationId,
    pub simulated_premium: f64,
    /// Percentage adjustments applied on top of the base premium.
    pub premium_adjustment_pct: f64,
    pub term_adjustment_pct: f64,
    pub deductible: f64,
    pub term_months: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_banding() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(29.99), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(30.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(69.99), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(70.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(100.0), RiskLevel::High);
    }
}
