//! Risk scoring and premium advisory.
//!
//! Advisory only: the underwriter reads assessments, the state machine never
//! does. The trait is the seam to a production scoring service; the
//! in-repo reference model keeps the contract honest.

mod model;

use crate::domain::{ApplicationId, RiskAssessment, WhatIfOutcome, WhatIfParams};

pub use model::{parse_amount, StandardRiskModel};

/// Deterministic risk scoring over an application's form data.
///
/// Contract: identical input yields identical output, and the score is
/// non-decreasing in the coverage/income and debt/income ratios.
pub trait RiskModel: Send + Sync {
    /// Score an application's financial attributes.
    fn assess(&self, application_id: &ApplicationId, data: &serde_json::Value) -> RiskAssessment;

    /// Recompute the premium under hypothetical deductible/term inputs.
    /// Pure simulation; no stored state is touched.
    fn what_if(&self, application_id: &ApplicationId, params: &WhatIfParams) -> WhatIfOutcome;
}
