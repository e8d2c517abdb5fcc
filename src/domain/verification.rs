//! Document verification result types.
//!
//! Produced by the verification collaborator and stored on the application.
//! The lifecycle machine only inspects `overall_status`; everything else is
//! carried for the analyst UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserId;

/// Outcome of cross-checking a document against the application form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    NeedsReview,
    Failed,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::NeedsReview => "needs_review",
            VerificationStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field where the document agrees with the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMatch {
    pub field: String,
    pub application_value: String,
    pub document_value: String,
}

/// A field where the document contradicts the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMismatch {
    pub field: String,
    pub application_value: String,
    pub document_value: String,
    pub severity: MismatchSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchSeverity {
    Medium,
    High,
}

/// Result of one verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub overall_status: VerificationStatus,
    /// Share of checked fields that matched; 0.5 when nothing was checkable.
    pub confidence_score: f64,
    pub document_type: String,
    pub matches: Vec<FieldMatch>,
    pub mismatches: Vec<FieldMismatch>,
    pub warnings: Vec<String>,
    pub verified_by: UserId,
    pub verified_at: DateTime<Utc>,
}

impl VerificationResult {
    pub fn is_verified(&self) -> bool {
        self.overall_status == VerificationStatus::Verified
    }

    /// Human-readable summary for reviewer surfaces.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Verification status: {} (confidence {:.0}%, {} matched / {} mismatched)",
            self.overall_status,
            self.confidence_score * 100.0,
            self.matches.len(),
            self.mismatches.len(),
        );
        for mismatch in &self.mismatches {
            out.push_str(&format!("\n  {}: {}", mismatch.field, mismatch.message));
        }
        for warning in &self.warnings {
            out.push_str(&format!("\n  warning: {warning}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: VerificationStatus) -> VerificationResult {
        VerificationResult {
            overall_status: status,
            confidence_score: 1.0,
            document_type: "ID_PROOF".to_string(),
            matches: vec![],
            mismatches: vec![],
            warnings: vec![],
            verified_by: "analyst-1".into(),
            verified_at: Utc::now(),
        }
    }

    #[test]
    fn only_verified_counts() {
        assert!(result(VerificationStatus::Verified).is_verified());
        assert!(!result(VerificationStatus::NeedsReview).is_verified());
        assert!(!result(VerificationStatus::Failed).is_verified());
    }

    #[test]
    fn summary_includes_mismatches() {
        let mut r = result(VerificationStatus::NeedsReview);
        r.mismatches.push(FieldMismatch {
            field: "Full Name".to_string(),
            application_value: "Ada Lovelace".to_string(),
            document_value: "A. Byron".to_string(),
            severity: MismatchSeverity::High,
            message: "name on ID does not match application".to_string(),
        });
        let summary = r.summary();
        assert!(summary.contains("needs_review"));
        assert!(summary.contains("Full Name"));
    }
}
