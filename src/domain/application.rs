//! Application entity and status model.
//!
//! This is the canonical record for one insurance application as it moves
//! through the review pipeline. The free-form `data` bag carries the
//! line-of-business form fields and is opaque to the lifecycle machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::verification::VerificationResult;
use super::{ApplicationId, UserId};

/// Coarse canonical state of an application.
///
/// Transitions are forward-only along the review pipeline; the single
/// exception is the `needs_info` round trip back to `submitted` once the
/// customer responds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    AnalystApproved,
    UnderReview,
    Approved,
    Declined,
    Rejected,
    NeedsInfo,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::AnalystApproved => "analyst_approved",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Declined => "declined",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::NeedsInfo => "needs_info",
        }
    }

    /// Terminal statuses never revert.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Approved
                | ApplicationStatus::Declined
                | ApplicationStatus::Rejected
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ApplicationStatus::Draft),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "analyst_approved" => Ok(ApplicationStatus::AnalystApproved),
            "under_review" => Ok(ApplicationStatus::UnderReview),
            "approved" => Ok(ApplicationStatus::Approved),
            "declined" => Ok(ApplicationStatus::Declined),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "needs_info" => Ok(ApplicationStatus::NeedsInfo),
            other => Err(format!("unknown application status: {other}")),
        }
    }
}

/// Payment state of an approved application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// Metadata for one uploaded supporting document.
///
/// File contents live in blob storage owned by the gateway; the workflow
/// only tracks enough to validate submission and drive verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub uploaded_by: UserId,
    pub uploaded_at: DateTime<Utc>,
}

/// One insurance application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,

    /// Owning customer.
    pub customer_id: UserId,

    pub status: ApplicationStatus,

    /// Line-of-business form fields (insurance type, coverage, financials).
    /// Schema varies by insurance type and is opaque to the state machine.
    pub data: serde_json::Value,

    /// Supporting documents recorded against this application.
    #[serde(default)]
    pub documents: Vec<DocumentRef>,

    /// Reviewer assignments, set when a reviewer claims the case.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyst_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underwriter_id: Option<UserId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,

    /// Result of the most recent document verification run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_data: Option<VerificationResult>,

    /// Populated only after `approved`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_premium: Option<f64>,

    /// Optimistic concurrency counter; every committed mutation increments it.
    pub version: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Create a fresh draft owned by `customer_id`.
    pub fn new_draft(customer_id: UserId, data: serde_json::Value) -> Self {
        let now = Utc::now();
        Self {
            id: ApplicationId::new(),
            customer_id,
            status: ApplicationStatus::Draft,
            data,
            documents: Vec::new(),
            analyst_id: None,
            underwriter_id: None,
            decision_reason: None,
            rejection_reason: None,
            verification_data: None,
            payment_status: None,
            policy_number: None,
            final_premium: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether document verification has run and come back clean.
    pub fn is_verified(&self) -> bool {
        self.verification_data
            .as_ref()
            .map(|v| v.is_verified())
            .unwrap_or(false)
    }

    /// The most recently uploaded document, if any.
    pub fn latest_document(&self) -> Option<&DocumentRef> {
        self.documents
            .iter()
            .max_by_key(|d| d.uploaded_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            ApplicationStatus::Draft,
            ApplicationStatus::Submitted,
            ApplicationStatus::AnalystApproved,
            ApplicationStatus::UnderReview,
            ApplicationStatus::Approved,
            ApplicationStatus::Declined,
            ApplicationStatus::Rejected,
            ApplicationStatus::NeedsInfo,
        ] {
            assert_eq!(
                status.as_str().parse::<ApplicationStatus>().unwrap(),
                status
            );
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(ApplicationStatus::Approved.is_terminal());
        assert!(ApplicationStatus::Declined.is_terminal());
        assert!(ApplicationStatus::Rejected.is_terminal());
        assert!(!ApplicationStatus::Draft.is_terminal());
        assert!(!ApplicationStatus::NeedsInfo.is_terminal());
    }

    #[test]
    fn new_draft_starts_clean() {
        let app = Application::new_draft("cust-1".into(), json!({"insuranceType": "auto"}));
        assert_eq!(app.status, ApplicationStatus::Draft);
        assert_eq!(app.version, 1);
        assert!(app.documents.is_empty());
        assert!(!app.is_verified());
        assert_eq!(app.created_at, app.updated_at);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ApplicationStatus::AnalystApproved).unwrap();
        assert_eq!(json, "\"analyst_approved\"");
    }
}
