//! Audit trail types.
//!
//! One `AuditEvent` is appended for every successful lifecycle transition.
//! Events are immutable once written and ordered by `created_at` (insertion
//! order breaks ties), forming the compliance record read by the auditor
//! dashboard, the status stepper, and the notification deriver.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ApplicationId, EventId, Role, UserId};

/// Lifecycle actions recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Submitted,
    MarkReady,
    UnderReview,
    Approved,
    Declined,
    Rejected,
    NeedsInfo,
    Updated,
    DocumentUploaded,
    DocumentVerified,
    PaymentRecorded,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Created => "created",
            AuditAction::Submitted => "submitted",
            AuditAction::MarkReady => "mark_ready",
            AuditAction::UnderReview => "under_review",
            AuditAction::Approved => "approved",
            AuditAction::Declined => "declined",
            AuditAction::Rejected => "rejected",
            AuditAction::NeedsInfo => "needs_info",
            AuditAction::Updated => "updated",
            AuditAction::DocumentUploaded => "document_uploaded",
            AuditAction::DocumentVerified => "document_verified",
            AuditAction::PaymentRecorded => "payment_recorded",
        }
    }

    /// Actions that record a final decision.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuditAction::Approved | AuditAction::Declined | AuditAction::Rejected
        )
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(AuditAction::Created),
            "submitted" => Ok(AuditAction::Submitted),
            "mark_ready" => Ok(AuditAction::MarkReady),
            "under_review" => Ok(AuditAction::UnderReview),
            "approved" => Ok(AuditAction::Approved),
            "declined" => Ok(AuditAction::Declined),
            "rejected" => Ok(AuditAction::Rejected),
            "needs_info" => Ok(AuditAction::NeedsInfo),
            "updated" => Ok(AuditAction::Updated),
            "document_uploaded" => Ok(AuditAction::DocumentUploaded),
            "document_verified" => Ok(AuditAction::DocumentVerified),
            "payment_recorded" => Ok(AuditAction::PaymentRecorded),
            other => Err(format!("unknown audit action: {other}")),
        }
    }
}

/// Immutable record of one lifecycle transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: EventId,
    pub application_id: ApplicationId,
    pub action: AuditAction,
    pub actor_role: Role,
    pub actor_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        application_id: ApplicationId,
        action: AuditAction,
        actor_role: Role,
        actor_id: UserId,
    ) -> Self {
        Self {
            id: EventId::new(),
            application_id,
            action,
            actor_role,
            actor_id,
            details: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Conjunctive filter for audit queries; all set fields must match.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action: Option<AuditAction>,
    pub actor_role: Option<Role>,
    pub application_id: Option<ApplicationId>,
    /// Maximum events returned, newest first. Zero means the store default.
    pub limit: usize,
}

impl AuditFilter {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn effective_limit(&self) -> usize {
        if self.limit == 0 {
            Self::DEFAULT_LIMIT
        } else {
            self.limit
        }
    }

    /// Whether `event` satisfies every set filter field.
    pub fn matches(&self, event: &AuditEvent) -> bool {
        if let Some(action) = self.action {
            if event.action != action {
                return false;
            }
        }
        if let Some(role) = self.actor_role {
            if event.actor_role != role {
                return false;
            }
        }
        if let Some(app_id) = self.application_id {
            if event.application_id != app_id {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_round_trips_through_str() {
        for action in [
            AuditAction::Created,
            AuditAction::Submitted,
            AuditAction::MarkReady,
            AuditAction::UnderReview,
            AuditAction::Approved,
            AuditAction::Declined,
            AuditAction::Rejected,
            AuditAction::NeedsInfo,
            AuditAction::Updated,
            AuditAction::DocumentUploaded,
            AuditAction::DocumentVerified,
            AuditAction::PaymentRecorded,
        ] {
            assert_eq!(action.as_str().parse::<AuditAction>().unwrap(), action);
        }
    }

    #[test]
    fn terminal_actions() {
        assert!(AuditAction::Approved.is_terminal());
        assert!(AuditAction::Declined.is_terminal());
        assert!(AuditAction::Rejected.is_terminal());
        assert!(!AuditAction::MarkReady.is_terminal());
        assert!(!AuditAction::NeedsInfo.is_terminal());
    }

    #[test]
    fn filter_is_conjunctive() {
        let app_id = ApplicationId::new();
        let event = AuditEvent::new(
            app_id,
            AuditAction::Submitted,
            Role::Customer,
            "cust-1".into(),
        );

        let empty = AuditFilter::default();
        assert!(empty.matches(&event));

        let matching = AuditFilter {
            action: Some(AuditAction::Submitted),
            actor_role: Some(Role::Customer),
            application_id: Some(app_id),
            limit: 0,
        };
        assert!(matching.matches(&event));

        let wrong_role = AuditFilter {
            action: Some(AuditAction::Submitted),
            actor_role: Some(Role::Analyst),
            ..Default::default()
        };
        assert!(!wrong_role.matches(&event));
    }

    #[test]
    fn event_details_attach() {
        let event = AuditEvent::new(
            ApplicationId::new(),
            AuditAction::Rejected,
            Role::Analyst,
            "analyst-1".into(),
        )
        .with_details(json!({"reason": "incomplete documents"}));

        assert_eq!(
            event.details.unwrap()["reason"],
            json!("incomplete documents")
        );
    }
}
