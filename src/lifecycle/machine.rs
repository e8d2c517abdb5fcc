//! The application lifecycle state machine.
//!
//! Enforces legal transitions, appends the audit event for each one, and
//! serializes concurrent writers per application through the store's
//! optimistic-concurrency commit. Preconditions are checked before any
//! mutation; a failed operation changes nothing and appends nothing.

use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::domain::{
    Actor, Application, ApplicationId, ApplicationStatus, AuditAction, AuditEvent, DocumentRef,
    PaymentStatus, Role, VerificationResult,
};
use crate::infra::{ApplicationStore, Result, WorkflowError};

/// Form fields that must be present before submission.
const REQUIRED_FIELDS: [&str; 6] = [
    "age",
    "insuranceType",
    "coverageNeeds",
    "assetValuation",
    "income",
    "debt",
];

/// Underwriter decision on a case under review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Decline,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Decline => "decline",
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "approve" => Ok(Decision::Approve),
            "decline" => Ok(Decision::Decline),
            other => Err(format!("unknown decision: {other}")),
        }
    }
}

/// Operations a role may attempt from a given status, for UI affordances.
pub fn allowed_operations(status: ApplicationStatus, role: Role) -> &'static [&'static str] {
    use ApplicationStatus::*;
    match (status, role) {
        (Draft, Role::Customer) => &["update_draft", "upload_document", "submit"],
        (NeedsInfo, Role::Customer) => &["upload_document", "submit"],
        (Approved, Role::Customer) => &["pay"],
        (Submitted, Role::Analyst) => &["verify_document", "approve", "reject", "request_info"],
        (AnalystApproved, Role::Analyst) => &["request_info"],
        (AnalystApproved, Role::Underwriter) => &["assign"],
        (UnderReview, Role::Underwriter) => &["decide"],
        _ => &[],
    }
}

/// The lifecycle service. Single writer path for application state.
pub struct Lifecycle {
    store: Arc<dyn ApplicationStore>,
}

impl Lifecycle {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store }
    }

    async fn load(&self, id: &ApplicationId) -> Result<Application> {
        self.store
            .get(id)
            .await?
            .ok_or(WorkflowError::NotFound(*id))
    }

    /// Commit a mutated application with its audit event, bumping the
    /// version. `app` must carry the version it was loaded with.
    async fn commit(&self, mut app: Application, event: AuditEvent) -> Result<Application> {
        let expected = app.version;
        app.version += 1;
        app.updated_at = Utc::now();
        self.store.commit(&app, &event, expected).await?;
        info!(
            application_id = %app.id,
            status = %app.status,
            action = %event.action,
            actor = %event.actor_id,
            "lifecycle transition committed"
        );
        Ok(app)
    }

    fn require_role(actor: &Actor, role: Role, operation: &'static str) -> Result<()> {
        if actor.role != role {
            return Err(WorkflowError::Forbidden {
                role: actor.role,
                operation,
            });
        }
        Ok(())
    }

    fn require_owner(app: &Application, actor: &Actor, operation: &'static str) -> Result<()> {
        if app.customer_id != actor.id {
            return Err(WorkflowError::Forbidden {
                role: actor.role,
                operation,
            });
        }
        Ok(())
    }

    /// Create a new draft application.
    pub async fn create(&self, actor: &Actor, data: serde_json::Value) -> Result<Application> {
        Self::require_role(actor, Role::Customer, "create an application")?;

        let app = Application::new_draft(actor.id.clone(), data);
        let event = AuditEvent::new(
            app.id,
            AuditAction::Created,
            actor.role,
            actor.id.clone(),
        );
        self.store.insert(&app, &event).await?;
        info!(application_id = %app.id, customer = %app.customer_id, "application created");
        Ok(app)
    }

    /// Replace the form data of a draft.
    pub async fn update_draft(
        &self,
        id: &ApplicationId,
        actor: &Actor,
        data: serde_json::Value,
    ) -> Result<Application> {
        Self::require_role(actor, Role::Customer, "update an application")?;
        let mut app = self.load(id).await?;
        Self::require_owner(&app, actor, "update an application")?;
        if app.status != ApplicationStatus::Draft {
            return Err(WorkflowError::InvalidState {
                status: app.status,
                operation: "update",
            });
        }

        app.data = data;
        let event = AuditEvent::new(*id, AuditAction::Updated, actor.role, actor.id.clone());
        self.commit(app, event).await
    }

    /// Record an uploaded supporting document.
    pub async fn record_document(
        &self,
        id: &ApplicationId,
        actor: &Actor,
        filename: String,
        content_type: Option<String>,
    ) -> Result<Application> {
        Self::require_role(actor, Role::Customer, "upload a document")?;
        let mut app = self.load(id).await?;
        Self::require_owner(&app, actor, "upload a document")?;
        if app.status.is_terminal() {
            return Err(WorkflowError::InvalidState {
                status: app.status,
                operation: "upload a document to",
            });
        }

        app.documents.push(DocumentRef {
            filename: filename.clone(),
            content_type,
            uploaded_by: actor.id.clone(),
            uploaded_at: Utc::now(),
        });
        let event = AuditEvent::new(
            *id,
            AuditAction::DocumentUploaded,
            actor.role,
            actor.id.clone(),
        )
        .with_details(json!({ "filename": filename }));
        self.commit(app, event).await
    }

    /// Submit a draft (or resubmit after a `needs_info` round trip).
    pub async fn submit(&self, id: &ApplicationId, actor: &Actor) -> Result<Application> {
        Self::require_role(actor, Role::Customer, "submit an application")?;
        let mut app = self.load(id).await?;
        Self::require_owner(&app, actor, "submit an application")?;
        if !matches!(
            app.status,
            ApplicationStatus::Draft | ApplicationStatus::NeedsInfo
        ) {
            return Err(WorkflowError::InvalidState {
                status: app.status,
                operation: "submit",
            });
        }

        let mut missing = missing_fields(&app.data);
        if app.documents.is_empty() {
            missing.push("supporting document".to_string());
        }
        if !missing.is_empty() {
            return Err(WorkflowError::Validation { missing });
        }

        app.status = ApplicationStatus::Submitted;
        let event = AuditEvent::new(*id, AuditAction::Submitted, actor.role, actor.id.clone());
        self.commit(app, event).await
    }

    /// Store the result of a document verification run.
    pub async fn attach_verification(
        &self,
        id: &ApplicationId,
        actor: &Actor,
        result: VerificationResult,
    ) -> Result<Application> {
        Self::require_role(actor, Role::Analyst, "verify documents")?;
        let mut app = self.load(id).await?;
        if app.status != ApplicationStatus::Submitted {
            return Err(WorkflowError::InvalidState {
                status: app.status,
                operation: "verify documents for",
            });
        }

        let details = json!({
            "overall_status": result.overall_status.as_str(),
            "document_type": result.document_type,
        });
        app.verification_data = Some(result);
        let event = AuditEvent::new(
            *id,
            AuditAction::DocumentVerified,
            actor.role,
            actor.id.clone(),
        )
        .with_details(details);
        self.commit(app, event).await
    }

    /// First-pass approval: moves the case to the underwriter queue.
    ///
    /// Requires a clean document verification; mirrors the reviewer rule
    /// that approval is unavailable until documents verify.
    pub async fn analyst_approve(&self, id: &ApplicationId, actor: &Actor) -> Result<Application> {
        Self::require_role(actor, Role::Analyst, "approve an application")?;
        let mut app = self.load(id).await?;
        if app.status != ApplicationStatus::Submitted {
            return Err(WorkflowError::InvalidState {
                status: app.status,
                operation: "approve",
            });
        }
        match &app.verification_data {
            None => {
                return Err(WorkflowError::Precondition(
                    "documents must be verified before approval".to_string(),
                ))
            }
            Some(v) if !v.is_verified() => {
                return Err(WorkflowError::Precondition(format!(
                    "document verification is {}, not verified",
                    v.overall_status
                )))
            }
            Some(_) => {}
        }

        app.status = ApplicationStatus::AnalystApproved;
        app.analyst_id = Some(actor.id.clone());
        let event = AuditEvent::new(*id, AuditAction::MarkReady, actor.role, actor.id.clone());
        self.commit(app, event).await
    }

    /// First-pass rejection, terminal.
    pub async fn analyst_reject(
        &self,
        id: &ApplicationId,
        actor: &Actor,
        reason: &str,
    ) -> Result<Application> {
        Self::require_role(actor, Role::Analyst, "reject an application")?;
        if reason.trim().is_empty() {
            return Err(WorkflowError::Validation {
                missing: vec!["reason".to_string()],
            });
        }
        let mut app = self.load(id).await?;
        if app.status != ApplicationStatus::Submitted {
            return Err(WorkflowError::InvalidState {
                status: app.status,
                operation: "reject",
            });
        }

        app.status = ApplicationStatus::Rejected;
        app.rejection_reason = Some(reason.to_string());
        app.analyst_id = Some(actor.id.clone());
        let event = AuditEvent::new(*id, AuditAction::Rejected, actor.role, actor.id.clone())
            .with_details(json!({ "reason": reason }));
        self.commit(app, event).await
    }

    /// Ask the customer for more input; resubmission returns to `submitted`.
    pub async fn request_more_info(
        &self,
        id: &ApplicationId,
        actor: &Actor,
        message: &str,
    ) -> Result<Application> {
        Self::require_role(actor, Role::Analyst, "request more information")?;
        if message.trim().is_empty() {
            return Err(WorkflowError::Validation {
                missing: vec!["message".to_string()],
            });
        }
        let mut app = self.load(id).await?;
        if !matches!(
            app.status,
            ApplicationStatus::Submitted | ApplicationStatus::AnalystApproved
        ) {
            return Err(WorkflowError::InvalidState {
                status: app.status,
                operation: "request more information for",
            });
        }

        app.status = ApplicationStatus::NeedsInfo;
        let event = AuditEvent::new(*id, AuditAction::NeedsInfo, actor.role, actor.id.clone())
            .with_details(json!({ "message": message }));
        self.commit(app, event).await
    }

    /// Underwriter claims an analyst-approved case.
    pub async fn assign_underwriter(
        &self,
        id: &ApplicationId,
        actor: &Actor,
    ) -> Result<Application> {
        Self::require_role(actor, Role::Underwriter, "claim a case")?;
        let mut app = self.load(id).await?;
        if app.status != ApplicationStatus::AnalystApproved {
            return Err(WorkflowError::InvalidState {
                status: app.status,
                operation: "claim",
            });
        }

        app.status = ApplicationStatus::UnderReview;
        app.underwriter_id = Some(actor.id.clone());
        let event = AuditEvent::new(*id, AuditAction::UnderReview, actor.role, actor.id.clone());
        self.commit(app, event).await
    }

    /// Final decision. `premium` is required when approving.
    pub async fn underwriter_decide(
        &self,
        id: &ApplicationId,
        actor: &Actor,
        decision: Decision,
        reason: &str,
        premium: Option<f64>,
    ) -> Result<Application> {
        Self::require_role(actor, Role::Underwriter, "decide an application")?;
        if reason.trim().is_empty() {
            return Err(WorkflowError::Validation {
                missing: vec!["reason".to_string()],
            });
        }
        if decision == Decision::Approve && premium.is_none() {
            return Err(WorkflowError::Validation {
                missing: vec!["premium_amount".to_string()],
            });
        }
        let mut app = self.load(id).await?;
        if app.status != ApplicationStatus::UnderReview {
            return Err(WorkflowError::InvalidState {
                status: app.status,
                operation: "decide",
            });
        }

        let (status, action) = match decision {
            Decision::Approve => (ApplicationStatus::Approved, AuditAction::Approved),
            Decision::Decline => (ApplicationStatus::Declined, AuditAction::Declined),
        };
        app.status = status;
        app.underwriter_id = Some(actor.id.clone());
        app.decision_reason = Some(reason.to_string());
        if decision == Decision::Approve {
            app.final_premium = premium;
        }
        let event = AuditEvent::new(*id, action, actor.role, actor.id.clone()).with_details(
            json!({ "reason": reason, "premium_amount": premium }),
        );
        self.commit(app, event).await
    }

    /// Record the first premium payment on an approved application and
    /// issue the policy number.
    pub async fn record_payment(&self, id: &ApplicationId, actor: &Actor) -> Result<Application> {
        Self::require_role(actor, Role::Customer, "pay for an application")?;
        let mut app = self.load(id).await?;
        Self::require_owner(&app, actor, "pay for an application")?;
        if app.status != ApplicationStatus::Approved {
            return Err(WorkflowError::InvalidState {
                status: app.status,
                operation: "pay for",
            });
        }
        if app.payment_status == Some(PaymentStatus::Paid) {
            return Err(WorkflowError::Precondition(
                "application is already paid".to_string(),
            ));
        }

        let policy_number = issue_policy_number(&app.id);
        app.payment_status = Some(PaymentStatus::Paid);
        app.policy_number = Some(policy_number.clone());
        let event = AuditEvent::new(
            *id,
            AuditAction::PaymentRecorded,
            actor.role,
            actor.id.clone(),
        )
        .with_details(json!({ "policy_number": policy_number }));
        self.commit(app, event).await
    }
}

/// Required form fields that are absent, null, or blank.
fn missing_fields(data: &serde_json::Value) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| {
            match data.get(**field) {
                None | Some(serde_json::Value::Null) => true,
                Some(serde_json::Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            }
        })
        .map(|f| f.to_string())
        .collect()
}

fn issue_policy_number(id: &ApplicationId) -> String {
    let hex = id.0.simple().to_string();
    format!("POL-{}", hex[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{MockApplicationStore, WorkflowError};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_application_is_not_found() {
        let mut store = MockApplicationStore::new();
        store.expect_get().returning(|_| Ok(None));

        let lifecycle = Lifecycle::new(Arc::new(store));
        let err = lifecycle
            .submit(&ApplicationId::new(), &Actor::new("cust-1", Role::Customer))
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn storage_failure_surfaces_from_create() {
        let mut store = MockApplicationStore::new();
        store
            .expect_insert()
            .returning(|_, _| Err(WorkflowError::Internal("backend offline".into())));

        let lifecycle = Lifecycle::new(Arc::new(store));
        let err = lifecycle
            .create(
                &Actor::new("cust-1", Role::Customer),
                json!({"insuranceType": "auto"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Internal(_)));
    }

    #[test]
    fn decision_parses() {
        assert_eq!("approve".parse::<Decision>().unwrap(), Decision::Approve);
        assert_eq!("decline".parse::<Decision>().unwrap(), Decision::Decline);
        assert!("pend".parse::<Decision>().is_err());
    }

    #[test]
    fn missing_fields_reports_blank_and_absent() {
        let data = json!({
            "age": 34,
            "insuranceType": "auto",
            "coverageNeeds": "",
            "income": null,
        });
        let missing = missing_fields(&data);
        assert_eq!(
            missing,
            vec!["coverageNeeds", "assetValuation", "income", "debt"]
        );
    }

    #[test]
    fn complete_data_has_no_missing_fields() {
        let data = json!({
            "age": 34,
            "insuranceType": "auto",
            "coverageNeeds": "50000",
            "assetValuation": 20000,
            "income": 60000,
            "debt": 5000,
        });
        assert!(missing_fields(&data).is_empty());
    }

    #[test]
    fn policy_numbers_are_prefixed_and_stable() {
        let id = ApplicationId::new();
        let first = issue_policy_number(&id);
        assert!(first.starts_with("POL-"));
        assert_eq!(first.len(), 12);
        assert_eq!(first, issue_policy_number(&id));
    }

    #[test]
    fn allowed_operations_by_role() {
        assert!(allowed_operations(ApplicationStatus::Draft, Role::Customer)
            .contains(&"submit"));
        assert!(
            allowed_operations(ApplicationStatus::Submitted, Role::Analyst)
                .contains(&"approve")
        );
        assert!(
            allowed_operations(ApplicationStatus::UnderReview, Role::Underwriter)
                .contains(&"decide")
        );
        assert!(allowed_operations(ApplicationStatus::Approved, Role::Analyst).is_empty());
        assert!(allowed_operations(ApplicationStatus::Declined, Role::Customer).is_empty());
    }
}
