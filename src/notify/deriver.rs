//! Per-user unseen-notification derivation.
//!
//! Notifications are not stored. Each role's inbox is derived on demand
//! from the audit trail minus the user's acknowledgement watermark, so a
//! missed watermark write re-shows items instead of dropping them.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::domain::{
    ApplicationId, AuditAction, AuditEvent, AuditFilter, EventId, Role, UserId,
};
use crate::infra::{ApplicationStore, AuditLog, Result, WatermarkStore};

/// Cap on items surfaced per open.
pub const MAX_NOTIFICATIONS: usize = 10;

/// How far back in the audit trail the deriver looks.
const SCAN_LIMIT: usize = 200;

/// One unseen inbox item.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub event_id: EventId,
    pub application_id: ApplicationId,
    pub action: AuditAction,
    pub message: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Notification {
    fn from_event(event: &AuditEvent) -> Self {
        Self {
            event_id: event.id,
            application_id: event.application_id,
            action: event.action,
            message: message_for(event),
            created_at: event.created_at,
        }
    }
}

fn message_for(event: &AuditEvent) -> String {
    match event.action {
        AuditAction::Submitted => {
            format!("Application {} was submitted for review", event.application_id)
        }
        AuditAction::MarkReady => format!(
            "Application {} cleared analyst review and joined the case queue",
            event.application_id
        ),
        AuditAction::UnderReview => {
            format!("Application {} is under underwriter review", event.application_id)
        }
        AuditAction::Approved => format!("Application {} was approved", event.application_id),
        AuditAction::Declined => format!("Application {} was declined", event.application_id),
        AuditAction::Rejected => format!("Application {} was rejected", event.application_id),
        AuditAction::NeedsInfo => format!(
            "Application {} needs more information from you",
            event.application_id
        ),
        other => format!("Application {}: {}", event.application_id, other),
    }
}

/// Audit actions relevant to a role's inbox. `None` means everything.
fn relevant_actions(role: Role) -> Option<&'static [AuditAction]> {
    match role {
        Role::Analyst => Some(&[AuditAction::Submitted]),
        Role::Underwriter => Some(&[AuditAction::MarkReady, AuditAction::UnderReview]),
        Role::Customer => Some(&[
            AuditAction::Approved,
            AuditAction::Declined,
            AuditAction::Rejected,
            AuditAction::NeedsInfo,
        ]),
        Role::Admin | Role::Auditor => None,
    }
}

/// Derives unseen notification sets and maintains watermarks.
pub struct NotificationDeriver {
    audit: Arc<dyn AuditLog>,
    applications: Arc<dyn ApplicationStore>,
    watermarks: Arc<dyn WatermarkStore>,
}

impl NotificationDeriver {
    pub fn new(
        audit: Arc<dyn AuditLog>,
        applications: Arc<dyn ApplicationStore>,
        watermarks: Arc<dyn WatermarkStore>,
    ) -> Self {
        Self {
            audit,
            applications,
            watermarks,
        }
    }

    /// Unseen notifications for one user in one role, newest first, capped
    /// to [`MAX_NOTIFICATIONS`].
    pub async fn unseen(&self, user_id: &UserId, role: Role) -> Result<Vec<Notification>> {
        let recent = self
            .audit
            .query(&AuditFilter {
                limit: SCAN_LIMIT,
                ..Default::default()
            })
            .await?;

        let actions = relevant_actions(role);
        let own_applications: Option<HashSet<ApplicationId>> = if role == Role::Customer {
            let apps = self.applications.list_for_customer(user_id).await?;
            Some(apps.into_iter().map(|a| a.id).collect())
        } else {
            None
        };

        // A watermark read failure degrades to "nothing acknowledged":
        // re-showing beats silently dropping.
        let seen = match self.watermarks.seen(user_id, role).await {
            Ok(seen) => seen,
            Err(e) => {
                warn!(user = %user_id, role = %role, error = %e, "watermark read failed, treating all as unseen");
                HashSet::new()
            }
        };

        let mut unseen: Vec<Notification> = recent
            .iter()
            .filter(|e| actions.map(|set| set.contains(&e.action)).unwrap_or(true))
            .filter(|e| {
                own_applications
                    .as_ref()
                    .map(|own| own.contains(&e.application_id))
                    .unwrap_or(true)
            })
            .filter(|e| !seen.contains(&e.id))
            .map(Notification::from_event)
            .collect();

        unseen.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        unseen.truncate(MAX_NOTIFICATIONS);
        Ok(unseen)
    }

    /// Merge the shown ids into the user's watermark.
    ///
    /// Acknowledgement is at-least-once: a failed write is logged and
    /// retried implicitly on the next open, when the same items resurface.
    pub async fn acknowledge(&self, user_id: &UserId, role: Role, ids: &[EventId]) {
        if ids.is_empty() {
            return;
        }
        if let Err(e) = self.watermarks.acknowledge(user_id, role, ids).await {
            warn!(
                user = %user_id,
                role = %role,
                count = ids.len(),
                error = %e,
                "watermark write failed, items will re-surface on next open"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Application;
    use crate::infra::MemoryStore;
    use serde_json::json;

    async fn seed(store: &MemoryStore, action: AuditAction, customer: &str) -> AuditEvent {
        let app = Application::new_draft(customer.into(), json!({"insuranceType": "auto"}));
        let event = AuditEvent::new(app.id, action, Role::Customer, customer.into());
        store.insert(&app, &event).await.unwrap();
        event
    }

    fn deriver(store: Arc<MemoryStore>) -> NotificationDeriver {
        NotificationDeriver::new(store.clone(), store.clone(), store)
    }

    #[tokio::test]
    async fn analyst_sees_only_submissions() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, AuditAction::Submitted, "cust-1").await;
        seed(&store, AuditAction::Approved, "cust-2").await;

        let unseen = deriver(store)
            .unseen(&"analyst-1".into(), Role::Analyst)
            .await
            .unwrap();
        assert_eq!(unseen.len(), 1);
        assert_eq!(unseen[0].action, AuditAction::Submitted);
    }

    #[tokio::test]
    async fn customer_sees_only_own_decisions() {
        let store = Arc::new(MemoryStore::new());
        let mine = seed(&store, AuditAction::Approved, "cust-1").await;
        seed(&store, AuditAction::Approved, "cust-2").await;

        let unseen = deriver(store)
            .unseen(&"cust-1".into(), Role::Customer)
            .await
            .unwrap();
        assert_eq!(unseen.len(), 1);
        assert_eq!(unseen[0].event_id, mine.id);
    }

    #[tokio::test]
    async fn acknowledged_items_never_resurface() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, AuditAction::Submitted, "cust-1").await;
        let deriver = deriver(store);
        let analyst: UserId = "analyst-1".into();

        let shown = deriver.unseen(&analyst, Role::Analyst).await.unwrap();
        assert_eq!(shown.len(), 1);

        let ids: Vec<EventId> = shown.iter().map(|n| n.event_id).collect();
        deriver.acknowledge(&analyst, Role::Analyst, &ids).await;

        let after = deriver.unseen(&analyst, Role::Analyst).await.unwrap();
        assert!(after.is_empty());

        // Acknowledging again is harmless.
        deriver.acknowledge(&analyst, Role::Analyst, &ids).await;
        assert!(deriver.unseen(&analyst, Role::Analyst).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inbox_is_capped_to_ten_newest() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..15 {
            seed(&store, AuditAction::Submitted, &format!("cust-{i}")).await;
        }
        let unseen = deriver(store)
            .unseen(&"analyst-1".into(), Role::Analyst)
            .await
            .unwrap();
        assert_eq!(unseen.len(), MAX_NOTIFICATIONS);
        for pair in unseen.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    async fn watermark_read_failure_degrades_to_all_unseen() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, AuditAction::Submitted, "cust-1").await;

        let mut watermarks = crate::infra::MockWatermarkStore::new();
        watermarks
            .expect_seen()
            .returning(|_, _| Err(crate::infra::WorkflowError::Internal("offline".into())));

        let deriver =
            NotificationDeriver::new(store.clone(), store.clone(), Arc::new(watermarks));
        let unseen = deriver
            .unseen(&"analyst-1".into(), Role::Analyst)
            .await
            .unwrap();
        assert_eq!(unseen.len(), 1);
    }

    #[tokio::test]
    async fn auditor_sees_everything() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, AuditAction::Submitted, "cust-1").await;
        seed(&store, AuditAction::Approved, "cust-2").await;

        let unseen = deriver(store)
            .unseen(&"auditor-1".into(), Role::Auditor)
            .await
            .unwrap();
        assert_eq!(unseen.len(), 2);
    }
}
