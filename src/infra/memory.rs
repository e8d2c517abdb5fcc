//! In-memory store implementation.
//!
//! Backs unit and integration tests, and local development without a
//! database. Implements the same atomicity contract as the Postgres store:
//! a commit swaps the application record and appends its audit event under
//! one lock acquisition.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use crate::domain::{
    Application, ApplicationId, ApplicationStatus, AuditEvent, AuditFilter, EventId, Role, UserId,
};

use super::{ApplicationStore, AuditLog, Result, WatermarkStore, WorkflowError};

#[derive(Default)]
struct Inner {
    applications: HashMap<ApplicationId, Application>,
    /// Append-only; Vec order is the insertion-order tiebreak.
    events: Vec<AuditEvent>,
    watermarks: HashMap<(UserId, Role), HashSet<EventId>>,
}

/// Shared in-memory backend implementing every storage trait.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert(&self, application: &Application, event: &AuditEvent) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .applications
            .insert(application.id, application.clone());
        inner.events.push(event.clone());
        Ok(())
    }

    async fn get(&self, id: &ApplicationId) -> Result<Option<Application>> {
        let inner = self.inner.read().await;
        Ok(inner.applications.get(id).cloned())
    }

    async fn commit(
        &self,
        application: &Application,
        event: &AuditEvent,
        expected_version: u64,
    ) -> Result<()> {
        let mut inner = self.inner.write().await;
        let current = inner
            .applications
            .get(&application.id)
            .ok_or(WorkflowError::NotFound(application.id))?;
        if current.version != expected_version {
            return Err(WorkflowError::Conflict {
                application_id: application.id,
                expected: expected_version,
                actual: current.version,
            });
        }
        inner
            .applications
            .insert(application.id, application.clone());
        inner.events.push(event.clone());
        Ok(())
    }

    async fn list_by_status(&self, statuses: &[ApplicationStatus]) -> Result<Vec<Application>> {
        let inner = self.inner.read().await;
        let mut apps: Vec<Application> = inner
            .applications
            .values()
            .filter(|a| statuses.contains(&a.status))
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Application>> {
        let inner = self.inner.read().await;
        let mut apps: Vec<Application> = inner
            .applications
            .values()
            .filter(|a| &a.customer_id == customer_id)
            .cloned()
            .collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(apps)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Application>> {
        let inner = self.inner.read().await;
        let mut apps: Vec<Application> = inner.applications.values().cloned().collect();
        apps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        apps.truncate(limit);
        Ok(apps)
    }

    async fn count(&self) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.applications.len() as u64)
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<AuditEvent>> {
        let inner = self.inner.read().await;
        let mut events: Vec<AuditEvent> = inner
            .events
            .iter()
            .filter(|e| &e.application_id == application_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        events.sort_by_key(|e| e.created_at);
        Ok(events)
    }

    async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>> {
        let inner = self.inner.read().await;
        let mut events: Vec<AuditEvent> = inner
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events.truncate(filter.effective_limit());
        Ok(events)
    }

    async fn count(&self) -> Result<u64> {
        let inner = self.inner.read().await;
        Ok(inner.events.len() as u64)
    }
}

#[async_trait]
impl WatermarkStore for MemoryStore {
    async fn seen(&self, user_id: &UserId, role: Role) -> Result<HashSet<EventId>> {
        let inner = self.inner.read().await;
        Ok(inner
            .watermarks
            .get(&(user_id.clone(), role))
            .cloned()
            .unwrap_or_default())
    }

    async fn acknowledge(&self, user_id: &UserId, role: Role, ids: &[EventId]) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .watermarks
            .entry((user_id.clone(), role))
            .or_default()
            .extend(ids.iter().copied());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuditAction;
    use serde_json::json;

    fn draft() -> Application {
        Application::new_draft("cust-1".into(), json!({"insuranceType": "auto"}))
    }

    fn created_event(app: &Application) -> AuditEvent {
        AuditEvent::new(
            app.id,
            AuditAction::Created,
            Role::Customer,
            app.customer_id.clone(),
        )
    }

    #[tokio::test]
    async fn insert_and_get() {
        let store = MemoryStore::new();
        let app = draft();
        store.insert(&app, &created_event(&app)).await.unwrap();

        let loaded = store.get(&app.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, app.id);
        assert_eq!(AuditLog::count(&store).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn commit_rejects_stale_version() {
        let store = MemoryStore::new();
        let app = draft();
        store.insert(&app, &created_event(&app)).await.unwrap();

        let mut first = app.clone();
        first.status = ApplicationStatus::Submitted;
        first.version = 2;
        let event = AuditEvent::new(
            app.id,
            AuditAction::Submitted,
            Role::Customer,
            app.customer_id.clone(),
        );
        store.commit(&first, &event, 1).await.unwrap();

        // Second writer still holds version 1.
        let mut second = app.clone();
        second.status = ApplicationStatus::Rejected;
        second.version = 2;
        let err = store.commit(&second, &event, 1).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict { actual: 2, .. }));

        // The losing write left no trace.
        let stored = store.get(&app.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ApplicationStatus::Submitted);
    }

    #[tokio::test]
    async fn audit_query_filters_and_caps() {
        let store = MemoryStore::new();
        let app = draft();
        store.insert(&app, &created_event(&app)).await.unwrap();

        let other = draft();
        store.insert(&other, &created_event(&other)).await.unwrap();

        let filter = AuditFilter {
            application_id: Some(app.id),
            ..Default::default()
        };
        let events = store.query(&filter).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].application_id, app.id);
    }

    #[tokio::test]
    async fn acknowledge_is_idempotent() {
        let store = MemoryStore::new();
        let user: UserId = "analyst-1".into();
        let ids = [EventId::new(), EventId::new()];

        store
            .acknowledge(&user, Role::Analyst, &ids)
            .await
            .unwrap();
        store
            .acknowledge(&user, Role::Analyst, &ids)
            .await
            .unwrap();

        let seen = store.seen(&user, Role::Analyst).await.unwrap();
        assert_eq!(seen.len(), 2);
    }
}
