//! Trait definitions for workflow storage seams.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use std::collections::HashSet;

use crate::domain::{
    Application, ApplicationId, ApplicationStatus, AuditEvent, AuditFilter, EventId, Role, UserId,
};

use super::Result;

/// Canonical application state plus the single writer path for transitions.
///
/// Invariant: state mutation and the audit append for it are one atomic
/// commit; a failed commit leaves neither behind. Only the lifecycle service
/// writes through this trait.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Persist a new application together with its `created` audit event.
    async fn insert(&self, application: &Application, event: &AuditEvent) -> Result<()>;

    async fn get(&self, id: &ApplicationId) -> Result<Option<Application>>;

    /// Commit a transition: replace the stored application and append the
    /// audit event in one transaction, guarded by `expected_version`.
    ///
    /// Returns `Conflict` when another writer got there first; the caller
    /// re-fetches and retries. This is the single-writer discipline per
    /// application.
    async fn commit(
        &self,
        application: &Application,
        event: &AuditEvent,
        expected_version: u64,
    ) -> Result<()>;

    /// List applications in any of the given statuses, newest first.
    async fn list_by_status(&self, statuses: &[ApplicationStatus]) -> Result<Vec<Application>>;

    /// List a customer's applications, newest first.
    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Application>>;

    /// Most recently created applications, for auditor sampling.
    async fn list_recent(&self, limit: usize) -> Result<Vec<Application>>;

    async fn count(&self) -> Result<u64>;
}

/// Read side of the append-only audit trail.
///
/// Appends happen exclusively through [`ApplicationStore::insert`] /
/// [`ApplicationStore::commit`] so that they share the transition's
/// transaction boundary.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Events for one application, oldest first.
    async fn list_for_application(&self, application_id: &ApplicationId)
        -> Result<Vec<AuditEvent>>;

    /// Filtered query, newest first. All filter fields are conjunctive.
    async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>>;

    async fn count(&self) -> Result<u64>;
}

/// Per-user, per-role acknowledgement watermark for notifications.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Event ids this user has already acknowledged in this role.
    async fn seen(&self, user_id: &UserId, role: Role) -> Result<HashSet<EventId>>;

    /// Union `ids` into the watermark. Idempotent.
    async fn acknowledge(&self, user_id: &UserId, role: Role, ids: &[EventId]) -> Result<()>;
}
