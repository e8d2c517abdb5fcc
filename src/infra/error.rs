//! Error types for the workflow service.

use thiserror::Error;

use crate::domain::{ApplicationId, ApplicationStatus, Role};

/// Errors surfaced by workflow operations.
///
/// Every variant is recoverable by the caller in a specific way: correct the
/// input (`Validation`), re-fetch current state (`InvalidState`,
/// `Precondition`), retry after re-fetch (`Conflict`), or retry later
/// (`Storage`, `External`). Failed operations never leave partial state.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Required input missing or malformed.
    #[error("validation failed, missing required fields: {}", missing.join(", "))]
    Validation { missing: Vec<String> },

    /// Transition not legal from the current status.
    #[error("cannot {operation} an application in status {status}")]
    InvalidState {
        status: ApplicationStatus,
        operation: &'static str,
    },

    /// A dependency of the transition is not satisfied yet.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Lost a concurrent-write race; re-fetch and retry.
    #[error("concurrent update on application {application_id}: expected version {expected}, found {actual}")]
    Conflict {
        application_id: ApplicationId,
        expected: u64,
        actual: u64,
    },

    #[error("application not found: {0}")]
    NotFound(ApplicationId),

    /// Role is not allowed to perform this operation.
    #[error("role {role} may not {operation}")]
    Forbidden {
        role: Role,
        operation: &'static str,
    },

    /// Persistence failure; the attempted transition was rolled back.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Verification or risk collaborator unavailable.
    #[error("external service error: {0}")]
    External(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;
