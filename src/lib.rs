//! Policyflow
//!
//! Role-based insurance application lifecycle service: customers submit
//! applications, analysts verify documents, underwriters price and decide,
//! and auditors review the compliance trail.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (applications, audit events, risk)
//! - [`lifecycle`] - The state machine and step derivation
//! - [`notify`] - Notification derivation from the audit trail
//! - [`risk`] - Risk scoring and premium advisory
//! - [`verification`] - Document verification collaborator
//! - [`infra`] - Storage traits and implementations (PostgreSQL, in-memory)
//! - [`api`] - REST API routes
//! - [`server`] - HTTP server bootstrap

pub mod api;
pub mod domain;
pub mod infra;
pub mod lifecycle;
pub mod migrations;
pub mod notify;
pub mod risk;
pub mod server;
pub mod verification;

// Re-export commonly used types
pub use domain::{
    Actor, Application, ApplicationId, ApplicationStatus, AuditAction, AuditEvent, AuditFilter,
    EventId, RiskAssessment, RiskLevel, Role, UserId, VerificationResult, VerificationStatus,
};
pub use infra::{
    ApplicationStore, AuditLog, MemoryStore, PgStore, Result, WatermarkStore, WorkflowError,
};
pub use lifecycle::{allowed_operations, current_step, Decision, Lifecycle, Step};
pub use notify::{NotificationDeriver, MAX_NOTIFICATIONS};
pub use risk::{RiskModel, StandardRiskModel};
pub use verification::{HeuristicVerifier, Verifier};
