//! Domain types for the application lifecycle.

mod application;
mod audit;
mod risk;
mod types;
mod verification;

pub use application::{Application, ApplicationStatus, DocumentRef, PaymentStatus};
pub use audit::{AuditAction, AuditEvent, AuditFilter};
pub use risk::{PremiumRange, RiskAssessment, RiskLevel, WhatIfOutcome, WhatIfParams};
pub use types::{Actor, ApplicationId, EventId, Role, UserId};
pub use verification::{
    FieldMatch, FieldMismatch, MismatchSeverity, VerificationResult, VerificationStatus,
};
