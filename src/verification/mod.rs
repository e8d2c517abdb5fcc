//! Document verification collaborator.
//!
//! The workflow refuses analyst approval until a verification run has come
//! back clean; the actual extraction engine is external. The heuristic
//! implementation here classifies by filename and cross-checks a stubbed
//! extraction against the application form, which is enough to drive the
//! full pipeline in development and tests.

mod heuristic;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::{Application, DocumentRef, VerificationResult};
use crate::infra::Result;

pub use heuristic::HeuristicVerifier;

/// Seam to the document verification engine.
///
/// Implementations return `WorkflowError::External` when the engine is
/// unavailable; the caller refuses the dependent transition rather than
/// guessing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Cross-check one uploaded document against the application form.
    async fn verify(
        &self,
        application: &Application,
        document: &DocumentRef,
    ) -> Result<VerificationResult>;
}
