//! Common test utilities and fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use policyflow::domain::{
    Actor, Application, ApplicationId, DocumentRef, Role, UserId, VerificationResult,
    VerificationStatus,
};
use policyflow::infra::MemoryStore;
use policyflow::lifecycle::Lifecycle;

/// Customer actor used throughout the suites.
pub fn customer() -> Actor {
    Actor::new("cust-1", Role::Customer)
}

pub fn other_customer() -> Actor {
    Actor::new("cust-2", Role::Customer)
}

pub fn analyst() -> Actor {
    Actor::new("analyst-1", Role::Analyst)
}

pub fn underwriter() -> Actor {
    Actor::new("uw-1", Role::Underwriter)
}

pub fn auditor() -> Actor {
    Actor::new("auditor-1", Role::Auditor)
}

/// A complete auto application form.
pub fn auto_application_data() -> serde_json::Value {
    json!({
        "insuranceType": "auto",
        "age": 34,
        "income": 80000,
        "debt": 10000,
        "coverageNeeds": "50000",
        "assetValuation": 30000,
        "fullName": "Ada Lovelace",
        "drivingHistory": "clean",
        "annualMileage": "12000",
        "vehicleMake": "Toyota",
        "vehicleModel": "Camry",
        "vehicleYear": "2020",
    })
}

/// A form missing most required fields.
pub fn incomplete_application_data() -> serde_json::Value {
    json!({ "insuranceType": "auto" })
}

/// Fresh store plus a lifecycle service over it.
pub fn lifecycle_fixture() -> (Arc<MemoryStore>, Lifecycle) {
    let store = Arc::new(MemoryStore::new());
    let lifecycle = Lifecycle::new(store.clone());
    (store, lifecycle)
}

/// Create a draft, attach one document, and submit it.
pub async fn submitted_application(lifecycle: &Lifecycle) -> Application {
    let actor = customer();
    let app = lifecycle
        .create(&actor, auto_application_data())
        .await
        .expect("create");
    lifecycle
        .record_document(
            &app.id,
            &actor,
            "vehicle_registration.pdf".to_string(),
            Some("application/pdf".to_string()),
        )
        .await
        .expect("upload");
    lifecycle.submit(&app.id, &actor).await.expect("submit")
}

/// A clean verification result attributed to the test analyst.
pub fn verified_result() -> VerificationResult {
    VerificationResult {
        overall_status: VerificationStatus::Verified,
        confidence_score: 1.0,
        document_type: "VEHICLE_REGISTRATION".to_string(),
        matches: vec![],
        mismatches: vec![],
        warnings: vec![],
        verified_by: UserId::new("analyst-1"),
        verified_at: Utc::now(),
    }
}

/// A verification result that requires human review.
pub fn needs_review_result() -> VerificationResult {
    VerificationResult {
        overall_status: VerificationStatus::NeedsReview,
        confidence_score: 0.4,
        document_type: "ID_PROOF".to_string(),
        matches: vec![],
        mismatches: vec![],
        warnings: vec!["name mismatch".to_string()],
        verified_by: UserId::new("analyst-1"),
        verified_at: Utc::now(),
    }
}

/// Drive an application all the way to `under_review`.
pub async fn application_under_review(lifecycle: &Lifecycle) -> Application {
    let app = submitted_application(lifecycle).await;
    lifecycle
        .attach_verification(&app.id, &analyst(), verified_result())
        .await
        .expect("verify");
    lifecycle
        .analyst_approve(&app.id, &analyst())
        .await
        .expect("analyst approve");
    lifecycle
        .assign_underwriter(&app.id, &underwriter())
        .await
        .expect("assign")
}

/// Document fixture for verifier tests.
pub fn document(filename: &str) -> DocumentRef {
    DocumentRef {
        filename: filename.to_string(),
        content_type: Some("application/pdf".to_string()),
        uploaded_by: UserId::new("cust-1"),
        uploaded_at: Utc::now(),
    }
}

pub fn random_application_id() -> ApplicationId {
    ApplicationId::new()
}
