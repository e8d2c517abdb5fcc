//! Analyst review handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::api::actor::{actor_from_headers, require_role};
use crate::api::error::{ApiError, ErrorCode};
use crate::api::types::{AnalystDashboard, RejectRequest, RequestInfoRequest};
use crate::domain::{Application, ApplicationId, ApplicationStatus, Role};
use crate::infra::WorkflowError;
use crate::server::AppState;

/// Upper bound on one verification run. Verification happens before any
/// state mutation, so a timeout leaves the application untouched.
const VERIFICATION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// POST /api/v1/applications/:id/verify-document - Run document verification.
///
/// Verifies the most recently uploaded document against the form and stores
/// the result on the application; approval stays unavailable until a run
/// comes back verified.
pub async fn verify_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Analyst)?;

    let id = ApplicationId::from_uuid(id);
    let app = state
        .applications
        .get(&id)
        .await?
        .ok_or(crate::infra::WorkflowError::NotFound(id))?;

    let document = app.latest_document().cloned().ok_or_else(|| {
        ApiError::new(
            ErrorCode::PreconditionFailed,
            "no document found for verification",
        )
    })?;

    let result = tokio::time::timeout(
        VERIFICATION_TIMEOUT,
        state.verifier.verify(&app, &document),
    )
    .await
    .map_err(|_| WorkflowError::External("document verification timed out".to_string()))??;
    let summary = result.summary();
    let app = state
        .lifecycle
        .attach_verification(&id, &actor, result.clone())
        .await?;

    Ok(Json(json!({
        "application_id": app.id,
        "verification_results": result,
        "verification_summary": summary,
    })))
}

/// POST /api/v1/applications/:id/approve - First-pass approval.
pub async fn approve_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Analyst)?;

    let id = ApplicationId::from_uuid(id);
    let app = state.lifecycle.analyst_approve(&id, &actor).await?;
    Ok(Json(app))
}

/// POST /api/v1/applications/:id/reject - First-pass rejection.
pub async fn reject_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectRequest>,
) -> Result<Json<Application>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Analyst)?;

    let id = ApplicationId::from_uuid(id);
    let app = state
        .lifecycle
        .analyst_reject(&id, &actor, &request.reason)
        .await?;
    Ok(Json(app))
}

/// POST /api/v1/applications/:id/request-info - Ask the customer for more.
pub async fn request_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<RequestInfoRequest>,
) -> Result<Json<Application>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Analyst)?;

    let id = ApplicationId::from_uuid(id);
    let app = state
        .lifecycle
        .request_more_info(&id, &actor, &request.message)
        .await?;
    Ok(Json(app))
}

/// GET /api/v1/dashboards/analyst - The analyst work queue.
pub async fn analyst_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AnalystDashboard>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Analyst)?;

    let submitted = state
        .applications
        .list_by_status(&[ApplicationStatus::Submitted])
        .await?;
    Ok(Json(AnalystDashboard {
        pending_review: submitted.len(),
        submitted_applications: submitted,
    }))
}
