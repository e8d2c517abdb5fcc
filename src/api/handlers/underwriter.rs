//! Underwriter decision handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use crate::api::actor::{actor_from_headers, require_role};
use crate::api::error::{ApiError, ErrorCode};
use crate::api::types::{DecisionRequest, UnderwriterDashboard, WhatIfRequest};
use crate::domain::{
    Application, ApplicationId, ApplicationStatus, RiskAssessment, Role, WhatIfOutcome,
    WhatIfParams,
};
use crate::lifecycle::Decision;
use crate::server::AppState;

/// POST /api/v1/applications/:id/assign - Claim a case for review.
pub async fn assign_case(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Underwriter)?;

    let id = ApplicationId::from_uuid(id);
    let app = state.lifecycle.assign_underwriter(&id, &actor).await?;
    Ok(Json(app))
}

/// POST /api/v1/applications/:id/decision - Final approve/decline.
pub async fn make_decision(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<DecisionRequest>,
) -> Result<Json<Application>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Underwriter)?;

    let decision: Decision = request
        .decision
        .parse()
        .map_err(|e: String| ApiError::new(ErrorCode::InvalidRequestBody, e))?;

    let id = ApplicationId::from_uuid(id);
    let app = state
        .lifecycle
        .underwriter_decide(&id, &actor, decision, &request.reason, request.premium_amount)
        .await?;
    Ok(Json(app))
}

/// GET /api/v1/applications/:id/risk-assessment - Advisory risk score.
pub async fn risk_assessment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Underwriter)?;

    let id = ApplicationId::from_uuid(id);
    let app = state
        .applications
        .get(&id)
        .await?
        .ok_or(crate::infra::WorkflowError::NotFound(id))?;

    Ok(Json(state.risk.assess(&app.id, &app.data)))
}

/// POST /api/v1/applications/:id/what-if-simulation - Pure premium simulation.
pub async fn what_if_simulation(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<WhatIfRequest>,
) -> Result<Json<WhatIfOutcome>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Underwriter)?;

    let id = ApplicationId::from_uuid(id);
    // Existence check only; the simulation itself never touches state.
    state
        .applications
        .get(&id)
        .await?
        .ok_or(crate::infra::WorkflowError::NotFound(id))?;

    let params = WhatIfParams {
        deductible: request.deductible,
        term: request.term,
    };
    Ok(Json(state.risk.what_if(&id, &params)))
}

/// GET /api/v1/dashboards/underwriter - Case queue and active reviews.
pub async fn underwriter_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UnderwriterDashboard>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Underwriter)?;

    let case_queue = state
        .applications
        .list_by_status(&[
            ApplicationStatus::AnalystApproved,
            ApplicationStatus::UnderReview,
        ])
        .await?;
    let under_review = case_queue
        .iter()
        .filter(|a| a.status == ApplicationStatus::UnderReview)
        .count();

    Ok(Json(UnderwriterDashboard {
        case_queue,
        under_review,
    }))
}
