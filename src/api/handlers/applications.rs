//! Customer-facing application handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use uuid::Uuid;

use crate::api::actor::{actor_from_headers, require_role};
use crate::api::error::ApiError;
use crate::api::types::{
    ApplicationDetails, CreateApplicationRequest, CustomerDashboard, UpdateApplicationRequest,
    UploadDocumentRequest,
};
use crate::domain::{Application, ApplicationId, ApplicationStatus, Role};
use crate::lifecycle::{allowed_operations, current_step};
use crate::server::AppState;

/// POST /api/v1/applications - Create a draft application.
pub async fn create_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<Json<Application>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Customer)?;

    let app = state.lifecycle.create(&actor, request.data).await?;
    Ok(Json(app))
}

/// PUT /api/v1/applications/:id - Update a draft's form data.
pub async fn update_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateApplicationRequest>,
) -> Result<Json<Application>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Customer)?;

    let id = ApplicationId::from_uuid(id);
    let app = state
        .lifecycle
        .update_draft(&id, &actor, request.data)
        .await?;
    Ok(Json(app))
}

/// POST /api/v1/applications/:id/documents - Record a document upload.
pub async fn upload_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<UploadDocumentRequest>,
) -> Result<Json<Application>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Customer)?;

    let id = ApplicationId::from_uuid(id);
    let app = state
        .lifecycle
        .record_document(&id, &actor, request.filename, request.content_type)
        .await?;
    Ok(Json(app))
}

/// POST /api/v1/applications/:id/submit - Submit for review.
pub async fn submit_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Customer)?;

    let id = ApplicationId::from_uuid(id);
    let app = state.lifecycle.submit(&id, &actor).await?;
    Ok(Json(app))
}

/// POST /api/v1/applications/:id/pay - Pay the first premium.
pub async fn pay_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Customer)?;

    let id = ApplicationId::from_uuid(id);
    let app = state.lifecycle.record_payment(&id, &actor).await?;
    Ok(Json(app))
}

/// GET /api/v1/applications/:id - Details with audit trail and step.
pub async fn get_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationDetails>, ApiError> {
    let actor = actor_from_headers(&headers)?;

    let id = ApplicationId::from_uuid(id);
    let app = state
        .applications
        .get(&id)
        .await?
        .ok_or(crate::infra::WorkflowError::NotFound(id))?;

    // Customers only see their own applications.
    if actor.role == Role::Customer && app.customer_id != actor.id {
        return Err(crate::infra::WorkflowError::NotFound(id).into());
    }

    let events = state.audit.list_for_application(&id).await?;
    let step = current_step(app.status, &events);
    let allowed = allowed_operations(app.status, actor.role)
        .iter()
        .map(|s| s.to_string())
        .collect();

    Ok(Json(ApplicationDetails {
        current_step_index: step.index(),
        current_step: step,
        allowed_operations: allowed,
        application: app,
        audit_events: events,
    }))
}

/// GET /api/v1/dashboards/customer - The customer's own applications.
pub async fn customer_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CustomerDashboard>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Customer)?;

    let apps = state.applications.list_for_customer(&actor.id).await?;
    let (drafts, submitted): (Vec<Application>, Vec<Application>) = apps
        .into_iter()
        .partition(|a| a.status == ApplicationStatus::Draft);

    Ok(Json(CustomerDashboard {
        draft_application: drafts.into_iter().next(),
        submitted_applications: submitted,
    }))
}
