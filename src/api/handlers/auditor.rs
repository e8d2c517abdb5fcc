//! Auditor handlers: trail queries, dashboard, integrity check.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde_json::json;
use std::str::FromStr;

use crate::api::actor::{actor_from_headers, require_role};
use crate::api::error::{ApiError, ErrorCode};
use crate::api::types::{AuditQuery, AuditorDashboard, IntegrityIssue, IntegrityReport};
use crate::domain::{ApplicationId, AuditAction, AuditFilter, Role};
use crate::server::AppState;

/// Sample size for integrity sweeps over recent applications.
const INTEGRITY_SAMPLE: usize = 500;

fn parse_filter(query: &AuditQuery) -> Result<AuditFilter, ApiError> {
    let action = query
        .action
        .as_deref()
        .map(AuditAction::from_str)
        .transpose()
        .map_err(|e| ApiError::new(ErrorCode::InvalidRequestBody, e))?;
    let actor_role = query
        .actor_role
        .as_deref()
        .map(Role::from_str)
        .transpose()
        .map_err(|e| ApiError::new(ErrorCode::InvalidRequestBody, e))?;

    Ok(AuditFilter {
        action,
        actor_role,
        application_id: query.application_id.map(ApplicationId::from_uuid),
        limit: query.limit.unwrap_or(0).min(2000),
    })
}

/// GET /api/v1/audit-events - Filtered audit search, newest first.
pub async fn list_audit_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AuditQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Auditor)?;

    let filter = parse_filter(&query)?;
    let events = state.audit.query(&filter).await?;
    Ok(Json(json!({
        "events": events,
        "count": events.len(),
    })))
}

/// GET /api/v1/dashboards/auditor - Overview stats and recent activity.
pub async fn auditor_dashboard(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuditorDashboard>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Auditor)?;

    let total_applications = state.applications.count().await?;
    let total_audit_events = state.audit.count().await?;
    let recent_events = state
        .audit
        .query(&AuditFilter {
            limit: 20,
            ..Default::default()
        })
        .await?;

    Ok(Json(AuditorDashboard {
        total_applications,
        total_audit_events,
        recent_events,
    }))
}

/// GET /api/v1/auditor/integrity-check - Applications missing their trail.
///
/// Every transition writes an audit event in the same transaction, so a
/// missing trail indicates out-of-band writes or data loss.
pub async fn integrity_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<IntegrityReport>, ApiError> {
    let actor = actor_from_headers(&headers)?;
    require_role(&actor, Role::Auditor)?;

    let mut issues = Vec::new();
    for app in state.applications.list_recent(INTEGRITY_SAMPLE).await? {
        let events = state.audit.list_for_application(&app.id).await?;
        if events.is_empty() {
            issues.push(IntegrityIssue::MissingAuditTrail {
                application_id: app.id.to_string(),
            });
        }
    }

    Ok(Json(IntegrityReport {
        count: issues.len(),
        issues,
    }))
}
