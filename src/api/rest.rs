//! REST API routes.

use axum::routing::{get, post, put};
use axum::Router;

use crate::server::AppState;

use super::handlers::{analyst, applications, auditor, notifications, underwriter};

/// Build the versioned API router.
pub fn router() -> Router<AppState> {
    Router::new()
        // Customer surface
        .route("/v1/applications", post(applications::create_application))
        .route("/v1/applications/:id", put(applications::update_application))
        .route("/v1/applications/:id", get(applications::get_application))
        .route(
            "/v1/applications/:id/documents",
            post(applications::upload_document),
        )
        .route(
            "/v1/applications/:id/submit",
            post(applications::submit_application),
        )
        .route("/v1/applications/:id/pay", post(applications::pay_application))
        // Analyst surface
        .route(
            "/v1/applications/:id/verify-document",
            post(analyst::verify_document),
        )
        .route(
            "/v1/applications/:id/approve",
            post(analyst::approve_application),
        )
        .route(
            "/v1/applications/:id/reject",
            post(analyst::reject_application),
        )
        .route(
            "/v1/applications/:id/request-info",
            post(analyst::request_info),
        )
        // Underwriter surface
        .route("/v1/applications/:id/assign", post(underwriter::assign_case))
        .route(
            "/v1/applications/:id/decision",
            post(underwriter::make_decision),
        )
        .route(
            "/v1/applications/:id/risk-assessment",
            get(underwriter::risk_assessment),
        )
        .route(
            "/v1/applications/:id/what-if-simulation",
            post(underwriter::what_if_simulation),
        )
        // Dashboards
        .route(
            "/v1/dashboards/customer",
            get(applications::customer_dashboard),
        )
        .route("/v1/dashboards/analyst", get(analyst::analyst_dashboard))
        .route(
            "/v1/dashboards/underwriter",
            get(underwriter::underwriter_dashboard),
        )
        .route("/v1/dashboards/auditor", get(auditor::auditor_dashboard))
        // Audit trail
        .route("/v1/audit-events", get(auditor::list_audit_events))
        .route(
            "/v1/auditor/integrity-check",
            get(auditor::integrity_check),
        )
        // Notifications
        .route("/v1/notifications", get(notifications::list_notifications))
        .route(
            "/v1/notifications/ack",
            post(notifications::acknowledge_notifications),
        )
}
