//! Request and response types for the REST API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Application, AuditEvent};
use crate::lifecycle::Step;
use crate::notify::Notification;

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateApplicationRequest {
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UploadDocumentRequest {
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RequestInfoRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub decision: String,
    pub reason: String,
    #[serde(default)]
    pub premium_amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct WhatIfRequest {
    #[serde(default = "default_deductible")]
    pub deductible: f64,
    #[serde(default = "default_term")]
    pub term: u32,
}

fn default_deductible() -> f64 {
    1000.0
}

fn default_term() -> u32 {
    12
}

/// Query parameters for `GET /audit-events`.
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub actor_role: Option<String>,
    #[serde(default)]
    pub application_id: Option<Uuid>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AckRequest {
    pub event_ids: Vec<Uuid>,
}

/// Full application view with its audit trail and derived step.
#[derive(Debug, Serialize)]
pub struct ApplicationDetails {
    pub application: Application,
    pub audit_events: Vec<AuditEvent>,
    pub current_step: Step,
    pub current_step_index: usize,
    pub allowed_operations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CustomerDashboard {
    pub draft_application: Option<Application>,
    pub submitted_applications: Vec<Application>,
}

#[derive(Debug, Serialize)]
pub struct AnalystDashboard {
    pub submitted_applications: Vec<Application>,
    pub pending_review: usize,
}

#[derive(Debug, Serialize)]
pub struct UnderwriterDashboard {
    pub case_queue: Vec<Application>,
    pub under_review: usize,
}

#[derive(Debug, Serialize)]
pub struct AuditorDashboard {
    pub total_applications: u64,
    pub total_audit_events: u64,
    pub recent_events: Vec<AuditEvent>,
}

/// One issue found by the auditor integrity check.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegrityIssue {
    MissingAuditTrail { application_id: String },
}

#[derive(Debug, Serialize)]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
    pub count: usize,
}
