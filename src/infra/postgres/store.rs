//! PostgreSQL-backed workflow storage.
//!
//! One pool-holding struct implements every storage trait; the transition
//! commit path runs the application update and the audit insert inside a
//! single transaction so a failure rolls both back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use std::collections::HashSet;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{
    Application, ApplicationId, ApplicationStatus, AuditAction, AuditEvent, AuditFilter,
    DocumentRef, EventId, PaymentStatus, Role, UserId, VerificationResult,
};

use super::super::{ApplicationStore, AuditLog, Result, WatermarkStore, WorkflowError};

/// PostgreSQL store for applications, audit events, and watermarks.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    customer_id: String,
    status: String,
    data: serde_json::Value,
    documents: serde_json::Value,
    analyst_id: Option<String>,
    underwriter_id: Option<String>,
    decision_reason: Option<String>,
    rejection_reason: Option<String>,
    verification_data: Option<serde_json::Value>,
    payment_status: Option<String>,
    policy_number: Option<String>,
    final_premium: Option<f64>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = WorkflowError;

    fn try_from(row: ApplicationRow) -> Result<Application> {
        let status = ApplicationStatus::from_str(&row.status).map_err(WorkflowError::Internal)?;
        let documents: Vec<DocumentRef> = serde_json::from_value(row.documents)
            .map_err(|e| WorkflowError::Internal(format!("bad documents column: {e}")))?;
        let verification_data: Option<VerificationResult> = row
            .verification_data
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| WorkflowError::Internal(format!("bad verification column: {e}")))?;
        let payment_status = row
            .payment_status
            .as_deref()
            .map(PaymentStatus::from_str)
            .transpose()
            .map_err(WorkflowError::Internal)?;

        Ok(Application {
            id: ApplicationId::from_uuid(row.id),
            customer_id: UserId::new(row.customer_id),
            status,
            data: row.data,
            documents,
            analyst_id: row.analyst_id.map(UserId::new),
            underwriter_id: row.underwriter_id.map(UserId::new),
            decision_reason: row.decision_reason,
            rejection_reason: row.rejection_reason,
            verification_data,
            payment_status,
            policy_number: row.policy_number,
            final_premium: row.final_premium,
            version: row.version as u64,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct AuditEventRow {
    id: Uuid,
    application_id: Uuid,
    action: String,
    actor_role: String,
    actor_id: String,
    details: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditEventRow> for AuditEvent {
    type Error = WorkflowError;

    fn try_from(row: AuditEventRow) -> Result<AuditEvent> {
        Ok(AuditEvent {
            id: EventId::from_uuid(row.id),
            application_id: ApplicationId::from_uuid(row.application_id),
            action: AuditAction::from_str(&row.action).map_err(WorkflowError::Internal)?,
            actor_role: Role::from_str(&row.actor_role).map_err(WorkflowError::Internal)?,
            actor_id: UserId::new(row.actor_id),
            details: row.details,
            created_at: row.created_at,
        })
    }
}

fn documents_json(application: &Application) -> Result<serde_json::Value> {
    serde_json::to_value(&application.documents)
        .map_err(|e| WorkflowError::Internal(format!("serialize documents: {e}")))
}

fn verification_json(application: &Application) -> Result<Option<serde_json::Value>> {
    application
        .verification_data
        .as_ref()
        .map(serde_json::to_value)
        .transpose()
        .map_err(|e| WorkflowError::Internal(format!("serialize verification: {e}")))
}

async fn insert_event<'e, E>(executor: E, event: &AuditEvent) -> Result<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO audit_events (id, application_id, action, actor_role, actor_id, details, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(event.id.0)
    .bind(event.application_id.0)
    .bind(event.action.as_str())
    .bind(event.actor_role.as_str())
    .bind(event.actor_id.as_str())
    .bind(&event.details)
    .bind(event.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn insert(&self, application: &Application, event: &AuditEvent) -> Result<()> {
        let documents = documents_json(application)?;
        let verification = verification_json(application)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO applications (
                id, customer_id, status, data, documents,
                analyst_id, underwriter_id, decision_reason, rejection_reason,
                verification_data, payment_status, policy_number, final_premium,
                version, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(application.id.0)
        .bind(application.customer_id.as_str())
        .bind(application.status.as_str())
        .bind(&application.data)
        .bind(documents)
        .bind(application.analyst_id.as_ref().map(|u| u.as_str()))
        .bind(application.underwriter_id.as_ref().map(|u| u.as_str()))
        .bind(&application.decision_reason)
        .bind(&application.rejection_reason)
        .bind(verification)
        .bind(application.payment_status.map(|p| p.as_str()))
        .bind(&application.policy_number)
        .bind(application.final_premium)
        .bind(application.version as i64)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_event(&mut *tx, event).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &ApplicationId) -> Result<Option<Application>> {
        let row: Option<ApplicationRow> =
            sqlx::query_as("SELECT * FROM applications WHERE id = $1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Application::try_from).transpose()
    }

    async fn commit(
        &self,
        application: &Application,
        event: &AuditEvent,
        expected_version: u64,
    ) -> Result<()> {
        let documents = documents_json(application)?;
        let verification = verification_json(application)?;

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE applications SET
                status = $1, data = $2, documents = $3,
                analyst_id = $4, underwriter_id = $5,
                decision_reason = $6, rejection_reason = $7,
                verification_data = $8, payment_status = $9,
                policy_number = $10, final_premium = $11,
                version = $12, updated_at = $13
            WHERE id = $14 AND version = $15
            "#,
        )
        .bind(application.status.as_str())
        .bind(&application.data)
        .bind(documents)
        .bind(application.analyst_id.as_ref().map(|u| u.as_str()))
        .bind(application.underwriter_id.as_ref().map(|u| u.as_str()))
        .bind(&application.decision_reason)
        .bind(&application.rejection_reason)
        .bind(verification)
        .bind(application.payment_status.map(|p| p.as_str()))
        .bind(&application.policy_number)
        .bind(application.final_premium)
        .bind(application.version as i64)
        .bind(application.updated_at)
        .bind(application.id.0)
        .bind(expected_version as i64)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            // Distinguish a lost race from a missing row.
            let current: Option<(i64,)> =
                sqlx::query_as("SELECT version FROM applications WHERE id = $1")
                    .bind(application.id.0)
                    .fetch_optional(&self.pool)
                    .await?;
            return match current {
                Some((actual,)) => Err(WorkflowError::Conflict {
                    application_id: application.id,
                    expected: expected_version,
                    actual: actual as u64,
                }),
                None => Err(WorkflowError::NotFound(application.id)),
            };
        }

        insert_event(&mut *tx, event).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn list_by_status(&self, statuses: &[ApplicationStatus]) -> Result<Vec<Application>> {
        let status_strs: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let rows: Vec<ApplicationRow> = sqlx::query_as(
            "SELECT * FROM applications WHERE status = ANY($1) ORDER BY created_at DESC",
        )
        .bind(&status_strs)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Application::try_from).collect()
    }

    async fn list_for_customer(&self, customer_id: &UserId) -> Result<Vec<Application>> {
        let rows: Vec<ApplicationRow> = sqlx::query_as(
            "SELECT * FROM applications WHERE customer_id = $1 ORDER BY created_at DESC",
        )
        .bind(customer_id.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Application::try_from).collect()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Application>> {
        let rows: Vec<ApplicationRow> =
            sqlx::query_as("SELECT * FROM applications ORDER BY created_at DESC LIMIT $1")
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(Application::try_from).collect()
    }

    async fn count(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 as u64)
    }
}

#[async_trait]
impl AuditLog for PgStore {
    async fn list_for_application(
        &self,
        application_id: &ApplicationId,
    ) -> Result<Vec<AuditEvent>> {
        let rows: Vec<AuditEventRow> = sqlx::query_as(
            r#"
            SELECT id, application_id, action, actor_role, actor_id, details, created_at
            FROM audit_events
            WHERE application_id = $1
            ORDER BY created_at ASC, seq ASC
            "#,
        )
        .bind(application_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AuditEvent::try_from).collect()
    }

    async fn query(&self, filter: &AuditFilter) -> Result<Vec<AuditEvent>> {
        let rows: Vec<AuditEventRow> = sqlx::query_as(
            r#"
            SELECT id, application_id, action, actor_role, actor_id, details, created_at
            FROM audit_events
            WHERE ($1::text IS NULL OR action = $1)
              AND ($2::text IS NULL OR actor_role = $2)
              AND ($3::uuid IS NULL OR application_id = $3)
            ORDER BY created_at DESC, seq DESC
            LIMIT $4
            "#,
        )
        .bind(filter.action.map(|a| a.as_str()))
        .bind(filter.actor_role.map(|r| r.as_str()))
        .bind(filter.application_id.map(|id| id.0))
        .bind(filter.effective_limit() as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(AuditEvent::try_from).collect()
    }

    async fn count(&self) -> Result<u64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM audit_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 as u64)
    }
}

#[async_trait]
impl WatermarkStore for PgStore {
    async fn seen(&self, user_id: &UserId, role: Role) -> Result<HashSet<EventId>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT event_id FROM notification_watermarks WHERE user_id = $1 AND role = $2",
        )
        .bind(user_id.as_str())
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(id,)| EventId::from_uuid(id)).collect())
    }

    async fn acknowledge(&self, user_id: &UserId, role: Role, ids: &[EventId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for id in ids {
            sqlx::query(
                r#"
                INSERT INTO notification_watermarks (user_id, role, event_id)
                VALUES ($1, $2, $3)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(user_id.as_str())
            .bind(role.as_str())
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
