//! Integration tests for the notification deriver.
//!
//! Covers role scoping, acknowledgement idempotence, and graceful
//! degradation when the watermark store misbehaves.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use policyflow::domain::{EventId, Role, UserId};
use policyflow::infra::{Result, WatermarkStore, WorkflowError};
use policyflow::lifecycle::Decision;
use policyflow::notify::{NotificationDeriver, MAX_NOTIFICATIONS};

/// Watermark store whose writes always fail, reads always empty.
struct BrokenWatermarks;

#[async_trait]
impl WatermarkStore for BrokenWatermarks {
    async fn seen(&self, _user_id: &UserId, _role: Role) -> Result<HashSet<EventId>> {
        Err(WorkflowError::Internal("watermark backend offline".into()))
    }

    async fn acknowledge(&self, _user_id: &UserId, _role: Role, _ids: &[EventId]) -> Result<()> {
        Err(WorkflowError::Internal("watermark backend offline".into()))
    }
}

#[tokio::test]
async fn analyst_inbox_follows_submissions() {
    let (store, lifecycle) = lifecycle_fixture();
    let deriver = NotificationDeriver::new(store.clone(), store.clone(), store.clone());
    let analyst_user: UserId = "analyst-1".into();

    assert!(deriver
        .unseen(&analyst_user, Role::Analyst)
        .await
        .unwrap()
        .is_empty());

    submitted_application(&lifecycle).await;

    let unseen = deriver.unseen(&analyst_user, Role::Analyst).await.unwrap();
    assert_eq!(unseen.len(), 1);
    assert!(unseen[0].message.contains("submitted"));
}

#[tokio::test]
async fn acknowledgement_clears_and_stays_cleared() {
    let (store, lifecycle) = lifecycle_fixture();
    let deriver = NotificationDeriver::new(store.clone(), store.clone(), store.clone());
    let analyst_user: UserId = "analyst-1".into();

    submitted_application(&lifecycle).await;

    let shown = deriver.unseen(&analyst_user, Role::Analyst).await.unwrap();
    let ids: Vec<EventId> = shown.iter().map(|n| n.event_id).collect();
    deriver.acknowledge(&analyst_user, Role::Analyst, &ids).await;

    // Unseen set for acknowledged items is now empty, and re-running the
    // deriver never resurfaces those exact ids.
    let after = deriver.unseen(&analyst_user, Role::Analyst).await.unwrap();
    assert!(after.iter().all(|n| !ids.contains(&n.event_id)));
    assert!(after.is_empty());
}

#[tokio::test]
async fn customer_notified_of_own_decision_only() {
    let (store, lifecycle) = lifecycle_fixture();
    let deriver = NotificationDeriver::new(store.clone(), store.clone(), store.clone());

    let app = application_under_review(&lifecycle).await;
    lifecycle
        .underwriter_decide(
            &app.id,
            &underwriter(),
            Decision::Approve,
            "low risk",
            Some(120.0),
        )
        .await
        .unwrap();

    let mine = deriver
        .unseen(&"cust-1".into(), Role::Customer)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert!(mine[0].message.contains("approved"));

    let theirs = deriver
        .unseen(&"cust-2".into(), Role::Customer)
        .await
        .unwrap();
    assert!(theirs.is_empty());
}

#[tokio::test]
async fn underwriter_sees_queue_arrivals() {
    let (store, lifecycle) = lifecycle_fixture();
    let deriver = NotificationDeriver::new(store.clone(), store.clone(), store.clone());

    let app = submitted_application(&lifecycle).await;
    lifecycle
        .attach_verification(&app.id, &analyst(), verified_result())
        .await
        .unwrap();
    lifecycle.analyst_approve(&app.id, &analyst()).await.unwrap();

    let unseen = deriver
        .unseen(&"uw-1".into(), Role::Underwriter)
        .await
        .unwrap();
    assert_eq!(unseen.len(), 1);
    assert!(unseen[0].message.contains("case queue"));
}

#[tokio::test]
async fn broken_watermarks_reshow_rather_than_drop() {
    let (store, lifecycle) = lifecycle_fixture();
    let deriver =
        NotificationDeriver::new(store.clone(), store.clone(), Arc::new(BrokenWatermarks));
    let analyst_user: UserId = "analyst-1".into();

    submitted_application(&lifecycle).await;

    // Read failure degrades to "nothing acknowledged".
    let first = deriver.unseen(&analyst_user, Role::Analyst).await.unwrap();
    assert_eq!(first.len(), 1);

    // A failed acknowledge is swallowed; items surface again next open.
    let ids: Vec<EventId> = first.iter().map(|n| n.event_id).collect();
    deriver.acknowledge(&analyst_user, Role::Analyst, &ids).await;

    let second = deriver.unseen(&analyst_user, Role::Analyst).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].event_id, first[0].event_id);
}

#[tokio::test]
async fn inbox_caps_at_ten() {
    let (store, lifecycle) = lifecycle_fixture();
    let deriver = NotificationDeriver::new(store.clone(), store.clone(), store.clone());

    for _ in 0..(MAX_NOTIFICATIONS + 3) {
        submitted_application(&lifecycle).await;
    }

    let unseen = deriver
        .unseen(&"analyst-1".into(), Role::Analyst)
        .await
        .unwrap();
    assert_eq!(unseen.len(), MAX_NOTIFICATIONS);
}
