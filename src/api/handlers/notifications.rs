//! Notification inbox handlers.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::json;

use crate::api::actor::actor_from_headers;
use crate::api::error::ApiError;
use crate::api::types::{AckRequest, NotificationsResponse};
use crate::domain::EventId;
use crate::server::AppState;

/// GET /api/v1/notifications - Unseen items for the acting user and role.
pub async fn list_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<NotificationsResponse>, ApiError> {
    let actor = actor_from_headers(&headers)?;

    let notifications = state
        .notifications
        .unseen(&actor.id, actor.role)
        .await?;
    Ok(Json(NotificationsResponse {
        count: notifications.len(),
        notifications,
    }))
}

/// POST /api/v1/notifications/ack - Merge shown ids into the watermark.
///
/// Always succeeds from the caller's perspective: a failed watermark write
/// re-surfaces the same items on the next open instead of erroring here.
pub async fn acknowledge_notifications(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<AckRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let actor = actor_from_headers(&headers)?;

    let ids: Vec<EventId> = request
        .event_ids
        .iter()
        .map(|id| EventId::from_uuid(*id))
        .collect();
    state
        .notifications
        .acknowledge(&actor.id, actor.role, &ids)
        .await;

    Ok(Json(json!({ "acknowledged": ids.len() })))
}
