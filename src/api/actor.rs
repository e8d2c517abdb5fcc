//! Actor extraction from gateway-provided headers.
//!
//! Authentication happens upstream; the gateway forwards the established
//! identity in `x-actor-id` / `x-actor-role`. Handlers use it for role
//! scoping and audit attribution.

use axum::http::HeaderMap;

use crate::domain::{Actor, Role};

use super::error::{ApiError, ErrorCode};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Pull the acting identity out of the request headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let id = headers
        .get(ACTOR_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            ApiError::new(
                ErrorCode::InvalidRequestBody,
                format!("missing {ACTOR_ID_HEADER} header"),
            )
        })?;

    let role = headers
        .get(ACTOR_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::new(
                ErrorCode::InvalidRequestBody,
                format!("missing {ACTOR_ROLE_HEADER} header"),
            )
        })?;

    let role: Role = role.parse().map_err(|e: String| {
        ApiError::new(ErrorCode::InvalidRequestBody, e)
    })?;

    Ok(Actor::new(id, role))
}

/// Reject the request unless the actor holds `role`.
pub fn require_role(actor: &Actor, role: Role) -> Result<(), ApiError> {
    if actor.role != role {
        return Err(ApiError::new(
            ErrorCode::Forbidden,
            format!("{} access required", role),
        ));
    }
    Ok(())
}
