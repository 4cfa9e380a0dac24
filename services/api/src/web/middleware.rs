//! services/api/src/web/middleware.rs
//!
//! Resolves the current user for protected routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use lecture_catalog_core::PortError;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::web::state::AppState;

/// The header carrying the already-authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that loads the user named by `x-user-id`.
///
/// Authentication happens upstream; this only resolves the id to a user record
/// (role and completion set) and inserts it into the request extensions.
/// Missing, malformed or unknown ids yield 401 Unauthorized.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract and parse the user id
    let user_id = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Resolve the user record through the store
    let user = state.store.get_user(user_id).await.map_err(|e| match e {
        PortError::NotFound(_) => {
            debug!(%user_id, "Unknown user");
            StatusCode::UNAUTHORIZED
        }
        other => {
            error!("Failed to resolve user {}: {:?}", user_id, other);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    // 3. Hand the resolved user to the handler
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
