use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::database::models::Role;
use crate::error::ApiError;
use crate::services::access::membership_role;

use super::auth::AuthUser;

/// Active group of the request, re-checked against `user_groups`.
#[derive(Clone, Copy, Debug)]
pub struct ActiveGroup {
    pub id: i32,
    pub role: Role,
}

/// Middleware that validates the active group from JWT claims against current membership.
/// A token minted before the user was removed from a group stops working here.
pub async fn validate_group_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Get AuthUser from previous JWT middleware
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before group validation"))?;

    let group_id = auth_user
        .group_id
        .ok_or_else(|| ApiError::forbidden("No active group selected"))?;

    let role = membership_role(&state.pool, auth_user.user_id, group_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!(
                "Group validation failed: user {} is not a member of group {}",
                auth_user.user_id,
                group_id
            );
            ApiError::forbidden("You are not a member of this group")
        })?;

    tracing::debug!("Group validation successful: user {} in group {} as {}", auth_user.user_id, group_id, role);

    request.extensions_mut().insert(ActiveGroup { id: group_id, role });

    Ok(next.run(request).await)
}
