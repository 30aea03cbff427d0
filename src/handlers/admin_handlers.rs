use crate::auth::{context::UserContext, rbac::Permission};
use crate::models::{RoleAssignment, SetRoleRequest, UserWithRoles};
use crate::{error::ApiError, AppState};
use axum::{
    extract::{Extension, Path, State},
    Json,
};
use uuid::Uuid;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
) -> Result<Json<Vec<UserWithRoles>>, ApiError> {
    user.require_permission(Permission::ManageUsers)?;
    let users = state.role_manager.list_users().await?;
    Ok(Json(users))
}

/// Replaces the user's role with exactly one assignment.
pub async fn set_user_role(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<Json<RoleAssignment>, ApiError> {
    user.require_permission(Permission::ManageUsers)?;

    tracing::info!(
        "Role change for {} to {} requested by {:?}",
        user_id,
        payload.role,
        user.user_id
    );
    let assignment = state.role_manager.set_role(user_id, payload.role).await?;
    Ok(Json(assignment))
}

/// Completes a role change whose insert step failed earlier.
pub async fn retry_user_role(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RoleAssignment>, ApiError> {
    user.require_permission(Permission::ManageUsers)?;
    let assignment = state.role_manager.retry_insert(user_id).await?;
    Ok(Json(assignment))
}
