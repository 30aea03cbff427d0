use crate::{
    auth::{context::UserContext, rbac::Permission},
    error::ApiError,
    models::{ActionListQuery, ForensicActionCreate, ForensicActionRecord},
    AppState,
};
use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::Json,
};

pub async fn list_actions(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Query(query): Query<ActionListQuery>,
) -> Result<Json<Vec<ForensicActionRecord>>, ApiError> {
    context.require_permission(Permission::ViewCases)?;
    let actions = app_state.case_service.list_actions(query.case_id).await?;
    Ok(Json(actions))
}

pub async fn create_action(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Json(mut payload): Json<ForensicActionCreate>,
) -> Result<(StatusCode, Json<ForensicActionRecord>), ApiError> {
    context.require_permission(Permission::EditCases)?;
    payload.created_by = context.user_id;

    let action = app_state.case_service.record_action(payload).await?;
    Ok((StatusCode::CREATED, Json(action)))
}
