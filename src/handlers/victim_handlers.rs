use crate::{
    auth::{context::UserContext, rbac::Permission},
    error::ApiError,
    models::{VictimCreate, VictimRecord, VictimUpdate},
    AppState,
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

pub async fn list_victims(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
) -> Result<Json<Vec<VictimRecord>>, ApiError> {
    context.require_permission(Permission::ViewCases)?;
    let victims = app_state.victim_service.list_victims().await?;
    Ok(Json(victims))
}

pub async fn create_victim(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Json(mut payload): Json<VictimCreate>,
) -> Result<(StatusCode, Json<VictimRecord>), ApiError> {
    context.require_permission(Permission::EditCases)?;
    payload.created_by = context.user_id;

    let victim = app_state.victim_service.create_victim(payload).await?;
    tracing::info!("Created victim {}", victim.id);
    Ok((StatusCode::CREATED, Json(victim)))
}

pub async fn get_victim(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<VictimRecord>, ApiError> {
    context.require_permission(Permission::ViewCases)?;
    let victim = app_state.victim_service.get_victim(&id).await?;
    Ok(Json(victim))
}

pub async fn update_victim(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<VictimUpdate>,
) -> Result<Json<VictimRecord>, ApiError> {
    context.require_permission(Permission::EditCases)?;
    let victim = app_state.victim_service.update_victim(&id, payload).await?;
    Ok(Json(victim))
}

pub async fn delete_victim(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    context.require_permission(Permission::DeleteRecords)?;
    app_state.victim_service.delete_victim(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
