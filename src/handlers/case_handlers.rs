use crate::{
    auth::{context::UserContext, rbac::Permission},
    error::ApiError,
    models::{CaseCreate, CaseRecord, CaseReport, CaseUpdate},
    AppState,
};
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

pub async fn list_cases(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
) -> Result<Json<Vec<CaseRecord>>, ApiError> {
    context.require_permission(Permission::ViewCases)?;
    let cases = app_state.case_service.list_cases().await?;
    Ok(Json(cases))
}

pub async fn create_case(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Json(mut payload): Json<CaseCreate>,
) -> Result<(StatusCode, Json<CaseRecord>), ApiError> {
    context.require_permission(Permission::EditCases)?;
    payload.created_by = context.user_id;

    let case = app_state.case_service.create_case(payload).await?;
    tracing::info!("Created case {} ({})", case.id, case.case_type);
    Ok((StatusCode::CREATED, Json(case)))
}

pub async fn get_case(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseRecord>, ApiError> {
    context.require_permission(Permission::ViewCases)?;
    let case = app_state.case_service.get_case(&id).await?;
    Ok(Json(case))
}

pub async fn update_case(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CaseUpdate>,
) -> Result<Json<CaseRecord>, ApiError> {
    context.require_permission(Permission::EditCases)?;
    let case = app_state.case_service.update_case(&id, payload).await?;
    Ok(Json(case))
}

pub async fn delete_case(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    context.require_permission(Permission::DeleteRecords)?;
    app_state.case_service.delete_case(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_case_report(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<CaseReport>, ApiError> {
    context.require_permission(Permission::ViewCases)?;
    context.require_permission(Permission::ViewEvidence)?;
    let report = app_state.case_service.case_report(&id).await?;
    Ok(Json(report))
}
