use crate::{
    auth::{context::UserContext, rbac::Permission},
    error::ApiError,
    models::AnalyticsReport,
    AppState,
};
use axum::{
    extract::{Extension, State},
    response::Json,
};

pub async fn get_dashboard(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
) -> Result<Json<AnalyticsReport>, ApiError> {
    context.require_permission(Permission::ViewAnalytics)?;
    let report = app_state
        .analytics_service
        .dashboard(chrono::Utc::now())
        .await?;
    Ok(Json(report))
}
