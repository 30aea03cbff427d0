use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::{database, error::ApiError, AppState};

/// Health check with store connectivity.
pub async fn health_check(State(app_state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let database = check_database_health(&app_state).await;
    let healthy = database["healthy"].as_bool().unwrap_or(false);

    if !healthy {
        return Err(ApiError::internal("Service is unhealthy"));
    }

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "service": "forensics-backend",
        "checks": { "database": database }
    })))
}

/// Simple health check endpoint for load balancers
pub async fn health_check_simple() -> Result<&'static str, StatusCode> {
    Ok("OK")
}

async fn check_database_health(app_state: &AppState) -> Value {
    let Some(pool) = &app_state.db_pool else {
        return json!({ "healthy": true, "message": "In-memory store" });
    };

    match database::health_check(pool).await {
        Ok(()) => json!({ "healthy": true, "message": "Database connection successful" }),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            json!({
                "healthy": false,
                "message": "Database connection failed",
                "error": e.to_string()
            })
        }
    }
}
