use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::rbac::Role;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Digest computation failed: {0}")]
    DigestComputationFailed(String),

    #[error("Blob upload failed: {0}")]
    BlobUploadFailed(String),

    #[error("Store write failed: {0}")]
    StoreWriteFailed(String),

    #[error("Role assignment incomplete for user {user_id}: prior roles removed but '{role}' was not inserted")]
    RoleAssignmentIncomplete { user_id: Uuid, role: Role },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Conflict error: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Create a new validation error
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new not found error
    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new internal error
    pub fn internal<T: Into<String>>(msg: T) -> Self {
        Self::Internal(msg.into())
    }

    /// Create a new authentication error
    pub fn authentication<T: Into<String>>(msg: T) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a new authorization error
    pub fn authorization<T: Into<String>>(msg: T) -> Self {
        Self::Authorization(msg.into())
    }

    /// Create a new conflict error
    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        Self::Conflict(msg.into())
    }

    /// Fold a persistence failure into `StoreWriteFailed`.
    ///
    /// Caller-facing conditions (validation, missing rows, conflicts) pass
    /// through unchanged so the response still explains what was wrong.
    pub fn store_write(err: ApiError) -> Self {
        match err {
            e @ (ApiError::Validation(_)
            | ApiError::NotFound(_)
            | ApiError::Conflict(_)
            | ApiError::StoreWriteFailed(_)) => e,
            other => ApiError::StoreWriteFailed(other.to_string()),
        }
    }

    /// Stable machine-readable code for the error class
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DigestComputationFailed(_) => "DIGEST_COMPUTATION_FAILED",
            ApiError::BlobUploadFailed(_) => "BLOB_UPLOAD_FAILED",
            ApiError::StoreWriteFailed(_) => "STORE_WRITE_FAILED",
            ApiError::RoleAssignmentIncomplete { .. } => "ROLE_ASSIGNMENT_INCOMPLETE",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Migration(_) => "MIGRATION_ERROR",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Io(_) => "IO_ERROR",
            ApiError::Serialization(_) => "SERIALIZATION_ERROR",
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Authentication(_) => "AUTHENTICATION_ERROR",
            ApiError::Authorization(_) => "AUTHORIZATION_ERROR",
            ApiError::Conflict(_) => "CONFLICT_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::DigestComputationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BlobUploadFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::RoleAssignmentIncomplete { .. } => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::StoreWriteFailed(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Config(_)
            | ApiError::Io(_)
            | ApiError::Serialization(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status_code();
        let code = self.code();

        // Internal details stay in the log; callers get a generic message
        let message = match &self {
            ApiError::Database(err) => {
                tracing::error!(error_id = %error_id, error = %err, "database error occurred");
                "Database error".to_string()
            }
            ApiError::Migration(err) => {
                tracing::error!(error_id = %error_id, error = %err, "database migration error occurred");
                "Database migration error".to_string()
            }
            ApiError::Config(err) => {
                tracing::error!(error_id = %error_id, error = %err, "configuration error occurred");
                "Configuration error".to_string()
            }
            ApiError::Io(err) => {
                tracing::error!(error_id = %error_id, error = %err, "IO error occurred");
                "IO error".to_string()
            }
            ApiError::Serialization(err) => {
                tracing::error!(error_id = %error_id, error = %err, "serialization error occurred");
                "Serialization error".to_string()
            }
            ApiError::StoreWriteFailed(msg) => {
                tracing::error!(error_id = %error_id, error = %msg, "store write failed");
                "Failed to persist record".to_string()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error_id = %error_id, error = %msg, "internal server error occurred");
                "Internal server error".to_string()
            }
            ApiError::BlobUploadFailed(msg) => {
                tracing::error!(error_id = %error_id, error = %msg, "blob upload failed");
                "Evidence upload failed".to_string()
            }
            ApiError::DigestComputationFailed(msg) => {
                tracing::warn!(error_id = %error_id, error = %msg, "digest computation failed");
                self.to_string()
            }
            ApiError::RoleAssignmentIncomplete { user_id, role } => {
                tracing::error!(
                    error_id = %error_id,
                    user_id = %user_id,
                    role = %role,
                    "role assignment left incomplete"
                );
                self.to_string()
            }
            ApiError::NotFound(msg) => {
                tracing::info!(error_id = %error_id, error = %msg, "resource not found");
                msg.clone()
            }
            ApiError::Validation(msg)
            | ApiError::Authentication(msg)
            | ApiError::Authorization(msg)
            | ApiError::Conflict(msg) => {
                tracing::warn!(error_id = %error_id, error = %msg, code = code, "request rejected");
                msg.clone()
            }
        };

        let mut error = json!({
            "message": message,
            "code": code,
            "error_id": error_id,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let ApiError::RoleAssignmentIncomplete { user_id, role } = &self {
            error["user_id"] = json!(user_id);
            error["role"] = json!(role);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;
