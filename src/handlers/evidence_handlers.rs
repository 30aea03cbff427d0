use crate::{
    auth::{context::UserContext, rbac::Permission},
    error::ApiError,
    models::{EvidenceListQuery, EvidenceRecord, EvidenceUpdate, VerificationReport},
    services::{IntakeFile, IntakeRequest},
    AppState,
};
use axum::{
    body::{Body, Bytes},
    extract::{Extension, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{Json, Response},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Multipart intake: `file` (optional), `evidence_type`, `description`,
/// `collection_time` (RFC 3339, optional).
pub async fn upload_evidence(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(case_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<EvidenceRecord>), ApiError> {
    context.require_permission(Permission::EditEvidence)?;
    let acting_user = context.acting_user()?;

    let mut file: Option<IntakeFile> = None;
    let mut evidence_type: Option<String> = None;
    let mut description: Option<String> = None;
    let mut collection_time: Option<DateTime<Utc>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read multipart field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .ok_or_else(|| ApiError::validation("No filename provided"))?;
                // A body that cannot be read in full must not be fingerprinted
                let content: Bytes = field.bytes().await.map_err(|e| {
                    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                        ApiError::Validation(format!("File is too large: {}", e))
                    } else {
                        ApiError::DigestComputationFailed(format!(
                            "Failed to read file data: {}",
                            e
                        ))
                    }
                })?;
                // Browsers send an empty, unnamed part when no file was chosen
                if file_name.is_empty() && content.is_empty() {
                    continue;
                }
                file = Some(IntakeFile { file_name, content });
            }
            "evidence_type" => evidence_type = Some(read_text(field).await?),
            "description" => {
                let text = read_text(field).await?;
                if !text.trim().is_empty() {
                    description = Some(text);
                }
            }
            "collection_time" => {
                let text = read_text(field).await?;
                let parsed = DateTime::parse_from_rfc3339(text.trim()).map_err(|e| {
                    ApiError::Validation(format!("Invalid collection_time: {}", e))
                })?;
                collection_time = Some(parsed.with_timezone(&Utc));
            }
            other => tracing::debug!("Ignoring unexpected multipart field '{}'", other),
        }
    }

    let request = IntakeRequest {
        case_id,
        evidence_type: evidence_type
            .ok_or_else(|| ApiError::validation("evidence_type is required"))?,
        description,
        collection_time,
        file,
    };

    let evidence = app_state
        .evidence_service
        .intake(acting_user, request)
        .await?;
    Ok((StatusCode::CREATED, Json(evidence)))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::Validation(format!("Failed to read form field: {}", e)))
}

pub async fn list_evidence(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Query(query): Query<EvidenceListQuery>,
) -> Result<Json<Vec<EvidenceRecord>>, ApiError> {
    context.require_permission(Permission::ViewEvidence)?;
    let evidence = app_state.evidence_service.list(query.case_id).await?;
    Ok(Json(evidence))
}

pub async fn get_evidence(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<EvidenceRecord>, ApiError> {
    context.require_permission(Permission::ViewEvidence)?;
    let evidence = app_state.evidence_service.get(&id).await?;
    Ok(Json(evidence))
}

pub async fn update_evidence(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EvidenceUpdate>,
) -> Result<Json<EvidenceRecord>, ApiError> {
    context.require_permission(Permission::EditEvidence)?;
    let evidence = app_state
        .evidence_service
        .update_metadata(&id, payload)
        .await?;
    Ok(Json(evidence))
}

pub async fn delete_evidence(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    context.require_permission(Permission::DeleteRecords)?;
    app_state.evidence_service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn verify_evidence(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<VerificationReport>, ApiError> {
    context.require_permission(Permission::ViewEvidence)?;
    let report = app_state.evidence_service.verify(&id).await?;
    Ok(Json(report))
}

pub async fn download_evidence(
    State(app_state): State<AppState>,
    Extension(context): Extension<UserContext>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    context.require_permission(Permission::ViewEvidence)?;
    let (evidence, content) = app_state.evidence_service.download(&id).await?;

    let file_name = evidence
        .file_name
        .as_deref()
        .map(sanitize_header_filename)
        .unwrap_or_else(|| evidence.id.to_string());

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, content.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        );
    if let Some(digest) = &evidence.file_hash {
        builder = builder.header("x-content-sha256", digest.as_str());
    }

    builder
        .body(Body::from(content))
        .map_err(|e| ApiError::Internal(format!("Failed to create response: {}", e)))
}

fn sanitize_header_filename(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .filter(|c| *c != '"' && *c != '\\')
        .collect()
}
