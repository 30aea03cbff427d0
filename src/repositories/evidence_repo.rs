use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{EvidenceCreate, EvidenceRecord, EvidenceUpdate},
};

const EVIDENCE_COLUMNS: &str = "id, case_id, evidence_type, file_name, file_size, file_hash, \
     storage_location, description, collection_time, created_at, created_by";

#[async_trait]
pub trait EvidenceRepository: Send + Sync {
    async fn create(&self, evidence: &EvidenceCreate) -> Result<EvidenceRecord, ApiError>;
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<EvidenceRecord>, ApiError>;
    async fn list_by_case(&self, case_id: &Uuid) -> Result<Vec<EvidenceRecord>, ApiError>;
    async fn list_recent(&self) -> Result<Vec<EvidenceRecord>, ApiError>;
    async fn list_all(&self) -> Result<Vec<EvidenceRecord>, ApiError>;
    /// Updates editable metadata only; `file_hash` is never written here.
    async fn update_metadata(
        &self,
        id: &Uuid,
        update: &EvidenceUpdate,
    ) -> Result<EvidenceRecord, ApiError>;
    async fn delete(&self, id: &Uuid) -> Result<(), ApiError>;
}

pub struct SqlxEvidenceRepository {
    pool: DatabasePool,
}

impl SqlxEvidenceRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn validate_evidence(&self, evidence: &EvidenceCreate) -> Result<(), ApiError> {
        if evidence.evidence_type.trim().is_empty() {
            return Err(ApiError::Validation("Evidence type cannot be empty".to_string()));
        }

        if evidence.file_size < 0 {
            return Err(ApiError::Validation("File size cannot be negative".to_string()));
        }

        // Digest and locator travel together
        if evidence.file_hash.is_some() != evidence.storage_location.is_some() {
            return Err(ApiError::Validation(
                "File hash and storage location must be set together".to_string(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl EvidenceRepository for SqlxEvidenceRepository {
    async fn create(&self, evidence: &EvidenceCreate) -> Result<EvidenceRecord, ApiError> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        self.validate_evidence(evidence)?;

        let query = format!(
            r#"
            INSERT INTO evidence (id, case_id, evidence_type, file_name, file_size, file_hash,
                                  storage_location, description, collection_time, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {EVIDENCE_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, EvidenceRecord>(&query)
            .bind(id)
            .bind(evidence.case_id)
            .bind(&evidence.evidence_type)
            .bind(&evidence.file_name)
            .bind(evidence.file_size)
            .bind(&evidence.file_hash)
            .bind(&evidence.storage_location)
            .bind(&evidence.description)
            .bind(evidence.collection_time)
            .bind(now)
            .bind(evidence.created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(result)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<EvidenceRecord>, ApiError> {
        let query = format!("SELECT {EVIDENCE_COLUMNS} FROM evidence WHERE id = $1");
        let result = sqlx::query_as::<_, EvidenceRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    async fn list_by_case(&self, case_id: &Uuid) -> Result<Vec<EvidenceRecord>, ApiError> {
        let query = format!(
            "SELECT {EVIDENCE_COLUMNS} FROM evidence WHERE case_id = $1 ORDER BY created_at DESC, id"
        );
        let results = sqlx::query_as::<_, EvidenceRecord>(&query)
            .bind(case_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn list_recent(&self) -> Result<Vec<EvidenceRecord>, ApiError> {
        let query = format!("SELECT {EVIDENCE_COLUMNS} FROM evidence ORDER BY created_at DESC, id");
        let results = sqlx::query_as::<_, EvidenceRecord>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn list_all(&self) -> Result<Vec<EvidenceRecord>, ApiError> {
        let query = format!("SELECT {EVIDENCE_COLUMNS} FROM evidence ORDER BY created_at ASC, id");
        let results = sqlx::query_as::<_, EvidenceRecord>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn update_metadata(
        &self,
        id: &Uuid,
        update: &EvidenceUpdate,
    ) -> Result<EvidenceRecord, ApiError> {
        let query = format!(
            r#"
            UPDATE evidence
            SET evidence_type = COALESCE($2, evidence_type),
                description = COALESCE($3, description),
                storage_location = COALESCE($4, storage_location),
                collection_time = COALESCE($5, collection_time)
            WHERE id = $1
            RETURNING {EVIDENCE_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, EvidenceRecord>(&query)
            .bind(id)
            .bind(&update.evidence_type)
            .bind(&update.description)
            .bind(&update.storage_location)
            .bind(update.collection_time)
            .fetch_optional(&self.pool)
            .await?;

        result.ok_or_else(|| ApiError::NotFound(format!("Evidence with id {} not found", id)))
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM evidence WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Evidence with id {} not found", id)));
        }

        Ok(())
    }
}
