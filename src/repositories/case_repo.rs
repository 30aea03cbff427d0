use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{CaseCreate, CaseRecord, CaseUpdate},
};

const CASE_COLUMNS: &str =
    "id, case_type, status, victim_id, incident_date, summary, created_at, created_by";

#[async_trait]
pub trait CaseRepository: Send + Sync {
    async fn create(&self, case: &CaseCreate) -> Result<CaseRecord, ApiError>;
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<CaseRecord>, ApiError>;
    /// Newest first, for listings.
    async fn list_recent(&self) -> Result<Vec<CaseRecord>, ApiError>;
    /// Insertion order, for aggregation snapshots.
    async fn list_all(&self) -> Result<Vec<CaseRecord>, ApiError>;
    async fn update(&self, id: &Uuid, update: &CaseUpdate) -> Result<CaseRecord, ApiError>;
    async fn delete(&self, id: &Uuid) -> Result<(), ApiError>;
}

pub struct SqlxCaseRepository {
    pool: DatabasePool,
}

impl SqlxCaseRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CaseRepository for SqlxCaseRepository {
    async fn create(&self, case: &CaseCreate) -> Result<CaseRecord, ApiError> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let query = format!(
            r#"
            INSERT INTO cases (id, case_type, status, victim_id, incident_date, summary, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {CASE_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, CaseRecord>(&query)
            .bind(id)
            .bind(&case.case_type)
            .bind(case.status)
            .bind(case.victim_id)
            .bind(case.incident_date)
            .bind(&case.summary)
            .bind(now)
            .bind(case.created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(result)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<CaseRecord>, ApiError> {
        let query = format!("SELECT {CASE_COLUMNS} FROM cases WHERE id = $1");
        let result = sqlx::query_as::<_, CaseRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    async fn list_recent(&self) -> Result<Vec<CaseRecord>, ApiError> {
        let query = format!("SELECT {CASE_COLUMNS} FROM cases ORDER BY created_at DESC, id");
        let results = sqlx::query_as::<_, CaseRecord>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn list_all(&self) -> Result<Vec<CaseRecord>, ApiError> {
        let query = format!("SELECT {CASE_COLUMNS} FROM cases ORDER BY created_at ASC, id");
        let results = sqlx::query_as::<_, CaseRecord>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn update(&self, id: &Uuid, update: &CaseUpdate) -> Result<CaseRecord, ApiError> {
        let query = format!(
            r#"
            UPDATE cases
            SET case_type = COALESCE($2, case_type),
                status = COALESCE($3, status),
                incident_date = COALESCE($4, incident_date),
                summary = COALESCE($5, summary),
                victim_id = COALESCE($6, victim_id)
            WHERE id = $1
            RETURNING {CASE_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, CaseRecord>(&query)
            .bind(id)
            .bind(&update.case_type)
            .bind(update.status)
            .bind(update.incident_date)
            .bind(&update.summary)
            .bind(update.victim_id)
            .fetch_optional(&self.pool)
            .await?;

        result.ok_or_else(|| ApiError::NotFound(format!("Case with id {} not found", id)))
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM cases WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Case with id {} not found", id)));
        }

        Ok(())
    }
}
