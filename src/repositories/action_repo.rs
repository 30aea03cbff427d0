use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{ForensicActionCreate, ForensicActionRecord},
};

const ACTION_COLUMNS: &str = "id, case_id, investigator_name, action_description, status, \
     execution_time, created_at, created_by";

#[async_trait]
pub trait ForensicActionRepository: Send + Sync {
    async fn create(&self, action: &ForensicActionCreate) -> Result<ForensicActionRecord, ApiError>;
    /// Latest execution first.
    async fn list_by_case(&self, case_id: &Uuid) -> Result<Vec<ForensicActionRecord>, ApiError>;
    async fn list_recent(&self) -> Result<Vec<ForensicActionRecord>, ApiError>;
    async fn list_all(&self) -> Result<Vec<ForensicActionRecord>, ApiError>;
}

pub struct SqlxForensicActionRepository {
    pool: DatabasePool,
}

impl SqlxForensicActionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ForensicActionRepository for SqlxForensicActionRepository {
    async fn create(&self, action: &ForensicActionCreate) -> Result<ForensicActionRecord, ApiError> {
        let id = Uuid::new_v4();
        let now = chrono::Utc::now();

        let query = format!(
            r#"
            INSERT INTO forensic_actions (id, case_id, investigator_name, action_description, status,
                                          execution_time, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ACTION_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, ForensicActionRecord>(&query)
            .bind(id)
            .bind(action.case_id)
            .bind(&action.investigator_name)
            .bind(&action.action_description)
            .bind(action.status)
            .bind(action.execution_time.unwrap_or(now))
            .bind(now)
            .bind(action.created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(result)
    }

    async fn list_by_case(&self, case_id: &Uuid) -> Result<Vec<ForensicActionRecord>, ApiError> {
        let query = format!(
            "SELECT {ACTION_COLUMNS} FROM forensic_actions WHERE case_id = $1 ORDER BY execution_time DESC, id"
        );
        let results = sqlx::query_as::<_, ForensicActionRecord>(&query)
            .bind(case_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn list_recent(&self) -> Result<Vec<ForensicActionRecord>, ApiError> {
        let query =
            format!("SELECT {ACTION_COLUMNS} FROM forensic_actions ORDER BY created_at DESC, id");
        let results = sqlx::query_as::<_, ForensicActionRecord>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn list_all(&self) -> Result<Vec<ForensicActionRecord>, ApiError> {
        let query =
            format!("SELECT {ACTION_COLUMNS} FROM forensic_actions ORDER BY created_at ASC, id");
        let results = sqlx::query_as::<_, ForensicActionRecord>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }
}
