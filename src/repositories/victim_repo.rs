use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    database::DatabasePool,
    error::ApiError,
    models::{VictimCreate, VictimRecord, VictimUpdate},
};

const VICTIM_COLUMNS: &str =
    "id, name, contact, location, address, description, report_date, created_at, created_by";

#[async_trait]
pub trait VictimRepository: Send + Sync {
    async fn create(&self, victim: &VictimCreate) -> Result<VictimRecord, ApiError>;
    async fn get_by_id(&self, id: &Uuid) -> Result<Option<VictimRecord>, ApiError>;
    /// Newest first.
    async fn list_recent(&self) -> Result<Vec<VictimRecord>, ApiError>;
    async fn update(&self, id: &Uuid, update: &VictimUpdate) -> Result<VictimRecord, ApiError>;
    /// Fails with `Conflict` while any case still references the victim.
    async fn delete(&self, id: &Uuid) -> Result<(), ApiError>;
}

pub struct SqlxVictimRepository {
    pool: DatabasePool,
}

impl SqlxVictimRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VictimRepository for SqlxVictimRepository {
    async fn create(&self, victim: &VictimCreate) -> Result<VictimRecord, ApiError> {
        let now = chrono::Utc::now();
        let query = format!(
            r#"
            INSERT INTO victims (id, name, contact, location, address, description, report_date, created_at, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8)
            RETURNING {VICTIM_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, VictimRecord>(&query)
            .bind(Uuid::new_v4())
            .bind(&victim.name)
            .bind(&victim.contact)
            .bind(&victim.location)
            .bind(&victim.address)
            .bind(&victim.description)
            .bind(now)
            .bind(victim.created_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(result)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<VictimRecord>, ApiError> {
        let query = format!("SELECT {VICTIM_COLUMNS} FROM victims WHERE id = $1");
        let result = sqlx::query_as::<_, VictimRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(result)
    }

    async fn list_recent(&self) -> Result<Vec<VictimRecord>, ApiError> {
        let query = format!("SELECT {VICTIM_COLUMNS} FROM victims ORDER BY created_at DESC, id");
        let results = sqlx::query_as::<_, VictimRecord>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(results)
    }

    async fn update(&self, id: &Uuid, update: &VictimUpdate) -> Result<VictimRecord, ApiError> {
        let query = format!(
            r#"
            UPDATE victims
            SET name = COALESCE($2, name),
                contact = COALESCE($3, contact),
                location = COALESCE($4, location),
                address = COALESCE($5, address),
                description = COALESCE($6, description)
            WHERE id = $1
            RETURNING {VICTIM_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, VictimRecord>(&query)
            .bind(id)
            .bind(&update.name)
            .bind(&update.contact)
            .bind(&update.location)
            .bind(&update.address)
            .bind(&update.description)
            .fetch_optional(&self.pool)
            .await?;

        result.ok_or_else(|| ApiError::NotFound(format!("Victim with id {} not found", id)))
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let result = sqlx::query("DELETE FROM victims WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    ApiError::conflict(format!("Victim {} is referenced by a case", id))
                }
                _ => ApiError::Database(e),
            })?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound(format!("Victim with id {} not found", id)));
        }

        Ok(())
    }
}
