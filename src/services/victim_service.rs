use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{VictimCreate, VictimRecord, VictimUpdate},
    repositories::VictimRepository,
};

pub struct VictimService {
    victim_repo: Arc<dyn VictimRepository + Send + Sync>,
}

impl VictimService {
    pub fn new(victim_repo: Arc<dyn VictimRepository + Send + Sync>) -> Self {
        Self { victim_repo }
    }

    pub async fn create_victim(&self, victim: VictimCreate) -> Result<VictimRecord, ApiError> {
        if victim.name.trim().is_empty() {
            return Err(ApiError::validation("Victim name cannot be empty"));
        }
        self.victim_repo
            .create(&victim)
            .await
            .map_err(ApiError::store_write)
    }

    pub async fn get_victim(&self, id: &Uuid) -> Result<VictimRecord, ApiError> {
        self.victim_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Victim with id {} not found", id)))
    }

    pub async fn list_victims(&self) -> Result<Vec<VictimRecord>, ApiError> {
        self.victim_repo.list_recent().await
    }

    pub async fn update_victim(
        &self,
        id: &Uuid,
        update: VictimUpdate,
    ) -> Result<VictimRecord, ApiError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(ApiError::validation("Victim name cannot be empty"));
            }
        }
        self.victim_repo
            .update(id, &update)
            .await
            .map_err(ApiError::store_write)
    }

    pub async fn delete_victim(&self, id: &Uuid) -> Result<(), ApiError> {
        self.victim_repo
            .delete(id)
            .await
            .map_err(ApiError::store_write)?;
        tracing::info!("Deleted victim {}", id);
        Ok(())
    }
}
