use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{
        CaseCreate, CaseRecord, CaseReport, CaseUpdate, ForensicActionCreate,
        ForensicActionRecord, ReportEvidence,
    },
    repositories::{CaseRepository, EvidenceRepository, ForensicActionRepository, VictimRepository},
    storage::BlobStore,
};

/// Case records, their forensic action log, and the per-case report.
pub struct CaseService {
    case_repo: Arc<dyn CaseRepository + Send + Sync>,
    evidence_repo: Arc<dyn EvidenceRepository + Send + Sync>,
    action_repo: Arc<dyn ForensicActionRepository + Send + Sync>,
    victim_repo: Arc<dyn VictimRepository + Send + Sync>,
    blob_store: Arc<dyn BlobStore>,
}

impl CaseService {
    pub fn new(
        case_repo: Arc<dyn CaseRepository + Send + Sync>,
        evidence_repo: Arc<dyn EvidenceRepository + Send + Sync>,
        action_repo: Arc<dyn ForensicActionRepository + Send + Sync>,
        victim_repo: Arc<dyn VictimRepository + Send + Sync>,
        blob_store: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            case_repo,
            evidence_repo,
            action_repo,
            victim_repo,
            blob_store,
        }
    }

    pub async fn create_case(&self, case: CaseCreate) -> Result<CaseRecord, ApiError> {
        if case.case_type.trim().is_empty() {
            return Err(ApiError::validation("Case type cannot be empty"));
        }
        self.require_victim(&case.victim_id).await?;
        self.case_repo
            .create(&case)
            .await
            .map_err(ApiError::store_write)
    }

    pub async fn get_case(&self, id: &Uuid) -> Result<CaseRecord, ApiError> {
        self.case_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Case with id {} not found", id)))
    }

    pub async fn list_cases(&self) -> Result<Vec<CaseRecord>, ApiError> {
        self.case_repo.list_recent().await
    }

    pub async fn update_case(&self, id: &Uuid, update: CaseUpdate) -> Result<CaseRecord, ApiError> {
        if let Some(case_type) = &update.case_type {
            if case_type.trim().is_empty() {
                return Err(ApiError::validation("Case type cannot be empty"));
            }
        }
        if let Some(victim_id) = &update.victim_id {
            self.require_victim(victim_id).await?;
        }
        self.case_repo
            .update(id, &update)
            .await
            .map_err(ApiError::store_write)
    }

    /// Deletes the case and, through the cascade, its evidence rows. Their
    /// blobs are removed afterwards on a best-effort basis.
    pub async fn delete_case(&self, id: &Uuid) -> Result<(), ApiError> {
        let locators: Vec<String> = self
            .evidence_repo
            .list_by_case(id)
            .await?
            .into_iter()
            .filter_map(|record| record.storage_location)
            .collect();

        self.case_repo
            .delete(id)
            .await
            .map_err(ApiError::store_write)?;
        tracing::info!("Deleted case {} with {} stored blob(s)", id, locators.len());

        for locator in &locators {
            if let Err(e) = self.blob_store.delete(locator).await {
                tracing::warn!("Failed to delete blob {} for case {}: {}", locator, id, e);
            }
        }

        Ok(())
    }

    pub async fn record_action(
        &self,
        action: ForensicActionCreate,
    ) -> Result<ForensicActionRecord, ApiError> {
        if action.investigator_name.trim().is_empty() {
            return Err(ApiError::validation("Investigator name cannot be empty"));
        }
        if action.action_description.trim().is_empty() {
            return Err(ApiError::validation("Action description cannot be empty"));
        }
        self.get_case(&action.case_id).await?;

        self.action_repo
            .create(&action)
            .await
            .map_err(ApiError::store_write)
    }

    pub async fn list_actions(
        &self,
        case_id: Option<Uuid>,
    ) -> Result<Vec<ForensicActionRecord>, ApiError> {
        match case_id {
            Some(case_id) => self.action_repo.list_by_case(&case_id).await,
            None => self.action_repo.list_recent().await,
        }
    }

    /// Case, its evidence newest first, and its actions by execution time.
    pub async fn case_report(&self, id: &Uuid) -> Result<CaseReport, ApiError> {
        let case = self.get_case(id).await?;
        let (victim, evidence, actions) = tokio::try_join!(
            self.victim_repo.get_by_id(&case.victim_id),
            self.evidence_repo.list_by_case(id),
            self.action_repo.list_by_case(id),
        )?;

        Ok(CaseReport {
            case,
            victim,
            evidence: evidence.into_iter().map(ReportEvidence::from).collect(),
            actions,
            generated_at: Utc::now(),
        })
    }

    async fn require_victim(&self, victim_id: &Uuid) -> Result<(), ApiError> {
        match self.victim_repo.get_by_id(victim_id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::validation(format!(
                "Victim {} does not exist",
                victim_id
            ))),
        }
    }
}
