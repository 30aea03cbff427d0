use crate::{
    config::Settings,
    database::DatabasePool,
    error::ApiError,
    repositories::{
        CaseRepository, EvidenceRepository, ForensicActionRepository, InMemoryStore,
        SqlxCaseRepository, SqlxEvidenceRepository, SqlxForensicActionRepository,
        SqlxUserRepository, SqlxVictimRepository, UserRepository, VictimRepository,
    },
    services::{
        AnalyticsService, CaseService, EvidenceIntakeRecorder, RoleTransitionManager,
        VictimService,
    },
    storage::{BlobStore, LocalBlobStore},
};
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod storage;

/// Repository handles shared by the services.
#[derive(Clone)]
pub struct Repositories {
    pub cases: Arc<dyn CaseRepository + Send + Sync>,
    pub evidence: Arc<dyn EvidenceRepository + Send + Sync>,
    pub actions: Arc<dyn ForensicActionRepository + Send + Sync>,
    pub users: Arc<dyn UserRepository + Send + Sync>,
    pub victims: Arc<dyn VictimRepository + Send + Sync>,
}

impl Repositories {
    pub fn postgres(pool: &DatabasePool) -> Self {
        Self {
            cases: Arc::new(SqlxCaseRepository::new(pool.clone())),
            evidence: Arc::new(SqlxEvidenceRepository::new(pool.clone())),
            actions: Arc::new(SqlxForensicActionRepository::new(pool.clone())),
            users: Arc::new(SqlxUserRepository::new(pool.clone())),
            victims: Arc::new(SqlxVictimRepository::new(pool.clone())),
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            cases: store.clone(),
            evidence: store.clone(),
            actions: store.clone(),
            users: store.clone(),
            victims: store,
        }
    }
}

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    /// Absent when running on the in-memory store.
    pub db_pool: Option<DatabasePool>,
    pub blob_store: Arc<dyn BlobStore>,
    pub evidence_service: Arc<EvidenceIntakeRecorder>,
    pub analytics_service: Arc<AnalyticsService>,
    pub case_service: Arc<CaseService>,
    pub victim_service: Arc<VictimService>,
    pub role_manager: Arc<RoleTransitionManager>,
    pub key: Key,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}

impl AppState {
    /// Connects to Postgres, runs migrations and wires the Sqlx repositories.
    pub async fn new(config: Settings) -> Result<Self, ApiError> {
        let db_pool = crate::database::create_connection_pool(&config.database_url).await?;
        Self::new_with_pool(config, db_pool)
    }

    pub fn new_with_pool(config: Settings, db_pool: DatabasePool) -> Result<Self, ApiError> {
        let repositories = Repositories::postgres(&db_pool);
        let blob_store: Arc<dyn BlobStore> =
            Arc::new(LocalBlobStore::new(&config.blob_storage_path));
        Self::from_parts(config, Some(db_pool), repositories, blob_store)
    }

    /// Runs entirely in process; blobs still go to `blob_storage_path`.
    pub fn in_memory(config: Settings, store: Arc<InMemoryStore>) -> Result<Self, ApiError> {
        let blob_store: Arc<dyn BlobStore> =
            Arc::new(LocalBlobStore::new(&config.blob_storage_path));
        Self::from_parts(config, None, Repositories::in_memory(store), blob_store)
    }

    pub fn from_parts(
        config: Settings,
        db_pool: Option<DatabasePool>,
        repositories: Repositories,
        blob_store: Arc<dyn BlobStore>,
    ) -> Result<Self, ApiError> {
        config.validate()?;

        let key = Key::try_from(config.auth_secret.as_bytes())
            .map_err(|e| ApiError::internal(format!("Invalid auth secret: {}", e)))?;

        let evidence_service = Arc::new(EvidenceIntakeRecorder::new(
            repositories.evidence.clone(),
            repositories.cases.clone(),
            blob_store.clone(),
            config.max_evidence_bytes,
        ));

        let analytics_service = Arc::new(AnalyticsService::new(
            repositories.cases.clone(),
            repositories.evidence.clone(),
            repositories.actions.clone(),
            repositories.users.clone(),
            config.trend_window_days,
            config.top_n_limit as usize,
        ));

        let case_service = Arc::new(CaseService::new(
            repositories.cases.clone(),
            repositories.evidence.clone(),
            repositories.actions.clone(),
            repositories.victims.clone(),
            blob_store.clone(),
        ));

        let victim_service = Arc::new(VictimService::new(repositories.victims.clone()));

        let role_manager = Arc::new(RoleTransitionManager::new(repositories.users.clone()));

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            blob_store,
            evidence_service,
            analytics_service,
            case_service,
            victim_service,
            role_manager,
            key,
        })
    }
}
