use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::{EvidenceCreate, EvidenceRecord, EvidenceUpdate, VerificationReport},
    repositories::{CaseRepository, EvidenceRepository},
    services::fingerprint::{fingerprint_bytes, fingerprint_reader},
    storage::{generate_locator, BlobStore},
};

/// A file selected for intake: its original name and full content.
#[derive(Debug, Clone)]
pub struct IntakeFile {
    pub file_name: String,
    pub content: Bytes,
}

#[derive(Debug, Clone)]
pub struct IntakeRequest {
    pub case_id: Uuid,
    pub evidence_type: String,
    pub description: Option<String>,
    pub collection_time: Option<DateTime<Utc>>,
    pub file: Option<IntakeFile>,
}

/// Records evidence with a content digest taken before the bytes are stored.
pub struct EvidenceIntakeRecorder {
    evidence_repo: Arc<dyn EvidenceRepository + Send + Sync>,
    case_repo: Arc<dyn CaseRepository + Send + Sync>,
    blob_store: Arc<dyn BlobStore>,
    max_evidence_bytes: u64,
}

impl EvidenceIntakeRecorder {
    pub fn new(
        evidence_repo: Arc<dyn EvidenceRepository + Send + Sync>,
        case_repo: Arc<dyn CaseRepository + Send + Sync>,
        blob_store: Arc<dyn BlobStore>,
        max_evidence_bytes: u64,
    ) -> Self {
        Self {
            evidence_repo,
            case_repo,
            blob_store,
            max_evidence_bytes,
        }
    }

    /// Digest, then upload, then insert. A failed upload leaves no record behind.
    pub async fn intake(
        &self,
        acting_user: Uuid,
        request: IntakeRequest,
    ) -> Result<EvidenceRecord, ApiError> {
        self.validate_intake(&request).await?;

        let now = Utc::now();
        let mut record = EvidenceCreate {
            case_id: request.case_id,
            evidence_type: request.evidence_type.trim().to_string(),
            file_name: None,
            file_size: 0,
            file_hash: None,
            storage_location: None,
            description: request.description,
            collection_time: request.collection_time.unwrap_or(now),
            created_by: acting_user,
        };

        if let Some(file) = request.file {
            let expected_len = file.content.len() as u64;
            let (digest, file_size) =
                fingerprint_reader(&file.content[..], Some(expected_len)).await?;

            let locator = generate_locator(acting_user, &file.file_name, now);
            self.blob_store
                .upload(&locator, file.content)
                .await
                .map_err(|e| {
                    tracing::warn!("Evidence upload to {} failed: {}", locator, e);
                    ApiError::BlobUploadFailed(e.to_string())
                })?;

            tracing::info!(
                case_id = %record.case_id,
                locator = %locator,
                digest = %digest,
                "Evidence file stored"
            );

            record.file_name = Some(file.file_name);
            record.file_size = file_size as i64;
            record.file_hash = Some(digest);
            record.storage_location = Some(locator);
        }

        let created = self.evidence_repo.create(&record).await.map_err(|e| {
            if let Some(locator) = &record.storage_location {
                tracing::error!(
                    "Evidence record insert failed after upload; blob at {} is unreferenced: {}",
                    locator,
                    e
                );
            }
            ApiError::store_write(e)
        })?;

        Ok(created)
    }

    async fn validate_intake(&self, request: &IntakeRequest) -> Result<(), ApiError> {
        if request.evidence_type.trim().is_empty() {
            return Err(ApiError::validation("Evidence type cannot be empty"));
        }

        if let Some(file) = &request.file {
            if file.file_name.trim().is_empty() {
                return Err(ApiError::validation("Uploaded file must have a name"));
            }
            if file.content.len() as u64 > self.max_evidence_bytes {
                return Err(ApiError::validation(format!(
                    "File exceeds the maximum evidence size of {} bytes",
                    self.max_evidence_bytes
                )));
            }
        }

        if self.case_repo.get_by_id(&request.case_id).await?.is_none() {
            return Err(ApiError::not_found(format!(
                "Case with id {} not found",
                request.case_id
            )));
        }

        Ok(())
    }

    pub async fn get(&self, id: &Uuid) -> Result<EvidenceRecord, ApiError> {
        self.evidence_repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("Evidence with id {} not found", id)))
    }

    pub async fn list(&self, case_id: Option<Uuid>) -> Result<Vec<EvidenceRecord>, ApiError> {
        match case_id {
            Some(case_id) => self.evidence_repo.list_by_case(&case_id).await,
            None => self.evidence_repo.list_recent().await,
        }
    }

    /// Edits descriptive fields. The digest is never touched, and the locator of
    /// a fingerprinted record is fixed because the digest describes its bytes.
    pub async fn update_metadata(
        &self,
        id: &Uuid,
        update: EvidenceUpdate,
    ) -> Result<EvidenceRecord, ApiError> {
        if update.is_empty() {
            return Err(ApiError::validation("No fields to update"));
        }
        if let Some(evidence_type) = &update.evidence_type {
            if evidence_type.trim().is_empty() {
                return Err(ApiError::validation("Evidence type cannot be empty"));
            }
        }

        let existing = self.get(id).await?;
        if let Some(location) = &update.storage_location {
            if existing.file_hash.is_some()
                && existing.storage_location.as_deref() != Some(location.as_str())
            {
                return Err(ApiError::validation(
                    "Storage location of fingerprinted evidence cannot be changed",
                ));
            }
            if existing.file_hash.is_none() {
                return Err(ApiError::validation(
                    "Storage location requires an attached file",
                ));
            }
        }

        self.evidence_repo
            .update_metadata(id, &update)
            .await
            .map_err(ApiError::store_write)
    }

    pub async fn download(&self, id: &Uuid) -> Result<(EvidenceRecord, Bytes), ApiError> {
        let record = self.get(id).await?;
        let locator = record
            .storage_location
            .clone()
            .ok_or_else(|| ApiError::not_found(format!("Evidence {} has no stored file", id)))?;
        let content = self.blob_store.download(&locator).await?;
        Ok((record, content))
    }

    /// Re-reads the stored bytes and compares their digest with the recorded one.
    pub async fn verify(&self, id: &Uuid) -> Result<VerificationReport, ApiError> {
        let record = self.get(id).await?;
        let (expected, locator) = match (&record.file_hash, &record.storage_location) {
            (Some(hash), Some(locator)) => (hash.clone(), locator.clone()),
            _ => {
                return Err(ApiError::validation(format!(
                    "Evidence {} has no fingerprinted file to verify",
                    id
                )))
            }
        };

        let content = self.blob_store.download(&locator).await?;
        let actual = fingerprint_bytes(&content);
        let matches = actual == expected;

        if matches {
            tracing::info!(evidence_id = %id, "Evidence digest verified");
        } else {
            tracing::warn!(
                evidence_id = %id,
                expected = %expected,
                actual = %actual,
                "Evidence digest mismatch"
            );
        }

        Ok(VerificationReport {
            evidence_id: record.id,
            storage_location: locator,
            expected,
            actual,
            matches,
            verified_at: Utc::now(),
        })
    }

    /// Removes the record first; the blob is then deleted on a best-effort basis.
    pub async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let record = self.get(id).await?;
        self.evidence_repo
            .delete(id)
            .await
            .map_err(ApiError::store_write)?;

        if let Some(locator) = &record.storage_location {
            if let Err(e) = self.blob_store.delete(locator).await {
                tracing::warn!("Failed to delete blob {} for evidence {}: {}", locator, id, e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CaseCreate, CaseStatus, VictimCreate};
    use crate::repositories::{InMemoryStore, VictimRepository};
    use crate::storage::LocalBlobStore;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    struct FailingBlobStore;

    #[async_trait]
    impl BlobStore for FailingBlobStore {
        async fn upload(&self, _locator: &str, _content: Bytes) -> Result<(), ApiError> {
            Err(ApiError::internal("storage unreachable"))
        }

        async fn download(&self, locator: &str) -> Result<Bytes, ApiError> {
            Err(ApiError::not_found(locator.to_string()))
        }

        async fn delete(&self, _locator: &str) -> Result<(), ApiError> {
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        blobs: Arc<LocalBlobStore>,
        recorder: EvidenceIntakeRecorder,
        case_id: Uuid,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let blobs = Arc::new(LocalBlobStore::new(dir.path()));
        let victim = VictimRepository::create(
            store.as_ref(),
            &VictimCreate {
                name: "Jane Roe".to_string(),
                contact: None,
                location: None,
                address: None,
                description: None,
                created_by: None,
            },
        )
        .await
        .unwrap();
        let case = CaseRepository::create(
            store.as_ref(),
            &CaseCreate {
                case_type: "Fraud".to_string(),
                status: CaseStatus::Open,
                victim_id: victim.id,
                incident_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
                summary: None,
                created_by: None,
            },
        )
        .await
        .unwrap();

        let recorder = EvidenceIntakeRecorder::new(
            store.clone(),
            store.clone(),
            blobs.clone(),
            1024,
        );
        Fixture {
            store,
            blobs,
            recorder,
            case_id: case.id,
            _dir: dir,
        }
    }

    fn without_file(case_id: Uuid) -> IntakeRequest {
        IntakeRequest {
            case_id,
            evidence_type: "Disk image".to_string(),
            description: Some("seized laptop".to_string()),
            collection_time: None,
            file: None,
        }
    }

    fn with_file(case_id: Uuid, name: &str, content: &[u8]) -> IntakeRequest {
        IntakeRequest {
            file: Some(IntakeFile {
                file_name: name.to_string(),
                content: Bytes::copy_from_slice(content),
            }),
            ..without_file(case_id)
        }
    }

    #[tokio::test]
    async fn test_intake_with_file_records_digest_of_stored_bytes() {
        let fx = fixture().await;
        let user = Uuid::new_v4();

        let record = fx
            .recorder
            .intake(user, with_file(fx.case_id, "disk.img", b"raw sectors"))
            .await
            .unwrap();

        let digest = record.file_hash.clone().unwrap();
        let locator = record.storage_location.clone().unwrap();
        assert_eq!(digest, fingerprint_bytes(b"raw sectors"));
        assert_eq!(record.file_size, 11);
        assert_eq!(record.created_by, user);
        assert!(locator.starts_with(&user.to_string()));
        assert!(locator.ends_with(".img"));

        let stored = fx.blobs.download(&locator).await.unwrap();
        assert_eq!(fingerprint_bytes(&stored), digest);
    }

    #[tokio::test]
    async fn test_metadata_only_intake_has_no_digest_or_locator() {
        let fx = fixture().await;
        let record = fx
            .recorder
            .intake(Uuid::new_v4(), without_file(fx.case_id))
            .await
            .unwrap();

        assert!(record.file_hash.is_none());
        assert!(record.storage_location.is_none());
        assert!(record.file_name.is_none());
        assert_eq!(record.file_size, 0);
    }

    #[tokio::test]
    async fn test_failed_upload_creates_no_record() {
        let fx = fixture().await;
        let recorder = EvidenceIntakeRecorder::new(
            fx.store.clone(),
            fx.store.clone(),
            Arc::new(FailingBlobStore),
            1024,
        );

        let result = recorder
            .intake(Uuid::new_v4(), with_file(fx.case_id, "a.txt", b"x"))
            .await;
        assert!(matches!(result, Err(ApiError::BlobUploadFailed(_))));
        assert_eq!(fx.store.evidence_count().await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_store_write_failed() {
        let fx = fixture().await;
        fx.store.set_fail_evidence_writes(true);

        let result = fx
            .recorder
            .intake(Uuid::new_v4(), with_file(fx.case_id, "a.txt", b"x"))
            .await;
        assert!(matches!(result, Err(ApiError::StoreWriteFailed(_))));
    }

    #[tokio::test]
    async fn test_concurrent_same_name_intakes_get_distinct_locators() {
        let fx = fixture().await;
        let user = Uuid::new_v4();

        let (a, b) = tokio::join!(
            fx.recorder
                .intake(user, with_file(fx.case_id, "photo.jpg", b"one")),
            fx.recorder
                .intake(user, with_file(fx.case_id, "photo.jpg", b"two")),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.storage_location, b.storage_location);
        assert_eq!(fx.store.evidence_count().await, 2);
    }

    #[tokio::test]
    async fn test_intake_rejects_unknown_case_and_oversized_file() {
        let fx = fixture().await;

        let missing = fx
            .recorder
            .intake(Uuid::new_v4(), without_file(Uuid::new_v4()))
            .await;
        assert!(matches!(missing, Err(ApiError::NotFound(_))));

        static BIG: [u8; 2048] = [7u8; 2048];
        let oversized = fx
            .recorder
            .intake(Uuid::new_v4(), with_file(fx.case_id, "big.bin", &BIG))
            .await;
        assert!(matches!(oversized, Err(ApiError::Validation(_))));
        assert_eq!(fx.store.evidence_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_keeps_digest_and_locks_locator() {
        let fx = fixture().await;
        let record = fx
            .recorder
            .intake(Uuid::new_v4(), with_file(fx.case_id, "log.txt", b"entries"))
            .await
            .unwrap();

        let updated = fx
            .recorder
            .update_metadata(
                &record.id,
                EvidenceUpdate {
                    description: Some("relabelled".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.description.as_deref(), Some("relabelled"));
        assert_eq!(updated.file_hash, record.file_hash);

        let moved = fx
            .recorder
            .update_metadata(
                &record.id,
                EvidenceUpdate {
                    storage_location: Some("elsewhere/file.txt".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(moved, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn test_verify_detects_tampering() {
        let fx = fixture().await;
        let record = fx
            .recorder
            .intake(Uuid::new_v4(), with_file(fx.case_id, "memo.txt", b"original"))
            .await
            .unwrap();

        let report = fx.recorder.verify(&record.id).await.unwrap();
        assert!(report.matches);

        let locator = record.storage_location.unwrap();
        std::fs::write(fx.blobs.root().join(&locator), b"tampered").unwrap();

        let report = fx.recorder.verify(&record.id).await.unwrap();
        assert!(!report.matches);
        assert_eq!(report.actual, fingerprint_bytes(b"tampered"));
    }

    #[tokio::test]
    async fn test_verify_requires_a_file() {
        let fx = fixture().await;
        let record = fx
            .recorder
            .intake(Uuid::new_v4(), without_file(fx.case_id))
            .await
            .unwrap();
        assert!(matches!(
            fx.recorder.verify(&record.id).await,
            Err(ApiError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_blob() {
        let fx = fixture().await;
        let record = fx
            .recorder
            .intake(Uuid::new_v4(), with_file(fx.case_id, "x.bin", b"x"))
            .await
            .unwrap();
        let locator = record.storage_location.clone().unwrap();

        fx.recorder.delete(&record.id).await.unwrap();
        assert!(matches!(
            fx.recorder.get(&record.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            fx.blobs.download(&locator).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_record_and_blob() {
        let fx = fixture().await;
        let record = fx
            .recorder
            .intake(Uuid::new_v4(), with_file(fx.case_id, "x.bin", b"x"))
            .await
            .unwrap();
        let locator = record.storage_location.clone().unwrap();

        fx.store.set_fail_evidence_writes(true);
        assert!(matches!(
            fx.recorder.delete(&record.id).await,
            Err(ApiError::StoreWriteFailed(_))
        ));
        assert!(fx.recorder.get(&record.id).await.is_ok());
        assert!(fx.blobs.download(&locator).await.is_ok());
    }
}
