//! In-process implementation of every repository trait.
//!
//! Used by the test suite and by `AppState::in_memory`. Ordering mirrors the
//! SQL implementations: `list_all` is insertion order, `list_recent` is newest
//! first. The `fail_*` switches let tests force a single step to error.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::rbac::Role;
use crate::error::ApiError;
use crate::models::{
    CaseCreate, CaseRecord, CaseUpdate, EvidenceCreate, EvidenceRecord, EvidenceUpdate,
    ForensicActionCreate, ForensicActionRecord, PendingRoleTransition, RoleAssignment,
    UserProfile, VictimCreate, VictimRecord, VictimUpdate,
};
use crate::repositories::{
    CaseRepository, EvidenceRepository, ForensicActionRepository, UserRepository,
    VictimRepository,
};

#[derive(Default)]
struct Tables {
    victims: Vec<VictimRecord>,
    cases: Vec<CaseRecord>,
    evidence: Vec<EvidenceRecord>,
    actions: Vec<ForensicActionRecord>,
    profiles: Vec<UserProfile>,
    user_roles: Vec<RoleAssignment>,
    transitions: Vec<PendingRoleTransition>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    fail_evidence_writes: AtomicBool,
    fail_role_inserts: AtomicBool,
    fail_role_deletes: AtomicBool,
    fail_transition_clears: AtomicBool,
}

fn injected(what: &str) -> ApiError {
    ApiError::internal(format!("injected failure: {}", what))
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_evidence_writes(&self, fail: bool) {
        self.fail_evidence_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_role_inserts(&self, fail: bool) {
        self.fail_role_inserts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_role_deletes(&self, fail: bool) {
        self.fail_role_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_transition_clears(&self, fail: bool) {
        self.fail_transition_clears.store(fail, Ordering::SeqCst);
    }

    pub async fn evidence_count(&self) -> usize {
        self.tables.read().await.evidence.len()
    }
}

#[async_trait]
impl VictimRepository for InMemoryStore {
    async fn create(&self, victim: &VictimCreate) -> Result<VictimRecord, ApiError> {
        let now = Utc::now();
        let record = VictimRecord {
            id: Uuid::new_v4(),
            name: victim.name.clone(),
            contact: victim.contact.clone(),
            location: victim.location.clone(),
            address: victim.address.clone(),
            description: victim.description.clone(),
            report_date: now,
            created_at: now,
            created_by: victim.created_by,
        };
        self.tables.write().await.victims.push(record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<VictimRecord>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.victims.iter().find(|v| v.id == *id).cloned())
    }

    async fn list_recent(&self) -> Result<Vec<VictimRecord>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.victims.iter().rev().cloned().collect())
    }

    async fn update(&self, id: &Uuid, update: &VictimUpdate) -> Result<VictimRecord, ApiError> {
        let mut tables = self.tables.write().await;
        let victim = tables
            .victims
            .iter_mut()
            .find(|v| v.id == *id)
            .ok_or_else(|| ApiError::NotFound(format!("Victim with id {} not found", id)))?;

        if let Some(name) = &update.name {
            victim.name = name.clone();
        }
        if let Some(contact) = &update.contact {
            victim.contact = Some(contact.clone());
        }
        if let Some(location) = &update.location {
            victim.location = Some(location.clone());
        }
        if let Some(address) = &update.address {
            victim.address = Some(address.clone());
        }
        if let Some(description) = &update.description {
            victim.description = Some(description.clone());
        }
        Ok(victim.clone())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let mut tables = self.tables.write().await;
        // Same effect as ON DELETE RESTRICT
        if tables.cases.iter().any(|c| c.victim_id == *id) {
            return Err(ApiError::conflict(format!(
                "Victim {} is referenced by a case",
                id
            )));
        }
        let before = tables.victims.len();
        tables.victims.retain(|v| v.id != *id);
        if tables.victims.len() == before {
            return Err(ApiError::NotFound(format!("Victim with id {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CaseRepository for InMemoryStore {
    async fn create(&self, case: &CaseCreate) -> Result<CaseRecord, ApiError> {
        let mut tables = self.tables.write().await;
        if !tables.victims.iter().any(|v| v.id == case.victim_id) {
            return Err(ApiError::internal(format!(
                "foreign key violation: victim {} does not exist",
                case.victim_id
            )));
        }
        let record = CaseRecord {
            id: Uuid::new_v4(),
            case_type: case.case_type.clone(),
            status: case.status,
            victim_id: case.victim_id,
            incident_date: case.incident_date,
            summary: case.summary.clone(),
            created_at: Utc::now(),
            created_by: case.created_by,
        };
        tables.cases.push(record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<CaseRecord>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.cases.iter().find(|c| c.id == *id).cloned())
    }

    async fn list_recent(&self) -> Result<Vec<CaseRecord>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.cases.iter().rev().cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<CaseRecord>, ApiError> {
        Ok(self.tables.read().await.cases.clone())
    }

    async fn update(&self, id: &Uuid, update: &CaseUpdate) -> Result<CaseRecord, ApiError> {
        let mut tables = self.tables.write().await;
        if let Some(victim_id) = update.victim_id {
            if !tables.victims.iter().any(|v| v.id == victim_id) {
                return Err(ApiError::internal(format!(
                    "foreign key violation: victim {} does not exist",
                    victim_id
                )));
            }
        }
        let case = tables
            .cases
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| ApiError::NotFound(format!("Case with id {} not found", id)))?;

        if let Some(case_type) = &update.case_type {
            case.case_type = case_type.clone();
        }
        if let Some(status) = update.status {
            case.status = status;
        }
        if let Some(victim_id) = update.victim_id {
            case.victim_id = victim_id;
        }
        if let Some(incident_date) = update.incident_date {
            case.incident_date = incident_date;
        }
        if let Some(summary) = &update.summary {
            case.summary = Some(summary.clone());
        }
        Ok(case.clone())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let mut tables = self.tables.write().await;
        let before = tables.cases.len();
        tables.cases.retain(|c| c.id != *id);
        if tables.cases.len() == before {
            return Err(ApiError::NotFound(format!("Case with id {} not found", id)));
        }
        // Same effect as ON DELETE CASCADE
        tables.evidence.retain(|e| e.case_id != *id);
        tables.actions.retain(|a| a.case_id != *id);
        Ok(())
    }
}

#[async_trait]
impl EvidenceRepository for InMemoryStore {
    async fn create(&self, evidence: &EvidenceCreate) -> Result<EvidenceRecord, ApiError> {
        if self.fail_evidence_writes.load(Ordering::SeqCst) {
            return Err(injected("evidence insert"));
        }

        let mut tables = self.tables.write().await;
        if !tables.cases.iter().any(|c| c.id == evidence.case_id) {
            return Err(ApiError::internal(format!(
                "foreign key violation: case {} does not exist",
                evidence.case_id
            )));
        }
        if evidence.file_hash.is_some() != evidence.storage_location.is_some() {
            return Err(ApiError::validation(
                "File hash and storage location must be set together",
            ));
        }
        if let Some(location) = &evidence.storage_location {
            if tables
                .evidence
                .iter()
                .any(|e| e.storage_location.as_deref() == Some(location.as_str()))
            {
                return Err(ApiError::conflict(format!(
                    "Storage location {} is already referenced",
                    location
                )));
            }
        }

        let record = EvidenceRecord {
            id: Uuid::new_v4(),
            case_id: evidence.case_id,
            evidence_type: evidence.evidence_type.clone(),
            file_name: evidence.file_name.clone(),
            file_size: evidence.file_size,
            file_hash: evidence.file_hash.clone(),
            storage_location: evidence.storage_location.clone(),
            description: evidence.description.clone(),
            collection_time: evidence.collection_time,
            created_at: Utc::now(),
            created_by: evidence.created_by,
        };
        tables.evidence.push(record.clone());
        Ok(record)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<EvidenceRecord>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.evidence.iter().find(|e| e.id == *id).cloned())
    }

    async fn list_by_case(&self, case_id: &Uuid) -> Result<Vec<EvidenceRecord>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .evidence
            .iter()
            .rev()
            .filter(|e| e.case_id == *case_id)
            .cloned()
            .collect())
    }

    async fn list_recent(&self) -> Result<Vec<EvidenceRecord>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.evidence.iter().rev().cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<EvidenceRecord>, ApiError> {
        Ok(self.tables.read().await.evidence.clone())
    }

    async fn update_metadata(
        &self,
        id: &Uuid,
        update: &EvidenceUpdate,
    ) -> Result<EvidenceRecord, ApiError> {
        if self.fail_evidence_writes.load(Ordering::SeqCst) {
            return Err(injected("evidence update"));
        }

        let mut tables = self.tables.write().await;
        let evidence = tables
            .evidence
            .iter_mut()
            .find(|e| e.id == *id)
            .ok_or_else(|| ApiError::NotFound(format!("Evidence with id {} not found", id)))?;

        if let Some(evidence_type) = &update.evidence_type {
            evidence.evidence_type = evidence_type.clone();
        }
        if let Some(description) = &update.description {
            evidence.description = Some(description.clone());
        }
        if let Some(location) = &update.storage_location {
            evidence.storage_location = Some(location.clone());
        }
        if let Some(collection_time) = update.collection_time {
            evidence.collection_time = collection_time;
        }
        Ok(evidence.clone())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        if self.fail_evidence_writes.load(Ordering::SeqCst) {
            return Err(injected("evidence delete"));
        }

        let mut tables = self.tables.write().await;
        let before = tables.evidence.len();
        tables.evidence.retain(|e| e.id != *id);
        if tables.evidence.len() == before {
            return Err(ApiError::NotFound(format!("Evidence with id {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ForensicActionRepository for InMemoryStore {
    async fn create(&self, action: &ForensicActionCreate) -> Result<ForensicActionRecord, ApiError> {
        let mut tables = self.tables.write().await;
        if !tables.cases.iter().any(|c| c.id == action.case_id) {
            return Err(ApiError::internal(format!(
                "foreign key violation: case {} does not exist",
                action.case_id
            )));
        }

        let now = Utc::now();
        let record = ForensicActionRecord {
            id: Uuid::new_v4(),
            case_id: action.case_id,
            investigator_name: action.investigator_name.clone(),
            action_description: action.action_description.clone(),
            status: action.status,
            execution_time: action.execution_time.unwrap_or(now),
            created_at: now,
            created_by: action.created_by,
        };
        tables.actions.push(record.clone());
        Ok(record)
    }

    async fn list_by_case(&self, case_id: &Uuid) -> Result<Vec<ForensicActionRecord>, ApiError> {
        let tables = self.tables.read().await;
        let mut actions: Vec<ForensicActionRecord> = tables
            .actions
            .iter()
            .filter(|a| a.case_id == *case_id)
            .cloned()
            .collect();
        actions.sort_by(|a, b| b.execution_time.cmp(&a.execution_time));
        Ok(actions)
    }

    async fn list_recent(&self) -> Result<Vec<ForensicActionRecord>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.actions.iter().rev().cloned().collect())
    }

    async fn list_all(&self) -> Result<Vec<ForensicActionRecord>, ApiError> {
        Ok(self.tables.read().await.actions.clone())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_profile(
        &self,
        email: &str,
        full_name: Option<&str>,
    ) -> Result<UserProfile, ApiError> {
        let mut tables = self.tables.write().await;
        if tables.profiles.iter().any(|p| p.email == email) {
            return Err(ApiError::conflict(format!("Profile {} already exists", email)));
        }
        let profile = UserProfile {
            id: Uuid::new_v4(),
            email: email.to_string(),
            full_name: full_name.map(str::to_string),
            created_at: Utc::now(),
        };
        tables.profiles.push(profile.clone());
        Ok(profile)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().rev().cloned().collect())
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .user_roles
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_user_roles(&self, user_id: Uuid) -> Result<u64, ApiError> {
        if self.fail_role_deletes.load(Ordering::SeqCst) {
            return Err(injected("role delete"));
        }
        let mut tables = self.tables.write().await;
        let before = tables.user_roles.len();
        tables.user_roles.retain(|r| r.user_id != user_id);
        Ok((before - tables.user_roles.len()) as u64)
    }

    async fn insert_user_role(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> Result<RoleAssignment, ApiError> {
        if self.fail_role_inserts.load(Ordering::SeqCst) {
            return Err(injected("role insert"));
        }

        let mut tables = self.tables.write().await;
        if !tables.profiles.iter().any(|p| p.id == user_id) {
            return Err(ApiError::internal(format!(
                "foreign key violation: profile {} does not exist",
                user_id
            )));
        }
        // Same effect as ON CONFLICT (user_id) DO UPDATE
        if let Some(existing) = tables.user_roles.iter_mut().find(|r| r.user_id == user_id) {
            existing.role = role;
            existing.created_at = Utc::now();
            return Ok(existing.clone());
        }
        let assignment = RoleAssignment {
            id: Uuid::new_v4(),
            user_id,
            role,
            created_at: Utc::now(),
        };
        tables.user_roles.push(assignment.clone());
        Ok(assignment)
    }

    async fn record_transition(
        &self,
        user_id: Uuid,
        target_role: Role,
    ) -> Result<PendingRoleTransition, ApiError> {
        let mut tables = self.tables.write().await;
        let marker = PendingRoleTransition {
            user_id,
            target_role,
            started_at: Utc::now(),
        };
        tables.transitions.retain(|t| t.user_id != user_id);
        tables.transitions.push(marker.clone());
        Ok(marker)
    }

    async fn find_transition(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PendingRoleTransition>, ApiError> {
        let tables = self.tables.read().await;
        Ok(tables
            .transitions
            .iter()
            .find(|t| t.user_id == user_id)
            .cloned())
    }

    async fn list_transitions(&self) -> Result<Vec<PendingRoleTransition>, ApiError> {
        Ok(self.tables.read().await.transitions.clone())
    }

    async fn clear_transition(&self, user_id: Uuid, target_role: Role) -> Result<(), ApiError> {
        if self.fail_transition_clears.load(Ordering::SeqCst) {
            return Err(injected("transition clear"));
        }
        self.tables
            .write()
            .await
            .transitions
            .retain(|t| !(t.user_id == user_id && t.target_role == target_role));
        Ok(())
    }
}
