use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::rbac::Role,
    error::ApiError,
    models::{RoleAssignment, UserWithRoles},
    repositories::UserRepository,
};

/// Replaces a user's role with a delete followed by an insert.
///
/// A `role_transitions` marker is written before the delete and cleared after
/// the insert. A marker that outlives its request identifies a user whose
/// transition was interrupted; `retry_insert` and `resume_pending` finish it.
/// The insert upserts on `user_id`, so concurrent changes for one user leave a
/// single assignment held by whichever insert ran last.
pub struct RoleTransitionManager {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl RoleTransitionManager {
    pub fn new(user_repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { user_repo }
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) -> Result<RoleAssignment, ApiError> {
        self.require_profile(user_id).await?;

        self.user_repo
            .record_transition(user_id, role)
            .await
            .map_err(ApiError::store_write)?;

        // On failure the marker stays; prior roles are untouched
        let removed = self
            .user_repo
            .delete_user_roles(user_id)
            .await
            .map_err(ApiError::store_write)?;
        tracing::debug!("Removed {} role assignment(s) for user {}", removed, user_id);

        let assignment = self.insert_pending(user_id, role).await?;
        self.clear_marker(user_id, role).await;
        tracing::info!("User {} now has role {}", user_id, role);
        Ok(assignment)
    }

    /// Finishes an interrupted transition to the role its marker names.
    ///
    /// Roles other than the target are removed first, covering a transition
    /// that stopped before its delete ran.
    pub async fn retry_insert(&self, user_id: Uuid) -> Result<RoleAssignment, ApiError> {
        let pending = self
            .user_repo
            .find_transition(user_id)
            .await?
            .ok_or_else(|| {
                ApiError::not_found(format!("No pending role change for user {}", user_id))
            })?;
        let role = pending.target_role;

        let existing = self.user_repo.get_user_roles(user_id).await?;
        if let [assignment] = existing.as_slice() {
            if assignment.role == role {
                // The insert landed before the failure was reported
                self.clear_marker(user_id, role).await;
                return Ok(assignment.clone());
            }
        }

        if existing.iter().any(|a| a.role != role) {
            let removed = self
                .user_repo
                .delete_user_roles(user_id)
                .await
                .map_err(ApiError::store_write)?;
            tracing::info!(
                "Removed {} stale role assignment(s) for user {} before retrying",
                removed,
                user_id
            );
        }

        let assignment = self.insert_pending(user_id, role).await?;
        self.clear_marker(user_id, role).await;
        tracing::info!("Completed pending role change for user {} to {}", user_id, role);
        Ok(assignment)
    }

    /// Completes every transition left pending by an earlier process.
    pub async fn resume_pending(&self) -> Result<usize, ApiError> {
        let pending = self.user_repo.list_transitions().await?;
        let mut resumed = 0;

        for marker in pending {
            match self.retry_insert(marker.user_id).await {
                Ok(_) => resumed += 1,
                Err(e) => tracing::warn!(
                    "Could not resume role change for user {}: {}",
                    marker.user_id,
                    e
                ),
            }
        }

        if resumed > 0 {
            tracing::info!("Resumed {} pending role change(s)", resumed);
        }
        Ok(resumed)
    }

    pub async fn roles_of(&self, user_id: Uuid) -> Result<Vec<Role>, ApiError> {
        let assignments = self.user_repo.get_user_roles(user_id).await?;
        Ok(assignments.into_iter().map(|a| a.role).collect())
    }

    /// The single role shown for a user: the earliest assignment, if any.
    pub async fn current_role(&self, user_id: Uuid) -> Result<Option<Role>, ApiError> {
        Ok(self.roles_of(user_id).await?.first().copied())
    }

    pub async fn list_users(&self) -> Result<Vec<UserWithRoles>, ApiError> {
        let profiles = self.user_repo.list_profiles().await?;
        let mut users = Vec::with_capacity(profiles.len());
        for profile in profiles {
            let roles = self.roles_of(profile.id).await?;
            users.push(UserWithRoles::from_profile_and_roles(profile, roles));
        }
        Ok(users)
    }

    async fn require_profile(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.user_repo.find_by_id(user_id).await?.is_none() {
            return Err(ApiError::not_found(format!("User {} not found", user_id)));
        }
        Ok(())
    }

    async fn insert_pending(&self, user_id: Uuid, role: Role) -> Result<RoleAssignment, ApiError> {
        self.user_repo
            .insert_user_role(user_id, role)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Role insert for user {} failed after prior roles were removed: {}",
                    user_id,
                    e
                );
                ApiError::RoleAssignmentIncomplete { user_id, role }
            })
    }

    async fn clear_marker(&self, user_id: Uuid, role: Role) {
        if let Err(e) = self.user_repo.clear_transition(user_id, role).await {
            tracing::warn!(
                "Role change for user {} completed but its marker was not cleared: {}",
                user_id,
                e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PendingRoleTransition, UserProfile};
    use crate::repositories::InMemoryStore;
    use async_trait::async_trait;
    use tokio::sync::Barrier;

    /// Holds every caller after its delete until all of them have deleted.
    struct DeleteRendezvous {
        inner: Arc<InMemoryStore>,
        barrier: Barrier,
    }

    #[async_trait]
    impl UserRepository for DeleteRendezvous {
        async fn create_profile(
            &self,
            email: &str,
            full_name: Option<&str>,
        ) -> Result<UserProfile, ApiError> {
            self.inner.create_profile(email, full_name).await
        }
        async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, ApiError> {
            self.inner.find_by_id(id).await
        }
        async fn list_profiles(&self) -> Result<Vec<UserProfile>, ApiError> {
            self.inner.list_profiles().await
        }
        async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>, ApiError> {
            self.inner.get_user_roles(user_id).await
        }
        async fn delete_user_roles(&self, user_id: Uuid) -> Result<u64, ApiError> {
            let removed = self.inner.delete_user_roles(user_id).await?;
            self.barrier.wait().await;
            Ok(removed)
        }
        async fn insert_user_role(
            &self,
            user_id: Uuid,
            role: Role,
        ) -> Result<RoleAssignment, ApiError> {
            self.inner.insert_user_role(user_id, role).await
        }
        async fn record_transition(
            &self,
            user_id: Uuid,
            target_role: Role,
        ) -> Result<PendingRoleTransition, ApiError> {
            self.inner.record_transition(user_id, target_role).await
        }
        async fn find_transition(
            &self,
            user_id: Uuid,
        ) -> Result<Option<PendingRoleTransition>, ApiError> {
            self.inner.find_transition(user_id).await
        }
        async fn list_transitions(&self) -> Result<Vec<PendingRoleTransition>, ApiError> {
            self.inner.list_transitions().await
        }
        async fn clear_transition(&self, user_id: Uuid, target_role: Role) -> Result<(), ApiError> {
            self.inner.clear_transition(user_id, target_role).await
        }
    }

    async fn setup() -> (Arc<InMemoryStore>, RoleTransitionManager, Uuid) {
        let store = Arc::new(InMemoryStore::new());
        let profile = store
            .create_profile("analyst@example.org", Some("Analyst"))
            .await
            .unwrap();
        let manager = RoleTransitionManager::new(store.clone());
        (store, manager, profile.id)
    }

    #[tokio::test]
    async fn test_set_role_leaves_exactly_one_assignment() {
        let (store, manager, user) = setup().await;
        store.insert_user_role(user, Role::Viewer).await.unwrap();

        manager.set_role(user, Role::Admin).await.unwrap();

        assert_eq!(manager.roles_of(user).await.unwrap(), vec![Role::Admin]);
        assert_eq!(manager.current_role(user).await.unwrap(), Some(Role::Admin));
        assert!(store.find_transition(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_insert_reports_incomplete_and_keeps_marker() {
        let (store, manager, user) = setup().await;
        store.insert_user_role(user, Role::Viewer).await.unwrap();
        store.set_fail_role_inserts(true);

        let result = manager.set_role(user, Role::Investigator).await;
        match result {
            Err(ApiError::RoleAssignmentIncomplete { user_id, role }) => {
                assert_eq!(user_id, user);
                assert_eq!(role, Role::Investigator);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(manager.roles_of(user).await.unwrap().is_empty());
        let marker = store.find_transition(user).await.unwrap().unwrap();
        assert_eq!(marker.target_role, Role::Investigator);

        store.set_fail_role_inserts(false);
        manager.retry_insert(user).await.unwrap();
        assert_eq!(
            manager.roles_of(user).await.unwrap(),
            vec![Role::Investigator]
        );
        assert!(store.find_transition(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_marker_clear_failure_still_succeeds() {
        let (store, manager, user) = setup().await;
        store.set_fail_transition_clears(true);

        manager.set_role(user, Role::Viewer).await.unwrap();
        assert_eq!(manager.roles_of(user).await.unwrap(), vec![Role::Viewer]);
        assert!(store.find_transition(user).await.unwrap().is_some());

        store.set_fail_transition_clears(false);
        assert_eq!(manager.resume_pending().await.unwrap(), 1);
        assert!(store.find_transition(user).await.unwrap().is_none());
        assert_eq!(manager.roles_of(user).await.unwrap(), vec![Role::Viewer]);
    }

    #[tokio::test]
    async fn test_resume_pending_finishes_interrupted_change() {
        let (store, manager, user) = setup().await;
        store.record_transition(user, Role::Admin).await.unwrap();

        assert_eq!(manager.resume_pending().await.unwrap(), 1);
        assert_eq!(manager.roles_of(user).await.unwrap(), vec![Role::Admin]);
    }

    #[tokio::test]
    async fn test_retry_removes_roles_left_by_skipped_delete() {
        let (store, manager, user) = setup().await;
        store.insert_user_role(user, Role::Viewer).await.unwrap();
        // Marker written, process stopped before the delete
        store.record_transition(user, Role::Admin).await.unwrap();

        let assignment = manager.retry_insert(user).await.unwrap();

        assert_eq!(assignment.role, Role::Admin);
        assert_eq!(manager.roles_of(user).await.unwrap(), vec![Role::Admin]);
        assert!(store.find_transition(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_old_role_and_retry_completes() {
        let (store, manager, user) = setup().await;
        store.insert_user_role(user, Role::Viewer).await.unwrap();
        store.set_fail_role_deletes(true);

        let result = manager.set_role(user, Role::Admin).await;
        assert!(matches!(result, Err(ApiError::StoreWriteFailed(_))));
        assert_eq!(manager.roles_of(user).await.unwrap(), vec![Role::Viewer]);
        let marker = store.find_transition(user).await.unwrap().unwrap();
        assert_eq!(marker.target_role, Role::Admin);

        store.set_fail_role_deletes(false);
        manager.retry_insert(user).await.unwrap();
        assert_eq!(manager.roles_of(user).await.unwrap(), vec![Role::Admin]);
        assert!(store.find_transition(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_set_role_leaves_one_assignment() {
        let store = Arc::new(InMemoryStore::new());
        let profile = store
            .create_profile("analyst@example.org", None)
            .await
            .unwrap();
        store
            .insert_user_role(profile.id, Role::Investigator)
            .await
            .unwrap();
        let repo = Arc::new(DeleteRendezvous {
            inner: store.clone(),
            barrier: Barrier::new(2),
        });
        let manager = RoleTransitionManager::new(repo);

        let (first, second) = tokio::join!(
            manager.set_role(profile.id, Role::Admin),
            manager.set_role(profile.id, Role::Viewer),
        );
        first.unwrap();
        second.unwrap();

        let roles = manager.roles_of(profile.id).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert!(matches!(roles[0], Role::Admin | Role::Viewer));
        assert!(store.find_transition(profile.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_retry_without_marker_is_not_found() {
        let (_store, manager, user) = setup().await;
        assert!(matches!(
            manager.retry_insert(user).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_role_for_unknown_user() {
        let (_store, manager, _user) = setup().await;
        assert!(matches!(
            manager.set_role(Uuid::new_v4(), Role::Admin).await,
            Err(ApiError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_users_includes_current_role() {
        let (_store, manager, user) = setup().await;
        manager.set_role(user, Role::Investigator).await.unwrap();

        let users = manager.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].current_role, Some(Role::Investigator));
    }
}
