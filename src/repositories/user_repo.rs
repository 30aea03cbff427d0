use crate::auth::rbac::Role;
use crate::database::DatabasePool;
use crate::error::ApiError;
use crate::models::{PendingRoleTransition, RoleAssignment, UserProfile};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_profile(
        &self,
        email: &str,
        full_name: Option<&str>,
    ) -> Result<UserProfile, ApiError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, ApiError>;
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, ApiError>;

    /// Assignments in the order they were granted.
    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>, ApiError>;
    async fn delete_user_roles(&self, user_id: Uuid) -> Result<u64, ApiError>;
    /// Writes the user's single assignment, replacing any row already present.
    async fn insert_user_role(&self, user_id: Uuid, role: Role)
        -> Result<RoleAssignment, ApiError>;

    /// Writes or replaces the in-flight marker for a user.
    async fn record_transition(
        &self,
        user_id: Uuid,
        target_role: Role,
    ) -> Result<PendingRoleTransition, ApiError>;
    async fn find_transition(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PendingRoleTransition>, ApiError>;
    async fn list_transitions(&self) -> Result<Vec<PendingRoleTransition>, ApiError>;
    /// Removes the marker only while it still names `target_role`.
    async fn clear_transition(&self, user_id: Uuid, target_role: Role) -> Result<(), ApiError>;
}

pub struct SqlxUserRepository {
    pool: DatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create_profile(
        &self,
        email: &str,
        full_name: Option<&str>,
    ) -> Result<UserProfile, ApiError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"INSERT INTO profiles (id, email, full_name, created_at)
               VALUES ($1, $2, $3, NOW())
               RETURNING id, email, full_name, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(full_name)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(profile)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserProfile>, ApiError> {
        let profile = sqlx::query_as::<_, UserProfile>(
            "SELECT id, email, full_name, created_at FROM profiles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(profile)
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, ApiError> {
        let profiles = sqlx::query_as::<_, UserProfile>(
            "SELECT id, email, full_name, created_at FROM profiles ORDER BY created_at DESC, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(profiles)
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<RoleAssignment>, ApiError> {
        let roles = sqlx::query_as::<_, RoleAssignment>(
            r#"SELECT id, user_id, role, created_at FROM user_roles
               WHERE user_id = $1 ORDER BY created_at ASC, id"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(roles)
    }

    async fn delete_user_roles(&self, user_id: Uuid) -> Result<u64, ApiError> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(ApiError::Database)?;

        Ok(result.rows_affected())
    }

    async fn insert_user_role(
        &self,
        user_id: Uuid,
        role: Role,
    ) -> Result<RoleAssignment, ApiError> {
        let assignment = sqlx::query_as::<_, RoleAssignment>(
            r#"INSERT INTO user_roles (id, user_id, role, created_at)
               VALUES ($1, $2, $3, NOW())
               ON CONFLICT (user_id) DO UPDATE
               SET role = EXCLUDED.role, created_at = EXCLUDED.created_at
               RETURNING id, user_id, role, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(assignment)
    }

    async fn record_transition(
        &self,
        user_id: Uuid,
        target_role: Role,
    ) -> Result<PendingRoleTransition, ApiError> {
        let marker = sqlx::query_as::<_, PendingRoleTransition>(
            r#"INSERT INTO role_transitions (user_id, target_role, started_at)
               VALUES ($1, $2, NOW())
               ON CONFLICT (user_id) DO UPDATE
               SET target_role = EXCLUDED.target_role, started_at = EXCLUDED.started_at
               RETURNING user_id, target_role, started_at"#,
        )
        .bind(user_id)
        .bind(target_role)
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(marker)
    }

    async fn find_transition(
        &self,
        user_id: Uuid,
    ) -> Result<Option<PendingRoleTransition>, ApiError> {
        let marker = sqlx::query_as::<_, PendingRoleTransition>(
            "SELECT user_id, target_role, started_at FROM role_transitions WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(marker)
    }

    async fn list_transitions(&self) -> Result<Vec<PendingRoleTransition>, ApiError> {
        let markers = sqlx::query_as::<_, PendingRoleTransition>(
            "SELECT user_id, target_role, started_at FROM role_transitions ORDER BY started_at ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::Database)?;

        Ok(markers)
    }

    async fn clear_transition(&self, user_id: Uuid, target_role: Role) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM role_transitions WHERE user_id = $1 AND target_role = $2")
            .bind(user_id)
            .bind(target_role)
            .execute(&self.pool)
            .await
            .map_err(ApiError::Database)?;

        Ok(())
    }
}
