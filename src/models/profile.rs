use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::auth::rbac::Role;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct RoleAssignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Marker written before a role change starts and cleared once it completes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct PendingRoleTransition {
    pub user_id: Uuid,
    pub target_role: Role,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub roles: Vec<Role>,
    /// The single role the admin view displays and edits.
    pub current_role: Option<Role>,
}

impl UserWithRoles {
    pub fn from_profile_and_roles(profile: UserProfile, roles: Vec<Role>) -> Self {
        let current_role = roles.first().copied();
        Self {
            profile,
            roles,
            current_role,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}
