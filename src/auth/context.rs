use crate::auth::rbac::{Permission, Role};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request-scoped identity resolved by the auth middleware.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: Option<Uuid>, // None for an API key not acting for a profile
    pub email: Option<String>,
    pub roles: Vec<Role>,
    pub is_api_key: bool,
}

impl UserContext {
    pub fn new_user(user_id: Uuid, email: String, roles: Vec<Role>) -> Self {
        Self {
            user_id: Some(user_id),
            email: Some(email),
            roles,
            is_api_key: false,
        }
    }

    /// Service credential; may act on behalf of a profile for attribution.
    pub fn new_api_key(acting_user: Option<Uuid>) -> Self {
        Self {
            user_id: acting_user,
            email: None,
            roles: vec![Role::Admin],
            is_api_key: true,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.roles.iter().any(|r| r.has_permission(permission))
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), ApiError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(ApiError::Authorization(format!(
                "Permission {:?} required",
                permission
            )))
        }
    }

    /// Identity the current request acts as; required for attributed writes.
    pub fn acting_user(&self) -> Result<Uuid, ApiError> {
        self.user_id
            .ok_or_else(|| ApiError::authentication("No acting user for this request"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_without_acting_user_cannot_attribute_writes() {
        let context = UserContext::new_api_key(None);
        assert!(context.has_permission(Permission::EditEvidence));
        assert!(matches!(
            context.acting_user(),
            Err(ApiError::Authentication(_))
        ));
    }

    #[test]
    fn test_permission_check_uses_any_role() {
        let context = UserContext::new_user(
            Uuid::new_v4(),
            "a@example.com".to_string(),
            vec![Role::Viewer, Role::Investigator],
        );
        assert!(context.require_permission(Permission::EditCases).is_ok());
        assert!(context.require_permission(Permission::ManageUsers).is_err());
    }
}
