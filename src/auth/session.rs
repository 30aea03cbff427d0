use crate::auth::rbac::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

/// Session issued by the external auth provider and carried in a private cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<Role>,
    pub expires_at: DateTime<Utc>,
    pub session_id: String,
}

impl UserSession {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_expiry() {
        let mut session = UserSession {
            user_id: Uuid::new_v4(),
            email: "investigator@example.com".to_string(),
            roles: vec![Role::Investigator],
            expires_at: Utc::now() + Duration::hours(1),
            session_id: "abc".to_string(),
        };
        assert!(!session.is_expired());

        session.expires_at = Utc::now() - Duration::seconds(1);
        assert!(session.is_expired());
    }
}
