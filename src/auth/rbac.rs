use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "app_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Investigator,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Investigator => "investigator",
            Role::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "investigator" => Some(Role::Investigator),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Permission {
    // Cases and forensic actions
    ViewCases,
    EditCases,

    // Evidence
    ViewEvidence,
    EditEvidence,

    // Destructive operations
    DeleteRecords,

    // Dashboard
    ViewAnalytics,

    // User Management
    ManageUsers,
}

impl Role {
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => &[
                Permission::ViewCases,
                Permission::EditCases,
                Permission::ViewEvidence,
                Permission::EditEvidence,
                Permission::DeleteRecords,
                Permission::ViewAnalytics,
                Permission::ManageUsers,
            ],
            Role::Investigator => &[
                Permission::ViewCases,
                Permission::EditCases,
                Permission::ViewEvidence,
                Permission::EditEvidence,
                Permission::ViewAnalytics,
            ],
            Role::Viewer => &[
                Permission::ViewCases,
                Permission::ViewEvidence,
                Permission::ViewAnalytics,
            ],
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}
