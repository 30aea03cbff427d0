use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "action_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ForensicActionRecord {
    pub id: Uuid,
    pub case_id: Uuid,
    /// Free text typed by whoever logged the action; not a profile reference.
    pub investigator_name: String,
    pub action_description: String,
    pub status: ActionStatus,
    pub execution_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForensicActionCreate {
    pub case_id: Uuid,
    pub investigator_name: String,
    pub action_description: String,
    #[serde(default = "default_action_status")]
    pub status: ActionStatus,
    pub execution_time: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub created_by: Option<Uuid>,
}

fn default_action_status() -> ActionStatus {
    ActionStatus::Pending
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionListQuery {
    pub case_id: Option<Uuid>,
}
