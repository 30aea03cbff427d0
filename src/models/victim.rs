use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Person a case is opened for. Cases reference victims by id.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct VictimRecord {
    pub id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub report_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VictimCreate {
    pub name: String,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    #[serde(skip)]
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VictimUpdate {
    pub name: Option<String>,
    pub contact: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
}
