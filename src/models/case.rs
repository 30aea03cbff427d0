use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use crate::models::{EvidenceRecord, ForensicActionRecord, VictimRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "case_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    Open,
    Investigation,
    Closed,
}

impl CaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "open",
            CaseStatus::Investigation => "investigation",
            CaseStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CaseRecord {
    pub id: Uuid,
    pub case_type: String,
    pub status: CaseStatus,
    pub victim_id: Uuid,
    pub incident_date: NaiveDate,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaseCreate {
    pub case_type: String,
    #[serde(default = "default_case_status")]
    pub status: CaseStatus,
    pub victim_id: Uuid,
    pub incident_date: NaiveDate,
    pub summary: Option<String>,
    #[serde(skip)]
    pub created_by: Option<Uuid>,
}

fn default_case_status() -> CaseStatus {
    CaseStatus::Open
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseUpdate {
    pub case_type: Option<String>,
    pub status: Option<CaseStatus>,
    pub victim_id: Option<Uuid>,
    pub incident_date: Option<NaiveDate>,
    pub summary: Option<String>,
}

/// Evidence row as shown in a case report, with the digest shortened.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEvidence {
    #[serde(flatten)]
    pub evidence: EvidenceRecord,
    pub file_hash_preview: Option<String>,
}

impl From<EvidenceRecord> for ReportEvidence {
    fn from(evidence: EvidenceRecord) -> Self {
        let file_hash_preview = evidence.file_hash.as_ref().map(|d| d.preview());
        Self {
            evidence,
            file_hash_preview,
        }
    }
}

/// Everything the case details view and its exported report show.
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub case: CaseRecord,
    pub victim: Option<VictimRecord>,
    pub evidence: Vec<ReportEvidence>,
    pub actions: Vec<ForensicActionRecord>,
    pub generated_at: DateTime<Utc>,
}
