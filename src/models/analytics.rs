use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{CaseRecord, EvidenceRecord, ForensicActionRecord, UserProfile};

/// Point-in-time copy of every collection the dashboard aggregates.
///
/// Owned and immutable for the duration of one aggregation; a concurrent
/// refetch builds a new snapshot rather than touching this one.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsSnapshot {
    pub cases: Vec<CaseRecord>,
    pub evidence: Vec<EvidenceRecord>,
    pub actions: Vec<ForensicActionRecord>,
    pub profiles: Vec<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// Short month name and year, e.g. `Mar 2026`.
    pub month: String,
    pub cases: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvestigatorCount {
    pub name: String,
    pub actions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardTotals {
    pub total_users: u64,
    pub total_cases: u64,
    pub total_evidence: u64,
    pub total_actions: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub status_counts: Vec<CategoryCount>,
    pub top_categories: Vec<CategoryCount>,
    pub monthly_trend: Vec<TrendPoint>,
    pub evidence_category_counts: Vec<CategoryCount>,
    pub top_investigators: Vec<InvestigatorCount>,
    pub totals: DashboardTotals,
    pub generated_at: DateTime<Utc>,
}
