use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    error::ApiError,
    models::{
        AnalyticsReport, AnalyticsSnapshot, CategoryCount, DashboardTotals, InvestigatorCount,
        TrendPoint,
    },
    repositories::{CaseRepository, EvidenceRepository, ForensicActionRepository, UserRepository},
};

/// Counts keys while remembering the order in which each key first appeared.
#[derive(Default)]
struct OrderedCounter {
    index: HashMap<String, usize>,
    entries: Vec<(String, u64)>,
}

impl OrderedCounter {
    fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    fn into_entries(self) -> Vec<(String, u64)> {
        self.entries
    }

    /// Descending by count; `sort_by` is stable so ties keep first-seen order.
    fn into_ranked(self, limit: usize) -> Vec<(String, u64)> {
        let mut entries = self.entries;
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(limit);
        entries
    }
}

fn category_counts(entries: Vec<(String, u64)>) -> Vec<CategoryCount> {
    entries
        .into_iter()
        .map(|(name, value)| CategoryCount { name, value })
        .collect()
}

/// Pure aggregation over an already-fetched snapshot.
pub struct AggregationEngine;

impl AggregationEngine {
    pub fn aggregate(
        snapshot: &AnalyticsSnapshot,
        now: DateTime<Utc>,
        window_days: u32,
        top_n: usize,
    ) -> AnalyticsReport {
        AnalyticsReport {
            status_counts: Self::status_counts(snapshot),
            top_categories: Self::top_categories(snapshot, top_n),
            monthly_trend: Self::monthly_trend(snapshot, now, window_days),
            evidence_category_counts: Self::evidence_category_counts(snapshot),
            top_investigators: Self::top_investigators(snapshot, top_n),
            totals: Self::totals(snapshot),
            generated_at: now,
        }
    }

    pub fn status_counts(snapshot: &AnalyticsSnapshot) -> Vec<CategoryCount> {
        let mut counter = OrderedCounter::default();
        for case in &snapshot.cases {
            counter.add(case.status.as_str());
        }
        category_counts(counter.into_entries())
    }

    pub fn top_categories(snapshot: &AnalyticsSnapshot, top_n: usize) -> Vec<CategoryCount> {
        let mut counter = OrderedCounter::default();
        for case in &snapshot.cases {
            counter.add(&case.case_type);
        }
        category_counts(counter.into_ranked(top_n))
    }

    /// Cases created strictly after `now - window_days`, bucketed by creation
    /// month in UTC. Buckets appear in the order first seen, not by date.
    pub fn monthly_trend(
        snapshot: &AnalyticsSnapshot,
        now: DateTime<Utc>,
        window_days: u32,
    ) -> Vec<TrendPoint> {
        let cutoff = now - Duration::days(i64::from(window_days));
        let mut counter = OrderedCounter::default();
        for case in snapshot.cases.iter().filter(|c| c.created_at > cutoff) {
            counter.add(&case.created_at.format("%b %Y").to_string());
        }
        counter
            .into_entries()
            .into_iter()
            .map(|(month, cases)| TrendPoint { month, cases })
            .collect()
    }

    pub fn evidence_category_counts(snapshot: &AnalyticsSnapshot) -> Vec<CategoryCount> {
        let mut counter = OrderedCounter::default();
        for evidence in &snapshot.evidence {
            counter.add(&evidence.evidence_type);
        }
        category_counts(counter.into_entries())
    }

    /// Grouped by the typed investigator name, exactly as entered.
    pub fn top_investigators(snapshot: &AnalyticsSnapshot, top_n: usize) -> Vec<InvestigatorCount> {
        let mut counter = OrderedCounter::default();
        for action in &snapshot.actions {
            counter.add(&action.investigator_name);
        }
        counter
            .into_ranked(top_n)
            .into_iter()
            .map(|(name, actions)| InvestigatorCount { name, actions })
            .collect()
    }

    pub fn totals(snapshot: &AnalyticsSnapshot) -> DashboardTotals {
        DashboardTotals {
            total_users: snapshot.profiles.len() as u64,
            total_cases: snapshot.cases.len() as u64,
            total_evidence: snapshot.evidence.len() as u64,
            total_actions: snapshot.actions.len() as u64,
        }
    }
}

pub struct AnalyticsService {
    case_repo: Arc<dyn CaseRepository + Send + Sync>,
    evidence_repo: Arc<dyn EvidenceRepository + Send + Sync>,
    action_repo: Arc<dyn ForensicActionRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    window_days: u32,
    top_n: usize,
}

impl AnalyticsService {
    pub fn new(
        case_repo: Arc<dyn CaseRepository + Send + Sync>,
        evidence_repo: Arc<dyn EvidenceRepository + Send + Sync>,
        action_repo: Arc<dyn ForensicActionRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        window_days: u32,
        top_n: usize,
    ) -> Self {
        Self {
            case_repo,
            evidence_repo,
            action_repo,
            user_repo,
            window_days,
            top_n,
        }
    }

    /// Fetches the four collections concurrently into an owned snapshot.
    pub async fn snapshot(&self) -> Result<AnalyticsSnapshot, ApiError> {
        let (cases, evidence, actions, profiles) = tokio::try_join!(
            self.case_repo.list_all(),
            self.evidence_repo.list_all(),
            self.action_repo.list_all(),
            self.user_repo.list_profiles(),
        )?;

        Ok(AnalyticsSnapshot {
            cases,
            evidence,
            actions,
            profiles,
        })
    }

    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<AnalyticsReport, ApiError> {
        let snapshot = self.snapshot().await?;
        tracing::debug!(
            cases = snapshot.cases.len(),
            evidence = snapshot.evidence.len(),
            actions = snapshot.actions.len(),
            "Aggregating dashboard snapshot"
        );
        Ok(AggregationEngine::aggregate(
            &snapshot,
            now,
            self.window_days,
            self.top_n,
        ))
    }
}
