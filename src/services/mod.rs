pub mod analytics_service;
pub mod case_service;
pub mod evidence_service;
pub mod fingerprint;
pub mod role_service;
pub mod victim_service;

// Re-export commonly used types
pub use analytics_service::{AggregationEngine, AnalyticsService};
pub use case_service::CaseService;
pub use evidence_service::{EvidenceIntakeRecorder, IntakeFile, IntakeRequest};
pub use fingerprint::{fingerprint_bytes, fingerprint_reader};
pub use role_service::RoleTransitionManager;
pub use victim_service::VictimService;
