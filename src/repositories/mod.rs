pub mod action_repo;
pub mod case_repo;
pub mod evidence_repo;
pub mod memory;
pub mod user_repo;
pub mod victim_repo;

pub use action_repo::{ForensicActionRepository, SqlxForensicActionRepository};
pub use case_repo::{CaseRepository, SqlxCaseRepository};
pub use evidence_repo::{EvidenceRepository, SqlxEvidenceRepository};
pub use memory::InMemoryStore;
pub use user_repo::{SqlxUserRepository, UserRepository};
pub use victim_repo::{SqlxVictimRepository, VictimRepository};
