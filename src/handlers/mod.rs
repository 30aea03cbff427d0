pub mod action_handlers;
pub mod admin_handlers;
pub mod analytics_handlers;
pub mod case_handlers;
pub mod evidence_handlers;
pub mod health_handlers;
pub mod victim_handlers;

pub use health_handlers::{health_check, health_check_simple};
