pub mod analytics;
pub mod case;
pub mod evidence;
pub mod forensic_action;
pub mod profile;
pub mod victim;

// Re-export commonly used types
pub use analytics::*;
pub use case::*;
pub use evidence::*;
pub use forensic_action::*;
pub use profile::*;
pub use victim::*;
