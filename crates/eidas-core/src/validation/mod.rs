//! Per-file validation of discovered content.

mod orchestrator;

pub use orchestrator::ValidationOrchestrator;
pub use orchestrator::apply_profile_outcome;
