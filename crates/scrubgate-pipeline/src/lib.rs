//! Scrubgate Pipeline Orchestrator
//!
//! Sequences preprocessing, language selection, recognition, filtering and
//! masking for one request, under the guard's text-size ceiling, entity
//! ceiling and processing deadline.

pub mod options;
pub mod orchestrator;

pub use options::{PipelineDefaults, ResolvedOptions};
pub use orchestrator::Orchestrator;
