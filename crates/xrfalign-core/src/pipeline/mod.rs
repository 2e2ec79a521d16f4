pub mod config;
mod orchestrator;
mod types;

pub use orchestrator::{run_alignment, run_pipeline, run_pipeline_reported};
pub use types::{AlignmentReport, AlignmentStage, PassSummary, ProgressReporter};
