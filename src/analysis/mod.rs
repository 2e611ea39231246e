//! Analysis orchestration.
//!
//! This module owns the submission state machine that moves a selected
//! file through the remote analysis.

pub mod orchestrator;

pub use orchestrator::{AnalysisOrchestrator, AnalysisPhase};
