//! Submission lifecycle for a single analysis.
//!
//! The current phase is the only in-flight guard: `begin` succeeds only from
//! `Idle` with a held candidate, so at most one request is ever outstanding.
//! Every transition out of `Awaiting` stops the progress simulator as part
//! of the transition itself.

use crate::client::AnalysisService;
use crate::error::{TransportError, ValidationError, GENERIC_ANALYSIS_MESSAGE};
use crate::models::{AnalysisReport, Envelope, UploadCandidate};
use crate::progress::ProgressSimulator;
use crate::report::{present, ExpandState, ReportView};
use crate::upload::InputValidator;
use std::fmt;
use tracing::{debug, info, warn};

/// Phase of the submission state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisPhase {
    Idle,
    Submitting,
    Awaiting,
    Success,
    Failed,
}

impl AnalysisPhase {
    /// True while a request is being prepared or is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, AnalysisPhase::Submitting | AnalysisPhase::Awaiting)
    }
}

impl fmt::Display for AnalysisPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisPhase::Idle => write!(f, "Idle"),
            AnalysisPhase::Submitting => write!(f, "Submitting"),
            AnalysisPhase::Awaiting => write!(f, "Awaiting"),
            AnalysisPhase::Success => write!(f, "Success"),
            AnalysisPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Owns the held upload, drives the service call and keeps the outcome.
pub struct AnalysisOrchestrator<S> {
    service: S,
    validator: InputValidator,
    progress: ProgressSimulator,
    phase: AnalysisPhase,
    report: Option<AnalysisReport>,
    error: Option<String>,
    expand: ExpandState,
}

impl<S: AnalysisService> AnalysisOrchestrator<S> {
    pub fn new(service: S, validator: InputValidator, progress: ProgressSimulator) -> Self {
        Self {
            service,
            validator,
            progress,
            phase: AnalysisPhase::Idle,
            report: None,
            error: None,
            expand: ExpandState::new(),
        }
    }

    pub fn phase(&self) -> AnalysisPhase {
        self.phase
    }

    pub fn candidate(&self) -> Option<&UploadCandidate> {
        self.validator.held()
    }

    pub fn report(&self) -> Option<&AnalysisReport> {
        self.report.as_ref()
    }

    /// Message of the last failure, held while in `Failed`.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn progress(&self) -> &ProgressSimulator {
        &self.progress
    }

    #[cfg(test)]
    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn expand_state(&self) -> &ExpandState {
        &self.expand
    }

    /// Offer files to the validator. Rejected with `Busy` while in flight
    /// and with `ResetRequired` once an outcome is held.
    pub fn select_file(&mut self, candidates: Vec<UploadCandidate>) -> Result<(), ValidationError> {
        if matches!(self.phase, AnalysisPhase::Success | AnalysisPhase::Failed) {
            return Err(ValidationError::ResetRequired);
        }

        let accepted = self.validator.select(candidates)?;
        info!("Selected {} ({})", accepted.name, accepted.display_size());
        Ok(())
    }

    /// Drop the held candidate. No effect outside `Idle`.
    pub fn clear_selection(&mut self) -> bool {
        if self.phase != AnalysisPhase::Idle {
            return false;
        }
        self.validator.clear()
    }

    /// Flip the expanded state of one category.
    pub fn toggle_category(&mut self, key: &str) -> bool {
        self.expand.toggle(key)
    }

    /// View model of the current report, if the last analysis succeeded.
    pub fn view(&self) -> Option<ReportView> {
        match (self.phase, self.report.as_ref()) {
            (AnalysisPhase::Success, Some(report)) => Some(present(report, &self.expand)),
            _ => None,
        }
    }

    /// `Idle -> Submitting`. Returns the candidate to send, or `None` when
    /// the guard refuses (not idle, or nothing held) and nothing changed.
    pub fn begin(&mut self) -> Option<UploadCandidate> {
        if self.phase != AnalysisPhase::Idle {
            debug!("analyze ignored in {} phase", self.phase);
            return None;
        }

        let candidate = match self.validator.held() {
            Some(candidate) => candidate.clone(),
            None => {
                debug!("analyze ignored: no file selected");
                return None;
            }
        };

        self.report = None;
        self.error = None;
        self.expand.clear();
        self.validator.set_enabled(false);
        self.transition(AnalysisPhase::Submitting);

        Some(candidate)
    }

    /// `Submitting -> Awaiting`, starting the progress simulator.
    pub fn request_sent(&mut self) -> bool {
        if self.phase != AnalysisPhase::Submitting {
            return false;
        }

        self.transition(AnalysisPhase::Awaiting);
        self.progress.start();
        true
    }

    /// `Awaiting -> Success | Failed`, stopping the progress simulator.
    pub fn resolve(&mut self, outcome: Result<Envelope, TransportError>) -> bool {
        if self.phase != AnalysisPhase::Awaiting {
            return false;
        }

        self.progress.stop();
        self.validator.set_enabled(true);

        match outcome_to_result(outcome) {
            Ok(report) => {
                info!("Analysis complete: overall score {}", report.overall_score);
                self.report = Some(report);
                self.transition(AnalysisPhase::Success);
            }
            Err(message) => {
                warn!("Analysis failed: {}", message);
                self.error = Some(message);
                self.transition(AnalysisPhase::Failed);
            }
        }

        true
    }

    /// `Success | Failed -> Idle`, clearing the candidate, outcome and
    /// expand state.
    pub fn reset(&mut self) -> bool {
        if !matches!(self.phase, AnalysisPhase::Success | AnalysisPhase::Failed) {
            return false;
        }

        self.validator.discard();
        self.report = None;
        self.error = None;
        self.expand.clear();
        self.transition(AnalysisPhase::Idle);
        true
    }

    /// Abandon an in-flight analysis (teardown). The held candidate is kept.
    pub fn cancel(&mut self) -> bool {
        if !self.phase.is_in_flight() {
            return false;
        }

        self.progress.stop();
        self.validator.set_enabled(true);
        self.transition(AnalysisPhase::Idle);
        true
    }

    /// Run one full submission. A call outside `Idle`, or with no file
    /// held, is a no-op that returns the unchanged phase.
    pub async fn analyze(&mut self) -> AnalysisPhase {
        let Some(candidate) = self.begin() else {
            return self.phase;
        };

        info!("Submitting {} for analysis", candidate.name);
        self.request_sent();

        let outcome = self.service.submit(&candidate).await;
        self.resolve(outcome);

        self.phase
    }

    fn transition(&mut self, next: AnalysisPhase) {
        debug!("{} -> {}", self.phase, next);
        self.phase = next;
    }
}

/// Collapse a service outcome into a report or a single display message.
fn outcome_to_result(
    outcome: Result<Envelope, TransportError>,
) -> Result<AnalysisReport, String> {
    match outcome {
        Ok(Envelope {
            success: true,
            data: Some(report),
            ..
        }) => Ok(report),
        Ok(envelope) => Err(envelope
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| GENERIC_ANALYSIS_MESSAGE.to_string())),
        Err(e) => Err(e.display_message()),
    }
}
