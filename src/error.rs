//! Error types for upload validation and the analysis transport.

use thiserror::Error;

/// Message shown when a transport failure carries nothing more specific.
pub const GENERIC_TRANSPORT_MESSAGE: &str = "Something went wrong. Please try again.";

/// Message shown when the service reports failure without a message.
pub const GENERIC_ANALYSIS_MESSAGE: &str = "Analysis failed.";

/// Why an upload candidate was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("No file was provided")]
    NoFile,

    #[error("Only one file can be analyzed at a time ({0} were provided)")]
    MultipleFiles(usize),

    #[error("Unsupported file type '{mime_type}'. Only {accepted} files are accepted")]
    UnsupportedType { mime_type: String, accepted: String },

    #[error("File is {size} bytes, which exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("An analysis is already in progress")]
    Busy,

    #[error("Start a new analysis before selecting another file")]
    ResetRequired,

    #[error("Cannot read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Failure while talking to the analysis service.
///
/// Carries both the structured `detail` from an error body (when one could
/// be parsed) and the transport's own message so that the displayed text can
/// be chosen by precedence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", pick_message(.detail, .message))]
pub struct TransportError {
    /// `detail` field of the error body, if the body parsed.
    pub detail: Option<String>,
    /// The transport's own description of the failure.
    pub message: String,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            detail: None,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail;
        self
    }

    /// Pick the message to show: structured detail, then the transport
    /// message, then the generic fallback.
    pub fn display_message(&self) -> String {
        pick_message(&self.detail, &self.message)
    }
}

/// Empty strings count as absent at every level.
fn pick_message(detail: &Option<String>, message: &str) -> String {
    detail
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .or_else(|| Some(message).filter(|m| !m.trim().is_empty()))
        .unwrap_or(GENERIC_TRANSPORT_MESSAGE)
        .to_string()
}
