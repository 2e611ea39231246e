//! Upload selection and validation.
//!
//! Turns paths into upload candidates and gates them against the accepted
//! type and size before anything is handed to the orchestrator. At most one
//! candidate is held at a time.

use crate::config::UploadConfig;
use crate::error::ValidationError;
use crate::models::UploadCandidate;
use std::fs;
use std::path::Path;
use tracing::debug;

/// MIME type reported for files whose extension is not recognised.
const FALLBACK_MIME: &str = "application/octet-stream";

/// Gate for upload candidates.
#[derive(Debug, Clone)]
pub struct InputValidator {
    max_bytes: u64,
    accepted_mime: String,
    held: Option<UploadCandidate>,
    enabled: bool,
}

impl Default for InputValidator {
    fn default() -> Self {
        Self::new(&UploadConfig::default())
    }
}

impl From<&UploadConfig> for InputValidator {
    fn from(config: &UploadConfig) -> Self {
        Self::new(config)
    }
}

impl InputValidator {
    pub fn new(config: &UploadConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            accepted_mime: config.accepted_mime.clone(),
            held: None,
            enabled: true,
        }
    }

    /// Check a single candidate against type and size constraints.
    pub fn check(&self, candidate: &UploadCandidate) -> Result<(), ValidationError> {
        if !candidate.mime_type.eq_ignore_ascii_case(&self.accepted_mime) {
            return Err(ValidationError::UnsupportedType {
                mime_type: candidate.mime_type.clone(),
                accepted: self.accepted_mime.clone(),
            });
        }

        if candidate.byte_size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size: candidate.byte_size,
                limit: self.max_bytes,
            });
        }

        Ok(())
    }

    /// Validate the presented files and, on success, replace the held candidate.
    ///
    /// While disabled every selection is rejected and the held candidate is
    /// left untouched.
    pub fn select(
        &mut self,
        mut candidates: Vec<UploadCandidate>,
    ) -> Result<&UploadCandidate, ValidationError> {
        if !self.enabled {
            return Err(ValidationError::Busy);
        }

        let candidate = match candidates.len() {
            0 => return Err(ValidationError::NoFile),
            1 => candidates.remove(0),
            n => return Err(ValidationError::MultipleFiles(n)),
        };

        self.check(&candidate)?;
        debug!(
            "Accepted {} ({}, {})",
            candidate.name,
            candidate.mime_type,
            candidate.display_size()
        );

        Ok(self.held.insert(candidate))
    }

    /// Drop the held candidate. Ignored while disabled.
    pub fn clear(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.held.take().is_some()
    }

    pub fn held(&self) -> Option<&UploadCandidate> {
        self.held.as_ref()
    }

    /// Enable or disable selection; the orchestrator disables it while a
    /// request is in flight.
    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Drop the held candidate regardless of the enabled flag.
    pub(crate) fn discard(&mut self) {
        self.held = None;
    }
}

/// Build an upload candidate from a file on disk.
///
/// The MIME type is derived from the file extension; anything not listed in
/// the config is presented as `application/octet-stream` and will be refused
/// by the validator.
pub fn candidate_from_path(
    path: &Path,
    config: &UploadConfig,
) -> Result<UploadCandidate, ValidationError> {
    let metadata = fs::metadata(path).map_err(|e| ValidationError::Unreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    if !metadata.is_file() {
        return Err(ValidationError::Unreadable {
            path: path.display().to_string(),
            reason: "not a regular file".to_string(),
        });
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(UploadCandidate {
        name,
        byte_size: metadata.len(),
        mime_type: mime_for_path(path, config),
        path: path.to_path_buf(),
    })
}

fn mime_for_path(path: &Path, config: &UploadConfig) -> String {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if config
        .accepted_extensions
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(&extension))
    {
        config.accepted_mime.clone()
    } else {
        FALLBACK_MIME.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MIB: u64 = 1024 * 1024;

    fn pdf(name: &str, size: u64) -> UploadCandidate {
        UploadCandidate {
            name: name.to_string(),
            byte_size: size,
            mime_type: "application/pdf".to_string(),
            path: PathBuf::from(name),
        }
    }

    #[test]
    fn test_size_boundary_is_inclusive() {
        let mut validator = InputValidator::default();
        assert!(validator.select(vec![pdf("exact.pdf", 10 * MIB)]).is_ok());
        assert_eq!(
            validator.select(vec![pdf("big.pdf", 10 * MIB + 1)]),
            Err(ValidationError::TooLarge {
                size: 10 * MIB + 1,
                limit: 10 * MIB
            })
        );
        // rejection keeps the previously accepted file
        assert_eq!(validator.held().unwrap().name, "exact.pdf");
    }

    #[test]
    fn test_rejects_wrong_type() {
        let mut validator = InputValidator::default();
        let mut doc = pdf("resume.docx", 100);
        doc.mime_type = "application/msword".to_string();
        assert!(matches!(
            validator.select(vec![doc]),
            Err(ValidationError::UnsupportedType { .. })
        ));
        assert!(validator.held().is_none());
    }

    #[test]
    fn test_rejects_multiple_and_empty() {
        let mut validator = InputValidator::default();
        assert_eq!(
            validator.select(vec![pdf("a.pdf", 1), pdf("b.pdf", 1)]),
            Err(ValidationError::MultipleFiles(2))
        );
        assert_eq!(validator.select(vec![]), Err(ValidationError::NoFile));
        assert!(validator.held().is_none());
    }

    #[test]
    fn test_accept_replaces_previous() {
        let mut validator = InputValidator::default();
        validator.select(vec![pdf("first.pdf", 10)]).unwrap();
        validator.select(vec![pdf("second.pdf", 20)]).unwrap();
        assert_eq!(validator.held().unwrap().name, "second.pdf");
    }

    #[test]
    fn test_disabled_rejects_without_state_change() {
        let mut validator = InputValidator::default();
        validator.select(vec![pdf("held.pdf", 10)]).unwrap();
        validator.set_enabled(false);

        assert_eq!(
            validator.select(vec![pdf("other.pdf", 10)]),
            Err(ValidationError::Busy)
        );
        assert!(!validator.clear());
        assert_eq!(validator.held().unwrap().name, "held.pdf");
    }

    #[test]
    fn test_candidate_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = UploadConfig::default();

        let pdf_path = dir.path().join("Resume.PDF");
        fs::write(&pdf_path, b"%PDF-1.4 test").unwrap();
        let candidate = candidate_from_path(&pdf_path, &config).unwrap();
        assert_eq!(candidate.name, "Resume.PDF");
        assert_eq!(candidate.byte_size, 13);
        assert_eq!(candidate.mime_type, "application/pdf");

        let txt_path = dir.path().join("resume.txt");
        fs::write(&txt_path, b"plain").unwrap();
        let candidate = candidate_from_path(&txt_path, &config).unwrap();
        assert_eq!(candidate.mime_type, FALLBACK_MIME);

        let missing = dir.path().join("missing.pdf");
        assert!(matches!(
            candidate_from_path(&missing, &config),
            Err(ValidationError::Unreadable { .. })
        ));
    }
}
