//! Client for the remote analysis service.
//!
//! The orchestrator talks to the service through [`AnalysisService`] so the
//! submission lifecycle can be driven without a network.

pub mod http;

use crate::error::TransportError;
use crate::models::{Envelope, HealthStatus, UploadCandidate};
use std::future::Future;

pub use http::HttpAnalysisService;

/// Operations offered by the analysis service.
pub trait AnalysisService {
    /// Upload the candidate and return the decoded response envelope.
    fn submit(
        &self,
        candidate: &UploadCandidate,
    ) -> impl Future<Output = Result<Envelope, TransportError>> + Send;

    /// Query the service health endpoint.
    fn health(&self) -> impl Future<Output = Result<HealthStatus, TransportError>> + Send;
}
