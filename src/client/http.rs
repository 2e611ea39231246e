//! HTTP implementation of the analysis service client.

use crate::client::AnalysisService;
use crate::config::ServiceConfig;
use crate::error::TransportError;
use crate::models::{Envelope, ErrorBody, HealthStatus, UploadCandidate};
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use tracing::{debug, warn};

/// Talks to the analysis service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    config: ServiceConfig,
    http_client: reqwest::Client,
}

impl HttpAnalysisService {
    /// Create a client; every request is bounded by the configured timeout.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Map a reqwest failure to the message shown to the user.
    fn describe(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::new(format!("timeout of {}ms exceeded", self.config.timeout_ms))
        } else if e.is_connect() {
            TransportError::new(format!(
                "Network Error: cannot connect to {}",
                self.config.base_url
            ))
        } else {
            TransportError::new(e.to_string())
        }
    }

    async fn build_form(&self, candidate: &UploadCandidate) -> Result<Form, TransportError> {
        let bytes = tokio::fs::read(&candidate.path).await.map_err(|e| {
            TransportError::new(format!("Failed to read {}: {}", candidate.name, e))
        })?;

        let part = Part::bytes(bytes)
            .file_name(candidate.name.clone())
            .mime_str(&candidate.mime_type)
            .map_err(|e| self.describe(e))?;

        Ok(Form::new().part(self.config.field_name.clone(), part))
    }
}

impl AnalysisService for HttpAnalysisService {
    async fn submit(&self, candidate: &UploadCandidate) -> Result<Envelope, TransportError> {
        let url = self.config.analyze_url();
        let form = self.build_form(candidate).await?;

        debug!("POST {} ({} bytes)", url, candidate.byte_size);

        let response = self
            .http_client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.describe(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.describe(e))?;

        debug!("Response {} ({} bytes)", status, body.len());
        interpret_response(status, &body)
    }

    async fn health(&self) -> Result<HealthStatus, TransportError> {
        let url = self.config.health_url();

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.describe(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.describe(e))?;

        if !(200..300).contains(&status) {
            return Err(status_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| TransportError::new(format!("Invalid health response: {}", e)))
    }
}

/// Turn a raw status and body into an envelope or a transport error.
///
/// A 2xx body that is not a valid envelope is treated as an unsuccessful
/// envelope without a message. Any other status is a transport error
/// carrying the best-effort `detail` from the body.
pub fn interpret_response(status: u16, body: &str) -> Result<Envelope, TransportError> {
    if !(200..300).contains(&status) {
        return Err(status_error(status, body));
    }

    match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => Ok(envelope),
        Err(e) => {
            warn!("Response body is not a valid envelope: {}", e);
            Ok(Envelope::default())
        }
    }
}

fn status_error(status: u16, body: &str) -> TransportError {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);

    TransportError::new(format!("Request failed with status code {}", status))
        .with_status(status)
        .with_detail(detail)
}
