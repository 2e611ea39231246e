//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.atscheck.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".atscheck.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote service settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Upload constraints.
    #[serde(default)]
    pub upload: UploadConfig,

    /// Progress display settings.
    #[serde(default)]
    pub progress: ProgressConfig,

    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Remote analysis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the analysis service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the analyze endpoint.
    #[serde(default = "default_analyze_path")]
    pub analyze_path: String,

    /// Path of the health endpoint.
    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Multipart field name carrying the file.
    #[serde(default = "default_field_name")]
    pub field_name: String,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            analyze_path: default_analyze_path(),
            health_path: default_health_path(),
            field_name: default_field_name(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn analyze_url(&self) -> String {
        join_url(&self.base_url, &self.analyze_path)
    }

    pub fn health_url(&self) -> String {
        join_url(&self.base_url, &self.health_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_analyze_path() -> String {
    "/api/analyze".to_string()
}

fn default_health_path() -> String {
    "/api/health".to_string()
}

fn default_field_name() -> String {
    "file".to_string()
}

fn default_timeout_ms() -> u64 {
    120_000 // analysis runs several LLM passes server-side
}

/// Upload constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes (inclusive).
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// The single accepted MIME type.
    #[serde(default = "default_accepted_mime")]
    pub accepted_mime: String,

    /// File extensions mapped to the accepted MIME type.
    #[serde(default = "default_accepted_extensions")]
    pub accepted_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            accepted_mime: default_accepted_mime(),
            accepted_extensions: default_accepted_extensions(),
        }
    }
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_accepted_mime() -> String {
    "application/pdf".to_string()
}

fn default_accepted_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

/// Progress display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Interval between cosmetic step advances, in milliseconds.
    #[serde(default = "default_step_period_ms")]
    pub step_period_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            step_period_ms: default_step_period_ms(),
        }
    }
}

impl ProgressConfig {
    pub fn step_period(&self) -> Duration {
        Duration::from_millis(self.step_period_ms)
    }
}

fn default_step_period_ms() -> u64 {
    4000
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format, `markdown` or `json`.
    #[serde(default = "default_format")]
    pub format: String,

    /// Expand every category's details.
    #[serde(default)]
    pub expand_all: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            expand_all: false,
        }
    }
}

fn default_format() -> String {
    "markdown".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.atscheck.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.url {
            self.service.base_url = url.clone();
        }

        if let Some(timeout) = args.timeout_ms {
            self.service.timeout_ms = timeout;
        }

        if let Some(format) = args.format {
            self.report.format = format.as_str().to_string();
        }

        if args.expand_all {
            self.report.expand_all = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.timeout_ms, 120_000);
        assert_eq!(config.service.field_name, "file");
        assert_eq!(config.upload.max_bytes, 10_485_760);
        assert_eq!(config.upload.accepted_mime, "application/pdf");
        assert_eq!(config.progress.step_period(), Duration::from_millis(4000));
    }

    #[test]
    fn test_analyze_url_join() {
        let mut service = ServiceConfig::default();
        assert_eq!(service.analyze_url(), "http://localhost:8000/api/analyze");

        service.base_url = "https://ats.example.com/".to_string();
        assert_eq!(service.health_url(), "https://ats.example.com/api/health");
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[service]
base_url = "https://ats.example.com"
timeout_ms = 30000

[upload]
max_bytes = 2048

[report]
format = "json"
expand_all = true
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.service.base_url, "https://ats.example.com");
        assert_eq!(config.service.timeout_ms, 30000);
        assert_eq!(config.service.analyze_path, "/api/analyze");
        assert_eq!(config.upload.max_bytes, 2048);
        assert_eq!(config.upload.accepted_mime, "application/pdf");
        assert_eq!(config.report.format, "json");
        assert!(config.report.expand_all);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[progress]\nstep_period_ms = 250\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.progress.step_period_ms, 250);

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[progress\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[service]"));
        assert!(toml_str.contains("[upload]"));
        assert!(toml_str.contains("[progress]"));
        assert!(toml_str.contains("[report]"));
    }
}
