//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// atscheck - check how a resume performs against ATS screening
///
/// Uploads a PDF resume to an analysis service and prints the scored
/// report: overall score, category breakdown and improvement suggestions.
///
/// Examples:
///   atscheck resume.pdf
///   atscheck resume.pdf --expand keywords,skills
///   atscheck resume.pdf --format json --output report.json
///   atscheck --url https://ats.example.com --health
///   atscheck --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Resume file to analyze (exactly one)
    #[arg(
        value_name = "FILE",
        required_unless_present_any = ["init_config", "health"]
    )]
    pub files: Vec<PathBuf>,

    /// Base URL of the analysis service
    ///
    /// Can also be set via ATSCHECK_URL env var or .atscheck.toml config.
    #[arg(long, value_name = "URL", env = "ATSCHECK_URL")]
    pub url: Option<String>,

    /// Request timeout in milliseconds
    ///
    /// Default: from config or 120000 (2 min).
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Categories whose details should be expanded (comma-separated)
    ///
    /// Example: --expand formatting,keywords
    #[arg(long, value_name = "KEYS", value_delimiter = ',')]
    pub expand: Option<Vec<String>>,

    /// Expand the details of every category
    #[arg(long)]
    pub expand_all: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .atscheck.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Query the service health endpoint and exit
    #[arg(long)]
    pub health: bool,

    /// Generate a default .atscheck.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Json => "json",
        }
    }

    /// Parse a format name from config, falling back to Markdown.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Markdown,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Service URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout) = self.timeout_ms {
            if timeout == 0 {
                return Err("Timeout must be at least 1 millisecond".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Category keys requested via --expand, trimmed and without blanks.
    pub fn expand_keys(&self) -> Vec<String> {
        self.expand
            .as_deref()
            .unwrap_or_default()
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }
}
