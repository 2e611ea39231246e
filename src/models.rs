//! Data models for the analysis client.
//!
//! This module contains the structures exchanged with the remote analysis
//! service: the held upload, the response envelope and the raw report.
//! Every report field the service may omit is modelled as an `Option` or a
//! defaulted collection so that decoding never fails on a sparse payload.
//! Report fields are also decoded one at a time: a field with an unexpected
//! JSON type degrades to its empty value instead of failing the report.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// A file selected for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCandidate {
    /// File name sent with the multipart part.
    pub name: String,
    /// Size of the file in bytes.
    pub byte_size: u64,
    /// MIME type the file is presented as.
    pub mime_type: String,
    /// Location of the file contents on disk.
    #[serde(skip)]
    pub path: PathBuf,
}

impl UploadCandidate {
    /// Human readable size (`B`, `KB` or `MB`).
    pub fn display_size(&self) -> String {
        format_file_size(self.byte_size)
    }
}

/// Format a byte count the way the upload panel shows it.
pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

/// Response envelope returned by `POST /api/analyze`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    /// Whether the service produced a report.
    #[serde(default, deserialize_with = "lenient_flag")]
    pub success: bool,
    /// The report, present on success.
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<AnalysisReport>,
    /// Human readable message, usually set on failure.
    #[serde(default, deserialize_with = "lenient_text")]
    pub message: Option<String>,
}

/// Error body attached to non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

/// Response from `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
}

/// The raw analysis report produced by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Overall score, nominally 0-100.
    #[serde(default, deserialize_with = "lenient_score")]
    pub overall_score: i64,
    /// Compatibility rating (`excellent`, `good`, `fair`, `poor`).
    #[serde(default, deserialize_with = "lenient_text")]
    pub ats_compatibility: Option<String>,
    /// Free-form pass rate estimate, e.g. `"65-75%"`.
    #[serde(default, deserialize_with = "lenient_text")]
    pub estimated_pass_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub detected_field: Option<String>,
    /// Per-category results in the order the service sent them.
    #[serde(default, deserialize_with = "lenient_categories")]
    pub category_scores: Option<IndexMap<String, CategoryResult>>,
    #[serde(default, deserialize_with = "lenient_improvements")]
    pub top_improvements: Option<Vec<Improvement>>,
}

/// Score and findings for a single category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    #[serde(default, deserialize_with = "lenient_text")]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub score: i64,
    #[serde(default, deserialize_with = "lenient")]
    pub weight: Option<Weight>,
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub strengths: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub weaknesses: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_text_list")]
    pub suggestions: Option<Vec<String>>,
}

/// Category weight, sent either as a number or as text such as `"20%"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Weight {
    Number(f64),
    Text(String),
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Number(n) => write!(f, "{}", n),
            Weight::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A single prioritized improvement suggestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    /// `high`, `medium` or `low`.
    #[serde(default, deserialize_with = "lenient_text")]
    pub priority: Option<String>,
}

/// Decode a value as `T`, or `None` when it has any other shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Accept a boolean; anything else reads as `false`.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_bool().unwrap_or(false))
}

/// Accept any JSON number, a numeric string or null for a score, rounding
/// fractions. Anything else reads as 0.
fn lenient_score<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(score_from_value(&value).unwrap_or(0))
}

fn score_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f.round() as i64),
        _ => None,
    }
}

/// Accept a string, or a number rendered as text.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(text_from_value(value))
}

fn text_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accept a list of strings, dropping entries that are not text.
fn lenient_text_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items.into_iter().filter_map(text_from_value).collect(),
        )),
        _ => Ok(None),
    }
}

/// Accept a category map, dropping entries that are not objects.
fn lenient_categories<'de, D>(
    deserializer: D,
) -> Result<Option<IndexMap<String, CategoryResult>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(entries) => Ok(Some(
            entries
                .into_iter()
                .filter(|(_, value)| value.is_object())
                .filter_map(|(key, value)| {
                    CategoryResult::deserialize(value).ok().map(|c| (key, c))
                })
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// Accept a list of improvements, dropping entries that are not objects.
fn lenient_improvements<'de, D>(deserializer: D) -> Result<Option<Vec<Improvement>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .filter(Value::is_object)
                .filter_map(|item| Improvement::deserialize(item).ok())
                .collect(),
        )),
        _ => Ok(None),
    }
}
