//! Markdown and JSON report generation.
//!
//! Renders the derived [`ReportView`] rather than the raw report, so every
//! default has already been resolved by the presenter.

use crate::models::UploadCandidate;
use crate::report::presenter::{
    CategoryDetails, CategoryView, ReportView, ScoreCardView, SuggestionView, SummaryView,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Context printed alongside the report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub file_name: String,
    pub file_size: String,
    pub generated_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

impl ReportMetadata {
    pub fn new(candidate: &UploadCandidate, duration_seconds: f64) -> Self {
        Self {
            file_name: candidate.name.clone(),
            file_size: candidate.display_size(),
            generated_at: Utc::now(),
            duration_seconds,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(view: &ReportView, metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Your ATS Analysis Results\n\n");
    output.push_str(&format!(
        "_Analyzed **{}** ({}) in {:.1}s_\n\n",
        metadata.file_name, metadata.file_size, metadata.duration_seconds
    ));

    if let Some(ref summary) = view.summary {
        output.push_str(&generate_summary_section(summary));
    }

    output.push_str(&generate_score_section(&view.score_card));
    output.push_str(&generate_breakdown_section(&view.categories));
    output.push_str(&generate_suggestions_section(&view.suggestions));

    // Footer
    output.push_str(&generate_footer(metadata));

    output
}

/// Generate a JSON report containing the view model and metadata.
pub fn generate_json_report(view: &ReportView, metadata: &ReportMetadata) -> Result<String> {
    #[derive(Serialize)]
    struct JsonReport<'a> {
        metadata: &'a ReportMetadata,
        report: &'a ReportView,
    }

    serde_json::to_string_pretty(&JsonReport {
        metadata,
        report: view,
    })
    .context("Failed to serialize report to JSON")
}

fn generate_summary_section(summary: &SummaryView) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!("> \"{}\"\n\n", summary.text));
    if let Some(ref field) = summary.detected_field {
        section.push_str(&format!("Detected field: **{}**\n\n", field));
    }

    section
}

fn generate_score_section(card: &ScoreCardView) -> String {
    let mut section = String::new();

    section.push_str("## Overall ATS Score\n\n");
    section.push_str(&format!(
        "**{}** / 100 `{}` {}\n\n",
        card.score,
        score_gauge(card.gauge, 20),
        card.band
    ));

    let badge = match card.compatibility.glyph {
        Some(glyph) => format!("{} {}", glyph, card.compatibility.text),
        None => card.compatibility.text.clone(),
    };
    section.push_str(&format!("- {}\n", badge));

    if let Some(ref pass_rate) = card.estimated_pass_rate {
        section.push_str(&format!("- Estimated ATS pass rate: **{}**\n", pass_rate));
    }
    section.push('\n');

    section
}

fn generate_breakdown_section(categories: &[CategoryView]) -> String {
    if categories.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Score Breakdown\n\n");
    section.push_str("| Category | Score | Bar | Weight |\n");
    section.push_str("|:---|:---:|:---|:---:|\n");
    for cat in categories {
        section.push_str(&format!(
            "| {} {} | {} | `{}` {} | {} |\n",
            cat.icon,
            cat.label,
            cat.score,
            score_gauge(cat.bar_width, 10),
            cat.bar_class.as_str(),
            cat.weight.as_deref().unwrap_or("-"),
        ));
    }
    section.push('\n');

    for cat in categories {
        section.push_str(&format!("### {} {}\n\n", cat.icon, cat.label));
        section.push_str(&format!("{} (`--expand {}`)\n\n", cat.toggle_label, cat.key));
        if let Some(ref details) = cat.details {
            section.push_str(&generate_details(details));
        }
    }

    section
}

fn generate_details(details: &CategoryDetails) -> String {
    if details.is_empty() {
        return "_No details provided._\n\n".to_string();
    }

    let mut block = String::new();
    for (heading, items) in [
        ("✅ Strengths", &details.strengths),
        ("⚠️ Weaknesses", &details.weaknesses),
        ("💡 Suggestions", &details.suggestions),
    ] {
        if items.is_empty() {
            continue;
        }
        block.push_str(&format!("**{}**\n\n", heading));
        for item in items {
            block.push_str(&format!("- {}\n", item));
        }
        block.push('\n');
    }

    block
}

fn generate_suggestions_section(suggestions: &[SuggestionView]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Improvement Suggestions\n\n");
    for (i, item) in suggestions.iter().enumerate() {
        section.push_str(&format!(
            "{}. {} `{}` **{}** _({} priority)_\n",
            i + 1,
            item.priority.emoji(),
            item.category,
            item.title,
            item.priority.as_str()
        ));
        if !item.description.is_empty() {
            section.push_str(&format!("   {}\n", item.description));
        }
    }
    section.push('\n');

    section
}

fn generate_footer(metadata: &ReportMetadata) -> String {
    format!(
        "---\n\n*Generated by atscheck v{} on {}*\n",
        env!("CARGO_PKG_VERSION"),
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Text gauge with `width` cells for a 0-100 value.
fn score_gauge(value: u8, width: usize) -> String {
    let filled = (usize::from(value.min(100)) * width + 50) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnalysisReport, CategoryResult, Improvement};
    use crate::report::presenter::{present, ExpandState};
    use indexmap::IndexMap;
    use std::path::PathBuf;

    fn metadata() -> ReportMetadata {
        ReportMetadata::new(
            &UploadCandidate {
                name: "resume.pdf".to_string(),
                byte_size: 2048,
                mime_type: "application/pdf".to_string(),
                path: PathBuf::from("resume.pdf"),
            },
            12.3,
        )
    }

    fn full_report() -> AnalysisReport {
        let mut scores = IndexMap::new();
        scores.insert(
            "formatting".to_string(),
            CategoryResult {
                label: Some("Formatting & Structure".to_string()),
                score: 50,
                strengths: Some(vec!["Clear headings".to_string()]),
                weaknesses: Some(vec!["Two-column layout".to_string()]),
                ..CategoryResult::default()
            },
        );
        AnalysisReport {
            overall_score: 64,
            ats_compatibility: Some("fair".to_string()),
            estimated_pass_rate: Some("55-65%".to_string()),
            summary: Some("Decent resume".to_string()),
            detected_field: Some("Software Engineering".to_string()),
            category_scores: Some(scores),
            top_improvements: Some(vec![Improvement::default()]),
        }
    }

    #[test]
    fn test_score_gauge() {
        assert_eq!(score_gauge(0, 10), "░░░░░░░░░░");
        assert_eq!(score_gauge(100, 10), "██████████");
        assert_eq!(score_gauge(50, 10), "█████░░░░░");
    }

    #[test]
    fn test_markdown_collapsed_report() {
        let view = present(&full_report(), &ExpandState::new());
        let md = generate_markdown_report(&view, &metadata());

        assert!(md.contains("# Your ATS Analysis Results"));
        assert!(md.contains("resume.pdf"));
        assert!(md.contains("2.0 KB"));
        assert!(md.contains("> \"Decent resume\""));
        assert!(md.contains("Detected field: **Software Engineering**"));
        assert!(md.contains("good-color"));
        assert!(md.contains("⚠️ fair compatibility"));
        assert!(md.contains("Estimated ATS pass rate: **55-65%**"));
        assert!(md.contains("📐 Formatting & Structure"));
        assert!(md.contains("▼ Show details"));
        assert!(!md.contains("Two-column layout"));
        assert!(md.contains("`general`"));
        assert!(md.contains("(medium priority)"));
    }

    #[test]
    fn test_markdown_expanded_category() {
        let mut expand = ExpandState::new();
        expand.toggle("formatting");
        let view = present(&full_report(), &expand);
        let md = generate_markdown_report(&view, &metadata());

        assert!(md.contains("▲ Hide details"));
        assert!(md.contains("**✅ Strengths**"));
        assert!(md.contains("- Two-column layout"));
        assert!(!md.contains("💡 Suggestions"));
    }

    #[test]
    fn test_markdown_sparse_report() {
        let report = AnalysisReport {
            overall_score: 30,
            ..AnalysisReport::default()
        };
        let view = present(&report, &ExpandState::new());
        let md = generate_markdown_report(&view, &metadata());

        assert!(md.contains("## Overall ATS Score"));
        assert!(md.contains("N/A compatibility"));
        assert!(!md.contains("## Summary"));
        assert!(!md.contains("## Score Breakdown"));
        assert!(!md.contains("## Improvement Suggestions"));
    }

    #[test]
    fn test_json_report() {
        let view = present(&full_report(), &ExpandState::new());
        let json = generate_json_report(&view, &metadata()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["metadata"]["file_name"], "resume.pdf");
        assert_eq!(value["report"]["score_card"]["band"], "good");
        assert_eq!(value["report"]["categories"][0]["bar_class"], "mid");
        assert_eq!(value["report"]["suggestions"][0]["priority"], "medium");
    }
}
