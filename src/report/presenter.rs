//! Derivation of render-ready view models from a raw analysis report.
//!
//! Everything here is pure: optional report fields are resolved to their
//! defaults once, so renderers never need to re-check for absence.

use crate::models::{AnalysisReport, CategoryResult, Improvement};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Category used for improvements that do not name one.
pub const DEFAULT_IMPROVEMENT_CATEGORY: &str = "general";

/// Clamp a score into 0-100.
pub fn clamp_score(score: i64) -> u8 {
    score.clamp(0, 100) as u8
}

/// Visual tier of the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl ScoreBand {
    pub fn css_class(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "excellent-color",
            ScoreBand::Good => "good-color",
            ScoreBand::Fair => "fair-color",
            ScoreBand::Poor => "poor-color",
        }
    }

    /// Ring color used by the score gauge.
    pub fn color(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "#10b981",
            ScoreBand::Good => "#06b6d4",
            ScoreBand::Fair => "#f59e0b",
            ScoreBand::Poor => "#ef4444",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_class())
    }
}

/// Band for an overall score: 80+, 60+, 40+, below.
pub fn score_band(score: i64) -> ScoreBand {
    match clamp_score(score) {
        80..=100 => ScoreBand::Excellent,
        60..=79 => ScoreBand::Good,
        40..=59 => ScoreBand::Fair,
        _ => ScoreBand::Poor,
    }
}

/// ATS compatibility rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Compatibility {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Compatibility {
    /// Parse a rating. Only the exact lowercase names are recognised.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "excellent" => Some(Compatibility::Excellent),
            "good" => Some(Compatibility::Good),
            "fair" => Some(Compatibility::Fair),
            "poor" => Some(Compatibility::Poor),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Compatibility::Excellent => "excellent",
            Compatibility::Good => "good",
            Compatibility::Fair => "fair",
            Compatibility::Poor => "poor",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Compatibility::Excellent => "🏆",
            Compatibility::Good => "✅",
            Compatibility::Fair => "⚠️",
            Compatibility::Poor => "❌",
        }
    }
}

/// Compatibility badge: optional glyph plus text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityView {
    pub rating: Option<Compatibility>,
    pub glyph: Option<&'static str>,
    pub text: String,
}

pub fn compatibility_view(raw: Option<&str>) -> CompatibilityView {
    let rating = raw.and_then(Compatibility::parse);
    let text = match rating {
        Some(r) => format!("{} compatibility", r.as_str()),
        None => "N/A compatibility".to_string(),
    };

    CompatibilityView {
        rating,
        glyph: rating.map(|r| r.glyph()),
        text,
    }
}

/// Fill class of a category score bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarClass {
    High,
    Mid,
    Low,
}

impl BarClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            BarClass::High => "high",
            BarClass::Mid => "mid",
            BarClass::Low => "low",
        }
    }
}

/// Bar class for a category score: 70+, 45+, below.
pub fn bar_class(score: i64) -> BarClass {
    match clamp_score(score) {
        70..=100 => BarClass::High,
        45..=69 => BarClass::Mid,
        _ => BarClass::Low,
    }
}

/// Display label: the category's own label, else its key.
pub fn category_label(key: &str, category: &CategoryResult) -> String {
    category
        .label
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or(key)
        .to_string()
}

pub fn category_icon(key: &str) -> &'static str {
    match key {
        "formatting" => "📐",
        "keywords" => "🔑",
        "experience" => "💼",
        "skills" => "🛠️",
        _ => "📊",
    }
}

/// Per-category expanded/collapsed state.
///
/// Keys are created lazily on first toggle; an unknown key reads as
/// collapsed. Toggling one key never touches another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandState {
    expanded: HashMap<String, bool>,
}

impl ExpandState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the state of `key` and return the new value.
    pub fn toggle(&mut self, key: &str) -> bool {
        let entry = self.expanded.entry(key.to_string()).or_insert(false);
        *entry = !*entry;
        *entry
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expanded.get(key).copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

/// Priority of an improvement suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Parse a priority; missing or unrecognised values are `Medium`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|r| r.trim().to_lowercase()).as_deref() {
            Some("high") => Priority::High,
            Some("low") => Priority::Low,
            _ => Priority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Priority::High => "🔴",
            Priority::Medium => "🟡",
            Priority::Low => "🟢",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCardView {
    /// Score as reported.
    pub score: i64,
    /// Score clamped to 0-100, for the gauge.
    pub gauge: u8,
    pub band: ScoreBand,
    /// Gauge color for the band.
    pub color: &'static str,
    pub compatibility: CompatibilityView,
    pub estimated_pass_rate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryView {
    pub text: String,
    pub detected_field: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDetails {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub suggestions: Vec<String>,
}

impl CategoryDetails {
    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty() && self.weaknesses.is_empty() && self.suggestions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryView {
    pub key: String,
    pub label: String,
    pub icon: &'static str,
    pub score: i64,
    /// Bar fill width in percent.
    pub bar_width: u8,
    pub bar_class: BarClass,
    pub weight: Option<String>,
    pub expanded: bool,
    pub toggle_label: &'static str,
    /// Present only while the category is expanded.
    pub details: Option<CategoryDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuggestionView {
    pub category: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

/// Everything a renderer needs for one report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub score_card: ScoreCardView,
    pub summary: Option<SummaryView>,
    pub categories: Vec<CategoryView>,
    pub suggestions: Vec<SuggestionView>,
}

pub fn score_card(report: &AnalysisReport) -> ScoreCardView {
    ScoreCardView {
        score: report.overall_score,
        gauge: clamp_score(report.overall_score),
        band: score_band(report.overall_score),
        color: score_band(report.overall_score).color(),
        compatibility: compatibility_view(report.ats_compatibility.as_deref()),
        estimated_pass_rate: non_empty(report.estimated_pass_rate.as_deref()),
    }
}

pub fn summary(report: &AnalysisReport) -> Option<SummaryView> {
    non_empty(report.summary.as_deref()).map(|text| SummaryView {
        text,
        detected_field: non_empty(report.detected_field.as_deref()),
    })
}

pub fn category_view(key: &str, category: &CategoryResult, expand: &ExpandState) -> CategoryView {
    let expanded = expand.is_expanded(key);
    let details = expanded.then(|| CategoryDetails {
        strengths: category.strengths.clone().unwrap_or_default(),
        weaknesses: category.weaknesses.clone().unwrap_or_default(),
        suggestions: category.suggestions.clone().unwrap_or_default(),
    });

    CategoryView {
        key: key.to_string(),
        label: category_label(key, category),
        icon: category_icon(key),
        score: category.score,
        bar_width: clamp_score(category.score),
        bar_class: bar_class(category.score),
        weight: category.weight.as_ref().map(|w| w.to_string()),
        expanded,
        toggle_label: if expanded {
            "▲ Hide details"
        } else {
            "▼ Show details"
        },
        details,
    }
}

/// Category views in the order the service sent them; none when the map is absent.
pub fn categories(report: &AnalysisReport, expand: &ExpandState) -> Vec<CategoryView> {
    report
        .category_scores
        .iter()
        .flatten()
        .map(|(key, category)| category_view(key, category, expand))
        .collect()
}

pub fn suggestion_view(improvement: &Improvement) -> SuggestionView {
    SuggestionView {
        category: non_empty(improvement.category.as_deref())
            .unwrap_or_else(|| DEFAULT_IMPROVEMENT_CATEGORY.to_string()),
        title: improvement.title.clone().unwrap_or_default(),
        description: improvement.description.clone().unwrap_or_default(),
        priority: Priority::parse(improvement.priority.as_deref()),
    }
}

/// Suggestions in input order; no re-sorting by priority.
pub fn suggestions(report: &AnalysisReport) -> Vec<SuggestionView> {
    report
        .top_improvements
        .iter()
        .flatten()
        .map(suggestion_view)
        .collect()
}

/// Derive the full view model.
pub fn present(report: &AnalysisReport, expand: &ExpandState) -> ReportView {
    ReportView {
        score_card: score_card(report),
        summary: summary(report),
        categories: categories(report, expand),
        suggestions: suggestions(report),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Weight;
    use indexmap::IndexMap;

    fn category(score: i64) -> CategoryResult {
        CategoryResult {
            score,
            ..CategoryResult::default()
        }
    }

    #[test]
    fn test_score_band_thresholds() {
        assert_eq!(score_band(85), ScoreBand::Excellent);
        assert_eq!(score_band(80), ScoreBand::Excellent);
        assert_eq!(score_band(79), ScoreBand::Good);
        assert_eq!(score_band(60), ScoreBand::Good);
        assert_eq!(score_band(59), ScoreBand::Fair);
        assert_eq!(score_band(40), ScoreBand::Fair);
        assert_eq!(score_band(39), ScoreBand::Poor);
        assert_eq!(score_band(0), ScoreBand::Poor);
        assert_eq!(score_band(85).css_class(), "excellent-color");
    }

    #[test]
    fn test_score_band_partitions_range() {
        let order = [
            ScoreBand::Poor,
            ScoreBand::Fair,
            ScoreBand::Good,
            ScoreBand::Excellent,
        ];
        let rank = |b: ScoreBand| order.iter().position(|o| *o == b).unwrap();

        let mut previous = rank(score_band(0));
        let mut transitions = 0;
        for s in 1..=100 {
            let current = rank(score_band(s));
            assert!(current >= previous, "band decreased at {}", s);
            assert!(current - previous <= 1, "band skipped at {}", s);
            if current != previous {
                transitions += 1;
            }
            previous = current;
        }
        assert_eq!(transitions, 3);
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        assert_eq!(score_band(150), ScoreBand::Excellent);
        assert_eq!(score_band(-20), ScoreBand::Poor);
        assert_eq!(bar_class(-1), BarClass::Low);
        assert_eq!(bar_class(1000), BarClass::High);
        assert_eq!(clamp_score(250), 100);
    }

    #[test]
    fn test_compatibility_view() {
        let good = compatibility_view(Some("good"));
        assert_eq!(good.glyph, Some("✅"));
        assert_eq!(good.text, "good compatibility");

        let poor = compatibility_view(Some("poor"));
        assert_eq!(poor.glyph, Some("❌"));
        assert_eq!(poor.text, "poor compatibility");

        assert_eq!(compatibility_view(Some("excellent")).glyph, Some("🏆"));
        assert_eq!(compatibility_view(Some("fair")).glyph, Some("⚠️"));

        for raw in [None, Some("stellar"), Some(""), Some("Good"), Some(" poor ")] {
            let view = compatibility_view(raw);
            assert_eq!(view.rating, None);
            assert_eq!(view.glyph, None);
            assert_eq!(view.text, "N/A compatibility");
        }
    }

    #[test]
    fn test_bar_class() {
        assert_eq!(bar_class(72), BarClass::High);
        assert_eq!(bar_class(70), BarClass::High);
        assert_eq!(bar_class(50), BarClass::Mid);
        assert_eq!(bar_class(45), BarClass::Mid);
        assert_eq!(bar_class(44), BarClass::Low);
        assert_eq!(bar_class(30), BarClass::Low);
    }

    #[test]
    fn test_category_label_falls_back_to_key() {
        let mut cat = category(50);
        assert_eq!(category_label("keywords", &cat), "keywords");
        cat.label = Some("Keyword Optimization".to_string());
        assert_eq!(category_label("keywords", &cat), "Keyword Optimization");
    }

    #[test]
    fn test_expand_toggle_is_per_key() {
        let mut state = ExpandState::new();
        assert!(!state.is_expanded("skills"));

        assert!(state.toggle("keywords"));
        assert!(state.is_expanded("keywords"));
        assert!(!state.is_expanded("skills"));
        assert!(!state.is_expanded("formatting"));

        state.toggle("skills");
        assert!(!state.toggle("keywords"));
        assert!(state.is_expanded("skills"));
    }

    #[test]
    fn test_improvement_defaults() {
        let view = suggestion_view(&Improvement::default());
        assert_eq!(view.category, "general");
        assert_eq!(view.priority, Priority::Medium);
        assert_eq!(view.title, "");
        assert_eq!(view.description, "");

        let odd = suggestion_view(&Improvement {
            category: Some("  ".to_string()),
            priority: Some("urgent".to_string()),
            ..Improvement::default()
        });
        assert_eq!(odd.category, "general");
        assert_eq!(odd.priority, Priority::Medium);
    }

    #[test]
    fn test_suggestions_keep_input_order() {
        let report = AnalysisReport {
            top_improvements: Some(vec![
                Improvement {
                    title: Some("low first".to_string()),
                    priority: Some("low".to_string()),
                    ..Improvement::default()
                },
                Improvement {
                    title: Some("then high".to_string()),
                    priority: Some("high".to_string()),
                    ..Improvement::default()
                },
            ]),
            ..AnalysisReport::default()
        };

        let titles: Vec<String> = suggestions(&report).into_iter().map(|s| s.title).collect();
        assert_eq!(titles, vec!["low first", "then high"]);
    }

    #[test]
    fn test_missing_categories_render_nothing() {
        let report = AnalysisReport {
            overall_score: 85,
            ats_compatibility: Some("good".to_string()),
            summary: Some("Solid resume.".to_string()),
            ..AnalysisReport::default()
        };

        let view = present(&report, &ExpandState::new());
        assert!(view.categories.is_empty());
        assert!(view.suggestions.is_empty());
        assert_eq!(view.score_card.band, ScoreBand::Excellent);
        assert_eq!(view.score_card.compatibility.glyph, Some("✅"));
        assert_eq!(view.summary.unwrap().text, "Solid resume.");
    }

    #[test]
    fn test_category_views_follow_expand_state() {
        let mut scores = IndexMap::new();
        scores.insert(
            "keywords".to_string(),
            CategoryResult {
                label: Some("Keyword Optimization".to_string()),
                score: 72,
                weight: Some(Weight::Text("35%".to_string())),
                strengths: Some(vec!["Relevant terms".to_string()]),
                weaknesses: None,
                suggestions: Some(vec!["Add tooling names".to_string()]),
            },
        );
        scores.insert("custom".to_string(), category(30));
        let report = AnalysisReport {
            category_scores: Some(scores),
            ..AnalysisReport::default()
        };

        let mut expand = ExpandState::new();
        expand.toggle("keywords");
        let views = categories(&report, &expand);

        assert_eq!(views.len(), 2);
        let keywords = &views[0];
        assert_eq!(keywords.label, "Keyword Optimization");
        assert_eq!(keywords.icon, "🔑");
        assert_eq!(keywords.bar_class, BarClass::High);
        assert_eq!(keywords.weight.as_deref(), Some("35%"));
        assert_eq!(keywords.toggle_label, "▲ Hide details");
        let details = keywords.details.as_ref().unwrap();
        assert_eq!(details.strengths, vec!["Relevant terms"]);
        assert!(details.weaknesses.is_empty());

        let custom = &views[1];
        assert_eq!(custom.label, "custom");
        assert_eq!(custom.icon, "📊");
        assert_eq!(custom.bar_class, BarClass::Low);
        assert!(!custom.expanded);
        assert!(custom.details.is_none());
        assert_eq!(custom.weight, None);
    }

    #[test]
    fn test_summary_requires_text() {
        let report = AnalysisReport {
            detected_field: Some("Data Science".to_string()),
            ..AnalysisReport::default()
        };
        assert!(summary(&report).is_none());
        assert_eq!(score_card(&report).estimated_pass_rate, None);
    }
}
