//! Data models for the scoring engine.
//!
//! This module contains all the core data structures used throughout
//! the application: check outcomes, category scores, extraction views,
//! and the persisted analysis document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Severity level of a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Low severity - cosmetic or minor signals
    Low,
    /// Medium severity - meaningful readability or visibility impact
    Medium,
    /// High severity - strong impact on how the page is read or indexed
    High,
    /// Critical severity - the page is effectively invisible or unreadable
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
            Severity::Critical => write!(f, "Critical"),
        }
    }
}

impl Severity {
    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🟠",
            Severity::Critical => "🔴",
        }
    }

    /// Per-check weight used in category score numerators/denominators.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::Low => 1.0,
            Severity::Medium => 1.5,
            Severity::High => 2.0,
            Severity::Critical => 3.0,
        }
    }
}

/// Outcome status of a single check. Closed set; unknown statuses are
/// rejected at the deserialization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
    Na,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::Pass => write!(f, "pass"),
            CheckStatus::Fail => write!(f, "fail"),
            CheckStatus::Warning => write!(f, "warning"),
            CheckStatus::Na => write!(f, "na"),
        }
    }
}

/// One of the five fixed scoring dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "contentStructure")]
    ContentStructure,
    #[serde(rename = "contentClarity")]
    ContentClarity,
    #[serde(rename = "technicalAccessibility")]
    TechnicalAccessibility,
    #[serde(rename = "metadataSchema")]
    MetadataSchema,
    #[serde(rename = "aiSignals")]
    AiSignals,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ContentStructure,
        Category::ContentClarity,
        Category::TechnicalAccessibility,
        Category::MetadataSchema,
        Category::AiSignals,
    ];

    /// Stable key used in persisted maps.
    pub fn key(&self) -> &'static str {
        match self {
            Category::ContentStructure => "contentStructure",
            Category::ContentClarity => "contentClarity",
            Category::TechnicalAccessibility => "technicalAccessibility",
            Category::MetadataSchema => "metadataSchema",
            Category::AiSignals => "aiSignals",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::ContentStructure => "Content Structure",
            Category::ContentClarity => "Content Clarity",
            Category::TechnicalAccessibility => "Technical Accessibility",
            Category::MetadataSchema => "Metadata & Schema",
            Category::AiSignals => "AI-Specific Signals",
        }
    }

    /// Parse a persisted map key. Returns `None` for unknown keys so the
    /// caller can report them instead of dropping data silently.
    pub fn parse(key: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.key() == key)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Outcome of a single check within a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Stable check identifier (e.g. "heading-hierarchy").
    pub id: String,
    /// Pass/fail/warning/na status.
    pub status: CheckStatus,
    /// Severity of the check when it fails.
    pub severity: Severity,
    /// Explanation shown to the user. May be shortened by truncation.
    pub message: String,
}

impl CheckOutcome {
    /// A check is applicable unless its status is `na`.
    pub fn is_applicable(&self) -> bool {
        self.status != CheckStatus::Na
    }
}

/// Weighted score of one category after aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    /// 0-100 rounded score.
    pub score: u8,
    /// Display label for the category.
    pub label: String,
    /// Effective weight (percent) after redistribution.
    pub weight: f64,
}

/// Counts of check outcomes by severity and status.
///
/// `critical`/`high`/`medium`/`low` count failed checks by severity;
/// `warning`, `passed`, and `na` count statuses directly. `total` is the
/// sum of all other counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueSummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub warning: usize,
    pub passed: usize,
    pub na: usize,
    pub total: usize,
}

impl IssueSummary {
    /// Build a summary from check results grouped by category.
    pub fn from_check_results(results: &BTreeMap<String, Vec<CheckOutcome>>) -> Self {
        let mut summary = Self::default();

        for outcome in results.values().flatten() {
            match outcome.status {
                CheckStatus::Pass => summary.passed += 1,
                CheckStatus::Warning => summary.warning += 1,
                CheckStatus::Na => summary.na += 1,
                CheckStatus::Fail => match outcome.severity {
                    Severity::Critical => summary.critical += 1,
                    Severity::High => summary.high += 1,
                    Severity::Medium => summary.medium += 1,
                    Severity::Low => summary.low += 1,
                },
            }
        }

        summary.total = summary.critical
            + summary.high
            + summary.medium
            + summary.low
            + summary.warning
            + summary.passed
            + summary.na;

        summary
    }
}

/// Overall score with its confidence band.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreConfidence {
    /// The overall score this band is centered on.
    pub score: u8,
    /// 0-100 confidence derived from coverage and dispersion.
    pub confidence: u8,
    /// [low, high] band around the score.
    pub range: [u8; 2],
    /// "High" / "Moderate" / "Low".
    pub label: String,
}

/// One extraction view of the page, as a named source sees it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    #[serde(default)]
    pub main_content: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headings: Vec<String>,
    /// Set when the stored body was shortened to fit the size ceiling.
    #[serde(default)]
    pub truncated: bool,
}

/// Agreement between extraction sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusReport {
    /// Mean pairwise overlap of main content, 0-100.
    pub overall: u8,
    /// Per-field agreement percentages.
    pub fields: BTreeMap<String, u8>,
    /// False when fewer than two sources supplied views.
    pub available: bool,
}

impl ConsensusReport {
    /// Report for a run with fewer than two extraction sources.
    pub fn unavailable() -> Self {
        Self {
            overall: 0,
            fields: BTreeMap::new(),
            available: false,
        }
    }
}

/// How recently the page content appears to have changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentFreshness {
    /// "fresh" / "recent" / "aging" / "stale" / "unknown".
    pub freshness: String,
    /// 0-100 freshness score.
    pub score: u8,
}

impl Default for ContentFreshness {
    fn default() -> Self {
        Self {
            freshness: "unknown".to_string(),
            score: 0,
        }
    }
}

/// Detected page type (article, product, landing page, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTypeInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub label: String,
    /// 0-100 detection confidence.
    pub confidence: u8,
}

impl Default for PageTypeInfo {
    fn default() -> Self {
        Self {
            kind: "unknown".to_string(),
            label: "Unknown".to_string(),
            confidence: 0,
        }
    }
}

/// How the page content entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    Url,
    Html,
    Text,
}

impl fmt::Display for InputMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputMethod::Url => write!(f, "url"),
            InputMethod::Html => write!(f, "html"),
            InputMethod::Text => write!(f, "text"),
        }
    }
}

/// One historical score for a user. Append-only; owned by an external
/// store and never mutated by this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreHistoryEntry {
    pub overall_score: u8,
    pub analyzed_at: DateTime<Utc>,
}

/// Everything the external check runner and extraction providers supply
/// for one analysis run. Validated before the pipeline executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub source_url: Option<String>,
    /// Raw page content for `html`/`text` input methods.
    #[serde(default)]
    pub content: Option<String>,
    pub input_method: InputMethod,
    /// Owner of the analysis; keys the score history series.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub page_title: String,
    #[serde(default)]
    pub page_description: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    /// Page-type hint from the classifier, if one ran.
    #[serde(default)]
    pub page_type: Option<PageTypeInfo>,
    /// Check outcomes grouped by category key. Unknown keys are rejected.
    pub check_results: BTreeMap<String, Vec<CheckOutcome>>,
    /// Total checks each category could have run. Falls back to the
    /// observed outcome count when absent.
    #[serde(default)]
    pub total_possible_checks: BTreeMap<String, usize>,
    /// Named extraction views of the page.
    #[serde(default)]
    pub extractions: BTreeMap<String, Extraction>,
    /// Issue a share link at commit time.
    #[serde(default)]
    pub share: bool,
}

fn default_language() -> String {
    "en".to_string()
}

/// The persisted unit of record for one completed analysis.
///
/// Created exactly once at the end of a full pipeline run; immutable
/// afterwards except for share issuance/revocation and retention-driven
/// deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDocument {
    pub id: String,
    #[serde(default)]
    pub source_url: Option<String>,
    pub input_method: InputMethod,
    pub analyzed_at: DateTime<Utc>,
    pub scoring_version: String,
    pub prompt_version: String,

    pub page_title: String,
    pub page_description: String,
    pub language: String,
    pub word_count: usize,

    pub category_scores: BTreeMap<String, CategoryScore>,
    pub issue_summary: IssueSummary,
    pub check_results: BTreeMap<String, Vec<CheckOutcome>>,

    pub overall_score: u8,
    pub grade: String,
    pub grade_color: String,
    pub grade_label: String,
    pub grade_summary: String,
    pub score_confidence: ScoreConfidence,

    pub llm_extractions: BTreeMap<String, Extraction>,
    pub llm_consensus: ConsensusReport,

    pub content_freshness: ContentFreshness,
    pub page_type: PageTypeInfo,

    pub is_shared: bool,
    #[serde(default)]
    pub share_token: Option<String>,
    #[serde(default)]
    pub share_expiry: Option<DateTime<Utc>>,
}
