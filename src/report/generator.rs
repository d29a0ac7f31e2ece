//! Markdown report generation.
//!
//! This module renders a completed analysis document as a Markdown report
//! for the terminal/file output path. The portal UI renders the same
//! document itself; this output is for CLI users and CI logs.

use crate::benchmark::BenchmarkReport;
use crate::consensus::word_diff;
use crate::models::{AnalysisDocument, CheckStatus, IssueSummary};
use anyhow::Result;

/// Most differing words listed per side of the extraction diff.
const DIFF_WORD_LIMIT: usize = 12;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(
    document: &AnalysisDocument,
    benchmark: Option<&BenchmarkReport>,
    overflow: bool,
) -> String {
    let mut output = String::new();

    output.push_str("# ReadScore Report\n\n");

    output.push_str(&generate_metadata_section(document));
    output.push_str(&generate_score_section(document));
    output.push_str(&generate_category_section(document));
    output.push_str(&generate_consensus_section(document));
    output.push_str(&generate_diff_section(document));

    if let Some(benchmark) = benchmark {
        output.push_str(&generate_benchmark_section(benchmark));
    }

    output.push_str(&generate_issues_section(document));

    if overflow {
        output.push_str(&generate_truncation_notice());
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(document: &AnalysisDocument) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    if let Some(ref url) = document.source_url {
        section.push_str(&format!("- **Page:** {}\n", url));
    }
    if !document.page_title.is_empty() {
        section.push_str(&format!("- **Title:** {}\n", document.page_title));
    }
    section.push_str(&format!(
        "- **Analyzed:** {}\n",
        document.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Input:** {}\n", document.input_method));
    section.push_str(&format!("- **Language:** {}\n", document.language));
    section.push_str(&format!("- **Words:** {}\n", document.word_count));
    section.push_str(&format!(
        "- **Scoring:** v{} (prompts v{})\n",
        document.scoring_version, document.prompt_version
    ));
    section.push('\n');

    section
}

/// Generate the overall score banner.
fn generate_score_section(document: &AnalysisDocument) -> String {
    let mut section = String::new();

    section.push_str("## Score\n\n");
    section.push_str(&format!(
        "**{} / 100 — Grade {} ({})**\n\n",
        document.overall_score, document.grade, document.grade_label
    ));
    section.push_str(&format!("{}\n\n", document.grade_summary));

    let confidence = &document.score_confidence;
    section.push_str(&format!(
        "Confidence: {}% ({}) — likely range {}-{}\n\n",
        confidence.confidence, confidence.label, confidence.range[0], confidence.range[1]
    ));

    section
}

/// Generate the category score table.
fn generate_category_section(document: &AnalysisDocument) -> String {
    if document.category_scores.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Categories\n\n");
    section.push_str("| Category | Score | Weight |\n");
    section.push_str("|:---|:---:|:---:|\n");

    for score in document.category_scores.values() {
        section.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            score.label, score.score, score.weight
        ));
    }
    section.push('\n');

    section
}

/// Generate the extraction consensus section.
fn generate_consensus_section(document: &AnalysisDocument) -> String {
    let consensus = &document.llm_consensus;
    if !consensus.available {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Extraction Consensus\n\n");
    section.push_str(&format!(
        "Overall agreement between {} extraction views: **{}%**\n\n",
        document.llm_extractions.len().max(2),
        consensus.overall
    ));

    if !consensus.fields.is_empty() {
        section.push_str("| Field | Agreement |\n");
        section.push_str("|:---|:---:|\n");
        for (field, agreement) in &consensus.fields {
            section.push_str(&format!("| {} | {}% |\n", field, agreement));
        }
        section.push('\n');
    }

    section
}

/// Generate the word-level diff between the two most divergent views.
fn generate_diff_section(document: &AnalysisDocument) -> String {
    if document.llm_extractions.len() < 2 || !document.llm_consensus.available {
        return String::new();
    }

    let sources: Vec<(&String, &crate::models::Extraction)> =
        document.llm_extractions.iter().collect();

    let mut worst: Option<(usize, usize, u8)> = None;
    for i in 0..sources.len() {
        for j in (i + 1)..sources.len() {
            let overlap = word_diff(&sources[i].1.main_content, &sources[j].1.main_content).overlap;
            if worst.map_or(true, |(_, _, w)| overlap < w) {
                worst = Some((i, j, overlap));
            }
        }
    }

    let Some((i, j, overlap)) = worst else {
        return String::new();
    };
    if overlap == 100 {
        return String::new();
    }

    let diff = word_diff(&sources[i].1.main_content, &sources[j].1.main_content);
    let mut section = String::new();

    section.push_str("## Extraction Diff\n\n");
    section.push_str(&format!(
        "Largest disagreement: `{}` vs `{}` ({}% overlap, {} shared words)\n\n",
        sources[i].0,
        sources[j].0,
        diff.overlap,
        diff.shared.len()
    ));

    if !diff.removed.is_empty() {
        section.push_str(&format!(
            "- Only in `{}`: {}\n",
            sources[i].0,
            preview_words(&diff.removed)
        ));
    }
    if !diff.additions.is_empty() {
        section.push_str(&format!(
            "- Only in `{}`: {}\n",
            sources[j].0,
            preview_words(&diff.additions)
        ));
    }
    section.push('\n');

    section
}

fn preview_words(words: &[String]) -> String {
    let shown: Vec<&str> = words
        .iter()
        .take(DIFF_WORD_LIMIT)
        .map(|w| w.as_str())
        .collect();
    if words.len() > DIFF_WORD_LIMIT {
        format!("{} … ({} more)", shown.join(", "), words.len() - DIFF_WORD_LIMIT)
    } else {
        shown.join(", ")
    }
}

/// Generate the benchmark section.
fn generate_benchmark_section(benchmark: &BenchmarkReport) -> String {
    let mut section = String::new();

    let trend = if benchmark.trend > 0 {
        format!("+{}", benchmark.trend)
    } else {
        benchmark.trend.to_string()
    };

    section.push_str("## Benchmark\n\n");
    section.push_str(&format!(
        "- **Average:** {} over {} analyses\n",
        benchmark.average, benchmark.sample_size
    ));
    section.push_str(&format!("- **Trend:** {} (recent analyses)\n", trend));
    section.push_str(&format!(
        "- **Percentile:** better than {}% of past scores\n",
        benchmark.percentile
    ));
    section.push('\n');

    section
}

/// Generate the issue breakdown grouped by category.
fn generate_issues_section(document: &AnalysisDocument) -> String {
    let mut section = String::new();

    section.push_str("## Issues\n\n");
    section.push_str(&generate_summary_table(&document.issue_summary));

    let failing: Vec<_> = document
        .check_results
        .iter()
        .filter(|(_, outcomes)| {
            outcomes
                .iter()
                .any(|o| matches!(o.status, CheckStatus::Fail | CheckStatus::Warning))
        })
        .collect();

    if failing.is_empty() {
        section.push_str("All applicable checks passed.\n\n");
        return section;
    }

    for (category, outcomes) in failing {
        let label = document
            .category_scores
            .get(category)
            .map(|c| c.label.clone())
            .unwrap_or_else(|| category.clone());
        section.push_str(&format!("### {}\n\n", label));

        for outcome in outcomes {
            match outcome.status {
                CheckStatus::Fail => {
                    section.push_str(&format!(
                        "- {} **{}** `{}`: {}\n",
                        outcome.severity.emoji(),
                        outcome.severity,
                        outcome.id,
                        outcome.message
                    ));
                }
                CheckStatus::Warning => {
                    section.push_str(&format!("- ⚠️ **Warning** `{}`: {}\n", outcome.id, outcome.message));
                }
                _ => {}
            }
        }
        section.push('\n');
    }

    section
}

/// Generate the severity summary table.
fn generate_summary_table(summary: &IssueSummary) -> String {
    let mut table = String::new();

    table.push_str("| 🔴 Critical | 🟠 High | 🟡 Medium | 🟢 Low | ⚠️ Warnings | ✅ Passed | **Total** |\n");
    table.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    table.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} | **{}** |\n\n",
        summary.critical,
        summary.high,
        summary.medium,
        summary.low,
        summary.warning,
        summary.passed,
        summary.total
    ));

    table
}

/// Generate the data-truncation notice.
fn generate_truncation_notice() -> String {
    let mut section = String::new();

    section.push_str("## Note\n\n");
    section.push_str(
        "Some extraction text or check messages were shortened so the stored \
         document fits the storage size limit. Scores are unaffected.\n\n",
    );

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by ReadScore*\n");

    footer
}

/// Generate a JSON report: the document itself, pretty-printed.
pub fn generate_json_report(document: &AnalysisDocument) -> Result<String> {
    serde_json::to_string_pretty(document).map_err(Into::into)
}
