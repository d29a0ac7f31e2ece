//! Category score aggregation.
//!
//! Turns check outcomes grouped by category into severity-weighted category
//! scores, redistributing the weight of categories that had no applicable
//! checks so the effective weights always total 100%.

use crate::error::AnalysisError;
use crate::models::{Category, CheckOutcome, CheckStatus};
use std::collections::BTreeMap;

/// Configured weight (percent) per category.
#[derive(Debug, Clone)]
pub struct CategoryWeights(BTreeMap<Category, f64>);

impl CategoryWeights {
    pub fn new(weights: BTreeMap<Category, f64>) -> Self {
        Self(weights)
    }

    pub fn get(&self, category: Category) -> f64 {
        self.0.get(&category).copied().unwrap_or(0.0)
    }

    /// Sum of all configured weights. Expected to be 100, but any positive
    /// total works since redistribution normalizes proportionally.
    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self(
            [
                (Category::ContentStructure, 20.0),
                (Category::ContentClarity, 25.0),
                (Category::TechnicalAccessibility, 20.0),
                (Category::MetadataSchema, 15.0),
                (Category::AiSignals, 20.0),
            ]
            .into_iter()
            .collect(),
        )
    }
}

/// Aggregated score of one category that had at least one applicable check.
#[derive(Debug, Clone)]
pub struct CategoryAggregate {
    pub category: Category,
    /// Unrounded 0-100 score.
    pub score: f64,
    /// Weight (percent) after redistribution.
    pub effective_weight: f64,
    /// Checks with a status other than `na`.
    pub applicable: usize,
    /// Checks with status `pass`.
    pub passed: usize,
}

/// Aggregate check results into weighted category scores.
///
/// Categories with zero applicable checks are excluded from the result and
/// their configured weight is redistributed proportionally across the rest.
/// Unknown category keys are reported as a validation error.
pub fn aggregate_categories(
    check_results: &BTreeMap<String, Vec<CheckOutcome>>,
    weights: &CategoryWeights,
) -> Result<Vec<CategoryAggregate>, AnalysisError> {
    let mut raw = Vec::new();

    for (key, outcomes) in check_results {
        let category = Category::parse(key)
            .ok_or_else(|| AnalysisError::Validation(format!("unknown category key: {key}")))?;

        let mut weighted_pass = 0.0;
        let mut weighted_applicable = 0.0;
        let mut applicable = 0;
        let mut passed = 0;

        for outcome in outcomes {
            if !outcome.is_applicable() {
                continue;
            }
            applicable += 1;
            weighted_applicable += outcome.severity.weight();
            if outcome.status == CheckStatus::Pass {
                passed += 1;
                weighted_pass += outcome.severity.weight();
            }
        }

        if applicable == 0 {
            // Excluded entirely; its weight is redistributed below.
            continue;
        }

        raw.push(CategoryAggregate {
            category,
            score: weighted_pass / weighted_applicable * 100.0,
            effective_weight: 0.0,
            applicable,
            passed,
        });
    }

    let included_weight: f64 = raw.iter().map(|a| weights.get(a.category)).sum();
    if included_weight <= 0.0 {
        return Ok(Vec::new());
    }

    for agg in &mut raw {
        agg.effective_weight = weights.get(agg.category) / included_weight * 100.0;
    }

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Severity;

    fn outcome(id: &str, status: CheckStatus, severity: Severity) -> CheckOutcome {
        CheckOutcome {
            id: id.to_string(),
            status,
            severity,
            message: "test".to_string(),
        }
    }

    fn results_for(entries: &[(&str, Vec<CheckOutcome>)]) -> BTreeMap<String, Vec<CheckOutcome>> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_all_pass_scores_100() {
        let results = results_for(&[(
            "contentClarity",
            vec![
                outcome("a", CheckStatus::Pass, Severity::High),
                outcome("b", CheckStatus::Pass, Severity::Low),
            ],
        )]);

        let aggs = aggregate_categories(&results, &CategoryWeights::default()).unwrap();
        assert_eq!(aggs.len(), 1);
        assert_eq!(aggs[0].score, 100.0);
        assert_eq!(aggs[0].effective_weight, 100.0);
    }

    #[test]
    fn test_na_excluded_from_both_sides() {
        let results = results_for(&[(
            "contentStructure",
            vec![
                outcome("a", CheckStatus::Pass, Severity::Low),
                outcome("b", CheckStatus::Fail, Severity::Low),
                outcome("c", CheckStatus::Na, Severity::Critical),
            ],
        )]);

        let aggs = aggregate_categories(&results, &CategoryWeights::default()).unwrap();
        // The critical na check must not drag the score down.
        assert_eq!(aggs[0].score, 50.0);
        assert_eq!(aggs[0].applicable, 2);
    }

    #[test]
    fn test_warning_is_applicable_without_credit() {
        let results = results_for(&[(
            "aiSignals",
            vec![
                outcome("a", CheckStatus::Pass, Severity::Low),
                outcome("b", CheckStatus::Warning, Severity::Low),
            ],
        )]);

        let aggs = aggregate_categories(&results, &CategoryWeights::default()).unwrap();
        assert_eq!(aggs[0].score, 50.0);
    }

    #[test]
    fn test_severity_weighting() {
        // One critical fail outweighs one low pass: 1.0 / (1.0 + 3.0).
        let results = results_for(&[(
            "technicalAccessibility",
            vec![
                outcome("a", CheckStatus::Pass, Severity::Low),
                outcome("b", CheckStatus::Fail, Severity::Critical),
            ],
        )]);

        let aggs = aggregate_categories(&results, &CategoryWeights::default()).unwrap();
        assert_eq!(aggs[0].score, 25.0);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let results = results_for(&[(
            "seoBasics",
            vec![outcome("a", CheckStatus::Pass, Severity::Low)],
        )]);

        let err = aggregate_categories(&results, &CategoryWeights::default()).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("seoBasics"));
    }

    #[test]
    fn test_weight_redistribution_totals_100() {
        // metadataSchema has only na checks, so its 15% is spread over the rest.
        let results = results_for(&[
            (
                "contentStructure",
                vec![outcome("a", CheckStatus::Pass, Severity::Low)],
            ),
            (
                "contentClarity",
                vec![outcome("b", CheckStatus::Pass, Severity::Low)],
            ),
            (
                "metadataSchema",
                vec![outcome("c", CheckStatus::Na, Severity::Low)],
            ),
        ]);

        let aggs = aggregate_categories(&results, &CategoryWeights::default()).unwrap();
        assert_eq!(aggs.len(), 2);

        let total: f64 = aggs.iter().map(|a| a.effective_weight).sum();
        assert!((total - 100.0).abs() < 1e-9);

        // Proportionality: clarity keeps 25/45 of the pot, structure 20/45.
        let clarity = aggs
            .iter()
            .find(|a| a.category == Category::ContentClarity)
            .unwrap();
        assert!((clarity.effective_weight - 25.0 / 45.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_applicable_checks_anywhere() {
        let results = results_for(&[(
            "contentStructure",
            vec![outcome("a", CheckStatus::Na, Severity::Low)],
        )]);

        let aggs = aggregate_categories(&results, &CategoryWeights::default()).unwrap();
        assert!(aggs.is_empty());
    }
}
