//! Overall score, grade bands, and confidence.
//!
//! The overall score is the weighted sum of category scores. The grade is
//! looked up from a fixed, contiguous band table covering 0-100. Confidence
//! combines check coverage with the dispersion of category scores.

use crate::models::ScoreConfidence;
use crate::scoring::aggregator::CategoryAggregate;

/// One row of the grade lookup table.
#[derive(Debug, Clone, Copy)]
pub struct GradeBand {
    pub min: u8,
    pub max: u8,
    pub grade: &'static str,
    pub color: &'static str,
    pub label: &'static str,
    pub summary: &'static str,
}

/// Fixed grade table. Bands are contiguous and cover 0-100 with no gaps.
pub const GRADE_BANDS: [GradeBand; 5] = [
    GradeBand {
        min: 90,
        max: 100,
        grade: "A",
        color: "green",
        label: "Excellent",
        summary: "This page is highly readable and clearly visible to AI systems.",
    },
    GradeBand {
        min: 80,
        max: 89,
        grade: "B",
        color: "lime",
        label: "Good",
        summary: "This page reads well; a few targeted fixes would make it excellent.",
    },
    GradeBand {
        min: 70,
        max: 79,
        grade: "C",
        color: "yellow",
        label: "Fair",
        summary: "This page is serviceable but leaves readability and visibility on the table.",
    },
    GradeBand {
        min: 60,
        max: 69,
        grade: "D",
        color: "orange",
        label: "Needs work",
        summary: "Significant readability or visibility problems are holding this page back.",
    },
    GradeBand {
        min: 0,
        max: 59,
        grade: "F",
        color: "red",
        label: "Poor",
        summary: "This page is hard to read and largely invisible to AI systems.",
    },
];

/// Look up the grade band for a 0-100 score.
pub fn grade_for(score: u8) -> &'static GradeBand {
    GRADE_BANDS
        .iter()
        .find(|band| score >= band.min && score <= band.max)
        // The table covers 0-100 and scores are clamped, so this is total.
        .unwrap_or(&GRADE_BANDS[GRADE_BANDS.len() - 1])
}

/// Weighted overall score, rounded to an integer.
pub fn overall_score(aggregates: &[CategoryAggregate]) -> u8 {
    if aggregates.is_empty() {
        return 0;
    }

    let weighted: f64 = aggregates
        .iter()
        .map(|a| a.score * a.effective_weight / 100.0)
        .sum();

    weighted.round().clamp(0.0, 100.0) as u8
}

/// Dispersion penalty cap. Category score spreads beyond this add nothing
/// more to the uncertainty.
const MAX_DISPERSION_PENALTY: f64 = 40.0;

/// Confidence band around the overall score.
///
/// Coverage is applicable checks over total possible checks across all
/// categories; dispersion is the population standard deviation of the
/// contributing category scores. High coverage and low dispersion raise
/// confidence and narrow the range. Zero coverage in a category lowers
/// confidence (through the coverage ratio) but never blocks scoring.
pub fn confidence_band(
    score: u8,
    aggregates: &[CategoryAggregate],
    total_possible_checks: usize,
) -> ScoreConfidence {
    let applicable: usize = aggregates.iter().map(|a| a.applicable).sum();
    let possible = total_possible_checks.max(applicable);

    let coverage = if possible == 0 {
        0.0
    } else {
        applicable as f64 / possible as f64
    };

    let dispersion = std_deviation(aggregates);
    let penalty = dispersion.min(MAX_DISPERSION_PENALTY);

    let confidence = (coverage * (100.0 - penalty)).round().clamp(0.0, 100.0) as u8;

    let half_width = ((100 - confidence as i32) as f64 / 4.0).round() as u8;
    let low = score.saturating_sub(half_width);
    let high = (score + half_width.min(100 - score.min(100))).min(100);

    let label = if confidence >= 80 {
        "High"
    } else if confidence >= 55 {
        "Moderate"
    } else {
        "Low"
    };

    ScoreConfidence {
        score,
        confidence,
        range: [low, high],
        label: label.to_string(),
    }
}

/// Population standard deviation of category scores.
fn std_deviation(aggregates: &[CategoryAggregate]) -> f64 {
    if aggregates.len() < 2 {
        return 0.0;
    }

    let n = aggregates.len() as f64;
    let mean = aggregates.iter().map(|a| a.score).sum::<f64>() / n;
    let variance = aggregates
        .iter()
        .map(|a| (a.score - mean).powi(2))
        .sum::<f64>()
        / n;

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn aggregate(category: Category, score: f64, weight: f64) -> CategoryAggregate {
        CategoryAggregate {
            category,
            score,
            effective_weight: weight,
            applicable: 4,
            passed: 2,
        }
    }

    fn five_categories(scores: [f64; 5], weights: [f64; 5]) -> Vec<CategoryAggregate> {
        Category::ALL
            .iter()
            .zip(scores.iter().zip(weights.iter()))
            .map(|(&c, (&s, &w))| aggregate(c, s, w))
            .collect()
    }

    #[test]
    fn test_weighted_overall_scenario() {
        // {80,70,75,65,80} at {20,25,20,15,20} -> 74.25 -> 74.
        let aggs = five_categories(
            [80.0, 70.0, 75.0, 65.0, 80.0],
            [20.0, 25.0, 20.0, 15.0, 20.0],
        );
        assert_eq!(overall_score(&aggs), 74);

        let band = grade_for(74);
        assert_eq!(band.grade, "C");
        assert_eq!(band.label, "Fair");
    }

    #[test]
    fn test_bands_contiguous_cover_0_to_100() {
        for score in 0..=100u8 {
            let band = grade_for(score);
            assert!(score >= band.min && score <= band.max, "gap at {score}");
        }
        // Adjacent bands must not overlap.
        for pair in GRADE_BANDS.windows(2) {
            assert_eq!(pair[0].min, pair[1].max + 1);
        }
    }

    #[test]
    fn test_monotonicity() {
        let weights = [20.0, 25.0, 20.0, 15.0, 20.0];
        let base = five_categories([80.0, 70.0, 75.0, 65.0, 80.0], weights);
        let baseline = overall_score(&base);

        // Raising any single category never decreases the overall score.
        for i in 0..5 {
            let mut scores: [f64; 5] = [80.0, 70.0, 75.0, 65.0, 80.0];
            scores[i] = (scores[i] + 15.0).min(100.0);
            let raised = five_categories(scores, weights);
            assert!(overall_score(&raised) >= baseline);
        }
    }

    #[test]
    fn test_empty_aggregates_score_zero() {
        assert_eq!(overall_score(&[]), 0);
    }

    #[test]
    fn test_confidence_full_coverage_no_dispersion() {
        let aggs = five_categories(
            [80.0, 80.0, 80.0, 80.0, 80.0],
            [20.0, 20.0, 20.0, 20.0, 20.0],
        );
        let band = confidence_band(80, &aggs, 20);

        assert_eq!(band.confidence, 100);
        assert_eq!(band.range, [80, 80]);
        assert_eq!(band.label, "High");
    }

    #[test]
    fn test_confidence_drops_with_dispersion() {
        let tight = five_categories(
            [78.0, 80.0, 79.0, 81.0, 80.0],
            [20.0, 20.0, 20.0, 20.0, 20.0],
        );
        let spread = five_categories(
            [20.0, 95.0, 40.0, 90.0, 60.0],
            [20.0, 20.0, 20.0, 20.0, 20.0],
        );

        let tight_band = confidence_band(80, &tight, 20);
        let spread_band = confidence_band(60, &spread, 20);

        assert!(tight_band.confidence > spread_band.confidence);
        let tight_width = tight_band.range[1] - tight_band.range[0];
        let spread_width = spread_band.range[1] - spread_band.range[0];
        assert!(spread_width > tight_width);
    }

    #[test]
    fn test_confidence_drops_with_partial_coverage() {
        let aggs = five_categories(
            [80.0, 80.0, 80.0, 80.0, 80.0],
            [20.0, 20.0, 20.0, 20.0, 20.0],
        );
        // 20 applicable out of 40 possible: half coverage.
        let band = confidence_band(80, &aggs, 40);
        assert_eq!(band.confidence, 50);
        assert_eq!(band.label, "Low");
    }

    #[test]
    fn test_range_stays_in_bounds() {
        let aggs = five_categories(
            [5.0, 95.0, 10.0, 90.0, 50.0],
            [20.0, 20.0, 20.0, 20.0, 20.0],
        );
        let low = confidence_band(2, &aggs, 100);
        assert!(low.range[0] <= 2);

        let high = confidence_band(99, &aggs, 100);
        assert!(high.range[1] <= 100);
        assert!(high.range[0] <= 99);
    }
}
