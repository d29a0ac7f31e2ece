//! Historical score benchmarking.
//!
//! Computes a user's average, recent trend, and percentile rank from their
//! score history. The history is read before the current analysis commits,
//! so an in-flight run never benchmarks against its own score.

use crate::models::ScoreHistoryEntry;

/// Minimum history entries before benchmarking activates.
pub const MIN_HISTORY_ENTRIES: usize = 5;

/// Window of most recent entries used for the trend.
const TREND_WINDOW: usize = 10;

/// Benchmark results over a user's score history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkReport {
    /// Rounded mean of all historical scores.
    pub average: u8,
    /// Last minus first score of the most-recent-10 slice.
    pub trend: i32,
    /// Percent of historical scores strictly below the average. Ties are
    /// not counted as below.
    pub percentile: u8,
    /// Number of history entries considered.
    pub sample_size: usize,
}

/// Benchmark a score history, oldest entries first.
///
/// Returns `None` until the user has at least five historical scores.
pub fn benchmark(history: &[ScoreHistoryEntry]) -> Option<BenchmarkReport> {
    if history.len() < MIN_HISTORY_ENTRIES {
        return None;
    }

    let total = history.len();
    let sum: u32 = history.iter().map(|e| e.overall_score as u32).sum();
    let average = (sum as f64 / total as f64).round() as u8;

    let window = &history[total.saturating_sub(TREND_WINDOW)..];
    let trend = if window.len() < 2 {
        0
    } else {
        window[window.len() - 1].overall_score as i32 - window[0].overall_score as i32
    };

    let below = history
        .iter()
        .filter(|e| e.overall_score < average)
        .count();
    let percentile = (below as f64 / total as f64 * 100.0).round() as u8;

    Some(BenchmarkReport {
        average,
        trend,
        percentile,
        sample_size: total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn history_of(scores: &[u8]) -> Vec<ScoreHistoryEntry> {
        let start = Utc::now() - Duration::days(scores.len() as i64);
        scores
            .iter()
            .enumerate()
            .map(|(i, &score)| ScoreHistoryEntry {
                overall_score: score,
                analyzed_at: start + Duration::days(i as i64),
            })
            .collect()
    }

    #[test]
    fn test_unavailable_below_five_entries() {
        assert!(benchmark(&history_of(&[])).is_none());
        assert!(benchmark(&history_of(&[70, 72, 74, 76])).is_none());
        assert!(benchmark(&history_of(&[70, 72, 74, 76, 78])).is_some());
    }

    #[test]
    fn test_seven_entry_series() {
        let report = benchmark(&history_of(&[60, 62, 65, 70, 75, 75, 80])).unwrap();

        // Mean 69.57 rounds to 70; trend over the whole 7-entry window.
        assert_eq!(report.average, 70);
        assert_eq!(report.trend, 20);
        // Strictly below 70: 60, 62, 65. The tie at 70 is excluded.
        assert_eq!(report.percentile, 43);
        assert_eq!(report.sample_size, 7);
    }

    #[test]
    fn test_ties_not_counted_as_below() {
        // Average is exactly 70; the three ties contribute nothing.
        let report = benchmark(&history_of(&[70, 70, 70, 60, 80])).unwrap();
        assert_eq!(report.average, 70);
        assert_eq!(report.percentile, 20);
    }

    #[test]
    fn test_trend_uses_most_recent_ten() {
        // Twelve entries; the first two (10, 20) fall outside the window.
        let report =
            benchmark(&history_of(&[10, 20, 50, 52, 54, 56, 58, 60, 62, 64, 66, 90])).unwrap();
        assert_eq!(report.trend, 90 - 50);
    }

    #[test]
    fn test_flat_history() {
        let report = benchmark(&history_of(&[75, 75, 75, 75, 75])).unwrap();
        assert_eq!(report.average, 75);
        assert_eq!(report.trend, 0);
        assert_eq!(report.percentile, 0);
    }

    #[test]
    fn test_declining_trend_is_negative() {
        let report = benchmark(&history_of(&[90, 85, 80, 75, 70])).unwrap();
        assert_eq!(report.trend, -20);
    }
}
