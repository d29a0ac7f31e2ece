//! Scoring modules.
//!
//! Category aggregation turns raw check outcomes into weighted category
//! scores; the overall scorer combines them into a single score, grade,
//! and confidence band.

pub mod aggregator;
pub mod overall;

pub use aggregator::{aggregate_categories, CategoryAggregate, CategoryWeights};
pub use overall::{confidence_band, grade_for, overall_score, GradeBand};
