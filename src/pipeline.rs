//! The analysis pipeline.
//!
//! One pipeline instance executes one analysis as a sequential run with
//! private working state: validate, check the cache, aggregate categories,
//! score, compute consensus and benchmark, assemble the document, fit it
//! under the size ceiling, then commit in a single terminal step. The
//! cancellation token is checked between stages; cancelling before the
//! commit persists nothing. Cache lookups and the commit are the only I/O
//! boundaries, everything in between is pure computation.

use crate::benchmark::{benchmark, BenchmarkReport};
use crate::cache::{request_signature, AnalysisCache};
use crate::consensus::consensus;
use crate::error::AnalysisError;
use crate::models::{
    AnalysisDocument, AnalysisRequest, ContentFreshness, InputMethod, IssueSummary,
};
use crate::scoring::{aggregate_categories, confidence_band, grade_for, overall_score};
use crate::scoring::{CategoryAggregate, CategoryWeights};
use crate::share::ShareLinkManager;
use crate::storage::store::{DocumentStore, ScoreHistoryStore};
use crate::storage::{truncate_to_fit, DEFAULT_SIZE_CEILING};
use chrono::Utc;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub weights: CategoryWeights,
    pub scoring_version: String,
    pub prompt_version: String,
    pub size_ceiling: usize,
    pub share_days: i64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights: CategoryWeights::default(),
            scoring_version: "2.1.0".to_string(),
            prompt_version: "1.4.0".to_string(),
            size_ceiling: DEFAULT_SIZE_CEILING,
            share_days: 30,
        }
    }
}

/// Everything a completed run hands back to the caller.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub document: AnalysisDocument,
    /// True when the size guard discarded data.
    pub overflow: bool,
    /// Present once the user has enough history.
    pub benchmark: Option<BenchmarkReport>,
    /// True when the document was served from the cache.
    pub from_cache: bool,
}

/// Sequential analysis pipeline over a document store and a history store.
pub struct AnalysisPipeline<S, H> {
    config: PipelineConfig,
    store: S,
    history: H,
    cache: AnalysisCache,
    share: ShareLinkManager,
}

impl<S: DocumentStore, H: ScoreHistoryStore> AnalysisPipeline<S, H> {
    pub fn new(config: PipelineConfig, store: S, history: H, cache: AnalysisCache) -> Self {
        let share = ShareLinkManager::new(config.share_days);
        Self {
            config,
            store,
            history,
            cache,
            share,
        }
    }

    /// Run one analysis to completion.
    ///
    /// Cancellation is honored between stages and always before the commit;
    /// a cancelled run persists nothing.
    pub async fn run(
        &mut self,
        request: AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutcome, AnalysisError> {
        validate_request(&request)?;

        let signature = request_signature(&request);
        if let Some(document) = self.cache.get(
            &signature,
            &self.config.scoring_version,
            &self.config.prompt_version,
        ) {
            info!("cache hit for {}", &signature[..12]);
            return Ok(PipelineOutcome {
                document: document.clone(),
                overflow: false,
                benchmark: None,
                from_cache: true,
            });
        }

        check_cancelled(cancel)?;
        let aggregates = aggregate_categories(&request.check_results, &self.config.weights)?;
        for agg in &aggregates {
            debug!(
                "{}: {}/{} applicable checks passed, score {:.1}, weight {:.1}%",
                agg.category, agg.passed, agg.applicable, agg.score, agg.effective_weight
            );
        }
        if aggregates.len() < request.check_results.len() {
            warn!(
                "{} categor(ies) had no applicable checks; weight redistributed",
                request.check_results.len() - aggregates.len()
            );
        }

        check_cancelled(cancel)?;
        let score = overall_score(&aggregates);
        let total_possible = total_possible_checks(&request);
        let score_confidence = confidence_band(score, &aggregates, total_possible);

        check_cancelled(cancel)?;
        let llm_consensus = consensus(&request.extractions);

        check_cancelled(cancel)?;
        // History is read before commit, so this run never sees itself.
        let history = match &request.user_id {
            Some(user_id) => self.history.history(user_id).await?,
            None => Vec::new(),
        };
        let benchmark_report = benchmark(&history);

        check_cancelled(cancel)?;
        let document = assemble_document(
            &request,
            &self.config,
            &aggregates,
            score,
            score_confidence,
            llm_consensus,
        );

        let truncated = truncate_to_fit(document, self.config.size_ceiling)?;
        let mut document = truncated.document;
        if truncated.overflow {
            warn!("document {} truncated to fit size ceiling", document.id);
        }

        if request.share {
            self.share.issue(&mut document);
        }

        // Last cancellation point: nothing has been persisted yet.
        check_cancelled(cancel)?;

        self.store.put(&document).await?;
        self.cache.insert(signature, document.clone());
        debug!("committed document {}", document.id);

        Ok(PipelineOutcome {
            document,
            overflow: truncated.overflow,
            benchmark: benchmark_report,
            from_cache: false,
        })
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), AnalysisError> {
    if cancel.is_cancelled() {
        Err(AnalysisError::Cancelled)
    } else {
        Ok(())
    }
}

/// Reject malformed input before any work happens.
pub fn validate_request(request: &AnalysisRequest) -> Result<(), AnalysisError> {
    match request.input_method {
        InputMethod::Url => {
            let url = request
                .source_url
                .as_deref()
                .ok_or_else(|| AnalysisError::Validation("url input requires sourceUrl".into()))?;
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(AnalysisError::Validation(format!(
                    "sourceUrl must start with http:// or https://: {url}"
                )));
            }
        }
        InputMethod::Html | InputMethod::Text => {
            let content = request.content.as_deref().unwrap_or("");
            if content.trim().is_empty() {
                return Err(AnalysisError::Validation(
                    "html/text input requires non-empty content".into(),
                ));
            }
        }
    }

    if request.check_results.is_empty() {
        return Err(AnalysisError::Validation(
            "request carries no check results".into(),
        ));
    }

    for key in request
        .check_results
        .keys()
        .chain(request.total_possible_checks.keys())
    {
        if crate::models::Category::parse(key).is_none() {
            return Err(AnalysisError::Validation(format!(
                "unknown category key: {key}"
            )));
        }
    }

    Ok(())
}

/// Sum of possible checks across categories, falling back to the observed
/// outcome count where the runner did not say.
fn total_possible_checks(request: &AnalysisRequest) -> usize {
    request
        .check_results
        .iter()
        .map(|(key, outcomes)| {
            request
                .total_possible_checks
                .get(key)
                .copied()
                .unwrap_or(outcomes.len())
                .max(outcomes.len())
        })
        .sum()
}

fn assemble_document(
    request: &AnalysisRequest,
    config: &PipelineConfig,
    aggregates: &[CategoryAggregate],
    score: u8,
    score_confidence: crate::models::ScoreConfidence,
    llm_consensus: crate::models::ConsensusReport,
) -> AnalysisDocument {
    let band = grade_for(score);
    let now = Utc::now();

    let category_scores: BTreeMap<String, crate::models::CategoryScore> = aggregates
        .iter()
        .map(|agg| {
            (
                agg.category.key().to_string(),
                crate::models::CategoryScore {
                    score: agg.score.round().clamp(0.0, 100.0) as u8,
                    label: agg.category.label().to_string(),
                    weight: agg.effective_weight,
                },
            )
        })
        .collect();

    AnalysisDocument {
        id: Uuid::new_v4().to_string(),
        source_url: request.source_url.clone(),
        input_method: request.input_method,
        analyzed_at: now,
        scoring_version: config.scoring_version.clone(),
        prompt_version: config.prompt_version.clone(),
        page_title: request.page_title.clone(),
        page_description: request.page_description.clone(),
        language: request.language.clone(),
        word_count: word_count(request),
        category_scores,
        issue_summary: IssueSummary::from_check_results(&request.check_results),
        check_results: request.check_results.clone(),
        overall_score: score,
        grade: band.grade.to_string(),
        grade_color: band.color.to_string(),
        grade_label: band.label.to_string(),
        grade_summary: band.summary.to_string(),
        score_confidence,
        llm_extractions: request.extractions.clone(),
        llm_consensus,
        content_freshness: freshness_of(request),
        page_type: request.page_type.clone().unwrap_or_default(),
        is_shared: false,
        share_token: None,
        share_expiry: None,
    }
}

/// Words in the supplied content, or in the longest extraction view when
/// only a URL was given.
fn word_count(request: &AnalysisRequest) -> usize {
    if let Some(content) = &request.content {
        return content.split_whitespace().count();
    }
    request
        .extractions
        .values()
        .map(|e| e.main_content.split_whitespace().count())
        .max()
        .unwrap_or(0)
}

/// Freshness from the page's last-modified date, when the fetcher found one.
fn freshness_of(request: &AnalysisRequest) -> ContentFreshness {
    let Some(last_modified) = request.last_modified else {
        return ContentFreshness::default();
    };

    let age_days = (Utc::now() - last_modified).num_days();
    let (freshness, score) = if age_days <= 30 {
        ("fresh", 100)
    } else if age_days <= 180 {
        ("recent", 75)
    } else if age_days <= 365 {
        ("aging", 50)
    } else {
        ("stale", 25)
    };

    ContentFreshness {
        freshness: freshness.to_string(),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckOutcome, CheckStatus, Extraction, ScoreHistoryEntry, Severity};
    use crate::storage::{MemoryHistoryStore, MemoryStore};
    use chrono::Duration;

    fn outcome(id: &str, status: CheckStatus, severity: Severity) -> CheckOutcome {
        CheckOutcome {
            id: id.to_string(),
            status,
            severity,
            message: format!("check {id}"),
        }
    }

    fn request() -> AnalysisRequest {
        let mut check_results = BTreeMap::new();
        check_results.insert(
            "contentStructure".to_string(),
            vec![
                outcome("h1", CheckStatus::Pass, Severity::High),
                outcome("paragraphs", CheckStatus::Fail, Severity::Medium),
            ],
        );
        check_results.insert(
            "contentClarity".to_string(),
            vec![
                outcome("sentences", CheckStatus::Pass, Severity::Medium),
                outcome("jargon", CheckStatus::Pass, Severity::Low),
            ],
        );

        let mut extractions = BTreeMap::new();
        extractions.insert(
            "parser".to_string(),
            Extraction {
                main_content: "clear readable body text".to_string(),
                title: "Example Page".to_string(),
                ..Default::default()
            },
        );
        extractions.insert(
            "reader".to_string(),
            Extraction {
                main_content: "clear readable body text".to_string(),
                title: "Example Page".to_string(),
                ..Default::default()
            },
        );

        AnalysisRequest {
            source_url: Some("https://example.com/guide".to_string()),
            content: None,
            input_method: InputMethod::Url,
            user_id: Some("user-1".to_string()),
            page_title: "Example Page".to_string(),
            page_description: "A guide".to_string(),
            language: "en".to_string(),
            last_modified: None,
            page_type: None,
            check_results,
            total_possible_checks: BTreeMap::new(),
            extractions,
            share: false,
        }
    }

    fn pipeline(
        history: Vec<ScoreHistoryEntry>,
    ) -> AnalysisPipeline<MemoryStore, MemoryHistoryStore> {
        AnalysisPipeline::new(
            PipelineConfig::default(),
            MemoryStore::new(),
            MemoryHistoryStore::new(history),
            AnalysisCache::new(8),
        )
    }

    #[tokio::test]
    async fn test_full_run_commits_document() {
        let mut pipeline = pipeline(Vec::new());
        let outcome = pipeline
            .run(request(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(!outcome.from_cache);
        assert!(!outcome.overflow);
        assert!(outcome.benchmark.is_none());

        let doc = &outcome.document;
        assert_eq!(doc.category_scores.len(), 2);
        assert!(doc.llm_consensus.available);
        assert_eq!(doc.llm_consensus.overall, 100);
        assert_eq!(doc.scoring_version, "2.1.0");
        assert!(doc.word_count > 0);

        // The commit actually persisted it.
        let stored = pipeline.store.get(&doc.id).await.unwrap().unwrap();
        assert_eq!(stored.overall_score, doc.overall_score);
    }

    #[tokio::test]
    async fn test_effective_weights_total_100() {
        let mut pipeline = pipeline(Vec::new());
        let outcome = pipeline
            .run(request(), &CancellationToken::new())
            .await
            .unwrap();

        let total: f64 = outcome
            .document
            .category_scores
            .values()
            .map(|c| c.weight)
            .sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_cache_hit_bypasses_pipeline() {
        let mut pipeline = pipeline(Vec::new());
        let first = pipeline
            .run(request(), &CancellationToken::new())
            .await
            .unwrap();
        let second = pipeline
            .run(request(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(second.from_cache);
        assert_eq!(second.document.id, first.document.id);
    }

    #[tokio::test]
    async fn test_cancellation_persists_nothing() {
        let mut pipeline = pipeline(Vec::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pipeline.run(request(), &cancel).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Cancelled));
        assert!(pipeline.store.list_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_benchmark_from_history() {
        let start = Utc::now() - Duration::days(30);
        let history = [60, 62, 65, 70, 75, 75, 80]
            .into_iter()
            .enumerate()
            .map(|(i, score)| ScoreHistoryEntry {
                overall_score: score,
                analyzed_at: start + Duration::days(i as i64),
            })
            .collect();

        let mut pipeline = pipeline(history);
        let outcome = pipeline
            .run(request(), &CancellationToken::new())
            .await
            .unwrap();

        let report = outcome.benchmark.unwrap();
        assert_eq!(report.average, 70);
        assert_eq!(report.trend, 20);
        assert_eq!(report.sample_size, 7);
    }

    #[tokio::test]
    async fn test_share_issued_at_commit() {
        let mut pipeline = pipeline(Vec::new());
        let mut req = request();
        req.share = true;

        let outcome = pipeline
            .run(req, &CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.document.is_shared);
        assert!(outcome.document.share_token.is_some());
        assert!(outcome.document.share_expiry.is_some());

        // The persisted copy carries the share fields too.
        let stored = pipeline
            .store
            .get(&outcome.document.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.share_token, outcome.document.share_token);
    }

    #[test]
    fn test_validation_rejects_bad_input() {
        let mut bad_url = request();
        bad_url.source_url = Some("ftp://example.com".to_string());
        assert!(validate_request(&bad_url).unwrap_err().is_validation());

        let mut no_content = request();
        no_content.input_method = InputMethod::Text;
        no_content.content = None;
        assert!(validate_request(&no_content).unwrap_err().is_validation());

        let mut unknown_category = request();
        unknown_category
            .check_results
            .insert("brandVoice".to_string(), Vec::new());
        assert!(validate_request(&unknown_category)
            .unwrap_err()
            .is_validation());

        assert!(validate_request(&request()).is_ok());
    }

    #[test]
    fn test_word_count_prefers_content() {
        let mut req = request();
        req.content = Some("one two three".to_string());
        assert_eq!(word_count(&req), 3);

        req.content = None;
        // Longest extraction view: "clear readable body text".
        assert_eq!(word_count(&req), 4);
    }

    #[test]
    fn test_freshness_bands() {
        let mut req = request();

        req.last_modified = Some(Utc::now() - Duration::days(5));
        assert_eq!(freshness_of(&req).freshness, "fresh");

        req.last_modified = Some(Utc::now() - Duration::days(90));
        assert_eq!(freshness_of(&req).freshness, "recent");

        req.last_modified = Some(Utc::now() - Duration::days(400));
        assert_eq!(freshness_of(&req).freshness, "stale");

        req.last_modified = None;
        let unknown = freshness_of(&req);
        assert_eq!(unknown.freshness, "unknown");
        assert_eq!(unknown.score, 0);
    }
}
