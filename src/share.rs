//! Share link issuance and revocation.
//!
//! A share token is an opaque capability granting time-boxed external read
//! access to a document. This module only issues and revokes tokens; any
//! resolver serving a share link must re-check expiry at read time itself.

use crate::models::AnalysisDocument;
use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use tracing::debug;

/// Length of generated share tokens.
const TOKEN_LENGTH: usize = 32;

/// Issues and revokes share tokens on analysis documents.
#[derive(Debug, Clone, Copy)]
pub struct ShareLinkManager {
    /// Days a share link stays valid after issuance.
    pub expiry_days: i64,
}

impl Default for ShareLinkManager {
    fn default() -> Self {
        Self { expiry_days: 30 }
    }
}

impl ShareLinkManager {
    pub fn new(expiry_days: i64) -> Self {
        Self { expiry_days }
    }

    /// Attach a fresh share token to a document. Returns the token.
    pub fn issue(&self, document: &mut AnalysisDocument) -> String {
        let token = generate_token();
        document.share_token = Some(token.clone());
        document.share_expiry = Some(Utc::now() + Duration::days(self.expiry_days));
        document.is_shared = true;
        debug!("issued share token for {}", document.id);
        token
    }

    /// Immediately withdraw the share capability.
    pub fn revoke(&self, document: &mut AnalysisDocument) {
        document.share_token = None;
        document.share_expiry = None;
        document.is_shared = false;
        debug!("revoked share token for {}", document.id);
    }
}

/// True only while a token exists and `at` is before its expiry.
pub fn is_share_active(document: &AnalysisDocument, at: DateTime<Utc>) -> bool {
    match (&document.share_token, document.share_expiry) {
        (Some(_), Some(expiry)) => at < expiry,
        _ => false,
    }
}

/// Collision-resistant opaque token.
fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ConsensusReport, ContentFreshness, InputMethod, IssueSummary, PageTypeInfo,
        ScoreConfidence,
    };
    use std::collections::BTreeMap;

    fn document() -> AnalysisDocument {
        AnalysisDocument {
            id: "doc-1".to_string(),
            source_url: None,
            input_method: InputMethod::Text,
            analyzed_at: Utc::now(),
            scoring_version: "2.1.0".to_string(),
            prompt_version: "1.4.0".to_string(),
            page_title: String::new(),
            page_description: String::new(),
            language: "en".to_string(),
            word_count: 0,
            category_scores: BTreeMap::new(),
            issue_summary: IssueSummary::default(),
            check_results: BTreeMap::new(),
            overall_score: 80,
            grade: "B".to_string(),
            grade_color: "lime".to_string(),
            grade_label: "Good".to_string(),
            grade_summary: String::new(),
            score_confidence: ScoreConfidence {
                score: 80,
                confidence: 90,
                range: [77, 83],
                label: "High".to_string(),
            },
            llm_extractions: BTreeMap::new(),
            llm_consensus: ConsensusReport::unavailable(),
            content_freshness: ContentFreshness::default(),
            page_type: PageTypeInfo::default(),
            is_shared: false,
            share_token: None,
            share_expiry: None,
        }
    }

    #[test]
    fn test_issue_sets_token_and_expiry() {
        let manager = ShareLinkManager::default();
        let mut doc = document();

        let token = manager.issue(&mut doc);
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert_eq!(doc.share_token.as_deref(), Some(token.as_str()));
        assert!(doc.is_shared);

        let expiry = doc.share_expiry.unwrap();
        let days_out = (expiry - Utc::now()).num_days();
        assert!((29..=30).contains(&days_out));
    }

    #[test]
    fn test_tokens_are_unique() {
        let manager = ShareLinkManager::default();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..64 {
            let mut doc = document();
            assert!(seen.insert(manager.issue(&mut doc)));
        }
    }

    #[test]
    fn test_active_only_before_expiry() {
        let manager = ShareLinkManager::new(7);
        let mut doc = document();
        manager.issue(&mut doc);

        let now = Utc::now();
        assert!(is_share_active(&doc, now));
        assert!(is_share_active(&doc, now + Duration::days(6)));
        assert!(!is_share_active(&doc, now + Duration::days(8)));
    }

    #[test]
    fn test_revoke_clears_everything() {
        let manager = ShareLinkManager::default();
        let mut doc = document();
        manager.issue(&mut doc);

        manager.revoke(&mut doc);
        assert!(doc.share_token.is_none());
        assert!(doc.share_expiry.is_none());
        assert!(!doc.is_shared);
        assert!(!is_share_active(&doc, Utc::now()));
    }

    #[test]
    fn test_unshared_document_never_active() {
        assert!(!is_share_active(&document(), Utc::now()));
    }
}
