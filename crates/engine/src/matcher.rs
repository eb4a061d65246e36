//! Matching new requests against stored exemplars.

use deckstyle_backend::InferenceBackend;
use deckstyle_core::normalize::normalize_keywords;
use deckstyle_core::{rank_exemplars, ExemplarScope, MatchedDesign, Result};
use deckstyle_store::ExemplarStore;

use crate::config::MatchingSettings;
use crate::keywords::KeywordExtractor;

/// Retrieves capped candidates and ranks them by keyword overlap,
/// quality and usage.
#[derive(Debug, Clone)]
pub struct DesignMatcher {
    keywords: KeywordExtractor,
    settings: MatchingSettings,
}

impl DesignMatcher {
    pub fn new(keywords: KeywordExtractor, settings: MatchingSettings) -> Self {
        Self { keywords, settings }
    }

    /// Extract keywords from `prompt` and `content`, then rank.
    pub fn match_designs(
        &self,
        backend: &dyn InferenceBackend,
        store: &dyn ExemplarStore,
        prompt: &str,
        content: &str,
        limit: Option<usize>,
        scope: &ExemplarScope,
    ) -> Result<Vec<MatchedDesign>> {
        let search = self.keywords.extract(backend, prompt, content);
        log::info!("Matching with {} keywords: {:?}", search.len(), search);
        self.match_keywords(store, &search, limit, scope)
    }

    /// Rank stored exemplars against an explicit keyword set.
    pub fn match_keywords(
        &self,
        store: &dyn ExemplarStore,
        keywords: &[String],
        limit: Option<usize>,
        scope: &ExemplarScope,
    ) -> Result<Vec<MatchedDesign>> {
        let search = normalize_keywords(keywords);
        let limit = limit.unwrap_or(self.settings.default_limit);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let candidates = store.candidates(scope, self.settings.candidate_cap)?;
        if candidates.len() == self.settings.candidate_cap {
            log::debug!(
                "Candidate retrieval hit the cap of {}; older exemplars are not ranked",
                self.settings.candidate_cap
            );
        }

        Ok(rank_exemplars(&search, &candidates, limit))
    }

    /// Bump usage counts of consumed matches; unknown ids are skipped.
    ///
    /// Returns how many exemplars were updated.
    pub fn record_usage<S: AsRef<str>>(
        &self,
        store: &dyn ExemplarStore,
        ids: &[S],
    ) -> Result<usize> {
        let mut updated = 0;
        for id in ids {
            match store.increment_usage(id.as_ref())? {
                Some(count) => {
                    log::debug!("Exemplar {} used {} times", id.as_ref(), count);
                    updated += 1;
                }
                None => log::warn!("Cannot record usage of unknown exemplar {}", id.as_ref()),
            }
        }
        Ok(updated)
    }
}
