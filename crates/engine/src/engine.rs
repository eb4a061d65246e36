//! The public entry point tying backend, store and services together.

use deckstyle_backend::InferenceBackend;
use deckstyle_core::normalize::normalize_keywords;
use deckstyle_core::{
    ActiveDesignSet, AggregatedDesignSpec, DesignExemplar, Error, ExemplarScope, ExtractedDesign,
    MatchedDesign, NewExemplar, Result, SlideOutline,
};
use deckstyle_store::ExemplarStore;

use crate::active_set;
use crate::config::EngineConfig;
use crate::extraction::DesignExtractor;
use crate::keywords::KeywordExtractor;
use crate::matcher::DesignMatcher;
use crate::outline::{OutlineOptions, OutlineSynthesizer};

/// Design matching and style aggregation engine.
///
/// Every operation is a stateless request/response over the backend and
/// the store; the engine itself holds no mutable state.
pub struct DesignEngine<B, S> {
    backend: B,
    store: S,
    config: EngineConfig,
    extractor: DesignExtractor,
    matcher: DesignMatcher,
    synthesizer: OutlineSynthesizer,
}

impl<B: InferenceBackend, S: ExemplarStore> DesignEngine<B, S> {
    pub fn new(backend: B, store: S, config: EngineConfig) -> Self {
        let extractor = DesignExtractor::new(config.vision_chain(), config.extraction.clone());
        let keywords = KeywordExtractor::new(config.keyword_chain(), config.keywords.clone());
        let matcher = DesignMatcher::new(keywords, config.matching.clone());
        let synthesizer = OutlineSynthesizer::new(config.outline_chain(), config.outline.clone());

        Self {
            backend,
            store,
            config,
            extractor,
            matcher,
            synthesizer,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze one reference image.
    pub fn extract_design(&self, image_ref: &str, keywords: &[String]) -> Result<ExtractedDesign> {
        self.extractor.extract(&self.backend, image_ref, keywords)
    }

    /// Analyze one reference image and store it as a new exemplar.
    ///
    /// The exemplar's keywords are the topic keywords followed by the
    /// extracted style keywords.
    pub fn extract_and_store(
        &self,
        image_ref: &str,
        keywords: &[String],
        category_tag: &str,
        uploaded_by: Option<&str>,
    ) -> Result<DesignExemplar> {
        let category_tag = category_tag.trim();
        if category_tag.is_empty() {
            return Err(Error::InvalidInput("category tag is empty".to_string()));
        }

        let design = self.extract_design(image_ref, keywords)?;
        let all_keywords = normalize_keywords(keywords.iter().chain(design.style_keywords.iter()));

        let stored = self.store.insert(NewExemplar {
            category_tag: category_tag.to_string(),
            keywords: all_keywords,
            quality_score: Some(design.quality_score),
            extracted_spec: Some(design),
            uploaded_by: uploaded_by.map(str::to_string),
            image_ref: Some(image_ref.to_string()),
        })?;

        log::info!("Stored exemplar {} in {}", stored.id, stored.category_tag);
        Ok(stored)
    }

    /// Rank stored exemplars against a prompt and content sample.
    pub fn match_designs(
        &self,
        prompt: &str,
        content: &str,
        limit: Option<usize>,
        scope: &ExemplarScope,
    ) -> Result<Vec<MatchedDesign>> {
        self.matcher
            .match_designs(&self.backend, &self.store, prompt, content, limit, scope)
    }

    /// Rank stored exemplars against explicit keywords, skipping extraction.
    pub fn match_keywords(
        &self,
        keywords: &[String],
        limit: Option<usize>,
        scope: &ExemplarScope,
    ) -> Result<Vec<MatchedDesign>> {
        self.matcher.match_keywords(&self.store, keywords, limit, scope)
    }

    /// Merge designs into one composite style.
    pub fn aggregate(&self, designs: &[ExtractedDesign]) -> AggregatedDesignSpec {
        deckstyle_core::aggregate(designs)
    }

    /// The most recently curated set, aggregated.
    pub fn active_aggregated_set(&self) -> Result<Option<ActiveDesignSet>> {
        active_set::active_aggregated_set(&self.store)
    }

    /// Generate a styled slide outline.
    pub fn synthesize_outline(
        &self,
        cleaned_text: &str,
        prompt: Option<&str>,
        options: &OutlineOptions,
    ) -> Result<SlideOutline> {
        self.synthesizer
            .synthesize(&self.backend, cleaned_text, prompt, options)
    }

    /// Record that matched exemplars were used; returns how many were found.
    pub fn record_usage<T: AsRef<str>>(&self, ids: &[T]) -> Result<usize> {
        self.matcher.record_usage(&self.store, ids)
    }
}
