//! Keyword extraction from a prompt and content sample.
//!
//! Two strategies, merged by union: a cheap model asked for
//! `{"keywords": [...]}`, and direct tokenization. The model strategy
//! is best effort; any failure leaves only the tokenized keywords.

use deckstyle_backend::{ChatMessage, ChatRequest, InferenceBackend, ModelChain, ResponseFormat};
use deckstyle_core::json::parse_lenient_object;
use deckstyle_core::normalize::{normalize_keywords, tokenize_keywords, truncate_chars};

use crate::config::KeywordSettings;
use crate::values::{field, string_list};

const KEYWORD_PROMPT: &str = "Extract 5 to 10 short topic and style keywords that describe \
what this presentation is about and how it should look. Respond with JSON only: \
{\"keywords\": [\"...\"]}";

#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    chain: ModelChain,
    settings: KeywordSettings,
}

impl KeywordExtractor {
    pub fn new(chain: ModelChain, settings: KeywordSettings) -> Self {
        Self { chain, settings }
    }

    /// Union of model and tokenized keywords, model keywords first.
    pub fn extract(
        &self,
        backend: &dyn InferenceBackend,
        prompt: &str,
        content: &str,
    ) -> Vec<String> {
        let content = truncate_chars(content, self.settings.max_content_chars);

        let mut keywords = self.model_keywords(backend, prompt, content);
        keywords.extend(tokenize_keywords(prompt));
        keywords.extend(tokenize_keywords(content));

        normalize_keywords(keywords)
    }

    fn model_keywords(
        &self,
        backend: &dyn InferenceBackend,
        prompt: &str,
        content: &str,
    ) -> Vec<String> {
        if prompt.trim().is_empty() && content.trim().is_empty() {
            return Vec::new();
        }
        if self.chain.models().is_empty() {
            return Vec::new();
        }

        let user = format!("Request: {}\n\nContent sample:\n{}", prompt.trim(), content);
        let outcome = self.chain.run(backend, |model| ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage::system(KEYWORD_PROMPT), ChatMessage::user(user.as_str())],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            response_format: Some(ResponseFormat::JsonObject),
        });

        let content = match outcome {
            Ok(success) => success.content,
            Err(e) => {
                log::warn!("Keyword extraction by model failed, using tokenized keywords: {}", e);
                return Vec::new();
            }
        };

        match parse_keyword_reply(&content) {
            Some(keywords) => keywords,
            None => {
                log::warn!("Keyword reply was not a keyword object, ignoring it");
                Vec::new()
            }
        }
    }
}

/// Read `{"keywords": [...]}`; a bare JSON array is accepted too.
pub fn parse_keyword_reply(raw: &str) -> Option<Vec<String>> {
    if let Ok(value) = parse_lenient_object(raw) {
        return string_list(field(&value, &["keywords", "tags"])).map(normalize_keywords);
    }
    serde_json::from_str::<Vec<String>>(raw.trim())
        .ok()
        .map(normalize_keywords)
        .filter(|k| !k.is_empty())
}
