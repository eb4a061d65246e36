#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use deckstyle_backend::{BackendError, ChatRequest, ChatResponse, InferenceBackend};
use deckstyle_core::ExtractedDesign;
use deckstyle_core::NewExemplar;
use deckstyle_engine::{DesignEngine, EngineConfig};
use deckstyle_store::SqliteExemplarStore;

/// Answers per model from a queue; unknown models fail with a transport
/// error. Records every request it sees.
#[derive(Default)]
pub struct ScriptedBackend {
    answers: RefCell<HashMap<String, VecDeque<Result<ChatResponse, BackendError>>>>,
    requests: RefCell<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, model: &str, content: &str) -> Self {
        self.push(model, Ok(ChatResponse::from_content(content)))
    }

    pub fn fail(self, model: &str, error: BackendError) -> Self {
        self.push(model, Err(error))
    }

    fn push(self, model: &str, answer: Result<ChatResponse, BackendError>) -> Self {
        self.answers
            .borrow_mut()
            .entry(model.to_string())
            .or_default()
            .push_back(answer);
        self
    }

    /// Models called, in order.
    pub fn called_models(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|r| r.model.clone()).collect()
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.borrow().clone()
    }
}

impl InferenceBackend for ScriptedBackend {
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        self.requests.borrow_mut().push(request.clone());
        self.answers
            .borrow_mut()
            .get_mut(&request.model)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(BackendError::Transport(format!(
                    "no answer for {}",
                    request.model
                )))
            })
    }
}

/// Config with short, distinct model names per stage.
pub fn test_config() -> EngineConfig {
    EngineConfig::from_toml(
        r#"
        [models]
        vision = ["vision-a", "vision-b"]
        keywords = ["kw-a"]
        outline = ["outline-a", "outline-b"]
        "#,
    )
    .unwrap()
}

pub fn engine(backend: ScriptedBackend) -> DesignEngine<ScriptedBackend, SqliteExemplarStore> {
    DesignEngine::new(backend, SqliteExemplarStore::open_in_memory().unwrap(), test_config())
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn new_exemplar(category: &str, keywords: &[&str], quality: Option<u8>) -> NewExemplar {
    NewExemplar {
        category_tag: category.to_string(),
        keywords: strings(keywords),
        extracted_spec: Some(ExtractedDesign::fallback(strings(keywords), quality.unwrap_or(70))),
        quality_score: quality,
        uploaded_by: None,
        image_ref: None,
    }
}
