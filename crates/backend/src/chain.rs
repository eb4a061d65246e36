//! Sequential model fallback.
//!
//! A [`ModelChain`] tries its models in priority order, one call at a
//! time. The first non-empty completion wins; a fatal failure (credential
//! or quota) stops the chain at once; any other failure moves on to the
//! next model.

use thiserror::Error;

use crate::error::BackendError;
use crate::request::ChatRequest;
use crate::InferenceBackend;

/// A successful completion and the model that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSuccess {
    pub model: String,
    pub content: String,
}

/// Why a chain produced no completion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    /// A credential or quota failure; later models were not tried.
    #[error("{model}: {error}")]
    Fatal { model: String, error: BackendError },

    /// Every model failed with a retryable error.
    #[error("all models failed, last {last_model}: {last_error}")]
    Exhausted {
        last_model: String,
        last_error: BackendError,
    },

    /// The chain has no models configured.
    #[error("no models configured")]
    NoModels,
}

/// Ordered list of models for one pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChain {
    stage: String,
    models: Vec<String>,
}

impl ModelChain {
    /// Create a chain for a named stage (used in log lines).
    pub fn new<I, S>(stage: impl Into<String>, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            stage: stage.into(),
            models: models
                .into_iter()
                .map(Into::into)
                .filter(|m: &String| !m.trim().is_empty())
                .collect(),
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Try each model in order with a request built for it.
    pub fn run<F>(
        &self,
        backend: &dyn InferenceBackend,
        mut build_request: F,
    ) -> Result<ChainSuccess, ChainError>
    where
        F: FnMut(&str) -> ChatRequest,
    {
        let mut last_failure: Option<(String, BackendError)> = None;

        for model in &self.models {
            let request = build_request(model);
            log::debug!("[{}] trying model {}", self.stage, model);

            let outcome = backend.complete(&request).and_then(|response| {
                response
                    .first_content()
                    .map(str::to_string)
                    .ok_or(BackendError::EmptyResponse)
            });

            match outcome {
                Ok(content) => {
                    log::info!("[{}] model {} succeeded", self.stage, model);
                    return Ok(ChainSuccess {
                        model: model.clone(),
                        content,
                    });
                }
                Err(error) if error.is_fatal() => {
                    log::error!("[{}] model {} failed fatally: {}", self.stage, model, error);
                    return Err(ChainError::Fatal {
                        model: model.clone(),
                        error,
                    });
                }
                Err(error) => {
                    log::warn!("[{}] model {} failed, trying next: {}", self.stage, model, error);
                    last_failure = Some((model.clone(), error));
                }
            }
        }

        match last_failure {
            Some((last_model, last_error)) => Err(ChainError::Exhausted {
                last_model,
                last_error,
            }),
            None => Err(ChainError::NoModels),
        }
    }
}
