//! Mapping of model chain outcomes onto engine errors.

use deckstyle_backend::{BackendError, ChainError};
use deckstyle_core::Error;

/// Which pipeline step a chain served; decides the exhaustion variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extraction,
    Keywords,
    Outline,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Extraction => "design extraction",
            Stage::Keywords => "keyword extraction",
            Stage::Outline => "outline synthesis",
        }
    }
}

/// Convert a chain failure into the engine error for `stage`.
pub fn chain_error(stage: Stage, error: ChainError) -> Error {
    match error {
        ChainError::Fatal {
            model,
            error: BackendError::Quota(message),
        } => Error::QuotaExhausted { model, message },
        ChainError::Fatal {
            model,
            error: BackendError::Credential(message),
        } => Error::Credential { model, message },
        ChainError::Fatal { model, error } => Error::Credential {
            model,
            message: error.to_string(),
        },
        ChainError::Exhausted {
            last_model,
            last_error,
        } => match stage {
            Stage::Outline => Error::OutlineGenerationFailed {
                last_model,
                last_error: last_error.to_string(),
            },
            _ => Error::ModelsExhausted {
                stage: stage.label().to_string(),
                last_model,
                last_error: last_error.to_string(),
            },
        },
        ChainError::NoModels => {
            Error::Config(format!("no models configured for {}", stage.label()))
        }
    }
}
