//! Error types for design extraction, matching and outline synthesis.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while analyzing, matching or applying designs.
#[derive(Error, Debug)]
pub enum Error {
    /// The inference backend rejected or never received a credential.
    #[error("Invalid or missing API credential (model {model}): {message}")]
    Credential { model: String, message: String },

    /// The inference backend reports insufficient quota or credits.
    #[error(
        "Inference quota exhausted (model {model}): {message}. \
         Try pasting the text content instead of uploading an image or scanned document"
    )]
    QuotaExhausted { model: String, message: String },

    /// Every model in a fallback chain failed with a retryable error.
    #[error("All models failed for {stage} (last model {last_model}): {last_error}")]
    ModelsExhausted {
        stage: String,
        last_model: String,
        last_error: String,
    },

    /// Every model in the outline chain failed with a retryable error.
    #[error("Outline generation failed (last model {last_model}): {last_error}")]
    OutlineGenerationFailed {
        last_model: String,
        last_error: String,
    },

    /// The vision model returned content that is not a design object.
    #[error("Failed to parse extracted design: {reason}")]
    ExtractionParse { reason: String, raw: String },

    /// The outline model returned content that is not a valid outline.
    #[error("Failed to parse slide outline: {reason}")]
    OutlineParse { reason: String, raw: String },

    /// Exemplar store failure.
    #[error("Exemplar store error: {0}")]
    Store(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller supplied an unusable argument.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether this error stems from configuration (credential or quota)
    /// rather than a transient model failure worth retrying later.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Credential { .. } | Self::QuotaExhausted { .. })
    }

    /// Raw backend content attached to a parse failure, if any.
    pub fn raw_content(&self) -> Option<&str> {
        match self {
            Self::ExtractionParse { raw, .. } | Self::OutlineParse { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
