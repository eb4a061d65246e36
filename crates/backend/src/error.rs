//! Backend failure kinds and their classification.

use std::time::Duration;
use thiserror::Error;

/// A failed inference call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Invalid or absent API credential. Fatal.
    #[error("Credential rejected: {0}")]
    Credential(String),

    /// Insufficient quota, credits or payment. Fatal.
    #[error("Quota exhausted: {0}")]
    Quota(String),

    /// The call did not finish within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-success HTTP status not covered by the fatal kinds.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection, TLS or body read failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body was not a chat completion.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The completion had no text content.
    #[error("Empty response content")]
    EmptyResponse,
}

impl BackendError {
    /// Credential and quota failures stop a fallback chain immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Credential(_) | Self::Quota(_))
    }
}

/// Map a failed HTTP exchange to a [`BackendError`].
///
/// Status codes decide first (401/403 credential, 402 quota); otherwise
/// the error message is searched for credential and quota markers, since
/// several providers report exhausted credits as 429 or 400.
pub fn classify_failure(status: u16, message: &str) -> BackendError {
    let lower = message.to_lowercase();

    if status == 401 || status == 403 || is_credential_message(&lower) {
        return BackendError::Credential(message.to_string());
    }

    if status == 402 || is_quota_message(&lower) {
        return BackendError::Quota(message.to_string());
    }

    BackendError::Http {
        status,
        message: message.to_string(),
    }
}

fn is_credential_message(lower: &str) -> bool {
    lower.contains("invalid api key")
        || lower.contains("incorrect api key")
        || lower.contains("invalid_api_key")
        || lower.contains("missing api key")
        || lower.contains("no api key")
        || lower.contains("unauthorized")
}

fn is_quota_message(lower: &str) -> bool {
    lower.contains("insufficient_quota")
        || lower.contains("insufficient quota")
        || lower.contains("insufficient credits")
        || lower.contains("insufficient balance")
        || lower.contains("payment required")
        || lower.contains("billing")
        || lower.contains("exceeded your current quota")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(classify_failure(401, "nope"), BackendError::Credential(_)));
        assert!(matches!(classify_failure(403, "nope"), BackendError::Credential(_)));
        assert!(matches!(classify_failure(402, "pay up"), BackendError::Quota(_)));
        assert!(matches!(
            classify_failure(500, "boom"),
            BackendError::Http { status: 500, .. }
        ));
    }

    #[test]
    fn test_message_classification() {
        assert!(matches!(
            classify_failure(429, "You exceeded your current quota, please check your plan"),
            BackendError::Quota(_)
        ));
        assert!(matches!(
            classify_failure(400, "Incorrect API key provided"),
            BackendError::Credential(_)
        ));
        // Plain rate limiting stays retryable
        assert!(!classify_failure(429, "Rate limit reached").is_fatal());
    }

    #[test]
    fn test_fatality() {
        assert!(BackendError::Credential("x".into()).is_fatal());
        assert!(BackendError::Quota("x".into()).is_fatal());
        assert!(!BackendError::Timeout(Duration::from_secs(1)).is_fatal());
        assert!(!BackendError::EmptyResponse.is_fatal());
    }
}
