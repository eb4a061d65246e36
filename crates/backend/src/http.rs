//! OpenAI-compatible `/chat/completions` backend over blocking HTTP.

use std::time::Duration;

use serde_json::Value;

use crate::error::{classify_failure, BackendError};
use crate::request::{ChatRequest, ChatResponse};
use crate::InferenceBackend;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    /// Absent keys surface as a credential error on the first call.
    pub api_key: Option<String>,
    /// Per-call timeout.
    pub timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Blocking HTTP client for chat completion endpoints.
pub struct HttpBackend {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpBackend {
    /// Build a client with the configured per-call timeout.
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.filter(|k| !k.trim().is_empty()),
            timeout: config.timeout,
        })
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl InferenceBackend for HttpBackend {
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| BackendError::Credential("no API key configured".to_string()))?;

        log::debug!("POST {} model={}", self.url(), request.model);

        let response = self
            .client
            .post(self.url())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.timeout)
                } else {
                    BackendError::Transport(format!("HTTP request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.timeout)
            } else {
                BackendError::Transport(format!("Failed to read response: {}", e))
            }
        })?;

        parse_completion(status.as_u16(), &body)
    }
}

/// Turn a status and body into a completion or a classified error.
///
/// Some providers return `{"error": ...}` with a success status, so the
/// body is checked for an error object either way.
pub fn parse_completion(status: u16, body: &str) -> Result<ChatResponse, BackendError> {
    let value: Option<Value> = serde_json::from_str(body).ok();

    if let Some(message) = value.as_ref().and_then(error_message) {
        return Err(classify_failure(status, &message));
    }

    if !(200..300).contains(&status) {
        return Err(classify_failure(status, body));
    }

    let value = value.ok_or_else(|| {
        BackendError::InvalidResponse("response body is not JSON".to_string())
    })?;

    serde_json::from_value(value).map_err(|e| BackendError::InvalidResponse(e.to_string()))
}

fn error_message(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    if error.is_null() {
        return None;
    }
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .unwrap_or("unknown error");
    let code = error.get("code").and_then(Value::as_str);

    Some(match code {
        Some(code) => format!("{} ({})", message, code),
        None => message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let response =
            parse_completion(200, r#"{"choices":[{"message":{"content":"ok"}}]}"#).unwrap();
        assert_eq!(response.first_content(), Some("ok"));
    }

    #[test]
    fn test_parse_error_object_with_success_status() {
        let err = parse_completion(
            200,
            r#"{"error":{"message":"You exceeded your current quota","code":"insufficient_quota"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, BackendError::Quota(_)));
    }

    #[test]
    fn test_parse_unauthorized() {
        let err = parse_completion(401, r#"{"error":{"message":"bad key"}}"#).unwrap_err();
        assert!(matches!(err, BackendError::Credential(_)));
    }

    #[test]
    fn test_parse_server_error_is_retryable() {
        let err = parse_completion(503, "upstream unavailable").unwrap_err();
        assert_eq!(
            err,
            BackendError::Http {
                status: 503,
                message: "upstream unavailable".to_string()
            }
        );
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_parse_non_json_success() {
        let err = parse_completion(200, "<html>").unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }

    #[test]
    fn test_missing_key_is_credential_error() {
        let backend = HttpBackend::new(HttpBackendConfig::default()).unwrap();
        let request = ChatRequest {
            model: "m".to_string(),
            messages: vec![],
            max_tokens: 1,
            temperature: 0.0,
            response_format: None,
        };
        assert!(matches!(
            backend.complete(&request),
            Err(BackendError::Credential(_))
        ));
    }
}
