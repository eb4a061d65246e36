//! Generative and vision inference backends.
//!
//! The engine talks to models only through [`InferenceBackend`]; the
//! HTTP implementation speaks the common chat completions contract, and
//! [`ModelChain`] layers sequential model fallback on top.

pub mod chain;
pub mod error;
pub mod http;
pub mod request;

pub use chain::{ChainError, ChainSuccess, ModelChain};
pub use error::BackendError;
pub use http::{HttpBackend, HttpBackendConfig};
pub use request::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat};

/// A black-box model endpoint: one request in, one completion out.
pub trait InferenceBackend {
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError>;
}

impl<T: InferenceBackend + ?Sized> InferenceBackend for &T {
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        (**self).complete(request)
    }
}

impl<T: InferenceBackend + ?Sized> InferenceBackend for Box<T> {
    fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, BackendError> {
        (**self).complete(request)
    }
}
