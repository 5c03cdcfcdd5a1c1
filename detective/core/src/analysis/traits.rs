//! Inference Backend Traits
//!
//! Trait definitions for the remote inference service. The analysis client
//! builds one [`AnalysisRequest`] per capture and hands it to whichever
//! backend is plugged in; the backend only moves bytes and returns the raw
//! text. Parsing and validation stay in the client.

use async_trait::async_trait;
use serde_json::Value;

use crate::capture::{CapturedImage, ImageMime};

/// One outbound analysis call
#[derive(Clone, Debug)]
pub struct AnalysisRequest {
    /// Model to use (backend-specific identifier)
    pub model: String,
    /// MIME type of the image
    pub mime_type: ImageMime,
    /// Base64 image data without any transport prefix
    pub image_data: String,
    /// Natural-language task description
    pub instruction: String,
    /// Structured-output schema the response must follow
    pub response_schema: Value,
}

impl AnalysisRequest {
    /// Build a request for `image`
    pub fn new(
        image: &CapturedImage,
        model: impl Into<String>,
        instruction: impl Into<String>,
        response_schema: Value,
    ) -> Self {
        Self {
            model: model.into(),
            mime_type: image.mime(),
            image_data: image.payload().to_string(),
            instruction: instruction.into(),
            response_schema,
        }
    }
}

/// Raw answer from the service
#[derive(Clone, Debug, Default)]
pub struct InferenceResponse {
    /// Response text, `None` when the service produced nothing
    pub text: Option<String>,
    /// Model that answered
    pub model: String,
    /// Why generation stopped, if reported
    pub finish_reason: Option<String>,
    /// Round-trip time in milliseconds
    pub duration_ms: Option<u64>,
}

impl InferenceResponse {
    /// Response carrying `text`
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Response without any content
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Inference backend trait
///
/// Implement this trait to add support for a different multimodal service.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Backend name (e.g. "Gemini")
    fn name(&self) -> &str;

    /// Check if the service is reachable
    async fn health_check(&self) -> bool;

    /// Send one request and wait for the complete answer
    ///
    /// Transport failures and error statuses are returned as `Err`; a
    /// successful call with no content is `Ok` with `text: None`.
    async fn generate(&self, request: &AnalysisRequest) -> anyhow::Result<InferenceResponse>;
}
