//! Analysis Client
//!
//! Turns one [`CapturedImage`] into one [`AnalysisResult`]. The client owns
//! the instruction and output schema, calls the backend exactly once, and
//! sorts every failure into an [`AnalysisError`] kind. Retrying is the
//! user's decision, never the client's.

use std::time::Instant;

use serde_json::Value;

use super::schema::{parse_analysis, response_schema, AnalysisResult, ANALYSIS_INSTRUCTION};
use super::traits::{AnalysisRequest, InferenceBackend};
use crate::capture::CapturedImage;
use crate::error::AnalysisError;

/// Client for the remote emotion classifier
pub struct AnalysisClient<B: InferenceBackend> {
    backend: B,
    model: String,
    instruction: String,
    schema: Value,
}

impl<B: InferenceBackend> AnalysisClient<B> {
    /// Create a client that asks `model` through `backend`
    pub fn new(backend: B, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            instruction: ANALYSIS_INSTRUCTION.to_string(),
            schema: response_schema(),
        }
    }

    /// The backend in use
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Model identifier sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Classify the emotion shown in `image`
    ///
    /// # Errors
    ///
    /// - [`AnalysisError::ServiceUnavailable`] if the call itself failed
    /// - [`AnalysisError::EmptyResponse`] if the service answered with nothing
    /// - [`AnalysisError::MalformedResponse`] if the answer is not a valid result
    pub async fn analyze(&self, image: &CapturedImage) -> Result<AnalysisResult, AnalysisError> {
        let request = AnalysisRequest::new(
            image,
            self.model.clone(),
            self.instruction.clone(),
            self.schema.clone(),
        );
        let start = Instant::now();
        tracing::debug!(
            model = %self.model,
            captured_at = %image.captured_at(),
            bytes = request.image_data.len(),
            "Sending analysis request"
        );

        let response = self.backend.generate(&request).await.map_err(|e| {
            tracing::warn!(
                backend = self.backend.name(),
                error = %e,
                "Analysis request failed"
            );
            AnalysisError::from(e)
        })?;

        let elapsed_ms = start.elapsed().as_millis();
        let Some(text) = response.text.filter(|t| !t.trim().is_empty()) else {
            tracing::warn!(
                backend = self.backend.name(),
                finish_reason = response.finish_reason.as_deref().unwrap_or("unknown"),
                elapsed_ms,
                "Analysis response had no content"
            );
            return Err(AnalysisError::EmptyResponse);
        };

        match parse_analysis(&text) {
            Ok(result) => {
                tracing::info!(
                    emotion = %result.emotion,
                    elapsed_ms,
                    "Analysis complete"
                );
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(error = %e, elapsed_ms, "Analysis response rejected");
                Err(e)
            }
        }
    }
}
