//! Gemini Backend Implementation
//!
//! Inference backend for Google's Gemini models.
//!
//! # Gemini API
//!
//! Gemini provides a REST API for:
//! - `/models/{model}:generateContent` - Generate a complete answer
//! - `/models` - List available models
//!
//! This implementation sends the image inline next to the instruction and
//! asks for JSON constrained by the request's response schema.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::traits::{AnalysisRequest, InferenceBackend, InferenceResponse};
use crate::config::ServiceSettings;

/// Header carrying the API key
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini backend client
#[derive(Clone)]
pub struct GeminiBackend {
    /// API root, e.g. `https://generativelanguage.googleapis.com/v1beta`
    base_url: String,
    /// API key (omitted from requests when unset)
    api_key: Option<String>,
    /// HTTP client
    http_client: reqwest::Client,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url,
            api_key,
            http_client,
        })
    }

    /// Create from service settings
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be built.
    pub fn from_settings(settings: &ServiceSettings) -> anyhow::Result<Self> {
        if settings.api_key.is_none() {
            tracing::warn!("No Gemini API key configured - requests will likely be rejected");
        }
        Self::new(
            settings.base_url.clone(),
            settings.api_key.clone(),
            settings.request_timeout(),
        )
    }

    /// Get models endpoint URL
    fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }

    /// Get generate endpoint URL
    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    /// Attach the API key, if any
    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.api_key {
            Some(ref key) => builder.header(API_KEY_HEADER, key),
            None => builder,
        }
    }

    /// Build the `generateContent` request body
    fn build_body(request: &AnalysisRequest) -> Value {
        json!({
            "contents": [{
                "parts": [
                    {
                        "inlineData": {
                            "mimeType": request.mime_type.as_str(),
                            "data": request.image_data,
                        }
                    },
                    { "text": request.instruction },
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": request.response_schema,
            }
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, `None` if there is none
    fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }

    fn finish_reason(&self) -> Option<String> {
        self.candidates.first()?.finish_reason.clone()
    }
}

#[async_trait]
impl InferenceBackend for GeminiBackend {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn health_check(&self) -> bool {
        self.authorize(self.http_client.get(self.models_url()))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn generate(&self, request: &AnalysisRequest) -> anyhow::Result<InferenceResponse> {
        let start = Instant::now();
        let url = self.generate_url(&request.model);
        let body = Self::build_body(request);

        tracing::info!(
            model = %request.model,
            image_bytes = request.image_data.len(),
            "Sending analysis request"
        );

        let response = self
            .authorize(self.http_client.post(&url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini returned {status}: {body}");
        }

        let data: GenerateContentResponse = response
            .json()
            .await
            .context("Gemini response was not a generateContent envelope")?;

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(model = %request.model, duration_ms, "Gemini responded");

        Ok(InferenceResponse {
            text: data.text(),
            model: data
                .model_version
                .clone()
                .unwrap_or_else(|| request.model.clone()),
            finish_reason: data.finish_reason(),
            duration_ms: Some(duration_ms),
        })
    }
}
