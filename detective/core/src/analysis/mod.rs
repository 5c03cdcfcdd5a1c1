//! Emotion Analysis
//!
//! This module sends a captured still to a remote multimodal model and parses
//! the structured answer into an [`AnalysisResult`].
//!
//! # Available Backends
//!
//! - **Gemini**: Google `generateContent` REST API (default)
//! - Other services plug in by implementing [`InferenceBackend`]
//!
//! # Usage
//!
//! ```ignore
//! use detective_core::analysis::{AnalysisClient, GeminiBackend};
//!
//! let backend = GeminiBackend::from_settings(&config.service)?;
//! let client = AnalysisClient::new(backend, &config.service.model);
//! let result = client.analyze(&image).await?;
//! println!("{} {}", result.emoji, result.korean_label);
//! ```

mod client;
mod gemini;
mod schema;
mod traits;

pub use client::AnalysisClient;
pub use gemini::GeminiBackend;
pub use schema::{
    parse_analysis, response_schema, AnalysisResult, Emotion, ANALYSIS_INSTRUCTION,
    REQUIRED_FIELDS,
};
pub use traits::{AnalysisRequest, InferenceBackend, InferenceResponse};
