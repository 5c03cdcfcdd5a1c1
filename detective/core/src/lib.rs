//! Detective Core - Headless Capture-to-Analysis Pipeline
//!
//! This crate provides the core logic of the AI Emotion Detective, completely
//! independent of any UI framework. A surface (kiosk, GUI, test harness)
//! feeds user events in and draws the views it is handed.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         UI Surface                            │
//! │          UserEvent (up)          ControllerMessage (down)     │
//! └───────────────────────────────┬──────────────────────────────┘
//!                                 │
//! ┌───────────────────────────────┼──────────────────────────────┐
//! │                        DETECTIVE CORE                         │
//! │  ┌────────────────────────────┴───────────────────────────┐  │
//! │  │                       Controller                        │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐  │  │
//! │  │  │   Capture    │  │   Analysis   │  │  Presenter   │  │  │
//! │  │  │   Provider   │  │    Client    │  │  (pure view) │  │  │
//! │  │  └──────┬───────┘  └──────┬───────┘  └──────────────┘  │  │
//! │  └─────────┼─────────────────┼────────────────────────────┘  │
//! └────────────┼─────────────────┼───────────────────────────────┘
//!              │                 │
//!        CameraDevice     InferenceBackend
//!        (platform)        (Gemini REST)
//! ```
//!
//! Data flows one way: camera frame → encoded still → analysis request →
//! structured result → result card.
//!
//! # Key Types
//!
//! - [`Controller`]: The state machine that sequences one attempt at a time
//! - [`CaptureProvider`]: Owns the camera and produces mirrored JPEG stills
//! - [`AnalysisClient`]: Calls the inference service once and parses the answer
//! - [`View`]: What the surface should draw
//!
//! # Quick Start
//!
//! ```ignore
//! use detective_core::{
//!     load_config, AnalysisClient, CaptureProvider, Controller, GeminiBackend,
//!     StillImageCamera, UserEvent,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let camera = StillImageCamera::open("face.jpg")?;
//!     let capture = CaptureProvider::new(
//!         camera,
//!         config.camera.constraints(),
//!         config.camera.jpeg_quality,
//!     );
//!     let backend = GeminiBackend::from_settings(&config.service)?;
//!     let analysis = AnalysisClient::new(backend, &config.service.model);
//!
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let mut controller = Controller::new(capture, analysis, tx);
//!
//!     controller.handle_event(UserEvent::Start).await;
//!     controller.next_completion().await;
//!     controller.handle_event(UserEvent::Capture).await;
//!     controller.next_completion().await;
//!
//!     println!("{}", controller.view());
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`analysis`]: Inference backend seam, Gemini client, result schema
//! - [`capture`]: Camera seam, capture provider, still images
//! - [`config`]: TOML + environment configuration
//! - [`controller`]: The flow state machine
//! - [`error`]: Error types per pipeline boundary
//! - [`messages`]: Events, messages and fixed user-facing texts
//! - [`presenter`]: Pure rendering of the current state

#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod capture;
pub mod config;
pub mod controller;
pub mod error;
pub mod messages;
pub mod presenter;

#[cfg(test)]
mod test_utils;

// Re-exports for convenience
pub use analysis::{
    AnalysisClient, AnalysisRequest, AnalysisResult, Emotion, GeminiBackend, InferenceBackend,
    InferenceResponse,
};
pub use capture::{
    CameraDevice, CaptureConstraints, CaptureProvider, CaptureSession, CapturedImage, Facing,
    ImageMime, StillImageCamera, VideoTrack,
};
pub use config::{load_config, load_config_from_path, ConfigError, DetectiveConfig};
pub use controller::{Controller, RequestToken};
pub use error::{AnalysisError, CaptureError, DeviceFailure, ImageDataError};
pub use messages::{ControllerMessage, FlowState, UserEvent};
pub use presenter::{ResultCard, Theme, View};
