//! Detective Kiosk
//!
//! Headless driver that runs one capture-to-analysis cycle and prints the
//! result card. The "camera" is a still picture on disk, which makes the
//! kiosk usable on machines without camera hardware and in smoke tests.
//!
//! # Usage
//!
//! ```bash
//! GEMINI_API_KEY=... DETECTIVE_FRAME=face.jpg detective-kiosk
//!
//! # With verbose logging
//! RUST_LOG=debug DETECTIVE_FRAME=face.jpg detective-kiosk
//! ```
//!
//! # Environment Variables
//!
//! - `DETECTIVE_FRAME`: Picture served as the camera feed (required)
//! - `DETECTIVE_CONFIG`: Config file (default: `~/.config/emotion-detective/detective.toml`)
//! - `GEMINI_API_KEY`: API key (fallback: `API_KEY`)
//! - `DETECTIVE_MODEL`, `DETECTIVE_SERVICE_URL`, `DETECTIVE_TIMEOUT_MS`,
//!   `DETECTIVE_JPEG_QUALITY`: Override config file values
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)
//!
//! # Exit Status
//!
//! Zero when a result card was printed, non-zero otherwise.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};

use detective_core::{
    config::{default_config_path, load_config_from_path},
    AnalysisClient, CaptureProvider, Controller, ControllerMessage, FlowState, GeminiBackend,
    InferenceBackend, StillImageCamera, UserEvent, View,
};

/// Extra time allowed on top of the request timeout
const GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("detective_kiosk=info".parse()?)
                .add_directive("detective_core=info".parse()?),
        )
        .with_target(true)
        .init();

    let config_path = std::env::var("DETECTIVE_CONFIG")
        .ok()
        .map(PathBuf::from)
        .or_else(default_config_path);
    let config = load_config_from_path(config_path)?;
    info!(
        source = %config.source(),
        model = %config.service.model,
        "Configuration loaded"
    );

    let frame_path = std::env::var("DETECTIVE_FRAME")
        .context("DETECTIVE_FRAME must point at a picture to use as the camera feed")?;
    let camera = tokio::task::spawn_blocking(move || open_camera(&frame_path))
        .await
        .context("Camera loader task failed")??;

    let backend = GeminiBackend::from_settings(&config.service)?;
    if !backend.health_check().await {
        warn!(url = %config.service.base_url, "Inference service is not reachable");
    }

    let capture = CaptureProvider::new(
        camera,
        config.camera.constraints(),
        config.camera.jpeg_quality,
    );
    let analysis = AnalysisClient::new(backend, config.service.model.clone());

    let (tx, mut rx) = mpsc::channel(100);
    let surface = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match msg {
                ControllerMessage::State { state } => info!(%state, "State"),
                ControllerMessage::CameraReady => info!("Camera ready"),
                ControllerMessage::ResultReady { result, .. } => {
                    info!(emotion = %result.emotion, "Result ready");
                }
                ControllerMessage::Failed { message } => warn!(reason = message, "Attempt failed"),
            }
        }
    });

    let mut controller = Controller::new(capture, analysis, tx);
    let wait = config.service.request_timeout() + GRACE;

    controller.handle_event(UserEvent::Start).await;
    if !settle(&mut controller, wait).await {
        return Ok(ExitCode::FAILURE);
    }
    if controller.state() == FlowState::Capturing {
        controller.handle_event(UserEvent::Capture).await;
        if !settle(&mut controller, wait).await {
            return Ok(ExitCode::FAILURE);
        }
    }

    let view = controller.view();
    println!("{view}");

    // Closes the message channel
    drop(controller);
    let _ = surface.await;

    Ok(match view {
        View::Result(_) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

/// Read and decode the picture served as the camera feed
fn open_camera(path: &str) -> anyhow::Result<StillImageCamera> {
    StillImageCamera::open(path).with_context(|| format!("Failed to open camera picture {path}"))
}

/// Wait until nothing is pending
///
/// Returns `false` on timeout or Ctrl+C.
async fn settle<D, B>(controller: &mut Controller<D, B>, wait: Duration) -> bool
where
    D: detective_core::CameraDevice + 'static,
    B: InferenceBackend + 'static,
{
    while controller.pending().is_some() {
        tokio::select! {
            outcome = tokio::time::timeout(wait, controller.next_completion()) => {
                if outcome.is_err() {
                    warn!(?wait, "Timed out waiting for the pipeline");
                    return false;
                }
            }
            _ = signal::ctrl_c() => {
                info!("Interrupted");
                return false;
            }
        }
    }
    true
}
