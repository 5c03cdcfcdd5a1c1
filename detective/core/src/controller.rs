//! Controller - The Flow Coordinator
//!
//! The controller sequences one capture-to-analysis cycle at a time:
//!
//! ```text
//! Intro        --Start------------------> Capturing
//! Capturing    --capture succeeds-------> Analyzing
//! Capturing    --camera/capture fails---> Failed
//! Analyzing    --analysis succeeds------> ResultReady
//! Analyzing    --analysis fails---------> Failed
//! ResultReady  --Retry------------------> Capturing
//! Failed       --Retry------------------> Capturing
//! any state    --Home-------------------> Intro
//! ```
//!
//! Like the rest of the core it is UI-agnostic. A surface feeds
//! [`UserEvent`]s in, listens for [`ControllerMessage`]s, and draws
//! [`Controller::view`].
//!
//! # Asynchronous work
//!
//! Camera acquisition and the analysis call run as tokio tasks. Each one is
//! tagged with a fresh [`RequestToken`] and reports back over an internal
//! channel. The surface drives delivery with [`Controller::next_completion`]
//! or [`Controller::poll_completions`]. A completion whose token is no
//! longer the pending one is dropped, so a result for an abandoned attempt
//! can never overwrite a newer one.
//!
//! The camera is exclusive. Before a new acquisition starts, and whenever the
//! flow leaves the capturing stage, the previous acquisition task is aborted
//! and awaited and any session it already delivered is dropped, so at most
//! one device handle is ever live.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::analysis::{AnalysisClient, AnalysisResult, InferenceBackend};
use crate::capture::{CameraDevice, CaptureProvider, CaptureSession, CapturedImage};
use crate::error::{AnalysisError, CaptureError};
use crate::messages::{
    ControllerMessage, FlowState, UserEvent, ANALYSIS_FAILED_MESSAGE, CAMERA_UNAVAILABLE_MESSAGE,
    CAPTURE_FAILED_MESSAGE,
};
use crate::presenter::{self, View};

/// Identifies one asynchronous operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl RequestToken {
    /// Raw counter value
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Outcome of a spawned operation
enum Completion {
    Device {
        token: RequestToken,
        outcome: Result<CaptureSession, CaptureError>,
    },
    Analysis {
        token: RequestToken,
        outcome: Result<AnalysisResult, AnalysisError>,
    },
}

impl Completion {
    fn token(&self) -> RequestToken {
        match self {
            Self::Device { token, .. } | Self::Analysis { token, .. } => *token,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Device { .. } => "device",
            Self::Analysis { .. } => "analysis",
        }
    }
}

/// The controller - owner of all cross-step state
pub struct Controller<D: CameraDevice, B: InferenceBackend> {
    /// Camera owner
    capture: CaptureProvider<D>,
    /// Shared with in-flight analysis tasks
    analysis: Arc<AnalysisClient<B>>,
    /// Current stage
    state: FlowState,
    /// Still being analyzed or shown
    image: Option<CapturedImage>,
    /// Result on screen
    result: Option<AnalysisResult>,
    /// Fixed message of the last failure
    failure: Option<&'static str>,
    /// Whether the device session is installed
    camera_ready: bool,
    /// Last issued token
    last_token: u64,
    /// The only operation whose completion will be applied
    pending: Option<RequestToken>,
    /// Most recent camera acquisition task
    device_task: Option<JoinHandle<()>>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    /// Channel to the surface
    tx: mpsc::Sender<ControllerMessage>,
}

impl<D, B> Controller<D, B>
where
    D: CameraDevice + 'static,
    B: InferenceBackend + 'static,
{
    /// Create a controller in the intro state
    ///
    /// `tx` is bounded and [`handle_event`](Self::handle_event) awaits
    /// capacity on it, so the surface must keep draining the receiver. A
    /// receiver that is dropped is fine; one that is kept but never read
    /// stalls the controller once the channel fills.
    pub fn new(
        capture: CaptureProvider<D>,
        analysis: AnalysisClient<B>,
        tx: mpsc::Sender<ControllerMessage>,
    ) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        Self {
            capture,
            analysis: Arc::new(analysis),
            state: FlowState::Intro,
            image: None,
            result: None,
            failure: None,
            camera_ready: false,
            last_token: 0,
            pending: None,
            device_task: None,
            completion_tx,
            completion_rx,
            tx,
        }
    }

    /// Get current state
    pub fn state(&self) -> FlowState {
        self.state
    }

    /// The held still, if any
    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    /// The held result, if any
    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// Message recorded by the last failure
    pub fn failure(&self) -> Option<&'static str> {
        self.failure
    }

    /// Whether the camera is streaming
    pub fn is_camera_ready(&self) -> bool {
        self.camera_ready
    }

    /// Token of the operation still awaited, if any
    pub fn pending(&self) -> Option<RequestToken> {
        self.pending
    }

    /// The capture provider
    pub fn capture(&self) -> &CaptureProvider<D> {
        &self.capture
    }

    /// The analysis client
    pub fn analysis(&self) -> &AnalysisClient<B> {
        &self.analysis
    }

    /// Render the current state
    pub fn view(&self) -> View {
        presenter::render(
            self.state,
            self.camera_ready,
            self.image.as_ref(),
            self.result.as_ref(),
            self.failure,
        )
    }

    /// Handle an event from the surface
    ///
    /// Events not valid in the current state are ignored.
    pub async fn handle_event(&mut self, event: UserEvent) {
        match (self.state, event) {
            (_, UserEvent::Home) => self.go_home().await,
            (FlowState::Intro, UserEvent::Start)
            | (FlowState::ResultReady | FlowState::Failed, UserEvent::Retry) => {
                self.begin_capturing().await;
            }
            (FlowState::Capturing, UserEvent::Capture) => self.take_picture().await,
            (state, event) => {
                tracing::debug!(%state, ?event, "Ignoring event");
            }
        }
    }

    /// Wait for the next completion and apply it
    ///
    /// Returns `false` if the completion was stale and dropped. Only call
    /// this while something is outstanding; with nothing spawned it waits
    /// forever.
    pub async fn next_completion(&mut self) -> bool {
        match self.completion_rx.recv().await {
            Some(completion) => self.apply(completion).await,
            // Unreachable while we hold a sender
            None => false,
        }
    }

    /// Apply every completion that has already arrived
    ///
    /// Returns the number applied (stale ones are not counted).
    pub async fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            if self.apply(completion).await {
                applied += 1;
            }
        }
        applied
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    async fn begin_capturing(&mut self) {
        self.image = None;
        self.result = None;
        self.failure = None;
        self.camera_ready = false;
        self.release_camera().await;

        let token = self.issue_token();
        let acquisition = self.capture.acquisition();
        let completions = self.completion_tx.clone();
        self.device_task = Some(tokio::spawn(async move {
            let outcome = acquisition.await;
            if completions
                .send(Completion::Device { token, outcome })
                .is_err()
            {
                tracing::debug!(%token, "Controller gone, dropping camera session");
            }
        }));

        self.set_state(FlowState::Capturing).await;
    }

    async fn take_picture(&mut self) {
        let image = match self.capture.capture() {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %e, camera_ready = self.camera_ready, "Capture failed");
                self.fail(CAPTURE_FAILED_MESSAGE).await;
                return;
            }
        };

        self.capture.stop();
        self.camera_ready = false;
        self.image = Some(image.clone());

        let token = self.issue_token();
        let client = Arc::clone(&self.analysis);
        let completions = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = client.analyze(&image).await;
            if completions
                .send(Completion::Analysis { token, outcome })
                .is_err()
            {
                tracing::debug!(%token, "Controller gone, dropping analysis result");
            }
        });

        self.set_state(FlowState::Analyzing).await;
    }

    async fn go_home(&mut self) {
        self.release_camera().await;
        self.pending = None;
        self.camera_ready = false;
        self.image = None;
        self.result = None;
        self.failure = None;
        self.set_state(FlowState::Intro).await;
    }

    async fn fail(&mut self, message: &'static str) {
        self.release_camera().await;
        self.pending = None;
        self.camera_ready = false;
        self.failure = Some(message);
        self.set_state(FlowState::Failed).await;
        self.send(ControllerMessage::Failed { message }).await;
    }

    async fn apply(&mut self, completion: Completion) -> bool {
        let token = completion.token();
        if self.pending != Some(token) {
            tracing::debug!(
                %token,
                kind = completion.kind(),
                pending = ?self.pending,
                "Dropping stale completion"
            );
            return false;
        }
        self.pending = None;

        match completion {
            Completion::Device { outcome, .. } => match outcome {
                Ok(session) => {
                    self.capture.install(session);
                    self.camera_ready = true;
                    tracing::debug!(%token, "Camera ready");
                    self.send(ControllerMessage::CameraReady).await;
                }
                Err(e) => {
                    tracing::warn!(%token, error = %e, "Camera unavailable");
                    self.fail(CAMERA_UNAVAILABLE_MESSAGE).await;
                }
            },
            Completion::Analysis { outcome, .. } => match outcome {
                Ok(result) => {
                    self.result = Some(result.clone());
                    self.set_state(FlowState::ResultReady).await;
                    if let Some(image) = self.image.clone() {
                        self.send(ControllerMessage::ResultReady { image, result })
                            .await;
                    }
                }
                Err(e) => {
                    tracing::warn!(%token, error = %e, "Analysis failed");
                    self.fail(ANALYSIS_FAILED_MESSAGE).await;
                }
            },
        }
        true
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Release the held session and any acquisition still in flight
    ///
    /// Every queued completion is dropped too: callers are about to replace
    /// or clear the pending token, which makes all of them stale.
    async fn release_camera(&mut self) {
        self.capture.stop();

        if let Some(task) = self.device_task.take() {
            task.abort();
            // Resolves once the task has either finished or been dropped
            let _ = task.await;
        }

        let mut dropped = 0;
        while let Ok(completion) = self.completion_rx.try_recv() {
            tracing::debug!(
                token = %completion.token(),
                kind = completion.kind(),
                "Discarding queued completion"
            );
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "Released queued camera sessions");
        }
    }

    fn issue_token(&mut self) -> RequestToken {
        self.last_token += 1;
        let token = RequestToken(self.last_token);
        self.pending = Some(token);
        token
    }

    async fn set_state(&mut self, state: FlowState) {
        if self.state != state {
            tracing::info!(from = %self.state, to = %state, "Flow state changed");
        }
        self.state = state;
        self.send(ControllerMessage::State { state }).await;
    }

    /// Send a message to the surface
    async fn send(&self, msg: ControllerMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}
