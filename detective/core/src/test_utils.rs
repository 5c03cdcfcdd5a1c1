//! Test doubles for the camera and inference seams

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::oneshot;

use crate::analysis::{AnalysisRequest, InferenceBackend, InferenceResponse};
use crate::capture::{CameraDevice, CaptureConstraints, VideoTrack};
use crate::error::{CaptureError, DeviceFailure};

/// A valid "Happy" answer
pub fn happy_body() -> String {
    json!({
        "emotion": "Happy",
        "koreanLabel": "행복해요",
        "emoji": "😊",
        "description": "활짝 웃는 얼굴이 정말 멋져요!",
        "reasoning": ["입꼬리가 올라갔어요"],
        "confidence": 0.92,
    })
    .to_string()
}

/// A valid "Sad" answer
pub fn sad_body() -> String {
    json!({
        "emotion": "Sad",
        "koreanLabel": "슬퍼요",
        "emoji": "😢",
        "description": "조금 속상한 일이 있었나봐요. 괜찮아요!",
        "reasoning": ["입꼬리가 내려갔어요", "눈썹이 처졌어요"],
    })
    .to_string()
}

// ============================================================================
// Camera
// ============================================================================

/// Shared acquire/release counters for a [`CountingCamera`]
#[derive(Clone, Default)]
pub struct CameraStats {
    acquired: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    busy: Arc<AtomicUsize>,
    held: Arc<AtomicBool>,
}

impl CameraStats {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn busy_rejections(&self) -> usize {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

/// Exclusive camera that counts every acquisition and release
#[derive(Clone)]
pub struct CountingCamera {
    frame: Option<DynamicImage>,
    permission_denied: bool,
    stats: CameraStats,
}

impl CountingCamera {
    pub fn new() -> Self {
        Self::with_frame(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            64,
            48,
            Rgb([200, 180, 160]),
        )))
    }

    pub fn with_frame(frame: DynamicImage) -> Self {
        Self {
            frame: Some(frame),
            permission_denied: false,
            stats: CameraStats::default(),
        }
    }

    /// Stream never delivers a frame
    pub fn without_frames(mut self) -> Self {
        self.frame = None;
        self
    }

    pub fn denying_permission(mut self) -> Self {
        self.permission_denied = true;
        self
    }

    pub fn stats(&self) -> CameraStats {
        self.stats.clone()
    }
}

#[async_trait]
impl CameraDevice for CountingCamera {
    fn name(&self) -> &str {
        "counting"
    }

    async fn acquire(
        &self,
        _constraints: &CaptureConstraints,
    ) -> Result<Box<dyn VideoTrack>, CaptureError> {
        if self.permission_denied {
            return Err(CaptureError::permission_denied());
        }
        if self.stats.held.swap(true, Ordering::SeqCst) {
            self.stats.busy.fetch_add(1, Ordering::SeqCst);
            return Err(CaptureError::DeviceUnavailable(DeviceFailure::Busy));
        }
        self.stats.acquired.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(CountingTrack {
            frame: self.frame.clone(),
            stats: self.stats.clone(),
            stopped: false,
        }))
    }
}

struct CountingTrack {
    frame: Option<DynamicImage>,
    stats: CameraStats,
    stopped: bool,
}

impl VideoTrack for CountingTrack {
    fn read_frame(&mut self) -> Option<DynamicImage> {
        if self.stopped {
            return None;
        }
        self.frame.clone()
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stats.released.fetch_add(1, Ordering::SeqCst);
            self.stats.held.store(false, Ordering::SeqCst);
        }
    }
}

// ============================================================================
// Inference
// ============================================================================

type Reply = anyhow::Result<InferenceResponse>;

enum Script {
    Text(String),
    Empty,
    Fail(String),
}

#[derive(Default)]
struct ScriptState {
    replies: Vec<Script>,
    calls: usize,
    last_request: Option<AnalysisRequest>,
}

/// Backend answering from a fixed script, in order
///
/// Once the script is exhausted the last entry repeats.
#[derive(Clone, Default)]
pub struct ScriptedBackend {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.state.lock().replies.push(Script::Text(text.into()));
        self
    }

    pub fn empty(self) -> Self {
        self.state.lock().replies.push(Script::Empty);
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.state.lock().replies.push(Script::Fail(message.into()));
        self
    }

    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }

    pub fn last_request(&self) -> Option<AnalysisRequest> {
        self.state.lock().last_request.clone()
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn generate(&self, request: &AnalysisRequest) -> Reply {
        let mut state = self.state.lock();
        let index = state.calls.min(state.replies.len().saturating_sub(1));
        state.calls += 1;
        state.last_request = Some(request.clone());

        match state.replies.get(index) {
            Some(Script::Text(text)) => Ok(InferenceResponse::with_text(text.clone())),
            Some(Script::Empty) => Ok(InferenceResponse::empty()),
            Some(Script::Fail(message)) => Err(anyhow::anyhow!("{message}")),
            None => Err(anyhow::anyhow!("no scripted reply")),
        }
    }
}

#[derive(Default)]
struct GateState {
    calls: usize,
    senders: Vec<Option<oneshot::Sender<Reply>>>,
    receivers: Vec<Option<oneshot::Receiver<Reply>>>,
}

impl GateState {
    fn ensure(&mut self, call: usize) {
        while self.senders.len() <= call {
            let (tx, rx) = oneshot::channel();
            self.senders.push(Some(tx));
            self.receivers.push(Some(rx));
        }
    }
}

/// Backend whose calls block until the test releases them
///
/// Calls are numbered from 0 in arrival order; either side may come first.
#[derive(Clone, Default)]
pub struct GatedBackend {
    state: Arc<Mutex<GateState>>,
}

impl GatedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.state.lock().calls
    }

    /// Yield to spawned tasks until `n` calls have arrived
    pub async fn wait_for_calls(&self, n: usize) {
        for _ in 0..1000 {
            if self.calls() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {n} calls, saw {}", self.calls());
    }

    /// Let call `call` finish with `text`
    pub fn release(&self, call: usize, text: impl Into<String>) {
        self.send(call, Ok(InferenceResponse::with_text(text)));
    }

    fn send(&self, call: usize, reply: Reply) {
        let mut state = self.state.lock();
        state.ensure(call);
        if let Some(tx) = state.senders[call].take() {
            let _ = tx.send(reply);
        }
    }
}

#[async_trait]
impl InferenceBackend for GatedBackend {
    fn name(&self) -> &str {
        "gated"
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn generate(&self, _request: &AnalysisRequest) -> Reply {
        let rx = {
            let mut state = self.state.lock();
            let call = state.calls;
            state.calls += 1;
            state.ensure(call);
            state.receivers[call].take()
        };

        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(anyhow::anyhow!("gate dropped"))),
            None => Err(anyhow::anyhow!("gate already used")),
        }
    }
}
