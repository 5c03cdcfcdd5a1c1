//! Controller Messages
//!
//! Events and messages exchanged between the controller and a surface.
//!
//! - [`UserEvent`]: Surface → Controller (what the user did)
//! - [`ControllerMessage`]: Controller → Surface (what changed)
//!
//! The fixed user-facing failure texts also live here, so every surface shows
//! the same words.

use crate::analysis::AnalysisResult;
use crate::capture::CapturedImage;

/// Shown when the camera cannot be acquired
pub const CAMERA_UNAVAILABLE_MESSAGE: &str =
    "카메라를 켤 수 없어요. 설정에서 카메라 권한을 허용해주세요!";

/// Shown when no still could be taken
pub const CAPTURE_FAILED_MESSAGE: &str =
    "사진을 찍지 못했어요. 카메라가 준비되면 다시 찍어볼까요?";

/// Shown for every analysis failure
pub const ANALYSIS_FAILED_MESSAGE: &str = "AI가 잠시 생각에 잠겼나봐요. 다시 시도해볼까요?";

/// Stage of the capture-to-analysis flow
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlowState {
    /// Welcome screen
    #[default]
    Intro,
    /// Camera preview, waiting for the shutter
    Capturing,
    /// Waiting for the inference service
    Analyzing,
    /// Result card on screen
    ResultReady,
    /// Something went wrong; the user may retry
    Failed,
}

impl FlowState {
    /// Short name for logs
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Intro => "intro",
            Self::Capturing => "capturing",
            Self::Analyzing => "analyzing",
            Self::ResultReady => "result_ready",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events from the surface to the controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserEvent {
    /// Leave the intro and open the camera
    Start,
    /// Press the shutter
    Capture,
    /// Try again from a result or failure
    Retry,
    /// Go back to the intro from anywhere
    Home,
}

/// Messages from the controller to the surface
#[derive(Clone, Debug)]
pub enum ControllerMessage {
    /// The flow moved to a new stage
    State {
        /// The new stage
        state: FlowState,
    },

    /// The camera is streaming and the shutter can be pressed
    CameraReady,

    /// Analysis finished
    ResultReady {
        /// The still that was analyzed
        image: CapturedImage,
        /// The classification
        result: AnalysisResult,
    },

    /// The attempt failed
    Failed {
        /// Fixed, child-friendly text
        message: &'static str,
    },
}
