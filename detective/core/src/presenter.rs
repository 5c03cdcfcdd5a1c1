//! Result Presenter
//!
//! Pure rendering of the controller's state into a [`View`]. Nothing here
//! touches the camera or the network; a surface draws whatever view it is
//! handed. The only lookup is emotion → [`Theme`].

use std::fmt;

use crate::analysis::{AnalysisResult, Emotion};
use crate::capture::CapturedImage;
use crate::messages::FlowState;

/// Intro headline
pub const INTRO_HEADLINE: &str = "내 표정엔 어떤 감정이 숨어있을까?";
/// Intro body text
pub const INTRO_BODY: &str =
    "카메라를 켜고 활짝 웃거나, 찌푸려보세요! 인공지능이 친구들의 표정을 보고 기분을 맞춰볼게요.";
/// Camera tip
pub const CAMERA_TIP: &str = "💡 팁: 얼굴이 잘 보이게 밝은 곳에서 찍어주세요!";
/// Analyzing headline
pub const ANALYZING_HEADLINE: &str = "AI가 표정을 살펴보고 있어요...";
/// Analyzing hint
pub const ANALYZING_HINT: &str = "눈은 어떻게 생겼지? 입꼬리는 올라갔나? 🤔";
/// Error screen title
pub const ERROR_TITLE: &str = "어라? 문제가 생겼어요";
/// Shown if a failure carries no message
const UNKNOWN_ERROR_MESSAGE: &str = "알 수 없는 오류가 발생했습니다.";
/// Heading above the reasoning list
const REASONING_HEADING: &str = "AI 탐정의 추리 노트";

// ============================================================================
// Theme
// ============================================================================

/// 24-bit colour
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Colours of one theme
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    /// Card background
    pub background: Rgb,
    /// Label text
    pub text: Rgb,
    /// Card border
    pub border: Rgb,
}

/// Visual theme of a result card
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    /// Yellow
    Warm,
    /// Blue
    Cool,
    /// Red
    Alert,
    /// Purple
    Accent,
    /// Gray
    Neutral,
}

impl Theme {
    /// Theme for an emotion
    #[must_use]
    pub fn for_emotion(emotion: Emotion) -> Self {
        match emotion {
            Emotion::Happy => Self::Warm,
            Emotion::Sad => Self::Cool,
            Emotion::Angry => Self::Alert,
            Emotion::Surprised => Self::Accent,
            Emotion::Neutral | Emotion::Fear | Emotion::Disgust => Self::Neutral,
        }
    }

    /// Fixed colours for this theme
    #[must_use]
    pub fn palette(self) -> Palette {
        let (background, text, border) = match self {
            Self::Warm => (Rgb(0xFE, 0xF9, 0xC3), Rgb(0x85, 0x4D, 0x0E), Rgb(0xFA, 0xCC, 0x15)),
            Self::Cool => (Rgb(0xDB, 0xEA, 0xFE), Rgb(0x1E, 0x40, 0xAF), Rgb(0x60, 0xA5, 0xFA)),
            Self::Alert => (Rgb(0xFE, 0xE2, 0xE2), Rgb(0x99, 0x1B, 0x1B), Rgb(0xF8, 0x71, 0x71)),
            Self::Accent => (Rgb(0xF3, 0xE8, 0xFF), Rgb(0x6B, 0x21, 0xA8), Rgb(0xC0, 0x84, 0xFC)),
            Self::Neutral => (Rgb(0xF3, 0xF4, 0xF6), Rgb(0x1F, 0x29, 0x37), Rgb(0x9C, 0xA3, 0xAF)),
        };
        Palette {
            background,
            text,
            border,
        }
    }
}

// ============================================================================
// Views
// ============================================================================

/// Everything a surface needs to draw a result
#[derive(Clone, Debug, PartialEq)]
pub struct ResultCard {
    /// Classified emotion
    pub emotion: Emotion,
    /// Localized label
    pub label: String,
    /// Emoji
    pub emoji: String,
    /// Encouraging sentence
    pub description: String,
    /// Visual clues in display order
    pub reasoning: Vec<String>,
    /// Confidence as a whole percentage
    pub confidence_percent: Option<u8>,
    /// Data URI of the analyzed still
    pub image_src: String,
    /// Card theme
    pub theme: Theme,
}

impl ResultCard {
    /// Build the card for `result` taken from `image`
    #[must_use]
    pub fn new(result: &AnalysisResult, image: &CapturedImage) -> Self {
        Self {
            emotion: result.emotion,
            label: result.korean_label.clone(),
            emoji: result.emoji.clone(),
            description: result.description.clone(),
            reasoning: result.reasoning.clone(),
            confidence_percent: result.confidence_percent(),
            image_src: image.data_uri().to_string(),
            theme: Theme::for_emotion(result.emotion),
        }
    }

    /// Reasoning items numbered from 1
    pub fn numbered_reasoning(&self) -> impl Iterator<Item = (usize, &str)> {
        self.reasoning
            .iter()
            .enumerate()
            .map(|(i, r)| (i + 1, r.as_str()))
    }
}

impl fmt::Display for ResultCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", self.emoji, self.label)?;
        writeln!(f, "\"{}\"", self.description)?;
        writeln!(f)?;
        writeln!(f, "{REASONING_HEADING}")?;
        for (n, reason) in self.numbered_reasoning() {
            writeln!(f, "  {n}. {reason}")?;
        }
        if let Some(percent) = self.confidence_percent {
            writeln!(f, "확신도: {percent}%")?;
        }
        Ok(())
    }
}

/// What the surface should show
#[derive(Clone, Debug, PartialEq)]
pub enum View {
    /// Welcome screen
    Intro {
        /// Headline
        headline: &'static str,
        /// Body text
        body: &'static str,
    },
    /// Camera preview
    Camera {
        /// Whether the stream is live and the shutter can be pressed
        ready: bool,
        /// Hint shown under the preview
        tip: &'static str,
    },
    /// Waiting for the service
    Analyzing {
        /// The still being analyzed
        image_src: String,
        /// Headline
        headline: &'static str,
        /// Hint
        hint: &'static str,
    },
    /// Result card
    Result(ResultCard),
    /// Error screen
    Error {
        /// Title
        title: &'static str,
        /// Fixed failure text
        message: &'static str,
    },
}

impl View {
    fn error(message: &'static str) -> Self {
        Self::Error {
            title: ERROR_TITLE,
            message,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intro { headline, body } => writeln!(f, "{headline}\n{body}"),
            Self::Camera { ready, tip } => {
                let status = if *ready { "📷" } else { "⏳" };
                writeln!(f, "{status} {tip}")
            }
            Self::Analyzing { headline, hint, .. } => writeln!(f, "{headline}\n{hint}"),
            Self::Result(card) => write!(f, "{card}"),
            Self::Error { title, message } => writeln!(f, "{title}\n{message}"),
        }
    }
}

/// Render the current flow
///
/// `image` and `result` are whatever the controller holds; `failure` is the
/// fixed message recorded on entering [`FlowState::Failed`].
#[must_use]
pub fn render(
    state: FlowState,
    camera_ready: bool,
    image: Option<&CapturedImage>,
    result: Option<&AnalysisResult>,
    failure: Option<&'static str>,
) -> View {
    match state {
        FlowState::Intro => View::Intro {
            headline: INTRO_HEADLINE,
            body: INTRO_BODY,
        },
        FlowState::Capturing => View::Camera {
            ready: camera_ready,
            tip: CAMERA_TIP,
        },
        FlowState::Analyzing => match image {
            Some(image) => View::Analyzing {
                image_src: image.data_uri().to_string(),
                headline: ANALYZING_HEADLINE,
                hint: ANALYZING_HINT,
            },
            None => {
                tracing::warn!("Analyzing without a captured image");
                View::error(UNKNOWN_ERROR_MESSAGE)
            }
        },
        FlowState::ResultReady => match (result, image) {
            (Some(result), Some(image)) => View::Result(ResultCard::new(result, image)),
            _ => {
                tracing::warn!("Result state without a result");
                View::error(UNKNOWN_ERROR_MESSAGE)
            }
        },
        FlowState::Failed => View::error(failure.unwrap_or(UNKNOWN_ERROR_MESSAGE)),
    }
}
