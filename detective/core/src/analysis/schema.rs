//! Analysis Result and Output Schema
//!
//! The remote model is told to constrain its answer to [`response_schema`],
//! and the answer is parsed into [`AnalysisResult`]. The two must describe
//! the same field set with the same required fields, otherwise fields are
//! silently dropped on one side. The tests at the bottom of this file pin
//! them together.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AnalysisError;

/// Task description sent with every image
pub const ANALYSIS_INSTRUCTION: &str = "\
You are a kind AI teacher for elementary school students.
Look at the face in this photo and decide which emotion it shows.
Audience: Korean elementary school students. Use simple, polite and playful Korean.

Task:
1. Pick the main emotion: one of Happy, Sad, Angry, Surprised, Neutral, Fear, Disgust.
2. Pick one emoji that matches the emotion.
3. Write one warm, encouraging sentence that explains the feeling.
4. Give 1-2 simple visual clues (for example \"입꼬리가 올라갔어요\", \"눈썹이 찌푸려졌어요\").

Answer in JSON.";

/// Fields the service must always return
pub const REQUIRED_FIELDS: [&str; 5] =
    ["emotion", "koreanLabel", "emoji", "description", "reasoning"];

/// Most visual clues a result may carry
const MAX_REASONS: usize = 2;

// ============================================================================
// Emotion
// ============================================================================

/// Closed emotion taxonomy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Emotion {
    /// 행복
    Happy,
    /// 슬픔
    Sad,
    /// 화남
    Angry,
    /// 놀람
    Surprised,
    /// 무표정
    Neutral,
    /// 두려움
    Fear,
    /// 싫음
    Disgust,
}

impl Emotion {
    /// Every category, in prompt order
    pub const ALL: [Emotion; 7] = [
        Self::Happy,
        Self::Sad,
        Self::Angry,
        Self::Surprised,
        Self::Neutral,
        Self::Fear,
        Self::Disgust,
    ];

    /// Canonical wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "Happy",
            Self::Sad => "Sad",
            Self::Angry => "Angry",
            Self::Surprised => "Surprised",
            Self::Neutral => "Neutral",
            Self::Fear => "Fear",
            Self::Disgust => "Disgust",
        }
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown emotion category {wanted:?}"))
    }
}

impl TryFrom<String> for Emotion {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ============================================================================
// Analysis Result
// ============================================================================

/// Structured emotion classification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Primary emotion
    pub emotion: Emotion,
    /// Short Korean label, e.g. "행복해요"
    pub korean_label: String,
    /// One representative emoji
    pub emoji: String,
    /// Friendly sentence for a child
    pub description: String,
    /// 1-2 simple visual clues, in order
    pub reasoning: Vec<String>,
    /// Model confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl AnalysisResult {
    /// Check the invariants a displayable result must satisfy
    ///
    /// # Errors
    ///
    /// Returns a short reason naming the first violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        if self.korean_label.trim().is_empty() {
            return Err("koreanLabel is empty".to_string());
        }
        if self.emoji.trim().is_empty() {
            return Err("emoji is empty".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("description is empty".to_string());
        }
        if !self.reasoning.iter().any(|r| !r.trim().is_empty()) {
            return Err("reasoning has no non-empty entry".to_string());
        }
        if self.reasoning.len() > MAX_REASONS {
            return Err(format!(
                "reasoning has {} entries (max {MAX_REASONS})",
                self.reasoning.len()
            ));
        }
        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(format!("confidence {confidence} outside [0, 1]"));
            }
        }
        Ok(())
    }

    /// Confidence as a whole percentage, if reported
    #[must_use]
    pub fn confidence_percent(&self) -> Option<u8> {
        self.confidence.map(|c| (c * 100.0).round().clamp(0.0, 100.0) as u8)
    }
}

/// Structured-output schema matching [`AnalysisResult`]
#[must_use]
pub fn response_schema() -> Value {
    let categories: Vec<&str> = Emotion::ALL.iter().map(|e| e.as_str()).collect();

    json!({
        "type": "OBJECT",
        "properties": {
            "emotion": {
                "type": "STRING",
                "format": "enum",
                "enum": categories,
            },
            "koreanLabel": {
                "type": "STRING",
                "description": "Simple Korean emotion name like '행복해요', '슬퍼요'",
            },
            "emoji": {
                "type": "STRING",
                "description": "A single emoji",
            },
            "description": {
                "type": "STRING",
                "description": "A friendly sentence for a child",
            },
            "reasoning": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "minItems": 1,
                "maxItems": MAX_REASONS,
                "description": "Simple visual cues in Korean",
            },
            "confidence": {
                "type": "NUMBER",
            },
        },
        "required": REQUIRED_FIELDS,
    })
}

/// Parse and validate the service's JSON text
///
/// # Errors
///
/// Returns [`AnalysisError::MalformedResponse`] when the text is not the
/// expected shape or breaks a result invariant.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, AnalysisError> {
    let result: AnalysisResult = serde_json::from_str(text.trim())
        .map_err(|e| AnalysisError::MalformedResponse(e.to_string()))?;
    result.validate().map_err(AnalysisError::MalformedResponse)?;
    Ok(result)
}
