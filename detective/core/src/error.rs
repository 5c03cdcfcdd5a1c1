//! Error Types
//!
//! One error enum per pipeline boundary. Every variant is terminal for the
//! current attempt: the controller turns it into a fixed, child-friendly
//! message and logs the cause. Raw error text never reaches the surface.

use thiserror::Error;

/// Boxed cause carried by transport failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Capture Errors
// =============================================================================

/// Why a camera device could not be acquired
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceFailure {
    /// The user (or platform policy) refused camera access
    PermissionDenied,
    /// No camera matching the constraints exists
    NotFound,
    /// Another session already holds the device
    Busy,
    /// Anything else the platform reported
    Other(String),
}

impl std::fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::NotFound => write!(f, "no camera found"),
            Self::Busy => write!(f, "device busy"),
            Self::Other(reason) => write!(f, "{reason}"),
        }
    }
}

/// Errors raised by the capture provider
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Camera permission was denied or no usable device exists
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(DeviceFailure),

    /// Capture was requested before the stream delivered a frame
    #[error("no video frame has been received yet")]
    NoActiveFrame,

    /// The sampled frame could not be encoded
    #[error("failed to encode captured frame: {0}")]
    Encode(#[from] image::ImageError),
}

impl CaptureError {
    /// Shorthand for a denied permission
    #[must_use]
    pub fn permission_denied() -> Self {
        Self::DeviceUnavailable(DeviceFailure::PermissionDenied)
    }

    /// Whether the failure happened while acquiring the device
    #[must_use]
    pub fn is_device_failure(&self) -> bool {
        matches!(self, Self::DeviceUnavailable(_))
    }
}

// =============================================================================
// Analysis Errors
// =============================================================================

/// Errors raised by the analysis client
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Network error, error status, or an undecodable envelope
    #[error("inference service unavailable: {0}")]
    ServiceUnavailable(#[source] BoxError),

    /// The service answered without any content
    #[error("inference service returned no content")]
    EmptyResponse,

    /// The content did not match the structured output contract
    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),
}

impl From<anyhow::Error> for AnalysisError {
    fn from(err: anyhow::Error) -> Self {
        Self::ServiceUnavailable(err.into())
    }
}

// =============================================================================
// Image Errors
// =============================================================================

/// Errors decoding an externally supplied data URI
#[derive(Debug, Error)]
pub enum ImageDataError {
    /// Data URI prefix names an image type we do not send
    #[error("unsupported image type in data URI: {0}")]
    UnsupportedType(String),

    /// Payload is not valid base64
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}
