//! Captured Still Images
//!
//! A captured still travels through the pipeline in its transport form, a
//! `data:image/jpeg;base64,...` URI. The surface can show it as-is and the
//! analysis client strips the prefix before upload.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};

use crate::error::ImageDataError;

/// Encoding of a captured still
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageMime {
    /// JPEG (what the capture provider produces)
    Jpeg,
    /// PNG
    Png,
}

impl ImageMime {
    /// MIME type string
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Parse the subtype of an `image/*` MIME type
    fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype {
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImageMime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remove a `data:image/(png|jpeg|jpg);base64,` prefix if present
///
/// Anything else is returned unchanged.
#[must_use]
pub fn strip_transport_prefix(encoded: &str) -> &str {
    encoded
        .strip_prefix("data:image/")
        .and_then(|rest| rest.split_once(";base64,"))
        .filter(|(subtype, _)| ImageMime::from_subtype(subtype).is_some())
        .map_or(encoded, |(_, payload)| payload)
}

/// One encoded still frame
#[derive(Clone, Debug, PartialEq)]
pub struct CapturedImage {
    data_uri: String,
    mime: ImageMime,
    dimensions: Option<(u32, u32)>,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    /// Wrap freshly encoded JPEG bytes
    #[must_use]
    pub fn from_jpeg(bytes: &[u8], width: u32, height: u32) -> Self {
        Self {
            data_uri: format!("data:image/jpeg;base64,{}", STANDARD.encode(bytes)),
            mime: ImageMime::Jpeg,
            dimensions: Some((width, height)),
            captured_at: Utc::now(),
        }
    }

    /// Wrap an externally produced data URI
    ///
    /// A bare base64 string is taken to be JPEG.
    ///
    /// # Errors
    ///
    /// Fails if the URI names an unsupported image type or the payload is
    /// not valid base64.
    pub fn from_data_uri(uri: impl Into<String>) -> Result<Self, ImageDataError> {
        let uri = uri.into();

        let (mime, payload) = match uri.strip_prefix("data:") {
            Some(rest) => {
                let (media_type, payload) = rest
                    .split_once(";base64,")
                    .ok_or_else(|| ImageDataError::UnsupportedType(rest.chars().take(32).collect()))?;
                let mime = media_type
                    .strip_prefix("image/")
                    .and_then(ImageMime::from_subtype)
                    .ok_or_else(|| ImageDataError::UnsupportedType(media_type.to_string()))?;
                (mime, payload)
            }
            None => (ImageMime::Jpeg, uri.as_str()),
        };

        STANDARD.decode(payload)?;

        let data_uri = format!("data:{mime};base64,{payload}");
        Ok(Self {
            data_uri,
            mime,
            dimensions: None,
            captured_at: Utc::now(),
        })
    }

    /// The transport form, usable directly as an image source
    #[must_use]
    pub fn data_uri(&self) -> &str {
        &self.data_uri
    }

    /// Base64 payload without the transport prefix
    #[must_use]
    pub fn payload(&self) -> &str {
        strip_transport_prefix(&self.data_uri)
    }

    /// Decoded image bytes
    ///
    /// # Errors
    ///
    /// Fails only if the stored payload is not valid base64.
    pub fn bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.payload())
    }

    /// Encoding of the image
    #[must_use]
    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    /// Pixel dimensions, when known
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    /// When the still was taken
    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}
