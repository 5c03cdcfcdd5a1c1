//! Camera Device Traits
//!
//! The camera is an external collaborator. These traits are the seam between
//! the capture provider and whatever media-capture capability the host offers.
//!
//! A device hands out a [`VideoTrack`] per acquisition. The provider wraps
//! every track in a release guard, so implementations only need to make
//! `stop()` free the underlying handle.

use async_trait::async_trait;
use image::DynamicImage;

use crate::error::CaptureError;

/// Which camera to prefer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    /// Front camera, looking at the user
    #[default]
    User,
    /// Rear camera
    Environment,
}

/// Constraints requested when acquiring a camera
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureConstraints {
    /// Preferred camera
    pub facing: Facing,
    /// Ideal frame width in pixels (best effort)
    pub ideal_width: u32,
    /// Ideal frame height in pixels (best effort)
    pub ideal_height: u32,
    /// Whether an audio track is wanted
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::User,
            ideal_width: 640,
            ideal_height: 480,
            audio: false,
        }
    }
}

impl CaptureConstraints {
    /// Set the ideal resolution
    #[must_use]
    pub fn with_ideal_size(mut self, width: u32, height: u32) -> Self {
        self.ideal_width = width;
        self.ideal_height = height;
        self
    }
}

/// A live video track handed out by a [`CameraDevice`]
pub trait VideoTrack: Send {
    /// Latest frame from the stream, `None` until the first frame arrives
    fn read_frame(&mut self) -> Option<DynamicImage>;

    /// Release the device handle behind this track
    fn stop(&mut self);
}

/// Camera device trait
///
/// Implement this trait to expose a platform camera to the pipeline.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Device name for logging
    fn name(&self) -> &str;

    /// Acquire the device and begin streaming
    ///
    /// Fails with [`CaptureError::DeviceUnavailable`] when permission is
    /// denied, no device matches, or the device is held elsewhere.
    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn VideoTrack>, CaptureError>;
}
