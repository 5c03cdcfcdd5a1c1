//! Capture Provider
//!
//! Owns the camera while the flow is in its capturing stage and turns the
//! live frame into a [`CapturedImage`].
//!
//! The device handle is an acquire/release pair: every acquisition is held by
//! a [`CaptureSession`] whose `Drop` releases the track, so an abandoned,
//! superseded, or torn-down session never leaks the camera.

use std::future::Future;
use std::sync::Arc;

use image::codecs::jpeg::JpegEncoder;
use image::imageops;

use super::captured::CapturedImage;
use super::traits::{CameraDevice, CaptureConstraints, VideoTrack};
use crate::error::CaptureError;

/// Release guard around one acquired [`VideoTrack`]
pub struct CaptureSession {
    track: Box<dyn VideoTrack>,
    released: bool,
}

impl CaptureSession {
    /// Take ownership of an acquired track
    #[must_use]
    pub fn new(track: Box<dyn VideoTrack>) -> Self {
        Self {
            track,
            released: false,
        }
    }

    /// Latest frame from the stream
    pub fn read_frame(&mut self) -> Option<image::DynamicImage> {
        if self.released {
            return None;
        }
        self.track.read_frame()
    }

    /// Release the device track. Idempotent.
    pub fn release(&mut self) {
        if !self.released {
            self.track.stop();
            self.released = true;
            tracing::debug!("Camera track released");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

/// Camera owner for the capturing stage
pub struct CaptureProvider<D: CameraDevice> {
    device: Arc<D>,
    constraints: CaptureConstraints,
    /// JPEG quality, 1-100
    jpeg_quality: u8,
    session: Option<CaptureSession>,
}

impl<D: CameraDevice + 'static> CaptureProvider<D> {
    /// Create a provider for `device`
    ///
    /// `jpeg_quality` is a fraction in (0, 1], as configured.
    pub fn new(device: D, constraints: CaptureConstraints, jpeg_quality: f32) -> Self {
        Self::with_shared_device(Arc::new(device), constraints, jpeg_quality)
    }

    /// Create a provider around an already shared device
    pub fn with_shared_device(
        device: Arc<D>,
        constraints: CaptureConstraints,
        jpeg_quality: f32,
    ) -> Self {
        Self {
            device,
            constraints,
            jpeg_quality: quality_percent(jpeg_quality),
            session: None,
        }
    }

    /// The underlying device
    pub fn device(&self) -> &Arc<D> {
        &self.device
    }

    /// Whether a device session is currently held
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Acquire the camera and hold the resulting session
    ///
    /// Any previously held session is stopped first, so at most one device
    /// handle exists at a time.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::DeviceUnavailable`] if the device refuses.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        self.stop();
        let session = self.acquisition().await?;
        self.install(session);
        Ok(())
    }

    /// Detached acquisition future
    ///
    /// Lets a caller run the acquisition as a task and hand the session back
    /// with [`install`](Self::install) once it is known to be wanted. A
    /// session that is never installed releases itself on drop.
    pub fn acquisition(
        &self,
    ) -> impl Future<Output = Result<CaptureSession, CaptureError>> + Send + 'static {
        let device = Arc::clone(&self.device);
        let constraints = self.constraints.clone();
        async move {
            tracing::debug!(
                device = device.name(),
                width = constraints.ideal_width,
                height = constraints.ideal_height,
                "Acquiring camera"
            );
            let track = device.acquire(&constraints).await?;
            Ok(CaptureSession::new(track))
        }
    }

    /// Hold an acquired session, stopping any previous one
    pub fn install(&mut self, session: CaptureSession) {
        self.stop();
        self.session = Some(session);
    }

    /// Release the held session, if any
    ///
    /// Returns whether a session was released.
    pub fn stop(&mut self) -> bool {
        match self.session.take() {
            Some(mut session) => {
                session.release();
                true
            }
            None => false,
        }
    }

    /// Sample the current frame as a mirrored JPEG still
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NoActiveFrame`] if no session is held or the
    /// stream has not produced a frame, and [`CaptureError::Encode`] if
    /// JPEG encoding fails.
    pub fn capture(&mut self) -> Result<CapturedImage, CaptureError> {
        let frame = self
            .session
            .as_mut()
            .and_then(CaptureSession::read_frame)
            .ok_or(CaptureError::NoActiveFrame)?;

        // Match the mirrored preview the user sees
        let mirrored = imageops::flip_horizontal(&frame.to_rgb8());
        let (width, height) = mirrored.dimensions();

        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, self.jpeg_quality)
            .encode_image(&mirrored)?;

        tracing::debug!(
            width,
            height,
            bytes = encoded.len(),
            quality = self.jpeg_quality,
            "Captured still"
        );

        Ok(CapturedImage::from_jpeg(&encoded, width, height))
    }
}

/// Convert a (0, 1] quality fraction to the encoder's 1-100 scale
fn quality_percent(fraction: f32) -> u8 {
    (fraction * 100.0).round().clamp(1.0, 100.0) as u8
}
