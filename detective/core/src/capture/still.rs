//! Still Image Camera
//!
//! A front-facing camera whose video feed is one fixed picture. The kiosk
//! binary uses it to run the pipeline without camera hardware.
//!
//! Behaves like a real device where it matters to the pipeline: it can only
//! be held by one session at a time, it can refuse permission, and it honours
//! the ideal-size constraint by downscaling.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use image::DynamicImage;
use parking_lot::Mutex;

use super::traits::{CameraDevice, CaptureConstraints, Facing, VideoTrack};
use crate::error::{CaptureError, DeviceFailure};

/// Camera backed by a fixed picture
#[derive(Clone)]
pub struct StillImageCamera {
    name: String,
    frame: Arc<DynamicImage>,
    in_use: Arc<Mutex<bool>>,
    permission_denied: bool,
}

impl StillImageCamera {
    /// Camera serving `frame`
    #[must_use]
    pub fn new(frame: DynamicImage) -> Self {
        Self {
            name: "still-image".to_string(),
            frame: Arc::new(frame),
            in_use: Arc::new(Mutex::new(false)),
            permission_denied: false,
        }
    }

    /// Camera serving the picture stored at `path`
    ///
    /// # Errors
    ///
    /// A missing file reports [`DeviceFailure::NotFound`]; an undecodable one
    /// reports [`DeviceFailure::Other`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let path = path.as_ref();
        let frame = image::open(path).map_err(|e| {
            let failure = match e {
                image::ImageError::IoError(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                    DeviceFailure::NotFound
                }
                other => DeviceFailure::Other(other.to_string()),
            };
            CaptureError::DeviceUnavailable(failure)
        })?;

        let mut camera = Self::new(frame);
        camera.name = format!("still-image:{}", path.display());
        Ok(camera)
    }

    /// Make every acquisition fail as if the user refused access
    #[must_use]
    pub fn denying_permission(mut self) -> Self {
        self.permission_denied = true;
        self
    }

    /// Whether a session currently holds this camera
    #[must_use]
    pub fn is_in_use(&self) -> bool {
        *self.in_use.lock()
    }
}

#[async_trait]
impl CameraDevice for StillImageCamera {
    fn name(&self) -> &str {
        &self.name
    }

    async fn acquire(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Box<dyn VideoTrack>, CaptureError> {
        if self.permission_denied {
            return Err(CaptureError::permission_denied());
        }
        if constraints.facing != Facing::User {
            return Err(CaptureError::DeviceUnavailable(DeviceFailure::NotFound));
        }

        {
            let mut in_use = self.in_use.lock();
            if *in_use {
                return Err(CaptureError::DeviceUnavailable(DeviceFailure::Busy));
            }
            *in_use = true;
        }

        let frame = if self.frame.width() > constraints.ideal_width
            || self.frame.height() > constraints.ideal_height
        {
            self.frame
                .thumbnail(constraints.ideal_width, constraints.ideal_height)
        } else {
            (*self.frame).clone()
        };

        tracing::debug!(
            camera = %self.name,
            width = frame.width(),
            height = frame.height(),
            "Still camera acquired"
        );

        Ok(Box::new(StillTrack {
            frame,
            in_use: Arc::clone(&self.in_use),
            stopped: false,
        }))
    }
}

struct StillTrack {
    frame: DynamicImage,
    in_use: Arc<Mutex<bool>>,
    stopped: bool,
}

impl VideoTrack for StillTrack {
    fn read_frame(&mut self) -> Option<DynamicImage> {
        (!self.stopped).then(|| self.frame.clone())
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            *self.in_use.lock() = false;
        }
    }
}
