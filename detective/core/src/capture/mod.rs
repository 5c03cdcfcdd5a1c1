//! Camera Capture
//!
//! This module acquires a camera through a common trait interface and turns
//! the live frame into a mirrored, JPEG-encoded still.
//!
//! # Available Devices
//!
//! - **StillImageCamera**: serves a fixed picture as its video feed (kiosk
//!   runs, demos, tests)
//! - Platform cameras plug in by implementing [`CameraDevice`]
//!
//! # Usage
//!
//! ```ignore
//! use detective_core::capture::{CaptureProvider, StillImageCamera};
//!
//! let camera = StillImageCamera::open("face.png")?;
//! let mut provider = CaptureProvider::new(camera, Default::default(), 0.8);
//! provider.start().await?;
//! let image = provider.capture()?;
//! provider.stop();
//! ```

mod captured;
mod provider;
mod still;
mod traits;

pub use captured::{strip_transport_prefix, CapturedImage, ImageMime};
pub use provider::{CaptureProvider, CaptureSession};
pub use still::StillImageCamera;
pub use traits::{CameraDevice, CaptureConstraints, Facing, VideoTrack};
