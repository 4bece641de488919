//! Camera sessions and still capture.
//!
//! This module owns everything between the camera device and an encoded
//! still: acquiring and releasing streams, binding them to display
//! surfaces, and turning the current frame into a JPEG.

mod camera;
mod capturer;
mod config;
mod frame;
#[cfg(feature = "camera")]
mod native;
mod session;
mod still;
mod surface;

pub use camera::{
    CameraError, CameraFailure, CameraProvider, MediaStream, MockBehavior, MockCameraProvider,
    MockDeviceStats, MockStream, Resolution,
};
pub use capturer::{CaptureError, FrameCapturer, JPEG_QUALITY};
pub use config::{FacingMode, StreamConstraints};
pub use frame::{CapturedFrame, EncodedFormat, VideoFrame, BYTES_PER_PIXEL};
#[cfg(feature = "camera")]
pub use native::{NativeCameraProvider, NativeStream};
pub use session::{CaptureSession, SessionState, SessionStats, StartOutcome};
pub use still::{StillImageCamera, StillImageStream};
pub use surface::{ImageSurface, Page, VideoSurface};
