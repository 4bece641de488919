//! Camera abstraction for stream acquisition.
//!
//! A [`CameraProvider`] grants access to a device and hands back an
//! exclusively-owned [`MediaStream`]. Real hardware, still images and
//! synthetic mocks all sit behind the same pair of traits.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{Rgb, RgbImage};
use thiserror::Error;

use super::{StreamConstraints, VideoFrame};

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// The user or platform refused camera access.
    #[error("camera permission denied: {0}")]
    PermissionDenied(String),
    /// No camera matches the request.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// Any other device or platform failure.
    #[error("camera device error: {0}")]
    Device(String),
    /// A frame could not be read from a live stream.
    #[error("failed to read frame: {0}")]
    ReadFailed(String),
    /// The stream has already been stopped.
    #[error("stream has been stopped")]
    Stopped,
}

impl CameraError {
    /// Classifies the error into the cause reported to callers.
    pub fn failure(&self) -> CameraFailure {
        match self {
            CameraError::PermissionDenied(_) => CameraFailure::PermissionDenied,
            CameraError::DeviceNotFound(_) => CameraFailure::DeviceNotFound,
            _ => CameraFailure::Other,
        }
    }
}

/// Tagged cause of a failed camera start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFailure {
    /// The user or platform refused access.
    PermissionDenied,
    /// No matching device exists.
    DeviceNotFound,
    /// Anything else, including a missing video surface.
    Other,
}

/// Native dimensions of a live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Creates a resolution.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if both dimensions are non-zero.
    pub fn is_usable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Grants access to a camera device.
#[allow(async_fn_in_trait)]
pub trait CameraProvider {
    /// Stream type handed out on success.
    type Stream: MediaStream;

    /// Requests access to a device matching `constraints`.
    ///
    /// May suspend while the platform prompts for permission.
    async fn open(&self, constraints: &StreamConstraints) -> Result<Self::Stream, CameraError>;
}

/// A live stream owned by exactly one capture session.
#[allow(async_fn_in_trait)]
pub trait MediaStream {
    /// Resolves once the stream reports its native dimensions.
    async fn loaded_metadata(&mut self) -> Result<Resolution, CameraError>;

    /// Reads the current frame.
    fn read_frame(&mut self) -> Result<VideoFrame, CameraError>;

    /// Stops every track. Idempotent.
    fn stop(&mut self);

    /// Returns true until [`stop`](Self::stop) is called.
    fn is_live(&self) -> bool;
}

/// How a [`MockCameraProvider`] answers an access request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MockBehavior {
    /// Access granted.
    #[default]
    Grant,
    /// Access refused.
    DenyPermission,
    /// No device present.
    NoDevice,
    /// Any other device failure.
    Fail(String),
}

/// Device-level counters shared between a mock provider and its streams.
#[derive(Debug, Default)]
pub struct MockDeviceStats {
    opened: AtomicUsize,
    released: AtomicUsize,
}

impl MockDeviceStats {
    /// Streams handed out.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Streams whose tracks were stopped.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Streams currently holding the device.
    pub fn live(&self) -> usize {
        self.opened().saturating_sub(self.released())
    }
}

/// Camera provider for testing that generates synthetic frames.
#[derive(Debug, Clone, Default)]
pub struct MockCameraProvider {
    behavior: MockBehavior,
    native: Option<Resolution>,
    delivered: Option<Resolution>,
    stats: Arc<MockDeviceStats>,
}

impl MockCameraProvider {
    /// Creates a provider that grants access.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how access requests are answered.
    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Fixes the native resolution instead of honouring the constraints.
    pub fn with_native_resolution(mut self, width: u32, height: u32) -> Self {
        self.native = Some(Resolution::new(width, height));
        self
    }

    /// Delivers frames at a size different from the native resolution.
    pub fn with_delivered_resolution(mut self, width: u32, height: u32) -> Self {
        self.delivered = Some(Resolution::new(width, height));
        self
    }

    /// Shared device counters.
    pub fn stats(&self) -> Arc<MockDeviceStats> {
        Arc::clone(&self.stats)
    }
}

impl CameraProvider for MockCameraProvider {
    type Stream = MockStream;

    async fn open(&self, constraints: &StreamConstraints) -> Result<MockStream, CameraError> {
        match &self.behavior {
            MockBehavior::Grant => {}
            MockBehavior::DenyPermission => {
                return Err(CameraError::PermissionDenied(
                    "user dismissed the prompt".to_string(),
                ))
            }
            MockBehavior::NoDevice => {
                return Err(CameraError::DeviceNotFound("no video input".to_string()))
            }
            MockBehavior::Fail(reason) => return Err(CameraError::Device(reason.clone())),
        }

        let native = self
            .native
            .unwrap_or_else(|| Resolution::new(constraints.width, constraints.height));
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        tracing::info!(resolution = %native, "MockCamera stream opened");

        Ok(MockStream {
            native,
            delivered: self.delivered.unwrap_or(native),
            sequence: 0,
            live: true,
            stats: Arc::clone(&self.stats),
        })
    }
}

/// Stream produced by [`MockCameraProvider`].
#[derive(Debug)]
pub struct MockStream {
    native: Resolution,
    delivered: Resolution,
    sequence: u64,
    live: bool,
    stats: Arc<MockDeviceStats>,
}

impl MediaStream for MockStream {
    async fn loaded_metadata(&mut self) -> Result<Resolution, CameraError> {
        if !self.live {
            return Err(CameraError::Stopped);
        }
        tokio::task::yield_now().await;
        Ok(self.native)
    }

    fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        if !self.live {
            return Err(CameraError::Stopped);
        }

        let Resolution { width, height } = self.delivered;
        let shift = (self.sequence % 256) as u32;

        // Smooth gradient so frames compress like camera images
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y + shift) % 256) as u8,
            ])
        });

        self.sequence += 1;
        Ok(VideoFrame::new(image, self.sequence))
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.stats.released.fetch_add(1, Ordering::SeqCst);
            tracing::info!("MockCamera stream stopped");
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}
