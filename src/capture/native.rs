//! Native webcam provider (requires the `camera` feature).

use nokhwa::{
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType},
    Camera, NokhwaError,
};

use super::{CameraError, CameraProvider, MediaStream, Resolution, StreamConstraints, VideoFrame};

/// Opens system cameras through `nokhwa`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCameraProvider;

impl NativeCameraProvider {
    /// Creates a provider for the system's cameras.
    pub fn new() -> Self {
        Self
    }
}

impl CameraProvider for NativeCameraProvider {
    type Stream = NativeStream;

    async fn open(&self, constraints: &StreamConstraints) -> Result<NativeStream, CameraError> {
        let format = CameraFormat::new(
            nokhwa::utils::Resolution::new(constraints.width, constraints.height),
            FrameFormat::MJPEG,
            constraints.max_fps,
        );
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let mut camera =
            Camera::new(CameraIndex::Index(constraints.device_index), requested).map_err(classify)?;
        camera.open_stream().map_err(classify)?;

        tracing::info!(
            device = constraints.device_index,
            facing = ?constraints.facing,
            "Native camera stream opened"
        );

        Ok(NativeStream {
            camera,
            sequence: 0,
            live: true,
        })
    }
}

/// Live stream from a system camera.
pub struct NativeStream {
    camera: Camera,
    sequence: u64,
    live: bool,
}

impl MediaStream for NativeStream {
    async fn loaded_metadata(&mut self) -> Result<Resolution, CameraError> {
        if !self.live {
            return Err(CameraError::Stopped);
        }
        let resolution = self.camera.resolution();
        Ok(Resolution::new(resolution.width(), resolution.height()))
    }

    fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        if !self.live {
            return Err(CameraError::Stopped);
        }
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CameraError::ReadFailed(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::ReadFailed(e.to_string()))?;

        self.sequence += 1;
        let (width, height) = (decoded.width(), decoded.height());
        VideoFrame::from_raw(width, height, decoded.into_raw(), self.sequence).ok_or_else(|| {
            CameraError::ReadFailed(format!("decoded buffer does not match {}x{}", width, height))
        })
    }

    fn stop(&mut self) {
        if !self.live {
            return;
        }
        self.live = false;
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!(error = %e, "Failed to stop camera stream");
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

fn classify(err: NokhwaError) -> CameraError {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("permission") || lowered.contains("denied") || lowered.contains("not authorized") {
        CameraError::PermissionDenied(message)
    } else if lowered.contains("not found") || lowered.contains("no such") || lowered.contains("no device") {
        CameraError::DeviceNotFound(message)
    } else {
        CameraError::Device(message)
    }
}
