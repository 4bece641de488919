//! Still-frame capture and JPEG encoding.

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, ExtendedColorType, RgbImage};
use thiserror::Error;

use super::{CameraError, CameraProvider, CaptureSession, CapturedFrame, EncodedFormat, MediaStream, Page, VideoFrame};

/// JPEG quality used for every capture.
pub const JPEG_QUALITY: u8 = 95;

/// Errors that can occur while capturing a still.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No active session, or the session is not bound to a surface.
    #[error("camera not started")]
    NotStarted,
    /// The stream failed while reading the frame.
    #[error(transparent)]
    Camera(#[from] CameraError),
    /// The stream delivered a frame with a zero dimension.
    #[error("unusable frame of {width}x{height}")]
    InvalidFrame {
        /// Delivered width.
        width: u32,
        /// Delivered height.
        height: u32,
    },
    /// JPEG encoding failed.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),
}

/// Grabs stills from an active [`CaptureSession`].
#[derive(Debug, Clone, Copy)]
pub struct FrameCapturer {
    quality: u8,
}

impl Default for FrameCapturer {
    fn default() -> Self {
        Self {
            quality: JPEG_QUALITY,
        }
    }
}

impl FrameCapturer {
    /// Creates a capturer at [`JPEG_QUALITY`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current frame at the stream's native resolution.
    pub fn capture_frame<P: CameraProvider>(
        &self,
        session: &mut CaptureSession<P>,
    ) -> Result<CapturedFrame, CaptureError> {
        let (stream, native) = session.live_stream().ok_or(CaptureError::NotStarted)?;
        let frame = stream.read_frame()?;

        let canvas = render_to_canvas(frame, native.width, native.height)?;
        let bytes = self.encode(&canvas)?;

        tracing::debug!(
            width = canvas.width(),
            height = canvas.height(),
            encoded_bytes = bytes.len(),
            "Captured frame"
        );

        session.record_capture(bytes.len());
        Ok(CapturedFrame::new(
            canvas.width(),
            canvas.height(),
            bytes,
            EncodedFormat::Jpeg,
        ))
    }

    /// Shows `frame` in the image surface `surface_id`.
    ///
    /// A missing surface is ignored.
    pub fn display_captured_image(&self, page: &Page, frame: &CapturedFrame, surface_id: &str) {
        if !page.show_image(surface_id, frame.to_data_url()) {
            tracing::debug!(surface = surface_id, "Preview surface not found");
        }
    }

    fn encode(&self, canvas: &RgbImage) -> Result<Vec<u8>, CaptureError> {
        let mut buffer = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        encoder.encode(
            canvas.as_raw(),
            canvas.width(),
            canvas.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(buffer)
    }
}

/// Draws the frame onto an off-screen buffer of the given size.
fn render_to_canvas(frame: VideoFrame, width: u32, height: u32) -> Result<RgbImage, CaptureError> {
    let delivered = frame.resolution();
    if !delivered.is_usable() {
        return Err(CaptureError::InvalidFrame {
            width: delivered.width,
            height: delivered.height,
        });
    }

    let image = frame.into_image();
    if (delivered.width, delivered.height) == (width, height) {
        return Ok(image);
    }

    tracing::trace!(from = %delivered, width, height, "Scaling frame to native resolution");
    Ok(image::imageops::resize(&image, width, height, FilterType::Triangle))
}
