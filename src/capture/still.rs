//! Camera provider backed by an image file.
//!
//! Useful on machines without a webcam: the file plays the role of a
//! stream whose every frame is the same picture.

use std::path::{Path, PathBuf};

use super::{CameraError, CameraProvider, MediaStream, Resolution, StreamConstraints, VideoFrame};

/// Serves frames decoded from a still image.
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    /// Serves frames decoded from the image at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CameraProvider for StillImageCamera {
    type Stream = StillImageStream;

    async fn open(&self, _constraints: &StreamConstraints) -> Result<StillImageStream, CameraError> {
        if !self.path.exists() {
            return Err(CameraError::DeviceNotFound(self.path.display().to_string()));
        }

        let image = image::open(&self.path)
            .map_err(|e| CameraError::Device(format!("{}: {}", self.path.display(), e)))?
            .into_rgb8();

        tracing::info!(
            path = %self.path.display(),
            width = image.width(),
            height = image.height(),
            "Still image camera opened"
        );

        Ok(StillImageStream {
            resolution: Resolution::new(image.width(), image.height()),
            image,
            sequence: 0,
            live: true,
        })
    }
}

/// Stream produced by [`StillImageCamera`].
#[derive(Debug)]
pub struct StillImageStream {
    resolution: Resolution,
    image: image::RgbImage,
    sequence: u64,
    live: bool,
}

impl MediaStream for StillImageStream {
    async fn loaded_metadata(&mut self) -> Result<Resolution, CameraError> {
        if !self.live {
            return Err(CameraError::Stopped);
        }
        Ok(self.resolution)
    }

    fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        if !self.live {
            return Err(CameraError::Stopped);
        }
        self.sequence += 1;
        Ok(VideoFrame::new(self.image.clone(), self.sequence))
    }

    fn stop(&mut self) {
        self.live = false;
    }

    fn is_live(&self) -> bool {
        self.live
    }
}
