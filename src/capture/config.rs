//! Camera stream constraints.
//!
//! Constraints are preferences, not guarantees: the device reports the
//! native resolution it actually delivers once the stream is live.

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front-facing (towards the user).
    #[default]
    User,
    /// Rear-facing.
    Environment,
}

/// Preferred stream settings passed to a [`CameraProvider`](super::CameraProvider).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConstraints {
    /// Camera device index, for providers that enumerate devices.
    pub device_index: u32,
    /// Ideal frame width in pixels.
    pub width: u32,
    /// Ideal frame height in pixels.
    pub height: u32,
    /// Ideal aspect ratio (width / height).
    pub aspect_ratio: f64,
    /// Upper bound on frame rate.
    pub max_fps: u32,
    /// Preferred facing mode.
    pub facing: FacingMode,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 1280,
            height: 720,
            aspect_ratio: 16.0 / 9.0,
            max_fps: 60,
            facing: FacingMode::User,
        }
    }
}

impl StreamConstraints {
    /// Creates constraints with the specified ideal dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            aspect_ratio: if height == 0 {
                0.0
            } else {
                width as f64 / height as f64
            },
            ..Default::default()
        }
    }

    /// Validates the constraint values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(ConfigError::InvalidAspectRatio);
        }
        if self.max_fps == 0 || self.max_fps > 120 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}
