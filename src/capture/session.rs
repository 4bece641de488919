//! Camera session lifecycle.
//!
//! ```text
//! Idle ──start──▶ Starting ──▶ Active ──stop──▶ Idle
//!                    │
//!                    └──▶ Failed ──stop/start──▶ Idle
//! ```

use super::{CameraError, CameraFailure, CameraProvider, MediaStream, Page, Resolution, StreamConstraints};

/// Current lifecycle state of a [`CaptureSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No stream held.
    Idle,
    /// Access requested, stream not yet playing.
    Starting,
    /// Stream attached and playing.
    Active,
    /// The last start failed with the given cause.
    Failed(CameraFailure),
}

impl SessionState {
    /// Returns true in the `Active` state.
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active)
    }
}

/// Result of [`CaptureSession::start`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOutcome {
    /// Whether the camera is now active.
    pub success: bool,
    /// User-facing description of the outcome.
    pub message: String,
    /// Cause tag, present only on failure.
    pub failure: Option<CameraFailure>,
}

impl StartOutcome {
    fn started() -> Self {
        Self {
            success: true,
            message: "Camera started successfully".to_string(),
            failure: None,
        }
    }

    fn failed(err: &CameraError) -> Self {
        let failure = err.failure();
        let message = match failure {
            CameraFailure::PermissionDenied => {
                "Camera permission denied. Please allow camera access.".to_string()
            }
            CameraFailure::DeviceNotFound => "No camera found on this device.".to_string(),
            CameraFailure::Other => format!("Error accessing camera: {}", err),
        };
        Self {
            success: false,
            message,
            failure: Some(failure),
        }
    }
}

/// Counters kept across the lifetime of a session object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Successful starts.
    pub starts: u64,
    /// Failed starts.
    pub start_failures: u64,
    /// Frames captured and encoded.
    pub frames_captured: u64,
    /// Encoded size of the most recent capture.
    pub last_frame_bytes: u64,
}

/// Owns one camera stream and its binding to a video surface.
///
/// Only the session that opened a stream stops it. Dropping the session
/// releases the device.
pub struct CaptureSession<P: CameraProvider> {
    provider: P,
    page: Page,
    constraints: StreamConstraints,
    state: SessionState,
    stream: Option<P::Stream>,
    surface_id: Option<String>,
    resolution: Option<Resolution>,
    stats: SessionStats,
}

impl<P: CameraProvider> CaptureSession<P> {
    /// Creates an idle session using the default constraints.
    pub fn new(provider: P, page: Page) -> Self {
        Self::with_constraints(provider, page, StreamConstraints::default())
    }

    /// Creates an idle session with custom constraints.
    pub fn with_constraints(provider: P, page: Page, constraints: StreamConstraints) -> Self {
        Self {
            provider,
            page,
            constraints,
            state: SessionState::Idle,
            stream: None,
            surface_id: None,
            resolution: None,
            stats: SessionStats::default(),
        }
    }

    /// Acquires the camera and binds it to the video surface `surface_id`.
    ///
    /// Never fails outward; the outcome carries the cause. Starting an
    /// active session stops the previous stream first.
    pub async fn start(&mut self, surface_id: &str) -> StartOutcome {
        if self.stream.is_some() || self.state != SessionState::Idle {
            tracing::info!(state = ?self.state, "Resetting session before start");
            self.stop();
        }

        self.state = SessionState::Starting;
        tracing::debug!(surface = surface_id, constraints = ?self.constraints, "Requesting camera");

        match self.acquire(surface_id).await {
            Ok(resolution) => {
                self.state = SessionState::Active;
                self.stats.starts += 1;
                tracing::info!(surface = surface_id, %resolution, "Camera session active");
                StartOutcome::started()
            }
            Err(err) => {
                let outcome = StartOutcome::failed(&err);
                self.state = SessionState::Failed(err.failure());
                self.stats.start_failures += 1;
                tracing::warn!(surface = surface_id, error = %err, "Camera start failed");
                outcome
            }
        }
    }

    async fn acquire(&mut self, surface_id: &str) -> Result<Resolution, CameraError> {
        let mut stream = self.provider.open(&self.constraints).await?;

        if !self.page.has_video_surface(surface_id) {
            stream.stop();
            return Err(CameraError::Device(format!(
                "video surface '{}' not found",
                surface_id
            )));
        }

        let resolution = match stream.loaded_metadata().await {
            Ok(resolution) if resolution.is_usable() => resolution,
            Ok(resolution) => {
                stream.stop();
                return Err(CameraError::Device(format!(
                    "stream reported unusable dimensions {}",
                    resolution
                )));
            }
            Err(err) => {
                stream.stop();
                return Err(err);
            }
        };

        if !self.page.attach_and_play(surface_id, resolution) {
            stream.stop();
            return Err(CameraError::Device(format!(
                "video surface '{}' disappeared",
                surface_id
            )));
        }

        self.stream = Some(stream);
        self.surface_id = Some(surface_id.to_string());
        self.resolution = Some(resolution);
        Ok(resolution)
    }

    /// Stops every track and detaches the surface. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            tracing::info!("Camera session stopped");
        }
        if let Some(surface_id) = self.surface_id.take() {
            self.page.detach(&surface_id);
        }
        self.resolution = None;
        self.state = SessionState::Idle;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns true while a stream is attached and playing.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Id of the bound video surface while active.
    pub fn surface_id(&self) -> Option<&str> {
        self.surface_id.as_deref()
    }

    /// Native resolution of the live stream while active.
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    /// Constraints used for the next start.
    pub fn constraints(&self) -> &StreamConstraints {
        &self.constraints
    }

    /// Page holding the bound surfaces.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Start and capture counters.
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The live stream and its native resolution, if active and bound.
    pub(crate) fn live_stream(&mut self) -> Option<(&mut P::Stream, Resolution)> {
        if !self.state.is_active() || self.surface_id.is_none() {
            return None;
        }
        let resolution = self.resolution?;
        self.stream
            .as_mut()
            .filter(|stream| stream.is_live())
            .map(|stream| (stream, resolution))
    }

    pub(crate) fn record_capture(&mut self, encoded_bytes: usize) {
        self.stats.frames_captured += 1;
        self.stats.last_frame_bytes = encoded_bytes as u64;
    }
}

impl<P: CameraProvider> Drop for CaptureSession<P> {
    fn drop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
        }
        if let Some(surface_id) = self.surface_id.take() {
            self.page.detach(&surface_id);
        }
    }
}
