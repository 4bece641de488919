//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use serde::Serialize;
use thiserror::Error;

use crate::capture::{CameraProvider, CaptureSession};
use crate::submission::{CookieStore, HttpClient, SubmissionClient};

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registering or encoding a metric failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of workflow state for metrics update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Whether a camera session is currently active.
    pub session_active: bool,
    /// Successful camera starts.
    pub camera_starts: u64,
    /// Failed camera starts.
    pub camera_start_failures: u64,
    /// Frames captured and encoded.
    pub frames_captured: u64,
    /// Encoded size of the most recent capture.
    pub last_frame_bytes: u64,
    /// Submissions sent to the server.
    pub submissions: u64,
    /// Submissions that came back unsuccessful.
    pub submission_failures: u64,
}

/// Prometheus registry holding the `rollcall_*` series.
pub struct MetricsRegistry {
    registry: Registry,

    // Camera metrics
    session_active: IntGauge,
    camera_starts_total: IntCounter,
    camera_start_failures_total: IntCounter,

    // Capture metrics
    frames_captured_total: IntCounter,
    last_frame_bytes: IntGauge,

    // Submission metrics
    submissions_total: IntCounter,
    submission_failures_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all capture metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let session_active = IntGauge::new(
            "rollcall_session_active",
            "Whether a camera session is active (1=active, 0=idle)",
        )?;
        let camera_starts_total = IntCounter::new(
            "rollcall_camera_starts_total",
            "Total successful camera starts",
        )?;
        let camera_start_failures_total = IntCounter::new(
            "rollcall_camera_start_failures_total",
            "Total failed camera starts",
        )?;
        let frames_captured_total = IntCounter::new(
            "rollcall_frames_captured_total",
            "Total frames captured and encoded",
        )?;
        let last_frame_bytes = IntGauge::new(
            "rollcall_last_frame_bytes",
            "Encoded size of the most recent capture in bytes",
        )?;
        let submissions_total = IntCounter::new(
            "rollcall_submissions_total",
            "Total frames submitted to the server",
        )?;
        let submission_failures_total = IntCounter::new(
            "rollcall_submission_failures_total",
            "Total submissions that failed or were rejected",
        )?;

        registry.register(Box::new(session_active.clone()))?;
        registry.register(Box::new(camera_starts_total.clone()))?;
        registry.register(Box::new(camera_start_failures_total.clone()))?;
        registry.register(Box::new(frames_captured_total.clone()))?;
        registry.register(Box::new(last_frame_bytes.clone()))?;
        registry.register(Box::new(submissions_total.clone()))?;
        registry.register(Box::new(submission_failures_total.clone()))?;

        Ok(Self {
            registry,
            session_active,
            camera_starts_total,
            camera_start_failures_total,
            frames_captured_total,
            last_frame_bytes,
            submissions_total,
            submission_failures_total,
        })
    }

    /// Updates all metrics from a snapshot of workflow state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.session_active.set(if snapshot.session_active { 1 } else { 0 });
        self.last_frame_bytes.set(snapshot.last_frame_bytes as i64);

        // Counters only move forward, so add the difference
        advance(&self.camera_starts_total, snapshot.camera_starts);
        advance(&self.camera_start_failures_total, snapshot.camera_start_failures);
        advance(&self.frames_captured_total, snapshot.frames_captured);
        advance(&self.submissions_total, snapshot.submissions);
        advance(&self.submission_failures_total, snapshot.submission_failures);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from the current state of workflow components.
    pub fn from_components<P, H, C>(
        session: &CaptureSession<P>,
        client: &SubmissionClient<H, C>,
    ) -> Self
    where
        P: CameraProvider,
        H: HttpClient,
        C: CookieStore,
    {
        let stats = session.stats();
        let counts = client.counts();

        Self {
            session_active: session.is_active(),
            camera_starts: stats.starts,
            camera_start_failures: stats.start_failures,
            frames_captured: stats.frames_captured,
            last_frame_bytes: stats.last_frame_bytes,
            submissions: counts.submitted,
            submission_failures: counts.failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            session_active: true,
            camera_starts: 2,
            camera_start_failures: 1,
            frames_captured: 5,
            last_frame_bytes: 48_213,
            submissions: 4,
            submission_failures: 1,
        };

        registry.update(&snapshot);
        registry.update(&snapshot);

        let output = registry.encode().unwrap();
        assert!(output.contains("rollcall_session_active 1"));
        assert!(output.contains("rollcall_camera_starts_total 2"));
        assert!(output.contains("rollcall_frames_captured_total 5"));
        assert!(output.contains("rollcall_last_frame_bytes 48213"));
        assert!(output.contains("rollcall_submission_failures_total 1"));
    }

    #[test]
    fn test_metrics_encode() {
        let registry = MetricsRegistry::new().unwrap();
        let output = registry.encode().unwrap();

        assert!(output.contains("rollcall_session_active"));
        assert!(output.contains("rollcall_submissions_total"));
    }
}
