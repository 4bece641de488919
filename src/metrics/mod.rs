//! Prometheus metrics for the capture workflow.
//!
//! # Metrics Exposed
//!
//! - `rollcall_session_active` - Whether a camera session is active
//! - `rollcall_camera_starts_total` - Successful camera starts
//! - `rollcall_camera_start_failures_total` - Failed camera starts
//! - `rollcall_frames_captured_total` - Frames captured and encoded
//! - `rollcall_last_frame_bytes` - Encoded size of the latest capture
//! - `rollcall_submissions_total` - Frames submitted to the server
//! - `rollcall_submission_failures_total` - Failed or rejected submissions
//!
//! The HTTP exporter (`/metrics`, `/status`, `/health`) needs the `metrics` feature.

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError};
