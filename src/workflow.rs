//! The two user journeys: registering a face and marking attendance.
//!
//! A [`CaptureWorkflow`] owns one session, one client and one presenter
//! for as long as the journey lasts. Every outcome is also reported as a
//! banner, so callers may ignore the returned results.

use std::time::Duration;

use tokio::sync::Notify;

use crate::capture::{CameraProvider, CaptureSession, FrameCapturer, StartOutcome};
use crate::metrics::MetricsSnapshot;
use crate::notify::{NotificationPresenter, Severity};
use crate::submission::{CookieStore, HttpClient, MarkStatus, SubmissionClient, SubmissionResult};

/// Surfaces the workflow renders into.
#[derive(Debug, Clone)]
pub struct SurfaceIds {
    /// Live video surface.
    pub video: String,
    /// Still preview surface, if the page has one.
    pub preview: Option<String>,
}

impl Default for SurfaceIds {
    fn default() -> Self {
        Self {
            video: "video".to_string(),
            preview: Some("captured-image".to_string()),
        }
    }
}

/// Capture, submit and report, in that order.
pub struct CaptureWorkflow<P: CameraProvider, H, C> {
    session: CaptureSession<P>,
    capturer: FrameCapturer,
    client: SubmissionClient<H, C>,
    presenter: NotificationPresenter,
    surfaces: SurfaceIds,
}

impl<P, H, C> CaptureWorkflow<P, H, C>
where
    P: CameraProvider,
    H: HttpClient,
    C: CookieStore,
{
    /// Creates a workflow rendering into `surfaces`.
    pub fn new(
        session: CaptureSession<P>,
        client: SubmissionClient<H, C>,
        presenter: NotificationPresenter,
        surfaces: SurfaceIds,
    ) -> Self {
        Self {
            session,
            capturer: FrameCapturer::new(),
            client,
            presenter,
            surfaces,
        }
    }

    /// Starts the camera on the video surface.
    pub async fn start_camera(&mut self) -> StartOutcome {
        let outcome = self.session.start(&self.surfaces.video).await;
        let severity = if outcome.success {
            Severity::Success
        } else {
            Severity::Error
        };
        self.presenter.show_notification(outcome.message.clone(), severity);
        outcome
    }

    /// Releases the camera.
    pub fn stop_camera(&mut self) {
        self.session.stop();
    }

    /// Captures a frame and registers it as the face of `subject_id`.
    pub async fn register_face(&mut self, subject_id: &str) -> SubmissionResult {
        let frame = match self.capture() {
            Ok(frame) => frame,
            Err(result) => return result,
        };

        let result = self.client.save_face_encoding(subject_id, &frame).await;
        if result.success {
            self.presenter
                .show_notification(result.message.clone(), Severity::Success);
            if let Some(path) = result.registration().image_path {
                tracing::info!(subject = subject_id, %path, "Face stored");
            }
        } else {
            self.presenter
                .show_notification(result.message.clone(), Severity::Error);
        }
        result
    }

    /// Captures a frame and submits it for attendance.
    pub async fn mark_attendance(&mut self) -> SubmissionResult {
        let frame = match self.capture() {
            Ok(frame) => frame,
            Err(result) => return result,
        };

        let result = self.client.process_attendance(&frame).await;
        if !result.success {
            self.presenter
                .show_notification(result.message.clone(), Severity::Error);
            return result;
        }

        self.presenter
            .show_notification(result.message.clone(), Severity::Success);

        let report = result.attendance();
        for student in &report.results {
            match student.status {
                MarkStatus::Marked => self.presenter.show_notification(
                    format!("{} ({}) marked present", student.name, student.student_id),
                    Severity::Success,
                ),
                MarkStatus::AlreadyMarked => self.presenter.show_notification(
                    format!(
                        "{} ({}) already marked at {}",
                        student.name,
                        student.student_id,
                        student.time.as_deref().unwrap_or("an earlier time")
                    ),
                    Severity::Warning,
                ),
                MarkStatus::Error | MarkStatus::Unknown => self.presenter.show_notification(
                    format!("Could not mark {} ({})", student.name, student.student_id),
                    Severity::Error,
                ),
            }
        }

        tracing::info!(
            faces = report.face_count.unwrap_or(0),
            recognized = report.results.len(),
            "Attendance processed"
        );
        result
    }

    fn capture(&mut self) -> Result<crate::capture::CapturedFrame, SubmissionResult> {
        match self.capturer.capture_frame(&mut self.session) {
            Ok(frame) => {
                if let Some(preview) = &self.surfaces.preview {
                    self.capturer
                        .display_captured_image(self.session.page(), &frame, preview);
                }
                Ok(frame)
            }
            Err(err) => {
                let result = SubmissionResult::failure(format!("Capture failed: {}", err));
                self.presenter
                    .show_notification(result.message.clone(), Severity::Error);
                Err(result)
            }
        }
    }

    /// The camera session.
    pub fn session(&self) -> &CaptureSession<P> {
        &self.session
    }

    /// The submission client.
    pub fn client(&self) -> &SubmissionClient<H, C> {
        &self.client
    }

    /// The banner presenter.
    pub fn presenter(&self) -> &NotificationPresenter {
        &self.presenter
    }

    /// Mutable access to the presenter, for dismissing banners.
    pub fn presenter_mut(&mut self) -> &mut NotificationPresenter {
        &mut self.presenter
    }

    /// Current counters for the metrics registry.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot::from_components(&self.session, &self.client)
    }
}

/// Waits `interval` between kiosk rounds.
///
/// Returns false as soon as `stop` is notified, including a notification
/// that arrived while the previous round was running.
pub async fn kiosk_pause(interval: Duration, stop: &Notify) -> bool {
    tokio::select! {
        _ = stop.notified() => false,
        _ = tokio::time::sleep(interval) => true,
    }
}
