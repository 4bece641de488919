//! Rollcall Capture Library
//!
//! Client side of a face-recognition attendance system: acquire a
//! camera, capture a still, and submit it to the attendance server for
//! registration or marking. Recognition itself happens on the server.
//!
//! # Architecture
//!
//! ```text
//! CaptureSession → FrameCapturer → SubmissionClient → NotificationPresenter
//!   (camera)         (JPEG still)     (HTTP + token)       (banners)
//! ```
//!
//! Platform facilities are injected: [`capture::CameraProvider`] for the
//! camera, [`submission::CookieStore`] for the anti-forgery token and
//! [`submission::HttpClient`] for the network. Display surfaces live in a
//! shared [`capture::Page`].
//!
//! # Example
//!
//! ```no_run
//! use rollcall_capture::{
//!     capture::{CaptureSession, FrameCapturer, MockCameraProvider, Page},
//!     config::ServerConfig,
//!     notify::{NotificationPresenter, Severity},
//!     submission::{ReqwestHttpClient, SubmissionClient},
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let page = Page::new();
//! page.add_video_surface("video");
//!
//! let mut session = CaptureSession::new(MockCameraProvider::new(), page);
//! let outcome = session.start("video").await;
//! assert!(outcome.success);
//!
//! let frame = FrameCapturer::new().capture_frame(&mut session)?;
//!
//! let server = ServerConfig::default();
//! let http = ReqwestHttpClient::new(&server)?;
//! let cookies = http.cookies();
//! let client = SubmissionClient::new(http, cookies, &server);
//!
//! let result = client.process_attendance(&frame).await;
//! let mut presenter = NotificationPresenter::default();
//! let severity = if result.success { Severity::Success } else { Severity::Error };
//! presenter.show_notification(result.message, severity);
//!
//! session.stop();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod config;
pub mod metrics;
pub mod notify;
pub mod submission;
pub mod workflow;

// Re-export commonly used types at crate root
pub use capture::{
    CameraProvider, CaptureSession, CapturedFrame, FrameCapturer, MockCameraProvider, Page,
    StartOutcome, StreamConstraints,
};
pub use config::FileConfig;
pub use notify::{NotificationPresenter, Severity};
pub use submission::{CookieStore, HttpClient, SubmissionClient, SubmissionResult};
pub use workflow::{CaptureWorkflow, SurfaceIds};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
