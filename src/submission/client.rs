//! Submission client for the registration and attendance endpoints.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::{CookieStore, HttpClient, HttpRequest, SubmissionResult, TransportError};
use crate::capture::CapturedFrame;
use crate::config::ServerConfig;

/// Longest subject identifier the server accepts.
pub const MAX_SUBJECT_ID_LEN: usize = 50;

/// Errors that can occur while submitting a frame.
///
/// These never reach callers of the client directly; they are folded
/// into a failed [`SubmissionResult`].
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Transport failed before a response arrived.
    #[error(transparent)]
    Network(#[from] TransportError),
    /// The response body is not the expected JSON.
    #[error("invalid JSON response (HTTP {status}): {reason}")]
    MalformedResponse {
        /// HTTP status of the response.
        status: u16,
        /// Why decoding failed.
        reason: String,
    },
    /// The student id would be rejected by the server.
    #[error("Invalid student ID format")]
    InvalidSubject(String),
    /// The request body could not be serialized.
    #[error("failed to serialize request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Target endpoint of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Face registration.
    SaveFace,
    /// Attendance marking.
    ProcessAttendance,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::SaveFace => write!(f, "save-face"),
            Endpoint::ProcessAttendance => write!(f, "process-attendance"),
        }
    }
}

/// One outgoing submission, built per call and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    /// Endpoint the request targets.
    pub endpoint: Endpoint,
    /// Full url of the endpoint.
    pub url: String,
    /// Student id, for registration only.
    pub subject_id: Option<String>,
    /// Encoded frame as a data URL.
    pub face_image: String,
    /// Anti-forgery token, if the cookie was set.
    pub csrf_token: Option<String>,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    student_id: Option<&'a str>,
    face_image: &'a str,
}

impl SubmissionRequest {
    /// JSON body sent to the server.
    pub fn body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&RequestBody {
            student_id: self.subject_id.as_deref(),
            face_image: &self.face_image,
        })
    }

    fn into_http(self, csrf_header: &str) -> Result<HttpRequest, serde_json::Error> {
        let body = self.body()?;
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = self.csrf_token {
            headers.push((csrf_header.to_string(), token));
        }
        Ok(HttpRequest {
            url: self.url,
            headers,
            body,
        })
    }
}

/// Totals since the client was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmissionCounts {
    /// Requests sent.
    pub submitted: u64,
    /// Requests that failed or were rejected.
    pub failed: u64,
}

/// Posts captured frames to the attendance server.
///
/// Neither call is idempotent: resubmitting may create duplicate records
/// server-side.
pub struct SubmissionClient<H, C> {
    http: H,
    cookies: C,
    save_face_url: String,
    process_attendance_url: String,
    csrf_cookie_name: String,
    csrf_header: String,
    submitted: AtomicU64,
    failed: AtomicU64,
}

impl<H: HttpClient, C: CookieStore> SubmissionClient<H, C> {
    /// Creates a client posting to the endpoints in `server`.
    pub fn new(http: H, cookies: C, server: &ServerConfig) -> Self {
        Self {
            http,
            cookies,
            save_face_url: server.save_face_url(),
            process_attendance_url: server.process_attendance_url(),
            csrf_cookie_name: server.csrf_cookie_name.clone(),
            csrf_header: server.csrf_header.clone(),
            submitted: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Registers `frame` as the face of `subject_id`.
    pub async fn save_face_encoding(
        &self,
        subject_id: &str,
        frame: &CapturedFrame,
    ) -> SubmissionResult {
        let subject_id = match validate_subject_id(subject_id) {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(error = ?err, "Rejected subject id");
                return SubmissionResult::failure(err.to_string());
            }
        };

        let request = self.build_request(Endpoint::SaveFace, Some(subject_id), frame);
        self.dispatch(request).await
    }

    /// Submits `frame` for attendance marking.
    pub async fn process_attendance(&self, frame: &CapturedFrame) -> SubmissionResult {
        let request = self.build_request(Endpoint::ProcessAttendance, None, frame);
        self.dispatch(request).await
    }

    /// Builds the request for `endpoint`, reading the token cookie now.
    pub fn build_request(
        &self,
        endpoint: Endpoint,
        subject_id: Option<&str>,
        frame: &CapturedFrame,
    ) -> SubmissionRequest {
        let url = match endpoint {
            Endpoint::SaveFace => self.save_face_url.clone(),
            Endpoint::ProcessAttendance => self.process_attendance_url.clone(),
        };

        let csrf_token = self.cookies.get(&self.csrf_cookie_name);
        if csrf_token.is_none() {
            tracing::warn!(
                cookie = %self.csrf_cookie_name,
                "Anti-forgery cookie missing; sending without token"
            );
        }

        SubmissionRequest {
            endpoint,
            url,
            subject_id: subject_id.map(str::to_string),
            face_image: frame.to_data_url(),
            csrf_token,
        }
    }

    async fn dispatch(&self, request: SubmissionRequest) -> SubmissionResult {
        let endpoint = request.endpoint;
        self.submitted.fetch_add(1, Ordering::Relaxed);

        match self.send(request).await {
            Ok(result) => {
                if result.success {
                    tracing::info!(%endpoint, message = %result.message, "Submission accepted");
                } else {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(%endpoint, message = %result.message, "Submission rejected");
                }
                result
            }
            Err(err) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(%endpoint, error = %err, "Submission failed");
                SubmissionResult::network_error(err)
            }
        }
    }

    async fn send(&self, request: SubmissionRequest) -> Result<SubmissionResult, SubmissionError> {
        let http_request = request.into_http(&self.csrf_header)?;
        let response = self.http.post(http_request).await?;

        let mut result: SubmissionResult =
            serde_json::from_slice(&response.body).map_err(|e| SubmissionError::MalformedResponse {
                status: response.status,
                reason: e.to_string(),
            })?;

        // Middleware answers (rate limiting) carry `error` instead of `message`
        if result.message.is_empty() {
            if let Some(error) = result.payload.get("error").and_then(Value::as_str) {
                result.message = error.to_string();
            } else if !response.is_success() {
                result.message = format!("Server error (HTTP {})", response.status);
            }
        }
        Ok(result)
    }

    /// Submission totals.
    pub fn counts(&self) -> SubmissionCounts {
        SubmissionCounts {
            submitted: self.submitted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Underlying transport.
    pub fn http(&self) -> &H {
        &self.http
    }
}

/// Checks a subject id the way the registration endpoint does.
pub fn validate_subject_id(subject_id: &str) -> Result<&str, SubmissionError> {
    let trimmed = subject_id.trim();
    let valid = !trimmed.is_empty()
        && trimmed.chars().count() <= MAX_SUBJECT_ID_LEN
        && trimmed.chars().all(char::is_alphanumeric);
    if valid {
        Ok(trimmed)
    } else {
        Err(SubmissionError::InvalidSubject(subject_id.to_string()))
    }
}
