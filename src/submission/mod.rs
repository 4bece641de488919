//! Submission of captured frames to the attendance server.
//!
//! The client never fails outward: transport and decoding problems are
//! folded into a [`SubmissionResult`] with `success == false`, so callers
//! handle exactly one shape.
//!
//! # Wire format
//!
//! | Endpoint | Body |
//! |---|---|
//! | `/api/save-face/` | `{"student_id": "...", "face_image": "data:image/jpeg;base64,..."}` |
//! | `/api/process-attendance/` | `{"face_image": "data:image/jpeg;base64,..."}` |
//!
//! Both requests echo the `csrftoken` cookie in the `X-CSRFToken` header.

mod client;
mod cookies;
mod dataurl;
mod http;
mod result;

pub use client::{
    validate_subject_id, Endpoint, SubmissionClient, SubmissionCounts, SubmissionError,
    SubmissionRequest, MAX_SUBJECT_ID_LEN,
};
pub use cookies::{find_cookie, CookieJar, CookieStore, SharedJarCookies};
pub use dataurl::{DataUrl, DataUrlError};
pub use http::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient, TransportError};
pub use result::{
    AttendanceReport, FaceBox, FaceRect, MarkStatus, RecognizedStudent, RegistrationDetails,
    SubmissionResult,
};
