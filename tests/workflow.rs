use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use rollcall_capture::capture::{MockBehavior, MockCameraProvider, Page, SessionState};
use rollcall_capture::config::ServerConfig;
use rollcall_capture::notify::{NotificationPresenter, Severity};
use rollcall_capture::submission::{
    CookieJar, DataUrl, HttpClient, HttpRequest, HttpResponse, SubmissionClient, TransportError,
};
use rollcall_capture::{CaptureSession, CaptureWorkflow, SurfaceIds};
use serde_json::{json, Value};

/// Scripted server that records every request it receives.
#[derive(Default)]
struct ScriptedServer {
    replies: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedServer {
    fn replying(replies: Vec<Result<HttpResponse, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for ScriptedServer {
    async fn post(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted reply".to_string())))
    }
}

fn json_reply(status: u16, body: Value) -> Result<HttpResponse, TransportError> {
    Ok(HttpResponse {
        status,
        body: serde_json::to_vec(&body).unwrap(),
    })
}

fn workflow(
    provider: MockCameraProvider,
    server: ScriptedServer,
    cookies: CookieJar,
) -> CaptureWorkflow<MockCameraProvider, ScriptedServer, CookieJar> {
    let surfaces = SurfaceIds::default();
    let page = Page::new();
    page.add_video_surface(surfaces.video.clone());
    page.add_image_surface("captured-image");

    let config = ServerConfig::default();
    CaptureWorkflow::new(
        CaptureSession::new(provider, page),
        SubmissionClient::new(server, cookies, &config),
        NotificationPresenter::new(Duration::from_secs(5)),
        surfaces,
    )
}

fn banners<P, H, C>(workflow: &CaptureWorkflow<P, H, C>) -> Vec<(String, Severity)>
where
    P: rollcall_capture::CameraProvider,
    H: HttpClient,
    C: rollcall_capture::CookieStore,
{
    workflow
        .presenter()
        .active()
        .map(|b| (b.message().to_string(), b.severity()))
        .collect()
}

#[tokio::test]
async fn test_register_face_end_to_end() {
    let server = ScriptedServer::replying(vec![json_reply(
        200,
        json!({
            "success": true,
            "message": "Face registered successfully!",
            "image_path": "faces/S123_1.jpg"
        }),
    )]);
    let mut workflow = workflow(
        MockCameraProvider::new(),
        server,
        CookieJar::from_header("csrftoken=tok123"),
    );

    assert!(workflow.start_camera().await.success);
    let result = workflow.register_face("S123").await;
    assert!(result.success);
    assert_eq!(result.message, "Face registered successfully!");

    let requests = workflow.client().http().requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.url.ends_with("/api/save-face/"));
    assert_eq!(request.header("X-CSRFToken"), Some("tok123"));
    assert_eq!(request.header("Content-Type"), Some("application/json"));

    let body: Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["student_id"], "S123");
    let image = DataUrl::parse(body["face_image"].as_str().unwrap()).unwrap();
    assert_eq!(image.mime_type(), Some("image/jpeg"));
    assert_eq!(&image.bytes()[..2], &[0xFF, 0xD8]);

    // Preview shows the same still that was sent
    let preview = workflow
        .session()
        .page()
        .image_surface("captured-image")
        .unwrap();
    assert!(preview.visible);
    assert_eq!(preview.src.as_deref(), body["face_image"].as_str());

    let shown = banners(&workflow);
    assert_eq!(
        shown.last().unwrap(),
        &("Face registered successfully!".to_string(), Severity::Success)
    );
}

#[tokio::test]
async fn test_attendance_reports_each_student() {
    let server = ScriptedServer::replying(vec![json_reply(
        200,
        json!({
            "success": true,
            "message": "Successfully processed 2 student(s).",
            "face_count": 2,
            "results": [
                {"name": "Ada", "student_id": "S1", "confidence": 80.0,
                 "status": "marked", "time": "09:00:00"},
                {"name": "Grace", "student_id": "S2", "confidence": 75.0,
                 "status": "already_marked", "time": "08:45:00"}
            ]
        }),
    )]);
    let mut workflow = workflow(
        MockCameraProvider::new(),
        server,
        CookieJar::from_header("csrftoken=tok"),
    );

    workflow.start_camera().await;
    let result = workflow.mark_attendance().await;
    assert!(result.success);
    assert_eq!(result.attendance().results.len(), 2);

    let body: Value =
        serde_json::from_slice(&workflow.client().http().requests()[0].body).unwrap();
    assert!(body.get("student_id").is_none());
    assert!(body["face_image"]
        .as_str()
        .unwrap()
        .starts_with("data:image/jpeg;base64,"));

    let shown = banners(&workflow);
    assert!(shown.contains(&("Ada (S1) marked present".to_string(), Severity::Success)));
    assert!(shown.contains(&(
        "Grace (S2) already marked at 08:45:00".to_string(),
        Severity::Warning
    )));
}

#[tokio::test]
async fn test_capture_before_start_sends_nothing() {
    let mut workflow = workflow(
        MockCameraProvider::new(),
        ScriptedServer::default(),
        CookieJar::new(),
    );

    let result = workflow.mark_attendance().await;
    assert!(!result.success);
    assert!(result.message.starts_with("Capture failed:"));
    assert!(workflow.client().http().requests().is_empty());
    assert_eq!(workflow.client().counts().submitted, 0);
}

#[tokio::test]
async fn test_network_error_becomes_result() {
    let server = ScriptedServer::replying(vec![Err(TransportError::Connect(
        "connection refused".to_string(),
    ))]);
    let mut workflow = workflow(MockCameraProvider::new(), server, CookieJar::new());

    workflow.start_camera().await;
    let result = workflow.mark_attendance().await;
    assert!(!result.success);
    assert_eq!(
        result.message,
        "Network error: connection failed: connection refused"
    );

    // No token cookie means no token header
    let request = &workflow.client().http().requests()[0];
    assert_eq!(request.header("X-CSRFToken"), None);

    let counts = workflow.client().counts();
    assert_eq!(counts.submitted, 1);
    assert_eq!(counts.failed, 1);
    assert_eq!(
        workflow.presenter().latest().unwrap().severity(),
        Severity::Error
    );
}

#[tokio::test]
async fn test_non_json_error_page_is_network_error() {
    let server = ScriptedServer::replying(vec![Ok(HttpResponse {
        status: 403,
        body: b"<html>CSRF verification failed</html>".to_vec(),
    })]);
    let mut workflow = workflow(MockCameraProvider::new(), server, CookieJar::new());

    workflow.start_camera().await;
    let result = workflow.register_face("S1").await;
    assert!(!result.success);
    assert!(result.message.starts_with("Network error:"));
    assert!(result.message.contains("403"));
}

#[tokio::test]
async fn test_server_rejection_keeps_server_message() {
    let server = ScriptedServer::replying(vec![json_reply(
        400,
        json!({"success": false, "message": "No face detected in the image"}),
    )]);
    let mut workflow = workflow(MockCameraProvider::new(), server, CookieJar::new());

    workflow.start_camera().await;
    let result = workflow.register_face("S1").await;
    assert!(!result.success);
    assert_eq!(result.message, "No face detected in the image");
}

#[tokio::test]
async fn test_invalid_student_id_not_sent() {
    let mut workflow = workflow(
        MockCameraProvider::new(),
        ScriptedServer::default(),
        CookieJar::new(),
    );

    workflow.start_camera().await;
    let result = workflow.register_face("S-1; DROP").await;
    assert!(!result.success);
    assert_eq!(result.message, "Invalid student ID format");
    assert!(workflow.client().http().requests().is_empty());
}

#[tokio::test]
async fn test_denied_camera_reports_banner() {
    let mut workflow = workflow(
        MockCameraProvider::new().with_behavior(MockBehavior::DenyPermission),
        ScriptedServer::default(),
        CookieJar::new(),
    );

    let outcome = workflow.start_camera().await;
    assert!(!outcome.success);
    assert!(matches!(workflow.session().state(), SessionState::Failed(_)));
    assert_eq!(
        banners(&workflow),
        vec![(
            "Camera permission denied. Please allow camera access.".to_string(),
            Severity::Error
        )]
    );
}

#[tokio::test]
async fn test_stop_releases_device_and_metrics_follow() {
    let provider = MockCameraProvider::new();
    let stats = provider.stats();
    let server = ScriptedServer::replying(vec![json_reply(
        200,
        json!({"success": true, "message": "ok", "results": []}),
    )]);
    let mut workflow = workflow(provider, server, CookieJar::new());

    workflow.start_camera().await;
    workflow.mark_attendance().await;

    let snapshot = workflow.metrics_snapshot();
    assert!(snapshot.session_active);
    assert_eq!(snapshot.frames_captured, 1);
    assert_eq!(snapshot.submissions, 1);

    workflow.stop_camera();
    workflow.stop_camera();
    assert_eq!(stats.live(), 0);
    assert!(!workflow.metrics_snapshot().session_active);
}
