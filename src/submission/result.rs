//! Submission results and the typed views of their payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded server answer.
///
/// `success` and `message` are always present; every other field the
/// server sent is kept verbatim in `payload`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Whether the server accepted the submission.
    #[serde(default)]
    pub success: bool,
    /// Human-readable outcome.
    #[serde(default)]
    pub message: String,
    /// Every other field of the answer.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl SubmissionResult {
    /// A failure produced on the client side.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: Map::new(),
        }
    }

    /// A failure caused by transport or decoding.
    pub fn network_error(cause: impl std::fmt::Display) -> Self {
        Self::failure(format!("Network error: {}", cause))
    }

    /// Returns true if the server sent fields beyond `success`/`message`.
    pub fn has_payload(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Registration details, when present.
    pub fn registration(&self) -> RegistrationDetails {
        RegistrationDetails {
            image_path: self
                .payload
                .get("image_path")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// Attendance details.
    ///
    /// On failure the server may put raw recognizer output under
    /// `results`; those entries are skipped.
    pub fn attendance(&self) -> AttendanceReport {
        let results = if self.success {
            self.payload
                .get("results")
                .and_then(Value::as_array)
                .map(|entries| {
                    entries
                        .iter()
                        .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                        .collect()
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        let face_rects = self
            .payload
            .get("face_rects")
            .cloned()
            .and_then(|rects| serde_json::from_value(rects).ok())
            .unwrap_or_default();

        AttendanceReport {
            results,
            face_count: self
                .payload
                .get("face_count")
                .and_then(Value::as_u64)
                .map(|count| count as u32),
            face_rects,
            detection_model: self
                .payload
                .get("detection_model")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// Details returned by the registration endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationDetails {
    /// Where the server stored the face image.
    pub image_path: Option<String>,
}

/// Details returned by the attendance endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceReport {
    /// Students that were recognized.
    pub results: Vec<RecognizedStudent>,
    /// Faces detected in the frame.
    pub face_count: Option<u32>,
    /// Every detected face, recognized or not.
    pub face_rects: Vec<FaceRect>,
    /// Face detector the server used.
    pub detection_model: Option<String>,
}

/// Outcome of marking one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkStatus {
    /// Attendance recorded now.
    Marked,
    /// Attendance was already recorded today.
    AlreadyMarked,
    /// The server failed to record attendance.
    Error,
    /// A status this client does not know.
    #[serde(other)]
    Unknown,
}

/// Bounding box in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBox {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width.
    pub w: i64,
    /// Height.
    pub h: i64,
}

/// A detected face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRect {
    /// Left edge.
    pub x: i64,
    /// Top edge.
    pub y: i64,
    /// Width.
    pub w: i64,
    /// Height.
    pub h: i64,
    /// Whether the face matched a registered student.
    #[serde(default)]
    pub recognized: bool,
    /// Match confidence, 0-100.
    #[serde(default)]
    pub confidence: f64,
}

/// A student matched by the recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedStudent {
    /// Student name.
    pub name: String,
    /// Student identifier.
    pub student_id: String,
    /// Class year, e.g. `FY`.
    #[serde(default)]
    pub class_year: Option<String>,
    /// Match confidence, 0-100.
    #[serde(default)]
    pub confidence: f64,
    /// Where the face was found.
    #[serde(default)]
    pub face_rect: Option<FaceBox>,
    /// Marking outcome.
    pub status: MarkStatus,
    /// Time attendance was recorded, `HH:MM:SS`.
    #[serde(default)]
    pub time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_result_has_no_payload() {
        let result: SubmissionResult =
            serde_json::from_value(json!({"success": true, "message": "ok"})).unwrap();
        assert!(result.success);
        assert_eq!(result.message, "ok");
        assert!(!result.has_payload());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": true, "message": "ok"})
        );
    }

    #[test]
    fn test_network_error_message() {
        let result = SubmissionResult::network_error("connection refused");
        assert!(!result.success);
        assert_eq!(result.message, "Network error: connection refused");
    }

    #[test]
    fn test_registration_image_path() {
        let result: SubmissionResult = serde_json::from_value(json!({
            "success": true,
            "message": "Face registered successfully!",
            "image_path": "faces/S123_1.jpg"
        }))
        .unwrap();
        assert_eq!(
            result.registration().image_path.as_deref(),
            Some("faces/S123_1.jpg")
        );
    }

    #[test]
    fn test_attendance_report() {
        let result: SubmissionResult = serde_json::from_value(json!({
            "success": true,
            "message": "Successfully processed 2 student(s).",
            "face_count": 3,
            "face_rects": [
                {"x": 1, "y": 2, "w": 30, "h": 40, "recognized": true, "confidence": 81.5},
                {"x": 5, "y": 6, "w": 30, "h": 40, "recognized": false, "confidence": 0}
            ],
            "results": [
                {
                    "name": "Ada", "student_id": "S1", "class_year": "FY",
                    "confidence": 81.5, "face_rect": {"x": 1, "y": 2, "w": 30, "h": 40},
                    "status": "marked", "time": "09:01:02"
                },
                {
                    "name": "Grace", "student_id": "S2", "class_year": "SY",
                    "confidence": 77.0, "status": "already_marked", "time": "08:55:00"
                }
            ]
        }))
        .unwrap();

        let report = result.attendance();
        assert_eq!(report.face_count, Some(3));
        assert_eq!(report.face_rects.len(), 2);
        assert!(!report.face_rects[1].recognized);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].status, MarkStatus::Marked);
        assert_eq!(report.results[1].status, MarkStatus::AlreadyMarked);
        assert_eq!(report.results[1].face_rect, None);
    }

    #[test]
    fn test_failed_attendance_skips_raw_results() {
        let result: SubmissionResult = serde_json::from_value(json!({
            "success": false,
            "message": "Detected 1 face(s), but none matched registered students.",
            "face_count": 1,
            "results": [{"student_id": null, "confidence": 0.0, "rect": [0, 0, 10, 10]}],
            "detection_model": "hog"
        }))
        .unwrap();

        let report = result.attendance();
        assert!(report.results.is_empty());
        assert_eq!(report.face_count, Some(1));
        assert_eq!(report.detection_model.as_deref(), Some("hog"));
    }

    #[test]
    fn test_unknown_status_tolerated() {
        let student: RecognizedStudent = serde_json::from_value(json!({
            "name": "Ada", "student_id": "S1", "status": "late"
        }))
        .unwrap();
        assert_eq!(student.status, MarkStatus::Unknown);
    }
}
