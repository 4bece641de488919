//! File configuration.
//!
//! Every section is optional; missing keys fall back to defaults that
//! match a local development dashboard.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::capture::StreamConstraints;

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Aspect ratio is not a positive finite number.
    #[error("invalid aspect ratio")]
    InvalidAspectRatio,
    /// Frame rate outside 1-120.
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    /// Base url does not parse or is not http(s).
    #[error("invalid server url: {0}")]
    InvalidServerUrl(String),
    /// Banners would expire immediately.
    #[error("notification display time must be non-zero")]
    InvalidDisplayTime,
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this layout.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Requested stream settings.
    #[serde(default)]
    pub camera: StreamConstraints,
    /// Attendance server.
    #[serde(default)]
    pub server: ServerConfig,
    /// Banner timing.
    #[serde(default)]
    pub notifications: NotificationConfig,
    /// Kiosk mode.
    #[serde(default)]
    pub kiosk: KioskConfig,
    /// Prometheus exporter.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Attendance server endpoints and anti-forgery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Scheme, host and port of the dashboard, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    /// Face registration endpoint path.
    pub save_face_path: String,
    /// Attendance endpoint path.
    pub process_attendance_path: String,
    /// Cookie holding the anti-forgery token.
    pub csrf_cookie_name: String,
    /// Header the token is echoed in.
    pub csrf_header: String,
    /// Page fetched once to obtain the anti-forgery cookie, if any.
    pub csrf_bootstrap_path: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            save_face_path: "/api/save-face/".to_string(),
            process_attendance_path: "/api/process-attendance/".to_string(),
            csrf_cookie_name: "csrftoken".to_string(),
            csrf_header: "X-CSRFToken".to_string(),
            csrf_bootstrap_path: None,
            timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Joins `path` onto the base url.
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Full url of the face registration endpoint.
    pub fn save_face_url(&self) -> String {
        self.url_for(&self.save_face_path)
    }

    /// Full url of the attendance endpoint.
    pub fn process_attendance_url(&self) -> String {
        self.url_for(&self.process_attendance_path)
    }

    /// Validates the base url.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidServerUrl(format!("{}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidServerUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }
        Ok(())
    }
}

/// Notification banner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Seconds a banner stays visible before it expires.
    pub display_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { display_secs: 5 }
    }
}

/// Continuous attendance capture settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// Seconds between attendance captures.
    pub interval_secs: u64,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self { interval_secs: 3 }
    }
}

/// Metrics exporter settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Metrics server port (0 to disable).
    pub port: u16,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.validate()?;
        self.server.validate()?;
        if self.notifications.display_secs == 0 {
            return Err(ConfigError::InvalidDisplayTime);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FacingMode;

    #[test]
    fn test_default_config_valid() {
        assert!(FileConfig::default().validate().is_ok());
    }

    #[test]
    fn test_endpoint_urls() {
        let server = ServerConfig {
            base_url: "http://localhost:8000/".to_string(),
            ..Default::default()
        };
        assert_eq!(server.save_face_url(), "http://localhost:8000/api/save-face/");
        assert_eq!(
            server.process_attendance_url(),
            "http://localhost:8000/api/process-attendance/"
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FileConfig::from_toml(
            r#"
            [camera]
            width = 640
            height = 480
            facing = "environment"

            [server]
            base_url = "https://school.example"
            "#,
        )
        .unwrap();

        assert_eq!(config.camera.width, 640);
        assert_eq!(config.camera.max_fps, 60);
        assert_eq!(config.camera.facing, FacingMode::Environment);
        assert_eq!(config.server.csrf_cookie_name, "csrftoken");
        assert_eq!(config.notifications.display_secs, 5);
        assert_eq!(config.metrics.port, 0);
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let result = FileConfig::from_toml(
            r#"
            [server]
            base_url = "ftp://example"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidServerUrl(_))));
    }

    #[test]
    fn test_rejects_zero_display_time() {
        let result = FileConfig::from_toml(
            r#"
            [notifications]
            display_secs = 0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::InvalidDisplayTime)));
    }
}
