//! Error types for benchscope-core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl DashError {
    /// True when the backend reported the resource as missing rather than failing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DashError::Http { status: 404, .. })
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<reqwest::Error> for DashError {
    fn from(e: reqwest::Error) -> Self {
        if let Some(status) = e.status() {
            DashError::Http {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else if e.is_timeout() {
            DashError::Network(format!("request timed out: {}", e))
        } else if e.is_connect() {
            DashError::Network(format!("connection failed: {}", e))
        } else {
            DashError::Network(e.to_string())
        }
    }
}

/// Prefers a JSON `detail`/`message`/`error` field, then the raw body.
pub fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["detail", "message", "error"] {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

pub type Result<T> = std::result::Result<T, DashError>;
