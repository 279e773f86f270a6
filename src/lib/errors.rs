use serde::Deserialize;
use thiserror::Error;

/// Generic copy shown for transport failures; details go to the console only.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred. Please try again.";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Text that is safe to render in an alert.
    ///
    /// Backend rejections keep their message (e.g. "Token expired"); transport
    /// and decoding problems collapse into a generic line.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(message) | AppError::Http { message, .. } => message.clone(),
            AppError::Network(_)
            | AppError::Timeout(_)
            | AppError::Parse(_)
            | AppError::Serialization(_)
            | AppError::Storage(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Extracts the human-readable part of a backend error body.
///
/// The JACS API answers `{ "error": "...", "message": "..." }`; `error` wins
/// because it carries the specific reason. Non-JSON bodies are returned as-is.
pub(crate) fn error_body_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(parsed) => parsed
            .error
            .or(parsed.message)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty()),
        Err(_) => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, GENERIC_ERROR_MESSAGE, error_body_message};

    #[test]
    fn error_body_prefers_error_field() {
        let body = r#"{"error":"Token expired","message":"Please request a new link"}"#;
        assert_eq!(error_body_message(body), Some("Token expired".to_string()));
    }

    #[test]
    fn error_body_falls_back_to_message_then_raw_text() {
        assert_eq!(
            error_body_message(r#"{"message":"An error occurred"}"#),
            Some("An error occurred".to_string())
        );
        assert_eq!(
            error_body_message("  Bad gateway  "),
            Some("Bad gateway".to_string())
        );
        assert_eq!(error_body_message(r#"{"error":"  "}"#), None);
        assert_eq!(error_body_message(""), None);
    }

    #[test]
    fn user_message_hides_transport_details() {
        let http = AppError::Http {
            status: 400,
            message: "Token expired".to_string(),
        };
        assert_eq!(http.user_message(), "Token expired");

        let network = AppError::Network("Unable to reach the server: dns".to_string());
        assert_eq!(network.user_message(), GENERIC_ERROR_MESSAGE);
    }
}
