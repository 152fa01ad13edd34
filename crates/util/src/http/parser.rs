//! # HTTP Utilities
//!
//! Response parsing helpers shared by the Galaxy client implementations.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Return a user-friendly error message for common Galaxy HTTP status codes.
///
/// # Example
/// ```rust
/// use glxy_util::http::status_error_message;
///
/// let error_401 = status_error_message(401).unwrap();
/// assert!(error_401.contains("GALAXY_API_KEY"));
///
/// let error_403 = status_error_message(403).unwrap();
/// assert!(error_403.contains("Forbidden"));
///
/// assert!(status_error_message(500).is_none());
/// ```
pub fn status_error_message(status_code: u16) -> Option<String> {
    match status_code {
        401 => Some("Unauthorized (401). Hint: check GALAXY_API_KEY".into()),
        403 => Some("Forbidden (403). Hint: the API key's user lacks access to this library, history or workflow".into()),
        404 => Some("Not found (404). Hint: check the Galaxy URL, including any path prefix".into()),
        _ => None,
    }
}

/// Parse HTTP response text into JSON, providing detailed errors on failure.
///
/// Decorates any parsing error with the originating HTTP status code plus a
/// truncated preview of the response body.
pub fn parse_response_json_strict(text: &str, status: Option<StatusCode>) -> Result<Value, JsonParseError> {
    serde_json::from_str::<Value>(text).map_err(|error| {
        let status_note = status
            .map(|code| format!("status {code}"))
            .unwrap_or_else(|| "unknown status".to_string());
        let preview = truncate_response_preview(text, 200);

        JsonParseError::new(status_note, error, preview)
    })
}

fn truncate_response_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for ch in text.chars() {
        if preview.len() >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    preview.trim().to_string()
}

/// Error returned when strict JSON parsing of an HTTP response fails.
#[derive(Debug, Error)]
#[error("failed to parse JSON response ({status_note}): {source}. body preview: {body_preview}")]
pub struct JsonParseError {
    status_note: String,
    #[source]
    source: serde_json::Error,
    body_preview: String,
}

impl JsonParseError {
    pub fn new(status_note: String, source: serde_json::Error, body_preview: String) -> Self {
        Self {
            status_note,
            source,
            body_preview,
        }
    }

    pub fn body_preview(&self) -> &str {
        &self.body_preview
    }
}
