//! Error type shared by the classifier, summarizer, scraper and output code.
//!
//! Every failure the pipeline can hit is an upstream failure of some kind
//! (network, a remote API refusing the request, a page with nothing to read).
//! [`AnalysisError::user_message`] turns each variant into the sentence shown
//! to the person running the tool, and [`AnalysisError::is_retryable`] tells
//! the backoff decorator in [`crate::api`] whether another attempt is worth it.

use reqwest::StatusCode;
use rustyline::error::ReadlineError;
use std::io;
use thiserror::Error;

use crate::utils::truncate_for_log;

/// Longest upstream reason quoted back to the user.
const MAX_REASON_CHARS: usize = 200;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The user gave us nothing usable (empty text, malformed URL).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A remote endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// Connection-level failure (DNS, TLS, reset).
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not finish in time.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The API key or token was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limit or quota exhausted.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The remote API answered successfully but without usable content.
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// The classifier model's labels cannot be mapped onto left/neutral/right.
    #[error("Unsupported classifier labels: {0}")]
    UnsupportedLabels(String),

    /// The page was fetched but no article text could be pulled out of it.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Configuration file or environment problem.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The interactive line editor failed.
    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    /// Classify a non-success HTTP response.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AnalysisError::Auth(body),
            StatusCode::TOO_MANY_REQUESTS => AnalysisError::QuotaExceeded(body),
            _ => AnalysisError::Http { status, body },
        }
    }

    /// Whether repeating the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AnalysisError::Network(_)
            | AnalysisError::Timeout(_)
            | AnalysisError::QuotaExceeded(_) => true,
            AnalysisError::Http { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// The message shown to the user in the terminal view and result page.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::InvalidInput(msg) => format!("Input required: {msg}"),
            AnalysisError::Http { status, .. } if status.is_server_error() => {
                format!("The remote service answered with HTTP {status}. Please try again later.")
            }
            AnalysisError::Http { status, body } => match upstream_reason(body) {
                Some(reason) => {
                    format!("The remote service rejected the request (HTTP {status}): {reason}")
                }
                None => format!("The remote service rejected the request (HTTP {status})."),
            },
            AnalysisError::Network(_) => {
                "Network failure: could not reach the remote service.".to_string()
            }
            AnalysisError::Timeout(_) => "The request timed out. Please try again.".to_string(),
            AnalysisError::Auth(_) => {
                "The API key was rejected. Check GEMINI_API_KEY / HF_API_TOKEN.".to_string()
            }
            AnalysisError::QuotaExceeded(_) => {
                "API quota exceeded. Wait a moment and try again.".to_string()
            }
            AnalysisError::EmptyResponse(service) => {
                format!("{service} returned an empty response.")
            }
            AnalysisError::UnsupportedLabels(labels) => {
                format!("The classifier model produced unsupported labels ({labels}).")
            }
            AnalysisError::Extraction(_) => "Unable to extract content: please verify the URL is valid or paste the text directly.".to_string(),
            AnalysisError::Config(msg) => format!("Configuration problem: {msg}"),
            AnalysisError::Terminal(msg) => format!("Terminal error: {msg}"),
            AnalysisError::Io(e) => format!("File system error: {e}"),
            AnalysisError::Json(e) => format!("Malformed data: {e}"),
        }
    }
}

/// The human-readable part of an error body.
///
/// Google and Hugging Face both answer with JSON (`{"error": {"message": ..}}`
/// or `{"error": ".."}`); anything else is quoted as plain text.
fn upstream_reason(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let error = v.get("error")?;
            error
                .get("message")
                .and_then(|m| m.as_str())
                .or_else(|| error.as_str())
                .map(str::to_string)
        });
    let reason = from_json.unwrap_or_else(|| body.to_string());
    Some(truncate_for_log(reason.trim(), MAX_REASON_CHARS))
}

impl From<ReadlineError> for AnalysisError {
    fn from(err: ReadlineError) -> Self {
        match err {
            ReadlineError::Io(e) => AnalysisError::Io(e),
            other => AnalysisError::Terminal(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AnalysisError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            AnalysisError::from_status(status, err.to_string())
        } else if err.is_decode() {
            AnalysisError::EmptyResponse(err.to_string())
        } else {
            AnalysisError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for AnalysisError {
    fn from(err: url::ParseError) -> Self {
        AnalysisError::InvalidInput(format!("URL parse error: {err}"))
    }
}

impl From<serde_yaml::Error> for AnalysisError {
    fn from(err: serde_yaml::Error) -> Self {
        AnalysisError::Config(format!("YAML error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(matches!(
            AnalysisError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            AnalysisError::Auth(_)
        ));
        assert!(matches!(
            AnalysisError::from_status(StatusCode::FORBIDDEN, String::new()),
            AnalysisError::Auth(_)
        ));
        assert!(matches!(
            AnalysisError::from_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            AnalysisError::QuotaExceeded(_)
        ));
        assert!(matches!(
            AnalysisError::from_status(StatusCode::BAD_GATEWAY, String::new()),
            AnalysisError::Http { .. }
        ));
    }

    #[test]
    fn test_retryable() {
        assert!(AnalysisError::Network("reset".into()).is_retryable());
        assert!(AnalysisError::QuotaExceeded("slow down".into()).is_retryable());
        assert!(
            AnalysisError::Http {
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !AnalysisError::Http {
                status: StatusCode::BAD_REQUEST,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!AnalysisError::Auth("bad key".into()).is_retryable());
        assert!(!AnalysisError::InvalidInput("empty".into()).is_retryable());
    }

    #[test]
    fn test_user_message_client_error_quotes_reason() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
        let msg = AnalysisError::from_status(StatusCode::BAD_REQUEST, body.into()).user_message();
        assert!(msg.contains("HTTP 400"));
        assert!(msg.contains("API key not valid"));
        assert!(!msg.contains("try again later"));

        let msg = AnalysisError::from_status(StatusCode::NOT_FOUND, r#"{"error": "Model not found"}"#.into())
            .user_message();
        assert!(msg.ends_with("Model not found"));

        let msg = AnalysisError::from_status(StatusCode::BAD_REQUEST, "  ".into()).user_message();
        assert!(msg.ends_with("(HTTP 400 Bad Request)."));
    }

    #[test]
    fn test_user_message_server_error_suggests_retry() {
        let msg = AnalysisError::from_status(StatusCode::BAD_GATEWAY, "<html>oops</html>".into())
            .user_message();
        assert!(msg.ends_with("Please try again later."));
        assert!(!msg.contains("oops"));
    }

    #[test]
    fn test_upstream_reason_truncated() {
        let reason = upstream_reason(&"x".repeat(1000)).unwrap();
        assert!(reason.starts_with(&"x".repeat(200)));
        assert!(reason.contains("…(+800 bytes)"));
    }

    #[test]
    fn test_user_message_extraction() {
        let msg = AnalysisError::Extraction("no paragraphs".into()).user_message();
        assert!(msg.starts_with("Unable to extract content"));
    }
}
