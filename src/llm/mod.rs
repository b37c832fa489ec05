pub mod openai;
pub mod replicate;

pub use openai::OpenAiClient;
pub use replicate::ReplicateClient;

use async_trait::async_trait;
use thiserror::Error;

/// Closed failure taxonomy for the hosted-model adapters. Every variant is
/// produced centrally here or in the adapters; callers never inspect raw
/// transport errors. None of these abort a query: the orchestrator falls
/// back to the other model, then to raw search text.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("authentication failed; check the API key")]
    Auth,
    #[error("rate limit exceeded; try again later")]
    RateLimited,
    #[error("remote API error ({status}): {message}")]
    Remote { status: u16, message: String },
    #[error("network error: unable to reach the completion API")]
    Network(#[source] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Stable identifier reported as the answer's source tag.
    fn name(&self) -> &'static str;

    /// Sends one prompt and returns the model's text. No retries.
    async fn generate(&self, prompt: &str) -> Result<String, CompletionError>;
}

pub(crate) fn error_from_status(status: u16, message: Option<String>) -> CompletionError {
    match status {
        401 => CompletionError::Auth,
        429 => CompletionError::RateLimited,
        _ => CompletionError::Remote {
            status,
            message: message.unwrap_or_else(|| "unknown error".into()),
        },
    }
}

pub(crate) fn transport_error(err: reqwest::Error) -> CompletionError {
    if err.is_connect() || err.is_timeout() {
        CompletionError::Network(err)
    } else {
        CompletionError::Other(err.to_string())
    }
}

/// Pulls a human-readable message out of an error body, trying the shapes
/// the two providers actually use: `{"error": {"message": ...}}` and
/// `{"detail": ...}`.
pub(crate) fn upstream_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .or_else(|| value.get("detail").and_then(|d| d.as_str()))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{error_from_status, upstream_message, CompletionError};

    #[test]
    fn status_401_maps_to_auth() {
        assert!(matches!(error_from_status(401, None), CompletionError::Auth));
    }

    #[test]
    fn status_429_maps_to_rate_limited() {
        assert!(matches!(
            error_from_status(429, None),
            CompletionError::RateLimited
        ));
    }

    #[test]
    fn other_statuses_map_to_remote_with_message() {
        match error_from_status(503, Some("overloaded".into())) {
            CompletionError::Remote { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn remote_falls_back_to_unknown_error_without_a_message() {
        match error_from_status(500, None) {
            CompletionError::Remote { message, .. } => assert_eq!(message, "unknown error"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn upstream_message_reads_openai_error_shape() {
        let body = r#"{"error": {"message": "invalid model", "type": "invalid_request_error"}}"#;
        assert_eq!(upstream_message(body).as_deref(), Some("invalid model"));
    }

    #[test]
    fn upstream_message_reads_replicate_detail_shape() {
        let body = r#"{"detail": "version not found"}"#;
        assert_eq!(upstream_message(body).as_deref(), Some("version not found"));
    }

    #[test]
    fn upstream_message_is_none_for_non_json_bodies() {
        assert_eq!(upstream_message("<html>502</html>"), None);
    }
}
